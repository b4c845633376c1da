//! Lifecycle control for wrapper-managed Windows services.
//!
//! Writes the rendered configuration file, drives the wrapper executable's
//! `install`/`uninstall`/`start`/`stop` subcommands and grants a configured
//! account control access over the registered service.

use std::fs;

use log::{debug, info};

pub mod exec;
pub mod sddl;
pub mod service;
pub mod settings;
pub mod xml;

pub use service::{Service, ServiceDefinition};
pub use settings::Settings;

use crate::error::{Error, Result};

/// Drives one service through its lifecycle operations.
///
/// Holds no state of its own: the OS service registry is queried fresh at the
/// start of every operation. The existence check and the action that follows
/// are separate external calls, so a concurrent actor can still win the race
/// in between; the OS service database is the only real lock.
pub struct ServiceManager {
    service: Service,
    settings: Settings,
}

/// What `install` decided to do after inspecting external state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstallAction {
    /// Unregistered: write the configuration file and run the wrapper.
    Register,
    /// Registered but the configuration file is missing: rewrite it only.
    RestoreConfig,
    /// Registered and fully configured: refuse to touch anything.
    AlreadyExists,
}

impl InstallAction {
    fn decide(registered: bool, config_exists: bool) -> Self {
        match (registered, config_exists) {
            (true, true) => Self::AlreadyExists,
            (true, false) => Self::RestoreConfig,
            (false, _) => Self::Register,
        }
    }
}

impl ServiceManager {
    /// Create a manager for one validated service.
    pub fn new(service: Service, settings: Settings) -> Self {
        Self { service, settings }
    }

    /// The wrapper configuration document for this service.
    pub fn rendered_config(&self) -> String {
        xml::render(&self.service)
    }

    async fn is_registered(&self) -> Result<bool> {
        exec::probe("sc", &["query", self.service.id()]).await
    }

    fn config_exists(&self) -> bool {
        self.service.config_path().is_file()
    }

    /// Write the rendered configuration file, replacing any previous one.
    fn write_config_file(&self) -> Result<()> {
        fs::write(self.service.config_path(), self.rendered_config())?;
        debug!(
            target: self.service.id(),
            "wrote configuration file {:?}",
            self.service.config_path()
        );
        Ok(())
    }

    fn wrapper_args(&self, subcommand: &str) -> Vec<String> {
        let mut args = vec![
            subcommand.to_string(),
            self.service.config_path().display().to_string(),
        ];
        if let Some(account) = self.service.account() {
            if let Some(username) = account.username() {
                args.push("--user".to_string());
                args.push(username.to_string());
                if let Some(password) = account.password() {
                    args.push("--pass".to_string());
                    args.push(password.to_string());
                }
            }
        }
        args
    }

    async fn run_wrapper(&self, subcommand: &str) -> Result<()> {
        exec::run(&self.settings.wrapper, &self.wrapper_args(subcommand)).await?;
        Ok(())
    }

    /// Register the service with the OS.
    ///
    /// Refuses to touch a service that is both registered and fully
    /// configured; for an already registered service only a missing
    /// configuration file is rewritten. After a fresh install the configured
    /// account, unless it is a built-in identity, is granted control access
    /// over the service.
    pub async fn install(&self) -> Result<()> {
        let action = InstallAction::decide(self.is_registered().await?, self.config_exists());
        self.apply_install(action).await
    }

    async fn apply_install(&self, action: InstallAction) -> Result<()> {
        match action {
            InstallAction::AlreadyExists => {
                Err(Error::ServiceAlreadyExists(self.service.id().to_string()))
            }
            InstallAction::RestoreConfig => {
                info!(
                    target: self.service.id(),
                    "service already registered, restoring missing configuration file"
                );
                self.write_config_file()
            }
            InstallAction::Register => {
                self.write_config_file()?;
                self.run_wrapper("install").await?;
                info!(target: self.service.id(), "installed service");

                if let Some(account) = self.service.account() {
                    if let Some(username) = account.bare_username() {
                        if !account.is_builtin() {
                            sddl::grant_control_access(self.service.id(), username).await?;
                        }
                    }
                }

                Ok(())
            }
        }
    }

    /// Registered service and configuration file both present, or the
    /// operation must not proceed.
    fn ensure_operable(&self, registered: bool) -> Result<()> {
        if !registered {
            return Err(Error::InvalidService(self.service.id().to_string()));
        }
        if !self.config_exists() {
            return Err(Error::FileNotFound(self.service.config_path().to_path_buf()));
        }
        Ok(())
    }

    /// Unregister the service and remove its configuration file.
    pub async fn uninstall(&self) -> Result<()> {
        self.ensure_operable(self.is_registered().await?)?;

        self.run_wrapper("uninstall").await?;
        fs::remove_file(self.service.config_path())?;
        info!(target: self.service.id(), "uninstalled service");

        Ok(())
    }

    /// Start the registered service.
    pub async fn start(&self) -> Result<()> {
        self.control("start").await
    }

    /// Stop the registered service.
    pub async fn stop(&self) -> Result<()> {
        self.control("stop").await
    }

    async fn control(&self, subcommand: &str) -> Result<()> {
        self.ensure_operable(self.is_registered().await?)?;

        self.run_wrapper(subcommand).await?;
        info!(target: self.service.id(), "issued {} to service", subcommand);

        Ok(())
    }

    /// Uninstall followed by install.
    ///
    /// Sequential with no rollback: a failure mid-sequence leaves the service
    /// in whatever state the failing step produced.
    pub async fn reinstall(&self) -> Result<()> {
        self.uninstall().await?;
        self.install().await
    }

    /// Stop followed by start, same no-rollback policy as [`Self::reinstall`].
    pub async fn restart(&self) -> Result<()> {
        self.stop().await?;
        self.start().await
    }
}

#[cfg(test)]
mod tests {
    use super::service::{AccountDefinition, ServiceDefinition};
    use super::*;

    fn test_manager(tag: &str, account: Option<AccountDefinition>) -> ServiceManager {
        let exe = std::env::current_exe().unwrap();
        let dir = std::env::temp_dir().join(format!("svcman-mgr-{tag}-{}", std::process::id()));
        let definition = ServiceDefinition {
            id: "worker1".to_string(),
            name: "Worker".to_string(),
            executable: exe.display().to_string(),
            config_directory: dir.display().to_string(),
            description: None,
            arguments: None,
            log: None,
            account,
        };
        let service = Service::new(definition, &Settings::default()).unwrap();
        ServiceManager::new(service, Settings::default())
    }

    #[test]
    fn wrapper_args_without_account() {
        let manager = test_manager("args-bare", None);
        let args = manager.wrapper_args("install");

        assert_eq!(args[0], "install");
        assert!(args[1].ends_with("worker1.service.xml"));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn wrapper_args_with_credentials() {
        let account = AccountDefinition {
            username: Some("CORP\\worker".to_string()),
            password: Some("hunter2".to_string()),
            allow_service_logon: None,
        };
        let manager = test_manager("args-creds", Some(account));
        let args = manager.wrapper_args("start");

        assert_eq!(
            args[2..],
            ["--user", "CORP\\worker", "--pass", "hunter2"].map(String::from)
        );
    }

    #[test]
    fn wrapper_args_omit_password_for_builtin_identity() {
        let account = AccountDefinition {
            username: Some("NT AUTHORITY\\LocalService".to_string()),
            password: Some("ignored".to_string()),
            allow_service_logon: None,
        };
        let manager = test_manager("args-builtin", Some(account));
        let args = manager.wrapper_args("install");

        assert_eq!(args[2..], ["--user", "NT AUTHORITY\\LocalService"].map(String::from));
    }

    #[test]
    fn install_decision_truth_table() {
        assert_eq!(InstallAction::decide(true, true), InstallAction::AlreadyExists);
        assert_eq!(InstallAction::decide(true, false), InstallAction::RestoreConfig);
        assert_eq!(InstallAction::decide(false, true), InstallAction::Register);
        assert_eq!(InstallAction::decide(false, false), InstallAction::Register);
    }

    #[tokio::test]
    async fn install_on_configured_service_fails_and_leaves_the_file_alone() {
        let manager = test_manager("install-exists", None);
        std::fs::write(manager.service.config_path(), "sentinel").unwrap();

        let err = manager
            .apply_install(InstallAction::AlreadyExists)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ServiceAlreadyExists(id) if id == "worker1"));
        assert_eq!(
            std::fs::read_to_string(manager.service.config_path()).unwrap(),
            "sentinel"
        );
    }

    #[tokio::test]
    async fn install_restores_a_missing_config_file() {
        let manager = test_manager("install-restore", None);
        std::fs::remove_file(manager.service.config_path()).ok();

        manager
            .apply_install(InstallAction::RestoreConfig)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(manager.service.config_path()).unwrap(),
            manager.rendered_config()
        );
    }

    #[test]
    fn operations_on_unregistered_service_fail_without_further_calls() {
        let manager = test_manager("unregistered", None);

        // The config file being present must not mask the missing service.
        std::fs::write(manager.service.config_path(), "sentinel").unwrap();

        let err = manager.ensure_operable(false).unwrap_err();
        assert!(matches!(err, Error::InvalidService(id) if id == "worker1"));
    }

    #[test]
    fn operations_without_config_file_fail_with_file_not_found() {
        let manager = test_manager("no-config", None);
        std::fs::remove_file(manager.service.config_path()).ok();

        let err = manager.ensure_operable(true).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(path) if path == manager.service.config_path()));
    }

    #[test]
    fn registered_and_configured_service_is_operable() {
        let manager = test_manager("operable", None);
        manager.write_config_file().unwrap();

        manager.ensure_operable(true).unwrap();
    }
}
