//! Account the wrapped service runs under.

use serde::Deserialize;

use crate::error::Result;
use crate::service_manager::Settings;

/// Plain deserialized account block, unvalidated.
#[derive(Debug, Default, Deserialize)]
pub struct AccountDefinition {
    /// Account name, bare or `DOMAIN\name` qualified
    #[serde(rename = "user")]
    pub username: Option<String>,

    /// Account password
    pub password: Option<String>,

    /// Whether to grant the account service-logon rights at install time
    #[serde(rename = "allowServiceLogon")]
    pub allow_service_logon: Option<bool>,
}

/// Validated service account.
///
/// Managed service accounts (trailing `$`) and the reserved built-in
/// identities from the [`Settings`] policy list require no credential; any
/// supplied password is discarded here so it can never reach the rendered
/// configuration file.
#[derive(Debug)]
pub struct ServiceAccount {
    username: Option<String>,
    password: Option<String>,
    allow_service_logon: Option<bool>,
    builtin: bool,
}

impl ServiceAccount {
    /// Validate a plain account block against the reserved account policy.
    pub fn new(definition: AccountDefinition, settings: &Settings) -> Result<Self> {
        let username = definition
            .username
            .map(|u| super::non_empty("user", u))
            .transpose()?;
        let password = definition
            .password
            .map(|p| super::non_empty("password", p))
            .transpose()?;

        let builtin = username
            .as_deref()
            .is_some_and(|u| settings.is_reserved_account(u));
        let managed = username.as_deref().is_some_and(|u| u.ends_with('$'));

        Ok(Self {
            password: if builtin || managed { None } else { password },
            username,
            allow_service_logon: definition.allow_service_logon,
            builtin,
        })
    }

    /// Account name as supplied, possibly `DOMAIN\name` qualified.
    ///
    /// Absent means the service runs under the default system account.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Password; always absent for managed and built-in identities.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Whether service-logon rights should be granted at install time.
    pub fn allow_service_logon(&self) -> Option<bool> {
        self.allow_service_logon
    }

    /// Whether the username denotes a reserved built-in identity.
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Domain part of a qualified username, if any.
    pub fn domain(&self) -> Option<&str> {
        self.username
            .as_deref()
            .and_then(|u| u.split_once('\\').map(|(domain, _)| domain))
    }

    /// Username with any `DOMAIN\` qualifier stripped.
    ///
    /// The account utilities (`net user`, the SID lookup) take bare names.
    pub fn bare_username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(|u| u.split_once('\\').map_or(u, |(_, name)| name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn account(definition: AccountDefinition) -> Result<ServiceAccount> {
        ServiceAccount::new(definition, &Settings::default())
    }

    #[test]
    fn keeps_password_for_regular_account() {
        let acct = account(AccountDefinition {
            username: Some("CORP\\worker".to_string()),
            password: Some("hunter2".to_string()),
            allow_service_logon: Some(true),
        })
        .unwrap();

        assert_eq!(acct.password(), Some("hunter2"));
        assert_eq!(acct.domain(), Some("CORP"));
        assert_eq!(acct.bare_username(), Some("worker"));
        assert!(!acct.is_builtin());
    }

    #[test]
    fn discards_password_for_managed_service_account() {
        let acct = account(AccountDefinition {
            username: Some("CORP\\gmsa-worker$".to_string()),
            password: Some("ignored".to_string()),
            allow_service_logon: None,
        })
        .unwrap();

        assert_eq!(acct.password(), None);
    }

    #[test]
    fn discards_password_for_reserved_identities() {
        for name in [
            "LocalSystem",
            "NT AUTHORITY\\LocalService",
            "NT AUTHORITY\\NetworkService",
        ] {
            let acct = account(AccountDefinition {
                username: Some(name.to_string()),
                password: Some("ignored".to_string()),
                allow_service_logon: None,
            })
            .unwrap();

            assert_eq!(acct.password(), None, "password kept for {name}");
            assert!(acct.is_builtin(), "{name} not flagged built-in");
        }
    }

    #[test]
    fn rejects_empty_username() {
        let err = account(AccountDefinition {
            username: Some(String::new()),
            password: None,
            allow_service_logon: None,
        })
        .unwrap_err();

        assert!(matches!(err, Error::Validation { field: "user", .. }));
    }

    #[test]
    fn bare_name_of_unqualified_account() {
        let acct = account(AccountDefinition {
            username: Some("worker".to_string()),
            password: None,
            allow_service_logon: None,
        })
        .unwrap();

        assert_eq!(acct.domain(), None);
        assert_eq!(acct.bare_username(), Some("worker"));
    }
}
