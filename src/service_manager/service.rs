//! Validated service configuration model.
//!
//! A [`ServiceDefinition`] is the plain deserialized shape of the json
//! definition file; [`Service::new`] turns it into an immutable, validated
//! [`Service`] in a single pass over the complete definition, so field order
//! can never change the validation outcome.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

mod account;
mod log_policy;

pub use account::{AccountDefinition, ServiceAccount};
pub use log_policy::{LogDefinition, LogMode, LogPolicy};

use crate::error::{Error, Result};
use crate::service_manager::Settings;

/// Plain deserialized service definition, unvalidated.
///
/// Mirror of the json definition file. Absent required fields and wrong
/// types are rejected by the deserializer; everything else is checked by
/// [`Service::new`].
#[derive(Debug, Deserialize)]
pub struct ServiceDefinition {
    /// Unique service identifier, also names the configuration file
    pub id: String,

    /// Display name
    pub name: String,

    /// Program the service runs; must exist or resolve on `PATH`
    pub executable: String,

    /// Directory the rendered wrapper configuration file is written into
    #[serde(rename = "configDirectory")]
    pub config_directory: String,

    /// Optional service description
    pub description: Option<String>,

    /// Optional program arguments, space-joined in the configuration file
    #[serde(rename = "args")]
    pub arguments: Option<Vec<String>>,

    /// Optional logging directives
    pub log: Option<LogDefinition>,

    /// Optional account to run the service under
    #[serde(rename = "serviceaccount")]
    pub account: Option<AccountDefinition>,
}

/// One service's validated desired state.
///
/// Constructed once per operation with [`Service::new`] and immutable
/// afterwards; discarded when the operation completes. The on-disk
/// configuration file and the OS service registry are the only persistent
/// state.
#[derive(Debug)]
pub struct Service {
    id: String,
    name: String,
    executable: String,
    config_directory: PathBuf,
    config_path: PathBuf,
    description: Option<String>,
    arguments: Option<Vec<String>>,
    log: Option<LogPolicy>,
    account: Option<ServiceAccount>,
}

impl Service {
    /// Validate a plain definition into a usable service model.
    ///
    /// Creates the configuration directory as a side effect. The executable
    /// check consults the filesystem and `PATH` at construction time; the
    /// file can still disappear before the wrapper runs, which then surfaces
    /// as a wrapper failure rather than a validation error.
    pub fn new(definition: ServiceDefinition, settings: &Settings) -> Result<Self> {
        let id = non_empty("id", definition.id)?;
        let name = non_empty("name", definition.name)?;

        let executable = non_empty("executable", definition.executable)?;
        if !Path::new(&executable).is_file() && which::which(&executable).is_err() {
            return Err(Error::Validation {
                field: "executable",
                reason: format!("`{executable}` does not exist and is not on PATH"),
            });
        }

        let config_directory =
            ensure_directory(non_empty("configDirectory", definition.config_directory)?)?;
        let config_path = config_directory.join(format!("{id}.service.xml"));

        let description = definition
            .description
            .map(|d| non_empty("description", d))
            .transpose()?;

        let arguments = match definition.arguments {
            Some(args) if args.is_empty() => {
                return Err(Error::Validation {
                    field: "args",
                    reason: "should be a non-empty array".to_string(),
                });
            }
            other => other,
        };

        let log = definition.log.map(LogPolicy::new).transpose()?;
        let account = definition
            .account
            .map(|a| ServiceAccount::new(a, settings))
            .transpose()?;

        Ok(Self {
            id,
            name,
            executable,
            config_directory,
            config_path,
            description,
            arguments,
            log,
            account,
        })
    }

    /// Unique service identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Program the service runs.
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Absolute directory holding the configuration file.
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Derived configuration file location: `<configDirectory>/<id>.service.xml`.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Service description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Program arguments, if any.
    pub fn arguments(&self) -> Option<&[String]> {
        self.arguments.as_deref()
    }

    /// Logging directives, if any.
    pub fn log(&self) -> Option<&LogPolicy> {
        self.log.as_ref()
    }

    /// Account the service runs under, if any.
    pub fn account(&self) -> Option<&ServiceAccount> {
        self.account.as_ref()
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String> {
    if value.is_empty() {
        return Err(Error::Validation {
            field,
            reason: "should be a non-empty string".to_string(),
        });
    }
    Ok(value)
}

/// Absolutize `dir` against the working directory and create it if absent.
///
/// Creation is idempotent; an already existing directory is not an error.
fn ensure_directory(dir: String) -> Result<PathBuf> {
    let path = PathBuf::from(dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        env::current_dir()?.join(path)
    };
    fs::create_dir_all(&absolute)?;
    Ok(absolute)
}
