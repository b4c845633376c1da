//! Typed failures for service configuration, SDDL editing and lifecycle
//! control.
//!
//! Construction-time errors (`MissingField`, `Validation`) are fatal to the
//! constructor call; no partially validated service ever escapes. Runtime
//! errors carry enough context to diagnose the failing external collaborator.

use std::path::PathBuf;

/// Result type alias for service manager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or controlling a service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A field made mandatory by the current configuration shape was absent.
    #[error("missing required field `{field}`: {context}")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
        /// Which shape made the field mandatory.
        context: &'static str,
    },

    /// A present field failed a range or shape check.
    #[error("invalid value for `{field}`: {reason}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// The shape the field was required to have.
        reason: String,
    },

    /// The service definition file could not be deserialized.
    ///
    /// Covers absent required fields and wrong json types; conditional
    /// requirements are checked after deserialization and surface as
    /// [`Error::MissingField`].
    #[error("invalid service definition:\n{0}")]
    Definition(#[from] format_serde_error::SerdeError),

    /// An expected on-disk artifact was absent at use time.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// No service is registered under the given identifier.
    #[error("no service registered under id `{0}`")]
    InvalidService(String),

    /// The service is registered and its configuration file already exists.
    #[error("service `{0}` is already registered and configured")]
    ServiceAlreadyExists(String),

    /// The account does not exist on this host.
    #[error("unknown account `{0}`")]
    UnknownAccount(String),

    /// A security descriptor did not match the `D:...[S:...]` grammar.
    #[error("malformed security descriptor: `{0}`")]
    MalformedDescriptor(String),

    /// An external command exited non-zero or wrote to its error stream.
    #[error("command `{command}` failed with exit code {code:?}: {stderr}")]
    Execution {
        /// The command line that was run.
        command: String,
        /// Exit code, absent when the process was killed by a signal.
        code: Option<i32>,
        /// Captured error stream, verbatim.
        stderr: String,
    },

    /// Filesystem or process-spawn failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
