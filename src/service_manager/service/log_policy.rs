//! Log rotation policy for the wrapped service.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Plain deserialized log directives, unvalidated.
#[derive(Debug, Default, Deserialize)]
pub struct LogDefinition {
    /// Directory the wrapper writes log files into
    #[serde(rename = "logpath")]
    pub path: Option<String>,

    /// Rotation mode
    pub mode: Option<LogMode>,

    /// Size in bytes past which the log file rolls
    #[serde(rename = "sizeThreshold")]
    pub size_threshold: Option<i64>,

    /// Number of rolled files to keep
    #[serde(rename = "keepFiles")]
    pub keep_files: Option<i64>,

    /// Date pattern stamped onto rolled file names
    pub pattern: Option<String>,

    /// Time of day at which to roll
    #[serde(rename = "autoRollAtTime")]
    pub auto_roll_at_time: Option<String>,
}

/// Log rotation mode
///
/// Closed set understood by the wrapper; unrecognized values are rejected
/// when the definition is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogMode {
    /// Append to a single log file
    #[serde(rename = "append")]
    Append,

    /// Truncate the log file on service start
    #[serde(rename = "reset")]
    Reset,

    /// Discard all output
    #[serde(rename = "none")]
    None,

    /// Roll when the file exceeds the size threshold
    #[serde(rename = "roll-by-size")]
    RollBySize,

    /// Roll on a date pattern
    #[serde(rename = "roll-by-time")]
    RollByTime,

    /// Roll on both size and time
    #[serde(rename = "roll-by-size-time")]
    RollBySizeTime,
}

impl LogMode {
    /// Wire name of the mode as the wrapper expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Reset => "reset",
            Self::None => "none",
            Self::RollBySize => "roll-by-size",
            Self::RollByTime => "roll-by-time",
            Self::RollBySizeTime => "roll-by-size-time",
        }
    }

    /// Whether `sizeThreshold` applies to this mode.
    pub fn takes_size_threshold(self) -> bool {
        matches!(self, Self::RollBySize | Self::RollBySizeTime)
    }

    /// Whether `keepFiles` applies to this mode.
    pub fn takes_keep_files(self) -> bool {
        matches!(self, Self::RollBySize)
    }

    /// Whether `autoRollAtTime` applies to this mode.
    pub fn takes_auto_roll(self) -> bool {
        matches!(self, Self::RollBySizeTime)
    }

    /// Whether a date `pattern` applies to this mode; when it applies it is
    /// also required at construction.
    pub fn takes_pattern(self) -> bool {
        matches!(self, Self::RollByTime | Self::RollBySizeTime)
    }
}

/// Validated log policy.
///
/// Fields irrelevant to the active mode are retained here and silently
/// dropped at serialization time rather than rejected at construction.
#[derive(Debug)]
pub struct LogPolicy {
    path: Option<PathBuf>,
    mode: Option<LogMode>,
    size_threshold: Option<u64>,
    keep_files: Option<u64>,
    pattern: Option<String>,
    auto_roll_at_time: Option<String>,
}

impl LogPolicy {
    /// Validate plain log directives.
    ///
    /// Creates the log directory as a side effect when one is given. Fails
    /// when a time-based rotation mode is set without a date pattern.
    pub fn new(definition: LogDefinition) -> Result<Self> {
        let path = definition
            .path
            .map(|p| super::non_empty("logpath", p).and_then(super::ensure_directory))
            .transpose()?;

        let size_threshold = definition
            .size_threshold
            .map(|n| positive("sizeThreshold", n))
            .transpose()?;
        let keep_files = definition
            .keep_files
            .map(|n| positive("keepFiles", n))
            .transpose()?;

        let pattern = definition
            .pattern
            .map(|p| super::non_empty("pattern", p))
            .transpose()?;
        let auto_roll_at_time = definition
            .auto_roll_at_time
            .map(|t| super::non_empty("autoRollAtTime", t))
            .transpose()?;

        if definition.mode.is_some_and(LogMode::takes_pattern) && pattern.is_none() {
            return Err(Error::MissingField {
                field: "pattern",
                context: "log modes roll-by-time and roll-by-size-time need a date pattern",
            });
        }

        Ok(Self {
            path,
            mode: definition.mode,
            size_threshold,
            keep_files,
            pattern,
            auto_roll_at_time,
        })
    }

    /// Absolute log directory, if one was configured.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rotation mode, if one was configured.
    pub fn mode(&self) -> Option<LogMode> {
        self.mode
    }

    /// Size threshold in bytes.
    pub fn size_threshold(&self) -> Option<u64> {
        self.size_threshold
    }

    /// Number of rolled files to keep.
    pub fn keep_files(&self) -> Option<u64> {
        self.keep_files
    }

    /// Date pattern for rolled file names.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Time of day at which to roll.
    pub fn auto_roll_at_time(&self) -> Option<&str> {
        self.auto_roll_at_time.as_deref()
    }
}

fn positive(field: &'static str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::Validation {
            field,
            reason: format!("should be a positive integer, got {value}"),
        })
}
