//! Controller policy settings.
//!
//! Holds the wrapper executable location and the closed list of reserved
//! built-in identities. The list lives here and nowhere else, so account
//! validation and SDDL granting can never drift apart.

use std::path::PathBuf;

use serde::Deserialize;

/// Built-in identities that run services without an explicit credential.
const RESERVED_ACCOUNTS: [&str; 3] = [
    "LocalSystem",
    "NT AUTHORITY\\LocalService",
    "NT AUTHORITY\\NetworkService",
];

/// Settings Struct
///
/// Policy data for the service manager: where the wrapper executable lives
/// and which account names denote built-in identities.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the service wrapper executable
    pub wrapper: PathBuf,

    /// Account names treated as built-in identities; they never carry a
    /// password and are never granted explicit control access
    #[serde(rename = "reservedAccounts")]
    pub reserved_accounts: Vec<String>,
}

impl Settings {
    /// Create settings for a wrapper location with the default reserved
    /// account policy.
    pub fn new(wrapper: PathBuf) -> Self {
        Self {
            wrapper,
            ..Self::default()
        }
    }

    /// Whether `username` denotes a reserved built-in identity.
    pub fn is_reserved_account(&self, username: &str) -> bool {
        self.reserved_accounts.iter().any(|a| a == username)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wrapper: PathBuf::from("winsw.exe"),
            reserved_accounts: RESERVED_ACCOUNTS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_covers_the_builtin_identities() {
        let settings = Settings::default();

        assert!(settings.is_reserved_account("LocalSystem"));
        assert!(settings.is_reserved_account("NT AUTHORITY\\LocalService"));
        assert!(settings.is_reserved_account("NT AUTHORITY\\NetworkService"));
        assert!(!settings.is_reserved_account("CORP\\worker"));
    }

    #[test]
    fn reserved_accounts_are_overridable() {
        let raw = r#"{ "wrapper": "wrapper.exe", "reservedAccounts": ["OpsBreakGlass"] }"#;
        let settings: Settings = serde_json::from_str(raw).unwrap();

        assert!(settings.is_reserved_account("OpsBreakGlass"));
        assert!(!settings.is_reserved_account("LocalSystem"));
    }
}
