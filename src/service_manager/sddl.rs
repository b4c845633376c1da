//! Security descriptor (SDDL) editing for registered services.
//!
//! Resolves an account to its SID through the system account utilities,
//! fetches a service's descriptor with `sc sdshow` and writes an updated
//! descriptor back with a single `sc sdset` call. Granting is idempotent:
//! an account already present in the DACL is left untouched, and any failure
//! along the way aborts without a partial write.

use log::{debug, info};

use crate::error::{Error, Result};
use crate::service_manager::exec;

/// Access rights granted to a controlling account: list, query config,
/// read/write properties, query status, enumerate dependents, interrogate
/// and user-defined control. The minimum set a non-administrative account
/// needs to control the service without owning it.
const CONTROL_RIGHTS: &str = "LCDTRPWPCR";

/// A service security descriptor split into its DACL clause and an optional
/// SACL clause carried verbatim.
///
/// Transient: computed per grant operation, never persisted by this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityDescriptor {
    dacl: String,
    sacl: Option<String>,
}

impl SecurityDescriptor {
    /// Split a raw descriptor string into `D:` and optional `S:` clauses.
    ///
    /// Anything that does not match the `D:...[S:...]` grammar, including an
    /// empty DACL clause, is [`Error::MalformedDescriptor`].
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let Some(rest) = trimmed.strip_prefix("D:") else {
            return Err(Error::MalformedDescriptor(trimmed.to_string()));
        };

        let (dacl, sacl) = match rest.find("S:") {
            Some(0) => return Err(Error::MalformedDescriptor(trimmed.to_string())),
            Some(at) => (
                format!("D:{}", &rest[..at]),
                Some(rest[at..].to_string()),
            ),
            None if rest.is_empty() => {
                return Err(Error::MalformedDescriptor(trimmed.to_string()));
            }
            None => (format!("D:{rest}"), None),
        };

        Ok(Self { dacl, sacl })
    }

    /// Whether the DACL already carries an entry for `sid`.
    ///
    /// Anchored to the trailing ACE fields (`;<sid>)`) rather than a raw
    /// substring, so one SID can never match inside another SID's text.
    pub fn contains_sid(&self, sid: &str) -> bool {
        self.dacl.contains(&format!(";{sid})"))
    }

    /// Append a control-access entry for `sid` unless one is already present.
    ///
    /// Returns `true` when the descriptor changed.
    pub fn grant_control(&mut self, sid: &str) -> bool {
        if self.contains_sid(sid) {
            return false;
        }
        self.dacl.push_str(&format!("(A;;{CONTROL_RIGHTS};;;{sid})"));
        true
    }

    /// The combined descriptor string, SACL clause preserved verbatim.
    pub fn render(&self) -> String {
        match &self.sacl {
            Some(sacl) => format!("{}{}", self.dacl, sacl),
            None => self.dacl.clone(),
        }
    }

    /// The discretionary access-control clause.
    pub fn dacl(&self) -> &str {
        &self.dacl
    }

    /// The system access-control clause, if the descriptor had one.
    pub fn sacl(&self) -> Option<&str> {
        self.sacl.as_deref()
    }
}

/// Resolve an account name to its security identifier.
///
/// Fails with [`Error::UnknownAccount`] when the account does not exist on
/// this host or the lookup yields no SID token.
pub async fn account_sid(username: &str) -> Result<String> {
    // A `'` would terminate the WQL string literal below; no valid account
    // name carries one, so reject rather than escape.
    if username.contains('\'') {
        return Err(Error::Validation {
            field: "user",
            reason: format!("`{username}` must not contain a single quote"),
        });
    }

    if !exec::probe("net", &["user", username]).await? {
        return Err(Error::UnknownAccount(username.to_string()));
    }

    let filter = format!("name='{username}'");
    let stdout = exec::run(
        "wmic",
        &["useraccount", "where", filter.as_str(), "get", "sid"],
    )
    .await?;

    // Output is a `SID` header line followed by the value; keep the token.
    stdout
        .split_whitespace()
        .find(|token| token.starts_with("S-"))
        .map(str::to_string)
        .ok_or_else(|| Error::UnknownAccount(username.to_string()))
}

/// Fetch the current security descriptor of a registered service.
pub async fn fetch_descriptor(service_id: &str) -> Result<SecurityDescriptor> {
    if !exec::probe("sc", &["query", service_id]).await? {
        return Err(Error::InvalidService(service_id.to_string()));
    }

    let raw = exec::run("sc", &["sdshow", service_id]).await?;
    SecurityDescriptor::parse(&raw)
}

/// Grant `username` control access over `service_id`, idempotently.
///
/// Resolves the SID, fetches the current descriptor and, only when the SID
/// is not yet present, appends one control-access entry and writes the
/// combined descriptor back in a single `sc sdset` call.
pub async fn grant_control_access(service_id: &str, username: &str) -> Result<()> {
    let sid = account_sid(username).await?;
    let mut descriptor = fetch_descriptor(service_id).await?;

    if !descriptor.grant_control(&sid) {
        debug!(
            target: service_id,
            "account {} already holds control access", username
        );
        return Ok(());
    }

    let rendered = descriptor.render();
    exec::run("sc", &["sdset", service_id, rendered.as_str()]).await?;
    info!(target: service_id, "granted control access to {}", username);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SID: &str = "S-1-5-21-3623811015-3361044348-30300820-1013";

    #[test]
    fn parse_splits_dacl_and_sacl() {
        let descriptor =
            SecurityDescriptor::parse("D:(A;;CCLCSWRPWPDTLOCRRC;;;SY)S:(AU;FA;CCDCLCSWRPWPDTLOCRSDRCWDWO;;;WD)")
                .unwrap();

        assert_eq!(descriptor.dacl(), "D:(A;;CCLCSWRPWPDTLOCRRC;;;SY)");
        assert_eq!(
            descriptor.sacl(),
            Some("S:(AU;FA;CCDCLCSWRPWPDTLOCRSDRCWDWO;;;WD)")
        );
    }

    #[test]
    fn parse_without_sacl() {
        let descriptor = SecurityDescriptor::parse("D:(A;;CCLCSWRPWPDTLOCRRC;;;SY)").unwrap();

        assert_eq!(descriptor.sacl(), None);
        assert_eq!(descriptor.render(), "D:(A;;CCLCSWRPWPDTLOCRRC;;;SY)");
    }

    #[test]
    fn parse_rejects_text_without_dacl() {
        for raw in ["", "garbage", "S:(AU;FA;FA;;;WD)", "D:", "D:S:(AU;FA;FA;;;WD)"] {
            let err = SecurityDescriptor::parse(raw).unwrap_err();
            assert!(matches!(err, Error::MalformedDescriptor(_)), "accepted `{raw}`");
        }
    }

    #[test]
    fn grant_appends_one_control_entry() {
        let mut descriptor = SecurityDescriptor::parse("D:(A;;CCLCSWRPWPDTLOCRRC;;;SY)").unwrap();

        assert!(descriptor.grant_control(SID));
        assert_eq!(
            descriptor.render(),
            format!("D:(A;;CCLCSWRPWPDTLOCRRC;;;SY)(A;;LCDTRPWPCR;;;{SID})")
        );
    }

    #[test]
    fn grant_is_idempotent() {
        let mut descriptor = SecurityDescriptor::parse("D:(A;;CCLCSWRPWPDTLOCRRC;;;SY)").unwrap();

        assert!(descriptor.grant_control(SID));
        assert!(!descriptor.grant_control(SID));

        assert_eq!(descriptor.render().matches(SID).count(), 1);
    }

    #[test]
    fn grant_preserves_sacl_verbatim() {
        let mut descriptor =
            SecurityDescriptor::parse("D:(A;;CCLCSWRPWPDTLOCRRC;;;SY)S:(AU;FA;FA;;;WD)").unwrap();
        descriptor.grant_control(SID);

        assert!(descriptor.render().ends_with("S:(AU;FA;FA;;;WD)"));
        assert!(descriptor.dacl().contains(SID));
    }

    #[tokio::test]
    async fn account_lookup_rejects_quoted_names() {
        let err = account_sid("o'brien").await.unwrap_err();
        assert!(matches!(err, Error::Validation { field: "user", .. }));
    }

    #[test]
    fn membership_check_is_anchored_to_the_entry_boundary() {
        let longer = format!("{SID}9");
        let mut descriptor = SecurityDescriptor::parse("D:(A;;CCLCSWRPWPDTLOCRRC;;;SY)").unwrap();
        descriptor.grant_control(&longer);

        // `SID` is a textual prefix of `longer` but holds no entry itself.
        assert!(!descriptor.contains_sid(SID));
        assert!(descriptor.contains_sid(&longer));
    }
}
