//! Renders a validated service model into the wrapper's XML configuration.
//!
//! The emitter keeps a fixed element order so the same model always yields a
//! byte-identical document; the wrapper does not care, but deterministic
//! output keeps config-file diffs and tests trivial. No XML declaration is
//! written. Text content goes through quick-xml's escaping; structure is not
//! re-validated here, the model's invariants are trusted.

use quick_xml::escape::escape;

use crate::service_manager::service::{LogPolicy, Service, ServiceAccount};

const INDENT: &str = "  ";

/// Render `service` into the wrapper configuration document.
///
/// Element order: `id`, `name`, `executable`, then optional `description`,
/// `arguments`, log fields and `serviceaccount`. Absent optionals are
/// omitted entirely, never emitted as empty elements.
pub fn render(service: &Service) -> String {
    let mut doc = String::new();
    doc.push_str("<service>\n");

    element(&mut doc, 1, "id", service.id());
    element(&mut doc, 1, "name", service.name());
    element(&mut doc, 1, "executable", service.executable());

    if let Some(description) = service.description() {
        element(&mut doc, 1, "description", description);
    }
    if let Some(arguments) = service.arguments() {
        element(&mut doc, 1, "arguments", &arguments.join(" "));
    }
    if let Some(log) = service.log() {
        log_elements(&mut doc, log);
    }
    if let Some(account) = service.account() {
        account_elements(&mut doc, account);
    }

    doc.push_str("</service>\n");
    doc
}

/// Emit `logpath` and the mode-gated `log` element.
///
/// A field irrelevant to the active mode is dropped silently, matching the
/// model's construction contract.
fn log_elements(doc: &mut String, log: &LogPolicy) {
    if let Some(path) = log.path() {
        element(doc, 1, "logpath", &path.display().to_string());
    }

    let Some(mode) = log.mode() else {
        return;
    };

    doc.push_str(INDENT);
    doc.push_str(&format!("<log mode=\"{}\">\n", mode.as_str()));

    if mode.takes_size_threshold() {
        if let Some(size) = log.size_threshold() {
            element(doc, 2, "sizeThreshold", &size.to_string());
        }
    }
    if mode.takes_keep_files() {
        if let Some(keep) = log.keep_files() {
            element(doc, 2, "keepFiles", &keep.to_string());
        }
    }
    if mode.takes_auto_roll() {
        if let Some(at) = log.auto_roll_at_time() {
            element(doc, 2, "autoRollAtTime", at);
        }
    }
    if mode.takes_pattern() {
        if let Some(pattern) = log.pattern() {
            element(doc, 2, "pattern", pattern);
        }
    }

    doc.push_str(INDENT);
    doc.push_str("</log>\n");
}

fn account_elements(doc: &mut String, account: &ServiceAccount) {
    doc.push_str(INDENT);
    doc.push_str("<serviceaccount>\n");

    if let Some(domain) = account.domain() {
        element(doc, 2, "domain", domain);
    }
    if let Some(username) = account.bare_username() {
        element(doc, 2, "username", username);
    }
    if let Some(password) = account.password() {
        element(doc, 2, "password", password);
    }
    if account.allow_service_logon() == Some(true) {
        element(doc, 2, "allowservicelogon", "true");
    }

    doc.push_str(INDENT);
    doc.push_str("</serviceaccount>\n");
}

fn element(doc: &mut String, depth: usize, tag: &str, text: &str) {
    doc.push_str(&INDENT.repeat(depth));
    doc.push('<');
    doc.push_str(tag);
    doc.push('>');
    doc.push_str(&escape(text));
    doc.push_str("</");
    doc.push_str(tag);
    doc.push_str(">\n");
}
