//! Subprocess invocation helpers.
//!
//! Every external tool call goes through here. Commands are awaited to
//! completion with no timeout; a hung process blocks the calling operation
//! until the caller's own cancellation mechanism kicks in.

use std::ffi::OsStr;

use log::debug;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Run an external command to completion.
///
/// A non-zero exit code or any output on the error stream fails the call
/// with [`Error::Execution`] carrying the command line, exit code and the
/// error text verbatim. Returns captured stdout on success.
pub async fn run<P, S>(program: P, args: &[S]) -> Result<String>
where
    P: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    let rendered = render_command(program.as_ref(), args);
    debug!(target: "exec", "running `{}`", rendered);

    let output = Command::new(&program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !output.status.success() || !stderr.is_empty() {
        return Err(Error::Execution {
            command: rendered,
            code: output.status.code(),
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run an external command used purely as an existence probe.
///
/// A non-zero exit code is the negative answer, not an error; only a failure
/// to spawn the probe itself surfaces as [`Error::Io`].
pub async fn probe<P, S>(program: P, args: &[S]) -> Result<bool>
where
    P: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    debug!(target: "exec", "probing `{}`", render_command(program.as_ref(), args));

    let output = Command::new(&program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await?;

    Ok(output.status.success())
}

fn render_command(program: &OsStr, args: &[impl AsRef<OsStr>]) -> String {
    let mut parts = vec![program.to_string_lossy().into_owned()];
    parts.extend(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()));
    parts.join(" ")
}
