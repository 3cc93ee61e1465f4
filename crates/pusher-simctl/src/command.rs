//! Child process helpers shared by every simctl call
//!
//! All commands run with `kill_on_drop(true)` so dropping an in-flight future
//! (a superseded feedback operation) also terminates the child.

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;

use pusher_core::prelude::*;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::options::SimctlOptions;

/// Run `xcrun simctl <args>` and collect its output.
///
/// A non-zero exit status is returned as `Ok`; callers decide which stderr
/// messages are benign.
pub(crate) async fn simctl<I, S>(
    options: &SimctlOptions,
    args: I,
    operation: &'static str,
) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(&options.xcrun);
    cmd.arg("simctl").args(args);
    run(cmd, None, options.command_timeout(), operation).await
}

/// Run `xcrun simctl <args>` feeding `input` on stdin.
pub(crate) async fn simctl_with_input<I, S>(
    options: &SimctlOptions,
    args: I,
    input: &[u8],
    operation: &'static str,
) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(&options.xcrun);
    cmd.arg("simctl").args(args);
    run(cmd, Some(input), options.command_timeout(), operation).await
}

/// Run an arbitrary program (e.g. `plutil`) feeding `input` on stdin.
pub(crate) async fn program_with_input(
    program: &str,
    args: &[&str],
    input: &[u8],
    limit: Duration,
    operation: &'static str,
) -> Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    run(cmd, Some(input), limit, operation).await
}

async fn run(
    mut cmd: Command,
    input: Option<&[u8]>,
    limit: Duration,
    operation: &'static str,
) -> Result<Output> {
    cmd.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    debug!("Running {}: {:?}", operation, cmd.as_std());

    let mut child = cmd
        .spawn()
        .map_err(|e| Error::simctl(format!("Failed to run {}: {}", operation, e)))?;

    // stdin is fed while stdout is drained; a child echoing its input would
    // otherwise block on a full pipe.
    let stdin = input.zip(child.stdin.take());
    let io = async move {
        let write = async move {
            if let Some((bytes, mut stdin)) = stdin {
                stdin.write_all(bytes).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e);
            }
            debug!("{} exited before reading all of stdin", operation);
        }
        Ok(output)
    };

    match timeout(limit, io).await {
        Ok(output) => output.with_context(|| format!("{} I/O failed", operation)),
        Err(_) => {
            warn!("{} timed out after {:?}", operation, limit);
            Err(Error::timeout(operation, limit))
        }
    }
}

/// Turn a failed exit status into an error carrying stderr.
pub(crate) fn ensure_success(output: &Output, operation: &'static str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(Error::simctl(format!(
        "{} failed ({}): {}",
        operation,
        output.status,
        stderr.trim()
    )))
}
