//! Host capability check for push simulation
//!
//! Push simulation needs `xcrun simctl push`, which first shipped with
//! Xcode 11.4.

use std::fmt;
use std::sync::LazyLock;

use pusher_core::prelude::*;
use regex::Regex;

use crate::command::{program_with_input, simctl};
use crate::options::SimctlOptions;

/// Oldest Xcode whose simctl supports `push`
pub const MIN_XCODE_VERSION: XcodeVersion = XcodeVersion { major: 11, minor: 4 };

static XCODE_VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Xcode (\d+)\.(\d+)").expect("valid regex"));

/// Major/minor Xcode version as printed by `xcodebuild -version`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct XcodeVersion {
    pub major: u32,
    pub minor: u32,
}

impl XcodeVersion {
    /// Extract the version from `xcodebuild -version` output
    pub fn parse(output: &str) -> Option<Self> {
        let caps = XCODE_VERSION_REGEX.captures(output)?;
        Some(Self {
            major: caps.get(1)?.as_str().parse().ok()?,
            minor: caps.get(2)?.as_str().parse().ok()?,
        })
    }

    pub fn supports_push(&self) -> bool {
        *self >= MIN_XCODE_VERSION
    }
}

impl fmt::Display for XcodeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Verify the host can deliver simulated pushes
pub async fn ensure_push_supported(options: &SimctlOptions) -> Result<()> {
    let xcrun = which::which(&options.xcrun).map_err(|e| {
        debug!("{} not resolvable: {}", options.xcrun, e);
        Error::XcrunNotFound
    })?;
    debug!("Using xcrun at {}", xcrun.display());

    let help = simctl(options, ["help", "push"], "simctl help push").await?;
    if !help.status.success() {
        return Err(Error::capability(
            "xcrun simctl does not support push; Xcode 11.4 or newer is required",
        ));
    }

    // Unreadable version output is not fatal once `simctl help push` succeeded
    match installed_xcode_version(options).await {
        Some(version) if !version.supports_push() => {
            return Err(Error::capability(format!(
                "Xcode {} is too old; {} or newer is required",
                version, MIN_XCODE_VERSION
            )));
        }
        Some(version) => info!("Xcode {} supports simulated push", version),
        None => debug!("Could not determine Xcode version"),
    }

    Ok(())
}

async fn installed_xcode_version(options: &SimctlOptions) -> Option<XcodeVersion> {
    let output = program_with_input(
        "xcodebuild",
        &["-version"],
        &[],
        options.command_timeout(),
        "xcodebuild -version",
    )
    .await
    .inspect_err(|e| debug!("xcodebuild -version failed: {}", e))
    .ok()?;

    if !output.status.success() {
        return None;
    }
    XcodeVersion::parse(&String::from_utf8_lossy(&output.stdout))
}
