//! Options controlling how simctl is invoked

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the `xcrun` executable
pub const XCRUN_ENV_VAR: &str = "PUSHER_XCRUN";

/// Options for the `[simctl]` section of the config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimctlOptions {
    /// `xcrun` executable (name on PATH or absolute path)
    pub xcrun: String,

    /// Upper bound for a single simctl invocation
    pub command_timeout_secs: u64,

    /// How long to wait for a booting simulator to report `Booted`
    pub boot_timeout_secs: u64,

    /// Bring Simulator.app to the front after booting a device
    pub open_simulator_app: bool,

    /// List system apps alongside user-installed ones
    pub include_system_apps: bool,
}

impl Default for SimctlOptions {
    fn default() -> Self {
        Self {
            xcrun: "xcrun".to_string(),
            command_timeout_secs: 30,
            boot_timeout_secs: 60,
            open_simulator_app: true,
            include_system_apps: false,
        }
    }
}

impl SimctlOptions {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }

    pub fn boot_timeout(&self) -> Duration {
        Duration::from_secs(self.boot_timeout_secs.max(1))
    }

    /// Apply `PUSHER_XCRUN` if set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(xcrun) = std::env::var(XCRUN_ENV_VAR) {
            if !xcrun.trim().is_empty() {
                self.xcrun = xcrun;
            }
        }
        self
    }
}
