//! Configuration types

use pusher_core::{PushPayload, DEFAULT_PAYLOAD};
use pusher_simctl::SimctlOptions;
use serde::{Deserialize, Serialize};

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub simctl: SimctlOptions,
    pub engine: EngineSettings,
    pub payload: PayloadSettings,
}

/// `[engine]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Capacity of the event and user-input channels
    pub channel_capacity: usize,

    /// Submit `Start` as soon as the engine runs
    pub auto_start: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            auto_start: true,
        }
    }
}

/// `[payload]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PayloadSettings {
    /// Initial payload buffer
    pub default: String,
}

impl Default for PayloadSettings {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAYLOAD.to_string(),
        }
    }
}

impl PayloadSettings {
    pub fn initial_payload(&self) -> PushPayload {
        PushPayload::new(self.default.clone())
    }
}
