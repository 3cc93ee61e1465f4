//! Headless mode - NDJSON observations on stdout, commands on stdin
//!
//! Every observation is one JSON object per line with an `"event"` tag and a
//! millisecond `timestamp`.
//!
//! # Example Output
//!
//! ```json
//! {"event":"state_changed","state":"list_fetching","loading":true,"device":null,"error":null,"timestamp":1704700001000}
//! {"event":"devices","devices":[{"udid":"ABC","name":"iPhone 15","family":"phone","state":"booted","runtime":"iOS 17.2","image":"iphone"}],"timestamp":1704700002000}
//! {"event":"push_delivered","udid":"ABC","bundle_id":"com.example.app","timestamp":1704700003000}
//! ```

pub mod runner;

use chrono::Utc;
use pusher_app::{AppState, EngineEvent};
use pusher_core::{ApplicationContext, DeviceContext, DeviceList};
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// The controller moved to a new state
    StateChanged {
        state: &'static str,
        loading: bool,
        device: Option<String>,
        error: Option<String>,
        timestamp: i64,
    },

    /// Current device list, families in display order
    Devices {
        devices: Vec<DeviceContext>,
        timestamp: i64,
    },

    /// Applications of a device
    Applications {
        udid: Option<String>,
        applications: Vec<ApplicationContext>,
        timestamp: i64,
    },

    /// The selected device
    Selection {
        device: Option<DeviceContext>,
        timestamp: i64,
    },

    PushDelivered {
        udid: String,
        bundle_id: String,
        timestamp: i64,
    },

    PushFailed {
        udid: String,
        bundle_id: String,
        error: String,
        timestamp: i64,
    },

    DeviceOperationFailed {
        udid: String,
        error: String,
        timestamp: i64,
    },

    /// A command could not be carried out
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        // NDJSON: one object per line, flushed immediately
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }
        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn state(state: &AppState) -> Self {
        Self::StateChanged {
            state: state.name(),
            loading: state.is_loading(),
            device: state.device().map(|d| d.udid.clone()),
            error: state.error().map(|e| e.to_string()),
            timestamp: Self::now(),
        }
    }

    pub fn devices(list: &DeviceList) -> Self {
        Self::Devices {
            devices: list.values().flatten().cloned().collect(),
            timestamp: Self::now(),
        }
    }

    pub fn applications(device: Option<&DeviceContext>, applications: &[ApplicationContext]) -> Self {
        Self::Applications {
            udid: device.map(|d| d.udid.clone()),
            applications: applications.to_vec(),
            timestamp: Self::now(),
        }
    }

    pub fn selection(device: Option<DeviceContext>) -> Self {
        Self::Selection {
            device,
            timestamp: Self::now(),
        }
    }

    pub fn error(message: impl Into<String>, fatal: bool) -> Self {
        Self::Error {
            message: message.into(),
            fatal,
            timestamp: Self::now(),
        }
    }

    /// Translate an engine event; `None` for events with no headless form
    pub fn from_engine_event(event: &EngineEvent) -> Option<Self> {
        let timestamp = Self::now();
        let event = match event {
            EngineEvent::StateChanged { new, .. } => Self::state(new),
            EngineEvent::DevicesUpdated { devices } => Self::devices(devices),
            EngineEvent::ApplicationsLoaded {
                device,
                applications,
            } => Self::applications(Some(device), applications),
            EngineEvent::SelectionChanged { device } => Self::selection(Some(device.clone())),
            EngineEvent::PushDelivered { udid, bundle_id } => Self::PushDelivered {
                udid: udid.clone(),
                bundle_id: bundle_id.clone(),
                timestamp,
            },
            EngineEvent::PushFailed {
                udid,
                bundle_id,
                error,
            } => Self::PushFailed {
                udid: udid.clone(),
                bundle_id: bundle_id.clone(),
                error: error.to_string(),
                timestamp,
            },
            EngineEvent::DeviceOperationFailed { udid, error } => Self::DeviceOperationFailed {
                udid: udid.clone(),
                error: error.to_string(),
                timestamp,
            },
            EngineEvent::Shutdown => return None,
        };
        Some(event)
    }
}
