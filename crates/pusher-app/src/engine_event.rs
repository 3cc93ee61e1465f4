//! Domain events emitted by the Engine for external consumers
//!
//! Events are broadcast after each fold via `Engine::subscribe()`, so
//! subscribers see them in the same order the reducer applied them.

use pusher_core::{ApplicationContext, DeviceContext, DeviceList, ToolError};

use crate::state::AppState;

/// Domain events emitted by the Engine for external consumers.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // State Machine
    // ─────────────────────────────────────────────────────────
    /// The controller moved to a different state
    StateChanged { old: AppState, new: AppState },

    // ─────────────────────────────────────────────────────────
    // Observations
    // ─────────────────────────────────────────────────────────
    /// A fresh device list was published
    DevicesUpdated { devices: DeviceList },

    /// Applications were loaded for a device
    ApplicationsLoaded {
        device: DeviceContext,
        applications: Vec<ApplicationContext>,
    },

    /// The selected device was set or refreshed
    SelectionChanged { device: DeviceContext },

    // ─────────────────────────────────────────────────────────
    // Operation Outcomes
    // ─────────────────────────────────────────────────────────
    /// A push was handed to the simulator
    PushDelivered { udid: String, bundle_id: String },

    /// A push could not be delivered
    PushFailed {
        udid: String,
        bundle_id: String,
        error: ToolError,
    },

    /// Boot or shutdown failed; the device list is refreshed regardless
    DeviceOperationFailed { udid: String, error: ToolError },

    // ─────────────────────────────────────────────────────────
    // Engine Lifecycle
    // ─────────────────────────────────────────────────────────
    /// Engine is shutting down
    Shutdown,
}

impl EngineEvent {
    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state_changed",
            Self::DevicesUpdated { .. } => "devices_updated",
            Self::ApplicationsLoaded { .. } => "applications_loaded",
            Self::SelectionChanged { .. } => "selection_changed",
            Self::PushDelivered { .. } => "push_delivered",
            Self::PushFailed { .. } => "push_failed",
            Self::DeviceOperationFailed { .. } => "device_operation_failed",
            Self::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pusher_simctl::test_utils::{booted_device, test_app};

    #[test]
    fn test_engine_event_type_labels() {
        assert_eq!(EngineEvent::Shutdown.event_type(), "shutdown");

        let event = EngineEvent::StateChanged {
            old: AppState::Idle,
            new: AppState::CheckingCapability,
        };
        assert_eq!(event.event_type(), "state_changed");

        let event = EngineEvent::PushFailed {
            udid: "A".to_string(),
            bundle_id: "com.a".to_string(),
            error: ToolError::PushDispatch("no such app".to_string()),
        };
        assert_eq!(event.event_type(), "push_failed");
    }

    #[test]
    fn test_engine_event_all_variants_have_labels() {
        let device = booted_device("A", "iPhone 15");
        let events = vec![
            EngineEvent::StateChanged {
                old: AppState::Idle,
                new: AppState::Idle,
            },
            EngineEvent::DevicesUpdated {
                devices: DeviceList::new(),
            },
            EngineEvent::ApplicationsLoaded {
                device: device.clone(),
                applications: vec![test_app("com.a", "A")],
            },
            EngineEvent::SelectionChanged {
                device: device.clone(),
            },
            EngineEvent::PushDelivered {
                udid: "A".to_string(),
                bundle_id: "com.a".to_string(),
            },
            EngineEvent::PushFailed {
                udid: "A".to_string(),
                bundle_id: "com.a".to_string(),
                error: ToolError::PushDispatch("x".to_string()),
            },
            EngineEvent::DeviceOperationFailed {
                udid: "A".to_string(),
                error: ToolError::DeviceOperation("x".to_string()),
            },
            EngineEvent::Shutdown,
        ];

        for event in &events {
            assert!(!event.event_type().is_empty());
        }
        let mut labels: Vec<_> = events.iter().map(EngineEvent::event_type).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), events.len());
    }
}
