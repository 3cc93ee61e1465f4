//! Event types - every stimulus the controller reacts to

use pusher_core::{ApplicationContext, DeviceContext, DeviceList, PushPayload, ToolError};

/// Input to the reducer, from the user or from a finished operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin the capability check
    Start,

    CapabilitySucceeded,
    CapabilityFailed(ToolError),

    ListSucceeded(DeviceList),
    ListFailed(ToolError),

    /// The user picked a device
    DeviceSelected(DeviceContext),

    /// The user asked to boot or shut down a device
    DeviceOperationRequested(DeviceContext),

    /// Applications fetched for `udid`
    AppListSucceeded {
        udid: String,
        apps: Vec<ApplicationContext>,
    },

    /// Application listing for `udid` failed
    AppListFailed { udid: String, error: ToolError },

    /// Boot/shutdown finished, successfully or not
    OperationDone { error: Option<ToolError> },

    /// The user asked to push `payload` to `bundle_id` on `device`
    PushRequested {
        device: DeviceContext,
        bundle_id: String,
        payload: PushPayload,
    },

    /// Push delivery finished, successfully or not
    PushSent { error: Option<ToolError> },

    /// The payload text was edited
    PayloadEdited(String),
}

impl Event {
    /// Short snake_case label for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::CapabilitySucceeded => "capability_succeeded",
            Self::CapabilityFailed(_) => "capability_failed",
            Self::ListSucceeded(_) => "list_succeeded",
            Self::ListFailed(_) => "list_failed",
            Self::DeviceSelected(_) => "device_selected",
            Self::DeviceOperationRequested(_) => "device_operation_requested",
            Self::AppListSucceeded { .. } => "app_list_succeeded",
            Self::AppListFailed { .. } => "app_list_failed",
            Self::OperationDone { .. } => "operation_done",
            Self::PushRequested { .. } => "push_requested",
            Self::PushSent { .. } => "push_sent",
            Self::PayloadEdited(_) => "payload_edited",
        }
    }

    /// Whether this event originates from the user rather than a feedback
    pub fn is_user_event(&self) -> bool {
        matches!(
            self,
            Self::Start
                | Self::DeviceSelected(_)
                | Self::DeviceOperationRequested(_)
                | Self::PushRequested { .. }
                | Self::PayloadEdited(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::Start.name(), "start");
        assert_eq!(Event::PushSent { error: None }.name(), "push_sent");
        assert_eq!(
            Event::AppListFailed {
                udid: "A".to_string(),
                error: ToolError::AppListFetch("x".to_string()),
            }
            .name(),
            "app_list_failed"
        );
    }

    #[test]
    fn test_user_events() {
        assert!(Event::Start.is_user_event());
        assert!(Event::PayloadEdited("{}".to_string()).is_user_event());
        assert!(!Event::CapabilitySucceeded.is_user_event());
        assert!(!Event::OperationDone { error: None }.is_user_event());
    }
}
