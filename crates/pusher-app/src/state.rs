//! Controller state machine states

use pusher_core::{ApplicationContext, DeviceContext, PushPayload, ToolError};

/// The single current state of the controller.
///
/// Values are never mutated in place; the reducer builds a new one for every
/// event. Equality on devices is by `udid`, so a refreshed copy of the same
/// device compares equal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppState {
    /// Waiting for `Start`
    #[default]
    Idle,

    /// Verifying that the host can simulate pushes
    CheckingCapability,

    /// The host cannot simulate pushes; terminal
    CapabilityFailed(ToolError),

    /// Fetching the device list
    ListFetching,

    /// The device list could not be fetched; terminal
    ListFetchingFailed(ToolError),

    /// Device list published; nothing selected yet
    ShowingItems,

    /// A device is selected but not booted, so it has no applications
    SelectedNotBooted(DeviceContext),

    /// Fetching the applications of a booted device
    FetchingApplications(DeviceContext),

    /// Application listing failed for the device
    ApplicationFetchFailed(ToolError, DeviceContext),

    /// Applications of the device are available for pushing
    ApplicationsLoaded(Vec<ApplicationContext>, DeviceContext),

    /// A push to `bundle_id` on the device is being delivered
    SendingPush {
        apps: Vec<ApplicationContext>,
        device: DeviceContext,
        bundle_id: String,
        payload: PushPayload,
    },

    /// The device is booting or shutting down
    DeviceOperationInFlight(DeviceContext),
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short snake_case label for logs and observers
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckingCapability => "checking_capability",
            Self::CapabilityFailed(_) => "capability_failed",
            Self::ListFetching => "list_fetching",
            Self::ListFetchingFailed(_) => "list_fetching_failed",
            Self::ShowingItems => "showing_items",
            Self::SelectedNotBooted(_) => "selected_not_booted",
            Self::FetchingApplications(_) => "fetching_applications",
            Self::ApplicationFetchFailed(..) => "application_fetch_failed",
            Self::ApplicationsLoaded(..) => "applications_loaded",
            Self::SendingPush { .. } => "sending_push",
            Self::DeviceOperationInFlight(_) => "device_operation_in_flight",
        }
    }

    /// The device this state is about, if any
    pub fn device(&self) -> Option<&DeviceContext> {
        match self {
            Self::SelectedNotBooted(device)
            | Self::FetchingApplications(device)
            | Self::ApplicationFetchFailed(_, device)
            | Self::ApplicationsLoaded(_, device)
            | Self::SendingPush { device, .. }
            | Self::DeviceOperationInFlight(device) => Some(device),
            _ => None,
        }
    }

    /// Applications known for the current device
    pub fn applications(&self) -> &[ApplicationContext] {
        match self {
            Self::ApplicationsLoaded(apps, _) | Self::SendingPush { apps, .. } => apps,
            _ => &[],
        }
    }

    /// The tool error of a failure state
    pub fn error(&self) -> Option<&ToolError> {
        match self {
            Self::CapabilityFailed(err)
            | Self::ListFetchingFailed(err)
            | Self::ApplicationFetchFailed(err, _) => Some(err),
            _ => None,
        }
    }

    /// Whether an asynchronous operation is expected to complete
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Self::CheckingCapability
                | Self::ListFetching
                | Self::FetchingApplications(_)
                | Self::SendingPush { .. }
                | Self::DeviceOperationInFlight(_)
        )
    }
}
