//! Reducer - pure state transitions

use pusher_core::prelude::*;
use pusher_core::DeviceContext;

use crate::event::Event;
use crate::state::AppState;

/// Compute the next state for `event`.
///
/// Any (state, event) pair without a transition leaves the state unchanged.
pub fn reduce(state: AppState, event: Event) -> AppState {
    match (state, event) {
        (AppState::Idle, Event::Start) => AppState::CheckingCapability,

        (AppState::CheckingCapability, Event::CapabilityFailed(err)) => {
            AppState::CapabilityFailed(err)
        }
        (AppState::CheckingCapability, Event::CapabilitySucceeded) => AppState::ListFetching,

        (AppState::ListFetching, Event::ListFailed(err)) => AppState::ListFetchingFailed(err),
        (AppState::ListFetching, Event::ListSucceeded(_)) => AppState::ShowingItems,

        // ─────────────────────────────────────────────────────────
        // Selection
        // ─────────────────────────────────────────────────────────
        (
            AppState::ShowingItems
            | AppState::SelectedNotBooted(_)
            | AppState::FetchingApplications(_)
            | AppState::ApplicationFetchFailed(..)
            | AppState::ApplicationsLoaded(..),
            Event::DeviceSelected(device),
        ) => select(device),

        // ─────────────────────────────────────────────────────────
        // Application listing (only for the device being fetched)
        // ─────────────────────────────────────────────────────────
        (AppState::FetchingApplications(device), Event::AppListFailed { udid, error })
            if udid == device.udid =>
        {
            AppState::ApplicationFetchFailed(error, device)
        }
        (AppState::FetchingApplications(device), Event::AppListSucceeded { udid, apps })
            if udid == device.udid =>
        {
            AppState::ApplicationsLoaded(apps, device)
        }

        // ─────────────────────────────────────────────────────────
        // Boot / shutdown
        // ─────────────────────────────────────────────────────────
        (
            AppState::ShowingItems
            | AppState::SelectedNotBooted(_)
            | AppState::ApplicationFetchFailed(..)
            | AppState::ApplicationsLoaded(..),
            Event::DeviceOperationRequested(device),
        ) => AppState::DeviceOperationInFlight(device),
        (AppState::DeviceOperationInFlight(_), Event::OperationDone { .. }) => {
            AppState::ListFetching
        }

        // ─────────────────────────────────────────────────────────
        // Push
        // ─────────────────────────────────────────────────────────
        (
            AppState::ApplicationsLoaded(apps, loaded),
            Event::PushRequested {
                device,
                bundle_id,
                payload,
            },
        ) if device.udid == loaded.udid => AppState::SendingPush {
            apps,
            device,
            bundle_id,
            payload,
        },
        (AppState::SendingPush { apps, device, .. }, Event::PushSent { .. }) => {
            AppState::ApplicationsLoaded(apps, device)
        }

        (state, event) => {
            trace!("Ignoring {} in {}", event.name(), state.name());
            state
        }
    }
}

fn select(device: DeviceContext) -> AppState {
    if device.is_booted() {
        AppState::FetchingApplications(device)
    } else {
        AppState::SelectedNotBooted(device)
    }
}
