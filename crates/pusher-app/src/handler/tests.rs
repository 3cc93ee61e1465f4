//! Tests for handler module

use super::*;
use crate::event::Event;
use crate::state::AppState;
use pusher_core::{ApplicationContext, DeviceList, PushPayload, ToolError};
use pusher_simctl::test_utils::{booted_device, test_app, test_device};

fn err(message: &str) -> ToolError {
    ToolError::ListFetch(message.to_string())
}

fn sample_states() -> Vec<AppState> {
    let a = booted_device("A", "iPhone 15");
    let apps = vec![test_app("com.example.one", "One")];
    vec![
        AppState::Idle,
        AppState::CheckingCapability,
        AppState::CapabilityFailed(ToolError::Capability("old".to_string())),
        AppState::ListFetching,
        AppState::ListFetchingFailed(err("no list")),
        AppState::ShowingItems,
        AppState::SelectedNotBooted(test_device("B", "iPad")),
        AppState::FetchingApplications(a.clone()),
        AppState::ApplicationFetchFailed(ToolError::AppListFetch("x".to_string()), a.clone()),
        AppState::ApplicationsLoaded(apps.clone(), a.clone()),
        AppState::SendingPush {
            apps,
            device: a.clone(),
            bundle_id: "com.example.one".to_string(),
            payload: PushPayload::default(),
        },
        AppState::DeviceOperationInFlight(a),
    ]
}

fn sample_events() -> Vec<Event> {
    let a = booted_device("A", "iPhone 15");
    vec![
        Event::Start,
        Event::CapabilitySucceeded,
        Event::CapabilityFailed(ToolError::Capability("old".to_string())),
        Event::ListSucceeded(DeviceList::new()),
        Event::ListFailed(err("boom")),
        Event::DeviceSelected(a.clone()),
        Event::DeviceSelected(test_device("B", "iPad")),
        Event::DeviceOperationRequested(a.clone()),
        Event::AppListSucceeded {
            udid: "A".to_string(),
            apps: vec![test_app("com.example.two", "Two")],
        },
        Event::AppListSucceeded {
            udid: "Z".to_string(),
            apps: vec![],
        },
        Event::AppListFailed {
            udid: "A".to_string(),
            error: ToolError::AppListFetch("denied".to_string()),
        },
        Event::AppListFailed {
            udid: "Z".to_string(),
            error: ToolError::AppListFetch("denied".to_string()),
        },
        Event::OperationDone { error: None },
        Event::OperationDone {
            error: Some(ToolError::DeviceOperation("busy".to_string())),
        },
        Event::PushRequested {
            device: a,
            bundle_id: "com.example.one".to_string(),
            payload: PushPayload::default(),
        },
        Event::PushRequested {
            device: booted_device("C", "iPhone SE"),
            bundle_id: "com.example.one".to_string(),
            payload: PushPayload::default(),
        },
        Event::PushSent { error: None },
        Event::PayloadEdited("{".to_string()),
    ]
}

/// Whether the transition table lists (state, event)
fn has_transition(state: &AppState, event: &Event) -> bool {
    use AppState as S;
    use Event as E;
    match (state, event) {
        (S::Idle, E::Start) => true,
        (S::CheckingCapability, E::CapabilityFailed(_) | E::CapabilitySucceeded) => true,
        (S::ListFetching, E::ListFailed(_) | E::ListSucceeded(_)) => true,
        (
            S::ShowingItems
            | S::SelectedNotBooted(_)
            | S::FetchingApplications(_)
            | S::ApplicationFetchFailed(..)
            | S::ApplicationsLoaded(..),
            E::DeviceSelected(_),
        ) => true,
        (S::FetchingApplications(d), E::AppListFailed { udid, .. })
        | (S::FetchingApplications(d), E::AppListSucceeded { udid, .. }) => *udid == d.udid,
        (
            S::ShowingItems
            | S::SelectedNotBooted(_)
            | S::ApplicationFetchFailed(..)
            | S::ApplicationsLoaded(..),
            E::DeviceOperationRequested(_),
        ) => true,
        (S::DeviceOperationInFlight(_), E::OperationDone { .. }) => true,
        (S::ApplicationsLoaded(_, loaded), E::PushRequested { device, .. }) => {
            device.udid == loaded.udid
        }
        (S::SendingPush { .. }, E::PushSent { .. }) => true,
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────
// Identity for unlisted pairs
// ─────────────────────────────────────────────────────────

#[test]
fn test_unlisted_pairs_are_identity() {
    let mut checked = 0;
    for state in sample_states() {
        for event in sample_events() {
            if has_transition(&state, &event) {
                continue;
            }
            let next = reduce(state.clone(), event.clone());
            assert_eq!(
                next,
                state,
                "{} + {} should be a no-op",
                state.name(),
                event.name()
            );
            checked += 1;
        }
    }
    assert!(checked > 100);
}

#[test]
fn test_payload_edited_is_always_identity() {
    for state in sample_states() {
        let next = reduce(state.clone(), Event::PayloadEdited("{}".to_string()));
        assert_eq!(next, state);
    }
}

#[test]
fn test_terminal_failure_states_ignore_everything() {
    for state in [
        AppState::CapabilityFailed(ToolError::Capability("old".to_string())),
        AppState::ListFetchingFailed(err("no list")),
    ] {
        for event in sample_events() {
            assert_eq!(reduce(state.clone(), event), state);
        }
    }
}

// ─────────────────────────────────────────────────────────
// Startup
// ─────────────────────────────────────────────────────────

#[test]
fn test_start_begins_capability_check() {
    assert_eq!(
        reduce(AppState::Idle, Event::Start),
        AppState::CheckingCapability
    );
}

#[test]
fn test_capability_success_fetches_list() {
    assert_eq!(
        reduce(AppState::CheckingCapability, Event::CapabilitySucceeded),
        AppState::ListFetching
    );
}

#[test]
fn test_capability_failure_is_kept() {
    let error = ToolError::Capability("Xcode 11.3 is too old".to_string());
    assert_eq!(
        reduce(
            AppState::CheckingCapability,
            Event::CapabilityFailed(error.clone())
        ),
        AppState::CapabilityFailed(error)
    );
}

#[test]
fn test_list_success_shows_items_for_any_list() {
    let list = pusher_core::group_by_family([booted_device("A", "iPhone 15")]);
    assert_eq!(
        reduce(AppState::ListFetching, Event::ListSucceeded(list)),
        AppState::ShowingItems
    );
    assert_eq!(
        reduce(AppState::ListFetching, Event::ListSucceeded(DeviceList::new())),
        AppState::ShowingItems
    );
}

#[test]
fn test_list_failure() {
    assert_eq!(
        reduce(AppState::ListFetching, Event::ListFailed(err("boom"))),
        AppState::ListFetchingFailed(err("boom"))
    );
}

// ─────────────────────────────────────────────────────────
// Selection
// ─────────────────────────────────────────────────────────

#[test]
fn test_select_booted_device_fetches_applications() {
    let a = booted_device("A", "iPhone 15");
    assert_eq!(
        reduce(AppState::ShowingItems, Event::DeviceSelected(a.clone())),
        AppState::FetchingApplications(a)
    );
}

#[test]
fn test_select_shutdown_device_is_not_booted() {
    let b = test_device("B", "iPad");
    assert_eq!(
        reduce(AppState::ShowingItems, Event::DeviceSelected(b.clone())),
        AppState::SelectedNotBooted(b)
    );
}

#[test]
fn test_reselect_from_loaded_applications() {
    let a = booted_device("A", "iPhone 15");
    let c = booted_device("C", "iPhone SE");
    let state = AppState::ApplicationsLoaded(vec![test_app("com.a", "A")], a);
    assert_eq!(
        reduce(state, Event::DeviceSelected(c.clone())),
        AppState::FetchingApplications(c)
    );
}

#[test]
fn test_reselect_after_fetch_failure() {
    let a = booted_device("A", "iPhone 15");
    let state =
        AppState::ApplicationFetchFailed(ToolError::AppListFetch("x".to_string()), a.clone());
    assert_eq!(
        reduce(state, Event::DeviceSelected(a.clone())),
        AppState::FetchingApplications(a)
    );
}

#[test]
fn test_selection_ignored_while_sending_or_operating() {
    let a = booted_device("A", "iPhone 15");
    let b = test_device("B", "iPad");
    let sending = AppState::SendingPush {
        apps: vec![],
        device: a.clone(),
        bundle_id: "com.a".to_string(),
        payload: PushPayload::default(),
    };
    assert_eq!(
        reduce(sending.clone(), Event::DeviceSelected(b.clone())),
        sending
    );

    let operating = AppState::DeviceOperationInFlight(a);
    assert_eq!(
        reduce(operating.clone(), Event::DeviceSelected(b)),
        operating
    );
}

// ─────────────────────────────────────────────────────────
// Application listing
// ─────────────────────────────────────────────────────────

#[test]
fn test_app_list_success_for_fetched_device() {
    let a = booted_device("A", "iPhone 15");
    let apps = vec![test_app("com.a", "A")];
    assert_eq!(
        reduce(
            AppState::FetchingApplications(a.clone()),
            Event::AppListSucceeded {
                udid: "A".to_string(),
                apps: apps.clone(),
            }
        ),
        AppState::ApplicationsLoaded(apps, a)
    );
}

#[test]
fn test_app_list_failure_keeps_device() {
    let a = booted_device("A", "iPhone 15");
    let error = ToolError::AppListFetch("not booted".to_string());
    assert_eq!(
        reduce(
            AppState::FetchingApplications(a.clone()),
            Event::AppListFailed {
                udid: "A".to_string(),
                error: error.clone(),
            }
        ),
        AppState::ApplicationFetchFailed(error, a)
    );
}

#[test]
fn test_stale_app_list_result_is_ignored() {
    let a = booted_device("A", "iPhone 15");
    let b = booted_device("B", "iPhone SE");

    let state = reduce(AppState::ShowingItems, Event::DeviceSelected(a));
    let state = reduce(state, Event::DeviceSelected(b.clone()));
    assert_eq!(state, AppState::FetchingApplications(b.clone()));

    let late = Event::AppListSucceeded {
        udid: "A".to_string(),
        apps: vec![test_app("com.a", "A")],
    };
    assert_eq!(reduce(state, late), AppState::FetchingApplications(b));
}

// ─────────────────────────────────────────────────────────
// Device operations
// ─────────────────────────────────────────────────────────

#[test]
fn test_device_operation_accepted_states() {
    let a = booted_device("A", "iPhone 15");
    let b = test_device("B", "iPad");
    for state in [
        AppState::ShowingItems,
        AppState::SelectedNotBooted(b.clone()),
        AppState::ApplicationFetchFailed(ToolError::AppListFetch("x".to_string()), a.clone()),
        AppState::ApplicationsLoaded(vec![], a.clone()),
    ] {
        assert_eq!(
            reduce(state, Event::DeviceOperationRequested(b.clone())),
            AppState::DeviceOperationInFlight(b.clone())
        );
    }
}

#[test]
fn test_device_operation_not_accepted_while_fetching() {
    let a = booted_device("A", "iPhone 15");
    let state = AppState::FetchingApplications(a.clone());
    assert_eq!(
        reduce(state.clone(), Event::DeviceOperationRequested(a)),
        state
    );
}

#[test]
fn test_operation_done_refreshes_list_even_on_error() {
    let a = booted_device("A", "iPhone 15");
    assert_eq!(
        reduce(
            AppState::DeviceOperationInFlight(a.clone()),
            Event::OperationDone { error: None }
        ),
        AppState::ListFetching
    );
    assert_eq!(
        reduce(
            AppState::DeviceOperationInFlight(a),
            Event::OperationDone {
                error: Some(ToolError::DeviceOperation("busy".to_string())),
            }
        ),
        AppState::ListFetching
    );
}

// ─────────────────────────────────────────────────────────
// Push
// ─────────────────────────────────────────────────────────

#[test]
fn test_push_round_trip_keeps_applications() {
    let a = booted_device("A", "iPhone 15");
    let apps: Vec<ApplicationContext> = vec![test_app("com.a", "A")];
    let loaded = AppState::ApplicationsLoaded(apps.clone(), a.clone());

    let sending = reduce(
        loaded.clone(),
        Event::PushRequested {
            device: a.clone(),
            bundle_id: "com.a".to_string(),
            payload: PushPayload::default(),
        },
    );
    assert_eq!(
        sending,
        AppState::SendingPush {
            apps: apps.clone(),
            device: a.clone(),
            bundle_id: "com.a".to_string(),
            payload: PushPayload::default(),
        }
    );

    let failed = reduce(
        sending.clone(),
        Event::PushSent {
            error: Some(ToolError::PushDispatch("no such app".to_string())),
        },
    );
    assert_eq!(failed, loaded);
    assert_eq!(reduce(sending, Event::PushSent { error: None }), loaded);
}

#[test]
fn test_push_for_another_device_is_ignored() {
    let a = booted_device("A", "iPhone 15");
    let b = booted_device("B", "iPhone SE");
    let loaded = AppState::ApplicationsLoaded(vec![test_app("com.only.on.a", "Only A")], a);

    let next = reduce(
        loaded.clone(),
        Event::PushRequested {
            device: b,
            bundle_id: "com.only.on.a".to_string(),
            payload: PushPayload::default(),
        },
    );
    assert_eq!(next, loaded);
    assert_eq!(next.device().map(|d| d.udid.as_str()), Some("A"));
}

#[test]
fn test_full_happy_path() {
    let a = booted_device("A", "iPhone 15");
    let app1 = test_app("com.example.one", "One");
    let list = pusher_core::group_by_family([a.clone()]);

    let events = [
        Event::Start,
        Event::CapabilitySucceeded,
        Event::ListSucceeded(list),
        Event::DeviceSelected(a.clone()),
        Event::AppListSucceeded {
            udid: "A".to_string(),
            apps: vec![app1.clone()],
        },
        Event::PushRequested {
            device: a.clone(),
            bundle_id: app1.bundle_identifier.clone(),
            payload: PushPayload::default(),
        },
        Event::PushSent { error: None },
    ];
    let expected = [
        "checking_capability",
        "list_fetching",
        "showing_items",
        "fetching_applications",
        "applications_loaded",
        "sending_push",
        "applications_loaded",
    ];

    let mut state = AppState::Idle;
    for (event, name) in events.into_iter().zip(expected) {
        state = reduce(state, event);
        assert_eq!(state.name(), name);
    }
    assert_eq!(state, AppState::ApplicationsLoaded(vec![app1], a));
}
