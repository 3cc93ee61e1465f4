//! Feedback loops - state-gated asynchronous operations
//!
//! Each [`Feedback`] looks at a state snapshot and either ignores it or
//! returns a one-shot future resolving to the event that reports the result.
//! [`spawn_feedback`] drives one feedback against the engine's state channel:
//! work starts only when the snapshot changed since the last one acted on, and
//! an in-flight future is dropped as soon as the state moves on.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use pusher_core::prelude::*;
use pusher_core::ToolError;
use pusher_simctl::SimulatorProvider;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::event::Event;
use crate::state::AppState;

/// State published to feedbacks.
///
/// `revision` only advances when the state actually changes, so re-publishing
/// an equal state is invisible to feedbacks while a change that comes back to
/// an earlier value (A -> B -> A) is still seen even if B was never observed.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub revision: u64,
    pub state: AppState,
}

/// A state-gated producer of at most one event per state
pub trait Feedback: Send + Sync + 'static {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Start work for `state`, or `None` when the guard does not match
    fn run(&self, state: &AppState) -> Option<BoxFuture<'static, Event>>;
}

// ─────────────────────────────────────────────────────────
// Gated feedbacks
// ─────────────────────────────────────────────────────────

/// Active in `CheckingCapability`
pub struct CapabilityCheck<P> {
    provider: Arc<P>,
}

impl<P> CapabilityCheck<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

impl<P: SimulatorProvider + Sync + 'static> Feedback for CapabilityCheck<P> {
    fn name(&self) -> &'static str {
        "capability_check"
    }

    fn run(&self, state: &AppState) -> Option<BoxFuture<'static, Event>> {
        if !matches!(state, AppState::CheckingCapability) {
            return None;
        }
        let provider = Arc::clone(&self.provider);
        Some(Box::pin(async move {
            match provider.check_capability().await {
                Ok(()) => Event::CapabilitySucceeded,
                Err(e) => Event::CapabilityFailed(ToolError::Capability(e.to_string())),
            }
        }))
    }
}

/// Active in `ListFetching`
pub struct DeviceListFetch<P> {
    provider: Arc<P>,
}

impl<P> DeviceListFetch<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

impl<P: SimulatorProvider + Sync + 'static> Feedback for DeviceListFetch<P> {
    fn name(&self) -> &'static str {
        "device_list_fetch"
    }

    fn run(&self, state: &AppState) -> Option<BoxFuture<'static, Event>> {
        if !matches!(state, AppState::ListFetching) {
            return None;
        }
        let provider = Arc::clone(&self.provider);
        Some(Box::pin(async move {
            match provider.list_devices().await {
                Ok(list) => Event::ListSucceeded(list),
                Err(e) => Event::ListFailed(ToolError::ListFetch(e.to_string())),
            }
        }))
    }
}

/// Active in `FetchingApplications(device)`
pub struct ApplicationListFetch<P> {
    provider: Arc<P>,
}

impl<P> ApplicationListFetch<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

impl<P: SimulatorProvider + Sync + 'static> Feedback for ApplicationListFetch<P> {
    fn name(&self) -> &'static str {
        "application_list_fetch"
    }

    fn run(&self, state: &AppState) -> Option<BoxFuture<'static, Event>> {
        let AppState::FetchingApplications(device) = state else {
            return None;
        };
        let provider = Arc::clone(&self.provider);
        let udid = device.udid.clone();
        Some(Box::pin(async move {
            match provider.list_applications(&udid).await {
                Ok(apps) => Event::AppListSucceeded { udid, apps },
                Err(e) => Event::AppListFailed {
                    udid,
                    error: ToolError::AppListFetch(e.to_string()),
                },
            }
        }))
    }
}

/// Active in `DeviceOperationInFlight(device)`; boots a shut-down device and
/// shuts down a booted one.
pub struct DeviceOperation<P> {
    provider: Arc<P>,
}

impl<P> DeviceOperation<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

impl<P: SimulatorProvider + Sync + 'static> Feedback for DeviceOperation<P> {
    fn name(&self) -> &'static str {
        "device_operation"
    }

    fn run(&self, state: &AppState) -> Option<BoxFuture<'static, Event>> {
        let AppState::DeviceOperationInFlight(device) = state else {
            return None;
        };
        let provider = Arc::clone(&self.provider);
        let udid = device.udid.clone();
        let make_booted = !device.is_booted();
        Some(Box::pin(async move {
            let error = match provider.set_boot_state(&udid, make_booted).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(
                        "Failed to {} {}: {}",
                        if make_booted { "boot" } else { "shut down" },
                        udid,
                        e
                    );
                    Some(ToolError::DeviceOperation(e.to_string()))
                }
            };
            Event::OperationDone { error }
        }))
    }
}

/// Active in `SendingPush`
pub struct PushDispatch<P> {
    provider: Arc<P>,
}

impl<P> PushDispatch<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

impl<P: SimulatorProvider + Sync + 'static> Feedback for PushDispatch<P> {
    fn name(&self) -> &'static str {
        "push_dispatch"
    }

    fn run(&self, state: &AppState) -> Option<BoxFuture<'static, Event>> {
        let AppState::SendingPush {
            device,
            bundle_id,
            payload,
            ..
        } = state
        else {
            return None;
        };
        let provider = Arc::clone(&self.provider);
        let udid = device.udid.clone();
        let bundle_id = bundle_id.clone();
        let payload = payload.clone();
        Some(Box::pin(async move {
            let error = provider
                .dispatch_push(&udid, &bundle_id, payload.as_str())
                .await
                .err()
                .map(|e| ToolError::PushDispatch(e.to_string()));
            Event::PushSent { error }
        }))
    }
}

/// The five state-gated feedbacks, all sharing `provider`
pub fn gated_feedbacks<P>(provider: Arc<P>) -> Vec<Box<dyn Feedback>>
where
    P: SimulatorProvider + Sync + 'static,
{
    vec![
        Box::new(CapabilityCheck::new(Arc::clone(&provider))),
        Box::new(DeviceListFetch::new(Arc::clone(&provider))),
        Box::new(ApplicationListFetch::new(Arc::clone(&provider))),
        Box::new(DeviceOperation::new(Arc::clone(&provider))),
        Box::new(PushDispatch::new(provider)),
    ]
}

// ─────────────────────────────────────────────────────────
// Runners
// ─────────────────────────────────────────────────────────

/// Drive `feedback` until the state channel closes or shutdown is requested.
pub fn spawn_feedback(
    feedback: Box<dyn Feedback>,
    mut state_rx: watch::Receiver<StateSnapshot>,
    event_tx: mpsc::Sender<Event>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = feedback.name();
        let mut last_revision: Option<u64> = None;

        loop {
            let snapshot = state_rx.borrow_and_update().clone();

            if last_revision != Some(snapshot.revision) {
                last_revision = Some(snapshot.revision);

                if let Some(effect) = feedback.run(&snapshot.state) {
                    debug!("{} started for {}", name, snapshot.state.name());
                    tokio::select! {
                        event = effect => {
                            trace!("{} produced {}", name, event.name());
                            tokio::select! {
                                sent = event_tx.send(event) => {
                                    if sent.is_err() {
                                        break;
                                    }
                                }
                                _ = shutdown_rx.changed() => break,
                            }
                        }
                        _ = superseded(&mut state_rx, snapshot.revision) => {
                            debug!("{} cancelled: {} was superseded", name, snapshot.state.name());
                        }
                        _ = shutdown_rx.changed() => break,
                    }
                    continue;
                }
            }

            tokio::select! {
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }

        trace!("{} feedback stopped", name);
    })
}

/// Resolves once the published revision differs from `revision`, or never if
/// the channel closes.
async fn superseded(state_rx: &mut watch::Receiver<StateSnapshot>, revision: u64) {
    loop {
        if state_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
        if state_rx.borrow_and_update().revision != revision {
            return;
        }
    }
}

/// Forward externally submitted user events into the engine's event channel.
///
/// Not gated on state: every event is forwarded unchanged.
pub fn spawn_user_input(
    mut user_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = user_rx.recv().await {
            debug_assert!(
                event.is_user_event(),
                "{} submitted as a user event",
                event.name()
            );
            if event_tx.send(event).await.is_err() {
                break;
            }
        }
        trace!("user input forwarder stopped");
    })
}
