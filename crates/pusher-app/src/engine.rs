//! Engine - the single serialization point of the controller
//!
//! The Engine owns the current [`AppState`] and one event channel. Every
//! feedback and the user-input forwarder send into that channel; the run loop
//! folds events through [`reduce`] one at a time and republishes the result to
//! feedbacks (revisioned snapshots) and observers (watch channels plus
//! broadcast [`EngineEvent`]s).

use std::sync::Arc;

use pusher_core::prelude::*;
use pusher_core::{find_device, validate_payload, DeviceContext, DeviceList, PushPayload};
use pusher_simctl::SimulatorProvider;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::EngineSettings;
use crate::engine_event::EngineEvent;
use crate::event::Event;
use crate::feedback::{gated_feedbacks, spawn_feedback, spawn_user_input, Feedback, StateSnapshot};
use crate::handler::reduce;
use crate::selection::{reresolve, Reresolved};
use crate::state::AppState;

const BROADCAST_CAPACITY: usize = 256;

/// Orchestrator owning the state machine.
///
/// Build with [`Engine::new`], hand [`Engine::handle`] clones to front ends and
/// drive it with [`Engine::run`].
pub struct Engine {
    state: AppState,
    revision: u64,
    auto_start: bool,

    event_tx: mpsc::Sender<Event>,
    event_rx: mpsc::Receiver<Event>,
    user_rx: Option<mpsc::Receiver<Event>>,
    feedbacks: Vec<Box<dyn Feedback>>,

    snapshot_tx: watch::Sender<StateSnapshot>,
    state_tx: watch::Sender<AppState>,
    devices_tx: watch::Sender<DeviceList>,
    selected_tx: watch::Sender<Option<DeviceContext>>,
    payload_tx: watch::Sender<PushPayload>,
    broadcast_tx: broadcast::Sender<EngineEvent>,

    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,

    handle: EngineHandle,
}

impl Engine {
    /// Create an engine whose feedbacks call `provider`.
    pub fn new<P>(provider: Arc<P>, settings: &EngineSettings, payload: PushPayload) -> Self
    where
        P: SimulatorProvider + Sync + 'static,
    {
        Self::with_feedbacks(gated_feedbacks(provider), settings, payload)
    }

    /// Create an engine with an explicit feedback set
    pub fn with_feedbacks(
        feedbacks: Vec<Box<dyn Feedback>>,
        settings: &EngineSettings,
        payload: PushPayload,
    ) -> Self {
        let capacity = settings.channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (user_tx, user_rx) = mpsc::channel(capacity);

        let (snapshot_tx, _) = watch::channel(StateSnapshot::default());
        let (state_tx, state_rx) = watch::channel(AppState::Idle);
        let (devices_tx, devices_rx) = watch::channel(DeviceList::new());
        let (selected_tx, selected_rx) = watch::channel(None);
        let (payload_tx, payload_rx) = watch::channel(payload);
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown_tx = Arc::new(shutdown_tx);

        let handle = EngineHandle {
            user_tx,
            state_rx,
            devices_rx,
            selected_rx,
            payload_rx,
            broadcast_tx: broadcast_tx.clone(),
            shutdown_tx: Arc::clone(&shutdown_tx),
        };

        Self {
            state: AppState::Idle,
            revision: 0,
            auto_start: settings.auto_start,
            event_tx,
            event_rx,
            user_rx: Some(user_rx),
            feedbacks,
            snapshot_tx,
            state_tx,
            devices_tx,
            selected_tx,
            payload_tx,
            broadcast_tx,
            shutdown_tx,
            shutdown_rx,
            handle,
        }
    }

    /// A cloneable handle for observers and front ends
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Current state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Sender for the shutdown flag (signal handlers, `quit`)
    pub fn shutdown_sender(&self) -> Arc<watch::Sender<bool>> {
        Arc::clone(&self.shutdown_tx)
    }

    /// Run feedbacks and fold events until shutdown is requested.
    pub async fn run(mut self) {
        let mut tasks: Vec<JoinHandle<()>> = Vec::new();
        for feedback in std::mem::take(&mut self.feedbacks) {
            tasks.push(spawn_feedback(
                feedback,
                self.snapshot_tx.subscribe(),
                self.event_tx.clone(),
                self.shutdown_rx.clone(),
            ));
        }
        let forwarder = self
            .user_rx
            .take()
            .map(|user_rx| spawn_user_input(user_rx, self.event_tx.clone()));

        if self.auto_start {
            self.process_event(Event::Start);
        }
        info!("Engine running ({} feedbacks)", tasks.len());

        loop {
            if *self.shutdown_rx.borrow_and_update() {
                break;
            }
            tokio::select! {
                event = self.event_rx.recv() => match event {
                    Some(event) => self.process_event(event),
                    None => break,
                },
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Engine shutting down");
        self.shutdown_tx.send_replace(true);
        let _ = self.broadcast_tx.send(EngineEvent::Shutdown);

        if let Some(forwarder) = forwarder {
            forwarder.abort();
            let _ = forwarder.await;
        }
        for task in tasks {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Feedback task failed: {}", e);
                }
            }
        }
    }

    /// Fold one event into the state and publish the result.
    pub fn process_event(&mut self, event: Event) {
        let old = self.state.clone();
        trace!("Folding {} in {}", event.name(), old.name());

        self.observe_before(&old, &event);
        let outcome = Self::outcome(&old, &event);

        let new = reduce(old.clone(), event);
        let changed = new != old;
        if changed {
            self.revision += 1;
            debug!("State {} -> {}", old.name(), new.name());
        }

        self.state = new.clone();
        self.snapshot_tx.send_replace(StateSnapshot {
            revision: self.revision,
            state: new.clone(),
        });
        self.state_tx.send_replace(new.clone());

        if changed {
            self.observe_after(&old, &new);
            self.emit(EngineEvent::StateChanged { old, new });
        }
        if let Some(outcome) = outcome {
            self.emit(outcome);
        }
    }

    /// Side observations published before the state moves
    fn observe_before(&mut self, old: &AppState, event: &Event) {
        match event {
            Event::ListSucceeded(list) if matches!(old, AppState::ListFetching) => {
                self.devices_tx.send_replace(list.clone());
                self.emit(EngineEvent::DevicesUpdated {
                    devices: list.clone(),
                });

                let current = self.selected_tx.borrow().clone();
                match reresolve(current.as_ref(), list) {
                    Some(Reresolved::Refreshed(fresh)) => self.set_selected(fresh),
                    Some(Reresolved::Kept(device)) => {
                        debug!("Selected device {} missing from fresh list", device.udid);
                    }
                    None => {}
                }
            }
            Event::PayloadEdited(text) => {
                self.payload_tx.send_replace(PushPayload::new(text.clone()));
            }
            _ => {}
        }
    }

    /// Observations that depend on the transition taken
    fn observe_after(&mut self, old: &AppState, new: &AppState) {
        match new {
            AppState::FetchingApplications(device) | AppState::SelectedNotBooted(device) => {
                self.set_selected(device.clone());
            }
            AppState::ApplicationsLoaded(apps, device)
                if matches!(old, AppState::FetchingApplications(_)) =>
            {
                info!("{} application(s) on {}", apps.len(), device.name);
                self.emit(EngineEvent::ApplicationsLoaded {
                    device: device.clone(),
                    applications: apps.clone(),
                });
            }
            _ => {}
        }
    }

    /// Broadcast outcome of a finished operation, if `event` completes one
    fn outcome(old: &AppState, event: &Event) -> Option<EngineEvent> {
        match (old, event) {
            (
                AppState::SendingPush {
                    device, bundle_id, ..
                },
                Event::PushSent { error },
            ) => Some(match error {
                None => EngineEvent::PushDelivered {
                    udid: device.udid.clone(),
                    bundle_id: bundle_id.clone(),
                },
                Some(error) => {
                    warn!("Push to {} failed: {}", bundle_id, error);
                    EngineEvent::PushFailed {
                        udid: device.udid.clone(),
                        bundle_id: bundle_id.clone(),
                        error: error.clone(),
                    }
                }
            }),
            (
                AppState::DeviceOperationInFlight(device),
                Event::OperationDone { error: Some(error) },
            ) => {
                // The transition is the same either way; observers still hear about it
                warn!("Device operation on {} failed: {}", device.name, error);
                Some(EngineEvent::DeviceOperationFailed {
                    udid: device.udid.clone(),
                    error: error.clone(),
                })
            }
            _ => None,
        }
    }

    fn set_selected(&mut self, device: DeviceContext) {
        self.selected_tx.send_replace(Some(device.clone()));
        self.emit(EngineEvent::SelectionChanged { device });
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.broadcast_tx.send(event);
    }
}

/// Cloneable access to a running [`Engine`]
#[derive(Clone)]
pub struct EngineHandle {
    user_tx: mpsc::Sender<Event>,
    state_rx: watch::Receiver<AppState>,
    devices_rx: watch::Receiver<DeviceList>,
    selected_rx: watch::Receiver<Option<DeviceContext>>,
    payload_rx: watch::Receiver<PushPayload>,
    broadcast_tx: broadcast::Sender<EngineEvent>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl EngineHandle {
    /// Current state snapshot
    pub fn state(&self) -> AppState {
        self.state_rx.borrow().clone()
    }

    pub fn state_receiver(&self) -> watch::Receiver<AppState> {
        self.state_rx.clone()
    }

    /// Most recently published device list
    pub fn devices(&self) -> DeviceList {
        self.devices_rx.borrow().clone()
    }

    pub fn devices_receiver(&self) -> watch::Receiver<DeviceList> {
        self.devices_rx.clone()
    }

    /// Selected device, re-resolved against every fresh list
    pub fn selected(&self) -> Option<DeviceContext> {
        self.selected_rx.borrow().clone()
    }

    pub fn selected_receiver(&self) -> watch::Receiver<Option<DeviceContext>> {
        self.selected_rx.clone()
    }

    /// Current payload buffer
    pub fn payload(&self) -> PushPayload {
        self.payload_rx.borrow().clone()
    }

    pub fn payload_receiver(&self) -> watch::Receiver<PushPayload> {
        self.payload_rx.clone()
    }

    /// Look a device up in the current list
    pub fn find_device(&self, udid: &str) -> Option<DeviceContext> {
        find_device(&self.devices_rx.borrow(), udid).cloned()
    }

    /// Submit a user event
    pub async fn submit(&self, event: Event) -> Result<()> {
        self.user_tx
            .send(event)
            .await
            .map_err(|e| Error::channel_send(format!("engine stopped: {}", e.0.name())))
    }

    /// Select the device `udid` from the current list
    pub async fn select_device(&self, udid: &str) -> Result<()> {
        let device = self
            .find_device(udid)
            .ok_or_else(|| Error::simctl(format!("Unknown device: {}", udid)))?;
        self.submit(Event::DeviceSelected(device)).await
    }

    /// Boot or shut down the device `udid`, depending on its state
    pub async fn toggle_device(&self, udid: &str) -> Result<()> {
        let device = self
            .find_device(udid)
            .ok_or_else(|| Error::simctl(format!("Unknown device: {}", udid)))?;
        self.submit(Event::DeviceOperationRequested(device)).await
    }

    /// Replace the payload buffer
    pub async fn edit_payload(&self, text: impl Into<String>) -> Result<()> {
        self.submit(Event::PayloadEdited(text.into())).await
    }

    /// Push the current payload to `bundle_id` on the selected device.
    ///
    /// Fails without submitting anything when the payload is invalid, no
    /// device is selected, or `bundle_id` is empty.
    pub async fn request_push(&self, bundle_id: &str) -> Result<()> {
        let payload = self.payload();
        validate_payload(payload.as_str())?;

        let device = self.selected().ok_or(Error::NoDeviceSelected)?;
        if bundle_id.trim().is_empty() {
            return Err(Error::NoApplication);
        }

        self.submit(Event::PushRequested {
            device,
            bundle_id: bundle_id.to_string(),
            payload,
        })
        .await
    }

    /// Structural payload check
    pub fn is_valid_payload(&self, text: &str) -> bool {
        pusher_core::is_valid_payload(text)
    }

    /// Subscribe to engine events.
    ///
    /// Slow subscribers may see `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Ask the engine to stop
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}
