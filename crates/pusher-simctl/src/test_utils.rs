//! Test utilities for simulator providers
//!
//! Provides device/application builders and [`FakeProvider`], an in-memory
//! [`SimulatorProvider`] with scripted results.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use pusher_core::prelude::*;
use pusher_core::{
    group_by_family, ApplicationContext, DeviceContext, DeviceFamily, DeviceList, DeviceState,
};

use crate::provider::SimulatorProvider;

/// Creates a shut-down iPhone simulator.
pub fn test_device(udid: &str, name: &str) -> DeviceContext {
    DeviceContext::new(udid, name, DeviceFamily::Phone, DeviceState::Shutdown)
        .with_runtime("iOS 17.2")
}

/// Creates a booted iPhone simulator.
pub fn booted_device(udid: &str, name: &str) -> DeviceContext {
    DeviceContext::new(udid, name, DeviceFamily::Phone, DeviceState::Booted)
        .with_runtime("iOS 17.2")
}

/// Creates a user application.
pub fn test_app(bundle_identifier: &str, display_name: &str) -> ApplicationContext {
    ApplicationContext::new(bundle_identifier, display_name)
}

/// A provider call recorded by [`FakeProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    CheckCapability,
    ListDevices,
    ListApplications(String),
    SetBootState { udid: String, make_booted: bool },
    DispatchPush { udid: String, bundle_id: String, payload: String },
}

#[derive(Debug, Default)]
struct FakeState {
    capability_error: Option<String>,
    list_error: Option<String>,
    app_list_error: Option<String>,
    boot_error: Option<String>,
    push_error: Option<String>,
    devices: Vec<DeviceContext>,
    applications: HashMap<String, Vec<ApplicationContext>>,
    delay: Option<Duration>,
    calls: Vec<ProviderCall>,
}

/// In-memory provider for engine and feedback tests.
///
/// Clones share state, so a test can keep one handle for assertions while the
/// engine owns another. Booting or shutting down a device flips its state in
/// the next device list.
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with these devices
    pub fn with_devices(self, devices: impl IntoIterator<Item = DeviceContext>) -> Self {
        self.lock().devices = devices.into_iter().collect();
        self
    }

    /// Applications reported for `udid`
    pub fn with_applications(
        self,
        udid: &str,
        apps: impl IntoIterator<Item = ApplicationContext>,
    ) -> Self {
        self.lock()
            .applications
            .insert(udid.to_string(), apps.into_iter().collect());
        self
    }

    /// Delay every operation, so tests can observe in-flight states
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    pub fn fail_capability(self, message: &str) -> Self {
        self.lock().capability_error = Some(message.to_string());
        self
    }

    pub fn fail_list(self, message: &str) -> Self {
        self.lock().list_error = Some(message.to_string());
        self
    }

    pub fn fail_app_list(self, message: &str) -> Self {
        self.lock().app_list_error = Some(message.to_string());
        self
    }

    pub fn fail_boot(self, message: &str) -> Self {
        self.lock().boot_error = Some(message.to_string());
        self
    }

    pub fn fail_push(self, message: &str) -> Self {
        self.lock().push_error = Some(message.to_string());
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count_calls(&self, predicate: impl Fn(&ProviderCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Current state of `udid` as the fake sees it
    pub fn device_state(&self, udid: &str) -> Option<DeviceState> {
        self.lock()
            .devices
            .iter()
            .find(|d| d.udid == udid)
            .map(|d| d.state)
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A panicking test thread must not hide the recorded calls
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and return the configured delay
    fn record(&self, call: ProviderCall) -> Option<Duration> {
        let mut state = self.lock();
        state.calls.push(call);
        state.delay
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl SimulatorProvider for FakeProvider {
    async fn check_capability(&self) -> Result<()> {
        Self::pause(self.record(ProviderCall::CheckCapability)).await;
        match self.lock().capability_error.clone() {
            Some(message) => Err(Error::capability(message)),
            None => Ok(()),
        }
    }

    async fn list_devices(&self) -> Result<DeviceList> {
        Self::pause(self.record(ProviderCall::ListDevices)).await;
        let state = self.lock();
        match &state.list_error {
            Some(message) => Err(Error::simctl(message.clone())),
            None => Ok(group_by_family(state.devices.iter().cloned())),
        }
    }

    async fn list_applications(&self, udid: &str) -> Result<Vec<ApplicationContext>> {
        Self::pause(self.record(ProviderCall::ListApplications(udid.to_string()))).await;
        let state = self.lock();
        match &state.app_list_error {
            Some(message) => Err(Error::simctl(message.clone())),
            None => Ok(state.applications.get(udid).cloned().unwrap_or_default()),
        }
    }

    async fn set_boot_state(&self, udid: &str, make_booted: bool) -> Result<()> {
        Self::pause(self.record(ProviderCall::SetBootState {
            udid: udid.to_string(),
            make_booted,
        }))
        .await;
        let mut state = self.lock();
        if let Some(message) = &state.boot_error {
            return Err(Error::simctl(message.clone()));
        }
        let device = state
            .devices
            .iter_mut()
            .find(|d| d.udid == udid)
            .ok_or_else(|| Error::simctl(format!("Invalid device: {}", udid)))?;
        device.state = if make_booted {
            DeviceState::Booted
        } else {
            DeviceState::Shutdown
        };
        Ok(())
    }

    async fn dispatch_push(&self, udid: &str, bundle_id: &str, payload: &str) -> Result<()> {
        Self::pause(self.record(ProviderCall::DispatchPush {
            udid: udid.to_string(),
            bundle_id: bundle_id.to_string(),
            payload: payload.to_string(),
        }))
        .await;
        match self.lock().push_error.clone() {
            Some(message) => Err(Error::simctl(message)),
            None => Ok(()),
        }
    }
}
