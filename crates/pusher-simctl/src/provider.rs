//! Simulator collaborator seam
//!
//! The engine only talks to simulators through [`SimulatorProvider`]; the
//! production implementation shells out to `xcrun simctl`, tests use the fake
//! from `test_utils`.

use pusher_core::prelude::*;
use pusher_core::{ApplicationContext, DeviceList};

use crate::options::SimctlOptions;
use crate::{applications, push, simulators, tool_availability};

/// One-shot simulator operations
#[trait_variant::make(SimulatorProvider: Send)]
pub trait LocalSimulatorProvider {
    /// Verify the host can simulate pushes
    async fn check_capability(&self) -> Result<()>;

    /// Fetch all available simulators, grouped by family
    async fn list_devices(&self) -> Result<DeviceList>;

    /// Fetch the applications installed on `udid`
    async fn list_applications(&self, udid: &str) -> Result<Vec<ApplicationContext>>;

    /// Boot (`make_booted == true`) or shut down `udid`
    async fn set_boot_state(&self, udid: &str, make_booted: bool) -> Result<()>;

    /// Deliver `payload` to `bundle_id` on `udid`
    async fn dispatch_push(&self, udid: &str, bundle_id: &str, payload: &str) -> Result<()>;
}

/// [`SimulatorProvider`] backed by `xcrun simctl`
#[derive(Debug, Clone, Default)]
pub struct SimctlProvider {
    options: SimctlOptions,
}

impl SimctlProvider {
    pub fn new(options: SimctlOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SimctlOptions {
        &self.options
    }
}

impl SimulatorProvider for SimctlProvider {
    async fn check_capability(&self) -> Result<()> {
        tool_availability::ensure_push_supported(&self.options).await
    }

    async fn list_devices(&self) -> Result<DeviceList> {
        simulators::list_devices(&self.options).await
    }

    async fn list_applications(&self, udid: &str) -> Result<Vec<ApplicationContext>> {
        applications::list_applications(&self.options, udid).await
    }

    async fn set_boot_state(&self, udid: &str, make_booted: bool) -> Result<()> {
        if make_booted {
            simulators::boot_simulator(&self.options, udid).await
        } else {
            simulators::shutdown_simulator(&self.options, udid).await
        }
    }

    async fn dispatch_push(&self, udid: &str, bundle_id: &str, payload: &str) -> Result<()> {
        push::send_push(&self.options, udid, bundle_id, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_keeps_options() {
        let options = SimctlOptions {
            xcrun: "/opt/xcode/xcrun".to_string(),
            ..Default::default()
        };
        let provider = SimctlProvider::new(options.clone());
        assert_eq!(provider.options(), &options);
    }

    #[test]
    fn test_provider_is_send_sync() {
        fn assert_send_sync<T: SimulatorProvider + Sync + 'static>() {}
        assert_send_sync::<SimctlProvider>();
    }
}
