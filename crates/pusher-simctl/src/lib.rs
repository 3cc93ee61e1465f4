//! # pusher-simctl - Simulator Integration
//!
//! Talks to iOS simulators through `xcrun simctl`: capability check, device
//! discovery, boot/shutdown, installed applications and push delivery.
//!
//! Depends on [`pusher_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Provider Seam
//! - [`SimulatorProvider`] - Async one-shot operations the engine depends on
//! - [`SimctlProvider`] - Production implementation backed by `xcrun simctl`
//! - [`SimctlOptions`] - Executable, timeouts and listing options
//!
//! ### Commands
//! - [`list_devices()`] / [`parse_device_list()`] - `simctl list devices -j`
//! - [`boot_simulator()`] / [`shutdown_simulator()`] - Device control
//! - [`list_applications()`] / [`parse_app_list()`] - `simctl listapps`
//! - [`send_push()`] - `simctl push`
//! - [`ensure_push_supported()`] - Host capability check
//!
//! ### Testing
//! With the `test-helpers` feature, `test_utils` exposes `FakeProvider` and
//! device builders.

mod command;

pub mod applications;
pub mod options;
pub mod provider;
pub mod push;
pub mod simulators;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod tool_availability;

pub use applications::{list_applications, parse_app_list};
pub use options::{SimctlOptions, XCRUN_ENV_VAR};
pub use provider::{LocalSimulatorProvider, SimctlProvider, SimulatorProvider};
pub use push::send_push;
pub use simulators::{boot_simulator, list_devices, parse_device_list, shutdown_simulator};
pub use tool_availability::{ensure_push_supported, XcodeVersion, MIN_XCODE_VERSION};
