//! # pusher-core - Core Domain Types
//!
//! Foundation crate for Pusher. Provides domain types, error handling,
//! payload validation and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`DeviceContext`] - A simulator device (equality by `udid`)
//! - [`DeviceFamily`] - Device class with a fixed display order
//! - [`DeviceState`] - Boot state reported by simctl
//! - [`ApplicationContext`] - An installed application
//! - [`DeviceList`] - Devices grouped by family
//!
//! ### Payloads (`payload`)
//! - [`PushPayload`] - Raw payload text being edited
//! - [`is_valid_payload()`] - Structural APNs check
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`ToolError`] - Cloneable tool failure carried through events
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! ```rust
//! use pusher_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod payload;
pub mod prelude;
pub mod types;

pub use error::{Error, Result, ResultExt, ToolError};
pub use payload::{is_valid_payload, validate_payload, PushPayload, DEFAULT_PAYLOAD};
pub use types::{
    find_device, group_by_family, ApplicationContext, ApplicationKind, DeviceContext,
    DeviceFamily, DeviceList, DeviceState,
};
