//! Push delivery through `xcrun simctl push`

use pusher_core::prelude::*;

use crate::command::{ensure_success, simctl_with_input};
use crate::options::SimctlOptions;

/// Deliver `payload` to `bundle_id` on the simulator `udid`.
///
/// The payload is passed on stdin (`-`), so no temporary file is written.
pub async fn send_push(
    options: &SimctlOptions,
    udid: &str,
    bundle_id: &str,
    payload: &str,
) -> Result<()> {
    if bundle_id.is_empty() {
        return Err(Error::NoApplication);
    }

    let output = simctl_with_input(
        options,
        ["push", udid, bundle_id, "-"],
        payload.as_bytes(),
        "simctl push",
    )
    .await?;
    ensure_success(&output, "simctl push")?;

    info!("Push delivered to {} on {}", bundle_id, udid);
    Ok(())
}
