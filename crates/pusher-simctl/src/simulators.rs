//! iOS simulator discovery and boot control using xcrun simctl
//!
//! Devices come from `xcrun simctl list devices -j`; boot and shutdown go
//! through `xcrun simctl boot|shutdown <udid>`.

use pusher_core::prelude::*;
use pusher_core::{group_by_family, DeviceContext, DeviceFamily, DeviceList, DeviceState};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::command::{ensure_success, simctl};
use crate::options::SimctlOptions;

const BOOT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// JSON output from `xcrun simctl list devices -j`
#[derive(Debug, Deserialize)]
struct SimctlOutput {
    devices: HashMap<String, Vec<SimctlDevice>>,
}

#[derive(Debug, Deserialize)]
struct SimctlDevice {
    udid: String,
    name: String,
    state: String,
    #[serde(rename = "deviceTypeIdentifier")]
    device_type_identifier: Option<String>,
    #[serde(rename = "isAvailable")]
    is_available: Option<bool>,
}

/// List all available simulators grouped by family
pub async fn list_devices(options: &SimctlOptions) -> Result<DeviceList> {
    let output = simctl(options, ["list", "devices", "-j"], "simctl list devices").await?;
    ensure_success(&output, "simctl list devices")?;

    let json_str = String::from_utf8_lossy(&output.stdout);
    let list = parse_device_list(&json_str)?;
    debug!(
        "Discovered {} simulator(s) in {} famil(ies)",
        list.values().map(Vec::len).sum::<usize>(),
        list.len()
    );
    Ok(list)
}

/// Parse simctl's device JSON, skipping unavailable devices
pub fn parse_device_list(json: &str) -> Result<DeviceList> {
    let parsed: SimctlOutput = serde_json::from_str(json)
        .map_err(|e| Error::protocol(format!("Failed to parse simctl output: {}", e)))?;

    let mut devices = Vec::new();
    for (runtime_key, entries) in parsed.devices {
        let runtime = parse_runtime_name(&runtime_key);

        for device in entries {
            if device.is_available == Some(false) {
                continue;
            }

            let family =
                DeviceFamily::from_device_type(device.device_type_identifier.as_deref(), &device.name);
            let state = DeviceState::from(device.state.as_str());
            devices.push(
                DeviceContext::new(device.udid, device.name, family, state)
                    .with_runtime(runtime.clone()),
            );
        }
    }

    Ok(group_by_family(devices))
}

/// Parse runtime identifier to friendly name
/// "com.apple.CoreSimulator.SimRuntime.iOS-17-2" -> "iOS 17.2"
fn parse_runtime_name(identifier: &str) -> String {
    if let Some(suffix) = identifier.strip_prefix("com.apple.CoreSimulator.SimRuntime.") {
        if let Some((os_name, version)) = suffix.split_once('-') {
            format!("{} {}", os_name, version.replace('-', "."))
        } else {
            suffix.to_string()
        }
    } else {
        identifier.to_string()
    }
}

/// Boot a simulator by UDID
///
/// Returns once the simulator reports `Booted`. An "already booted" refusal
/// from simctl is not an error.
pub async fn boot_simulator(options: &SimctlOptions, udid: &str) -> Result<()> {
    let output = simctl(options, ["boot", udid], "simctl boot").await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // "Unable to boot device in current state: Booted" is not an error
        if !stderr.contains("Booted") {
            return Err(Error::simctl(format!(
                "Failed to boot simulator: {}",
                stderr.trim()
            )));
        }
    }

    wait_for_boot(options, udid).await?;

    if options.open_simulator_app {
        // Best effort: the device is booted even if the app cannot be raised
        if let Err(e) = Command::new("open")
            .args(["-a", "Simulator"])
            .kill_on_drop(true)
            .output()
            .await
        {
            debug!("Could not open Simulator.app: {}", e);
        }
    }

    info!("Simulator {} booted", udid);
    Ok(())
}

/// Shut down a simulator by UDID
pub async fn shutdown_simulator(options: &SimctlOptions, udid: &str) -> Result<()> {
    let output = simctl(options, ["shutdown", udid], "simctl shutdown").await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Ignore "Unable to shutdown device in current state: Shutdown"
        if !stderr.contains("Shutdown") {
            return Err(Error::simctl(format!(
                "Failed to shutdown simulator: {}",
                stderr.trim()
            )));
        }
    }

    info!("Simulator {} shut down", udid);
    Ok(())
}

async fn is_booted(options: &SimctlOptions, udid: &str) -> Result<bool> {
    let list = list_devices(options).await?;
    Ok(pusher_core::find_device(&list, udid).is_some_and(DeviceContext::is_booted))
}

async fn wait_for_boot(options: &SimctlOptions, udid: &str) -> Result<()> {
    let max_wait = options.boot_timeout();
    let start = Instant::now();

    while start.elapsed() < max_wait {
        if is_booted(options, udid).await? {
            return Ok(());
        }
        tokio::time::sleep(BOOT_POLL_INTERVAL).await;
    }

    Err(Error::timeout("simulator boot", max_wait))
}
