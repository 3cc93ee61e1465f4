//! Installed application discovery for a booted simulator
//!
//! `xcrun simctl listapps <udid>` prints an old-style property list, so its
//! output is piped through `plutil -convert json -o - -` before parsing.

use std::collections::HashMap;

use pusher_core::prelude::*;
use pusher_core::{ApplicationContext, ApplicationKind};
use serde::Deserialize;

use crate::command::{ensure_success, program_with_input, simctl};
use crate::options::SimctlOptions;

const PLUTIL: &str = "plutil";

/// One entry of the `listapps` dictionary, keyed by bundle identifier
#[derive(Debug, Deserialize)]
struct AppEntry {
    #[serde(rename = "ApplicationType")]
    application_type: Option<String>,
    #[serde(rename = "CFBundleDisplayName")]
    display_name: Option<String>,
    #[serde(rename = "CFBundleName")]
    bundle_name: Option<String>,
}

/// List applications installed on the simulator `udid`
pub async fn list_applications(
    options: &SimctlOptions,
    udid: &str,
) -> Result<Vec<ApplicationContext>> {
    let output = simctl(options, ["listapps", udid], "simctl listapps").await?;
    ensure_success(&output, "simctl listapps")?;

    let converted = program_with_input(
        PLUTIL,
        &["-convert", "json", "-o", "-", "-"],
        &output.stdout,
        options.command_timeout(),
        "plutil convert",
    )
    .await?;
    ensure_success(&converted, "plutil convert")?;

    let json_str = String::from_utf8_lossy(&converted.stdout);
    let apps = parse_app_list(&json_str, options.include_system_apps)?;
    debug!("Found {} application(s) on {}", apps.len(), udid);
    Ok(apps)
}

/// Parse the JSON form of `listapps`, sorted by display name
pub fn parse_app_list(json: &str, include_system: bool) -> Result<Vec<ApplicationContext>> {
    let entries: HashMap<String, AppEntry> = serde_json::from_str(json)
        .map_err(|e| Error::protocol(format!("Failed to parse listapps output: {}", e)))?;

    let mut apps: Vec<ApplicationContext> = entries
        .into_iter()
        .filter_map(|(bundle_identifier, entry)| {
            let kind = match entry.application_type.as_deref() {
                Some("System") => ApplicationKind::System,
                _ => ApplicationKind::User,
            };
            if kind == ApplicationKind::System && !include_system {
                return None;
            }

            let display_name = entry
                .display_name
                .filter(|n| !n.is_empty())
                .or(entry.bundle_name.filter(|n| !n.is_empty()))
                .unwrap_or_else(|| bundle_identifier.clone());

            Some(ApplicationContext {
                bundle_identifier,
                display_name,
                kind,
            })
        })
        .collect();

    apps.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.bundle_identifier.cmp(&b.bundle_identifier))
    });
    Ok(apps)
}
