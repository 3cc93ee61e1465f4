//! Domain types: simulator devices, installed applications, device grouping

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Devices grouped by family, families in display order, devices sorted by name.
pub type DeviceList = BTreeMap<DeviceFamily, Vec<DeviceContext>>;

/// Boot state of a simulator device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Shutdown,
    Booted,
    Booting,
    Unknown,
}

impl From<&str> for DeviceState {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "shutdown" => DeviceState::Shutdown,
            "booted" => DeviceState::Booted,
            "booting" => DeviceState::Booting,
            _ => DeviceState::Unknown,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Shutdown => write!(f, "shutdown"),
            DeviceState::Booted => write!(f, "booted"),
            DeviceState::Booting => write!(f, "booting"),
            DeviceState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Device class used to group simulators.
///
/// Variant order is the display order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    Phone,
    Tablet,
    Watch,
    Tv,
    Vision,
    Other,
}

impl DeviceFamily {
    /// Stable sort key (display order)
    pub fn sort_key(&self) -> u8 {
        *self as u8
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DeviceFamily::Phone => "iPhone",
            DeviceFamily::Tablet => "iPad",
            DeviceFamily::Watch => "Apple Watch",
            DeviceFamily::Tv => "Apple TV",
            DeviceFamily::Vision => "Apple Vision",
            DeviceFamily::Other => "Other",
        }
    }

    /// Opaque icon asset id for the presentation layer
    pub fn image(&self) -> &'static str {
        match self {
            DeviceFamily::Phone => "iphone",
            DeviceFamily::Tablet => "ipad",
            DeviceFamily::Watch => "applewatch",
            DeviceFamily::Tv => "appletv",
            DeviceFamily::Vision => "visionpro",
            DeviceFamily::Other => "desktopcomputer",
        }
    }

    /// Classify a simctl device type identifier, falling back to the device name
    ///
    /// "com.apple.CoreSimulator.SimDeviceType.iPhone-15-Pro" -> Phone
    pub fn from_device_type(identifier: Option<&str>, name: &str) -> Self {
        let source = identifier
            .and_then(|id| id.strip_prefix("com.apple.CoreSimulator.SimDeviceType."))
            .unwrap_or(name)
            .to_lowercase();

        if source.starts_with("iphone") {
            DeviceFamily::Phone
        } else if source.starts_with("ipad") {
            DeviceFamily::Tablet
        } else if source.contains("watch") {
            DeviceFamily::Watch
        } else if source.contains("tv") {
            DeviceFamily::Tv
        } else if source.contains("vision") {
            DeviceFamily::Vision
        } else {
            DeviceFamily::Other
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A simulator device as reported by the device-listing provider
///
/// Equality is by `udid` only, so a refreshed copy of the same device compares
/// equal to the stale one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceContext {
    pub udid: String,
    pub name: String,
    pub family: DeviceFamily,
    pub state: DeviceState,
    /// e.g. "iOS 17.2"
    pub runtime: String,
    pub image: String,
}

impl DeviceContext {
    pub fn new(
        udid: impl Into<String>,
        name: impl Into<String>,
        family: DeviceFamily,
        state: DeviceState,
    ) -> Self {
        Self {
            udid: udid.into(),
            name: name.into(),
            family,
            state,
            runtime: String::new(),
            image: family.image().to_string(),
        }
    }

    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    pub fn is_booted(&self) -> bool {
        self.state == DeviceState::Booted
    }
}

impl PartialEq for DeviceContext {
    fn eq(&self, other: &Self) -> bool {
        self.udid == other.udid
    }
}

impl Eq for DeviceContext {}

impl std::hash::Hash for DeviceContext {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.udid.hash(state);
    }
}

/// Origin of an installed application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationKind {
    User,
    System,
}

/// An application installed on a booted simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationContext {
    pub bundle_identifier: String,
    pub display_name: String,
    pub kind: ApplicationKind,
}

impl ApplicationContext {
    pub fn new(bundle_identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            bundle_identifier: bundle_identifier.into(),
            display_name: display_name.into(),
            kind: ApplicationKind::User,
        }
    }

    /// Sentinel meaning "no real applications available yet"
    pub fn placeholder() -> Self {
        Self {
            bundle_identifier: String::new(),
            display_name: "None".to_string(),
            kind: ApplicationKind::User,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.bundle_identifier.is_empty()
    }
}

/// Group devices by family, sorting each family's devices by name.
pub fn group_by_family(devices: impl IntoIterator<Item = DeviceContext>) -> DeviceList {
    let mut list = DeviceList::new();
    for device in devices {
        list.entry(device.family).or_default().push(device);
    }
    for devices in list.values_mut() {
        devices.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.udid.cmp(&b.udid)));
    }
    list
}

/// Find a device by identity anywhere in the list
pub fn find_device<'a>(list: &'a DeviceList, udid: &str) -> Option<&'a DeviceContext> {
    list.values().flatten().find(|d| d.udid == udid)
}
