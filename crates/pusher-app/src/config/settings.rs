//! Settings loader for `config.toml`

use std::path::{Path, PathBuf};

use pusher_core::prelude::*;
use pusher_core::PushPayload;

use super::types::Settings;

const CONFIG_FILENAME: &str = "config.toml";
const APP_DIR: &str = "pusher";

/// `<config_dir>/pusher/config.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
}

/// Load settings from `path`, or the default location when `None`.
///
/// Missing or malformed files fall back to defaults. `PUSHER_XCRUN` is applied
/// last.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let settings = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(config_path) => read_settings(&config_path, path.is_some()),
        None => {
            debug!("No config directory on this platform, using defaults");
            Settings::default()
        }
    };

    Settings {
        simctl: settings.simctl.with_env_overrides(),
        ..settings
    }
}

fn read_settings(config_path: &Path, explicit: bool) -> Settings {
    if !config_path.exists() {
        if explicit {
            warn!("Config file {:?} does not exist, using defaults", config_path);
        } else {
            debug!("No config file at {:?}, using defaults", config_path);
        }
        return Settings::default();
    }

    match std::fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Read a payload file given on the command line.
///
/// The text is returned even when it is not a valid push payload; it is only
/// checked before dispatch.
pub fn load_payload_file(path: &Path) -> Result<PushPayload> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload file {:?}", path))?;
    if !pusher_core::is_valid_payload(&text) {
        warn!("Payload in {:?} is not a valid push payload yet", path);
    }
    Ok(PushPayload::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pusher_core::DEFAULT_PAYLOAD;
    use pusher_simctl::XCRUN_ENV_VAR;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_load_settings_missing_file() {
        let temp = tempdir().unwrap();
        let settings = load_settings(Some(temp.path().join("config.toml").as_path()));

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.simctl.command_timeout_secs, 30);
        assert_eq!(settings.engine.channel_capacity, 256);
        assert!(settings.engine.auto_start);
        assert_eq!(settings.payload.default, DEFAULT_PAYLOAD);
    }

    #[test]
    #[serial]
    fn test_load_settings_custom() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        let config = r#"
[simctl]
xcrun = "/Applications/Xcode.app/Contents/Developer/usr/bin/xcrun"
boot_timeout_secs = 120
include_system_apps = true

[engine]
auto_start = false

[payload]
default = '{"aps":{"alert":{"title":"T","body":"B"}}}'
"#;
        std::fs::write(&path, config).unwrap();

        let settings = load_settings(Some(path.as_path()));

        assert_eq!(
            settings.simctl.xcrun,
            "/Applications/Xcode.app/Contents/Developer/usr/bin/xcrun"
        );
        assert_eq!(settings.simctl.boot_timeout_secs, 120);
        assert_eq!(settings.simctl.command_timeout_secs, 30);
        assert!(settings.simctl.include_system_apps);
        assert!(!settings.engine.auto_start);
        assert_eq!(settings.engine.channel_capacity, 256);
        assert!(settings.payload.initial_payload().is_valid());
    }

    #[test]
    #[serial]
    fn test_load_settings_invalid_toml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "not valid toml {{{{").unwrap();

        let settings = load_settings(Some(path.as_path()));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    #[serial]
    fn test_xcrun_env_override() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[simctl]\nxcrun = \"from-config\"\n").unwrap();

        std::env::set_var(XCRUN_ENV_VAR, "/opt/custom/xcrun");
        let settings = load_settings(Some(path.as_path()));
        std::env::remove_var(XCRUN_ENV_VAR);

        assert_eq!(settings.simctl.xcrun, "/opt/custom/xcrun");
    }

    #[test]
    #[serial]
    fn test_empty_xcrun_env_is_ignored() {
        let temp = tempdir().unwrap();
        std::env::set_var(XCRUN_ENV_VAR, "  ");
        let settings = load_settings(Some(temp.path().join("missing.toml").as_path()));
        std::env::remove_var(XCRUN_ENV_VAR);

        assert_eq!(settings.simctl.xcrun, "xcrun");
    }

    #[test]
    fn test_load_payload_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("payload.json");
        std::fs::write(&path, "{ not yet json").unwrap();

        let payload = load_payload_file(&path).unwrap();
        assert_eq!(payload.as_str(), "{ not yet json");
        assert!(!payload.is_valid());
    }

    #[test]
    fn test_load_payload_file_missing() {
        let temp = tempdir().unwrap();
        let err = load_payload_file(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_payload_file_unreadable() {
        let temp = tempdir().unwrap();
        let err = load_payload_file(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_default_config_path_ends_with_app_dir() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("pusher/config.toml"));
        }
    }
}
