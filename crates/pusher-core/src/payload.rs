//! APNs push payload buffer and its structural validation

use serde::Deserialize;

use crate::error::{Error, Result};

/// Payload offered when nothing else is configured
pub const DEFAULT_PAYLOAD: &str = r#"{
    "aps": {
        "alert": {
            "body": "Hello!",
            "title": "From Pusher"
        }
    }
}"#;

#[derive(Debug, Deserialize)]
struct ApnsPayload {
    aps: Aps,
}

#[derive(Debug, Deserialize)]
struct Aps {
    alert: Alert,
}

#[derive(Debug, Deserialize)]
struct Alert {
    title: String,
    body: String,
    #[serde(default)]
    #[allow(dead_code)]
    subtitle: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    badge: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    sound: Option<String>,
}

/// Check the payload structure, returning why it is rejected.
///
/// A valid payload is a JSON object with `aps.alert.title` and `aps.alert.body`
/// as non-empty strings.
pub fn validate_payload(text: &str) -> Result<()> {
    let payload: ApnsPayload =
        serde_json::from_str(text).map_err(|e| Error::invalid_payload(e.to_string()))?;

    if payload.aps.alert.title.trim().is_empty() {
        return Err(Error::invalid_payload("aps.alert.title is empty"));
    }
    if payload.aps.alert.body.trim().is_empty() {
        return Err(Error::invalid_payload("aps.alert.body is empty"));
    }
    Ok(())
}

/// Structural check used before allowing dispatch
pub fn is_valid_payload(text: &str) -> bool {
    validate_payload(text).is_ok()
}

/// Raw, possibly-invalid payload text being edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPayload(String);

impl PushPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        is_valid_payload(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for PushPayload {
    fn default() -> Self {
        Self(DEFAULT_PAYLOAD.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payload_is_valid() {
        assert!(is_valid_payload(DEFAULT_PAYLOAD));
        assert!(PushPayload::default().is_valid());
    }

    #[test]
    fn test_compact_default_payload_is_valid() {
        assert!(is_valid_payload(
            r#"{"aps":{"alert":{"body":"Hello!","title":"From Pusher"}}}"#
        ));
    }

    #[test]
    fn test_malformed_json_is_invalid() {
        assert!(!is_valid_payload(r#"{"aps":{"alert":{"#));
        assert!(!is_valid_payload(""));
        assert!(!is_valid_payload("not json"));
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        assert!(!is_valid_payload(r#"{}"#));
        assert!(!is_valid_payload(r#"{"aps":{}}"#));
        assert!(!is_valid_payload(r#"{"aps":{"alert":{"title":"Hi"}}}"#));
        assert!(!is_valid_payload(r#"{"aps":{"alert":{"body":"Hi"}}}"#));
        assert!(!is_valid_payload(r#"{"aps":{"alert":"plain string"}}"#));
        assert!(!is_valid_payload(r#"[1, 2, 3]"#));
    }

    #[test]
    fn test_empty_title_or_body_is_invalid() {
        let err = validate_payload(r#"{"aps":{"alert":{"title":"","body":"Hi"}}}"#).unwrap_err();
        assert!(err.to_string().contains("title"));
        assert!(!is_valid_payload(
            r#"{"aps":{"alert":{"title":"Hi","body":"  "}}}"#
        ));
    }

    #[test]
    fn test_optional_fields_must_have_right_types() {
        assert!(is_valid_payload(
            r#"{"aps":{"alert":{"title":"T","body":"B","subtitle":"S","badge":3,"sound":"default"}}}"#
        ));
        assert!(!is_valid_payload(
            r#"{"aps":{"alert":{"title":"T","body":"B","badge":"three"}}}"#
        ));
    }

    #[test]
    fn test_extra_keys_are_allowed() {
        assert!(is_valid_payload(
            r#"{"Simulator Target Bundle":"com.example","aps":{"alert":{"title":"T","body":"B"},"badge":1}}"#
        ));
    }
}
