use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Free-form device attributes. Values keep their JSON kind.
pub type Properties = serde_json::Map<String, Value>;

/// A device record as returned by the device API.
///
/// `name`, `type` and `status` are required on create, but rows written by
/// other tools may lack them or hold a non-string value. Missing and null
/// become empty, other scalars are shown in their JSON form, so one odd row
/// never fails the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    #[serde(default, deserialize_with = "lenient_text::required")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_text::required")]
    pub device_type: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text::optional"
    )]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text::required")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    /// Server-set. `None` when absent or unparseable.
    #[serde(default, with = "lenient_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Status colour class
// ---------------------------------------------------------------------------

/// Display class derived from the free-text `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    On,
    Off,
    Default,
}

impl StatusClass {
    /// Positive matches win, so `"unlocked"` is `On` even though it contains
    /// `"locked"`.
    pub fn of(status: &str) -> Self {
        let status = status.to_lowercase();
        if status == "on"
            || status == "active"
            || status.contains("open")
            || status.contains("unlocked")
        {
            StatusClass::On
        } else if status == "off"
            || status == "inactive"
            || status.contains("closed")
            || status.contains("locked")
        {
            StatusClass::Off
        } else {
            StatusClass::Default
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            StatusClass::On => "device-status-on",
            StatusClass::Off => "device-status-off",
            StatusClass::Default => "device-status-default",
        }
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropertiesError {
    #[error("properties are not valid JSON: {0}")]
    Syntax(String),
    #[error("properties must be a JSON object")]
    NotAnObject,
}

/// Parse the free-text properties field.
///
/// Blank text means "no properties" (`Ok(None)`); anything else must be a JSON
/// object.
pub fn parse_properties(text: &str) -> Result<Option<Properties>, PropertiesError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(PropertiesError::NotAnObject),
        Err(e) => Err(PropertiesError::Syntax(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Accepts RFC 3339, a naive ISO 8601 timestamp (read as UTC), or epoch
/// milliseconds.
pub fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|n| n.and_utc())
            }),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Local date and time, or `Invalid Date` when the server sent nothing usable.
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "Invalid Date".to_owned(),
    }
}

mod lenient_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(super::parse_timestamp))
    }
}

mod lenient_text {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn text(raw: Value) -> Option<String> {
        match raw {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(text(Value::deserialize(deserializer)?))
    }
}
