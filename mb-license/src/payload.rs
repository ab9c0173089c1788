//! The metadata record carried inside a license key.
//!
//! Serialized as a flat JSON object:
//! - `generatedOn`: issue time (ISO-8601, millisecond precision, UTC)
//! - `version`: payload format version
//! - `expiryDate`: trial expiry, only present on trial keys
//! - any caller-supplied extension fields, merged verbatim
//!
//! Decoding accepts any JSON object. A well-known field that is absent or
//! has an unexpected shape is left out of the typed view, and its raw value
//! stays in the extension map.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

/// Payload format version written into every new key.
pub const PAYLOAD_VERSION: &str = "1.0";

/// Field names owned by the payload itself. Extensions cannot override them.
pub const RESERVED_FIELDS: [&str; 3] = ["generatedOn", "version", "expiryDate"];

/// Decoded license payload.
///
/// There are no mutators: once built, a payload is only read, encoded and
/// compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct LicensePayload {
    #[serde(
        rename = "generatedOn",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    generated_on: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(
        rename = "expiryDate",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    expiry_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl LicensePayload {
    /// Builds a payload issued at `generated_on` with the given extension fields.
    ///
    /// Extension fields named like a reserved field are dropped.
    #[must_use]
    pub fn new(generated_on: DateTime<Utc>, extra: Map<String, Value>) -> Self {
        let extra = extra
            .into_iter()
            .filter(|(name, _)| {
                let reserved = RESERVED_FIELDS.contains(&name.as_str());
                if reserved {
                    warn!(
                        field = %name,
                        "ignoring extension field that shadows a reserved payload field"
                    );
                }
                !reserved
            })
            .collect();

        Self {
            generated_on: Some(generated_on),
            version: Some(PAYLOAD_VERSION.to_string()),
            expiry_date: None,
            extra,
        }
    }

    /// Returns this payload with the given expiry.
    #[must_use]
    pub fn with_expiry(self, expiry: DateTime<Utc>) -> Self {
        Self {
            expiry_date: Some(expiry),
            ..self
        }
    }

    /// Issue time, if the payload carries a well-formed one.
    #[must_use]
    pub fn generated_on(&self) -> Option<DateTime<Utc>> {
        self.generated_on
    }

    /// Payload format version, if present as a string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Trial expiry, if any.
    #[must_use]
    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }

    /// Extension fields, including raw well-known fields that did not parse.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Looks up a single extension field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.extra.get(field)
    }

    /// Returns true if the payload carries an expiry that is at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|exp| exp <= now)
    }

    /// Whole days left before expiry, or None if the payload never expires.
    #[must_use]
    pub fn days_remaining_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expiry_date.map(|exp| (exp - now).num_days().max(0))
    }
}

impl From<Map<String, Value>> for LicensePayload {
    fn from(mut fields: Map<String, Value>) -> Self {
        let generated_on = take_timestamp(&mut fields, "generatedOn");
        let expiry_date = take_timestamp(&mut fields, "expiryDate");
        let version = match fields.remove("version") {
            Some(Value::String(version)) => Some(version),
            Some(other) => {
                fields.insert("version".to_string(), other);
                None
            }
            None => None,
        };

        Self {
            generated_on,
            version,
            expiry_date,
            extra: fields,
        }
    }
}

/// Removes and parses `name` if it holds an RFC 3339 timestamp string.
fn take_timestamp(fields: &mut Map<String, Value>, name: &str) -> Option<DateTime<Utc>> {
    let parsed = fields
        .get(name)?
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())?
        .with_timezone(&Utc);
    fields.remove(name);
    Some(parsed)
}

/// Expiry of a trial issued at `generated_on` lasting `days` days.
///
/// # Errors
///
/// Returns [`LicenseError::InvalidTrialDays`] if the expiry falls outside the
/// representable date range.
pub fn trial_expiry(generated_on: DateTime<Utc>, days: u32) -> LicenseResult<DateTime<Utc>> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|length| generated_on.checked_add_signed(length))
        .ok_or(LicenseError::InvalidTrialDays(days))
}

/// Formats a timestamp in the `2026-01-05T10:20:30.123Z` form.
fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(dt) => s.serialize_str(&format_timestamp(dt)),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 10, 20, 30).unwrap()
    }

    fn fourteen_day_trial() -> LicensePayload {
        let expiry = trial_expiry(issued(), 14).unwrap();
        LicensePayload::new(issued(), Map::new()).with_expiry(expiry)
    }

    #[test]
    fn serializes_camel_case_fields() {
        let value = serde_json::to_value(fourteen_day_trial()).unwrap();
        assert_eq!(value["generatedOn"], "2026-01-05T10:20:30.000Z");
        assert_eq!(value["version"], PAYLOAD_VERSION);
        assert_eq!(value["expiryDate"], "2026-01-19T10:20:30.000Z");
    }

    #[test]
    fn expiry_omitted_when_absent() {
        let payload = LicensePayload::new(issued(), Map::new());
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("expiryDate").is_none());
    }

    #[test]
    fn reserved_extension_fields_are_dropped() {
        let extra = json!({"version": "9.9", "generatedOn": "x", "seats": 3});
        let Value::Object(extra) = extra else { unreachable!() };
        let payload = LicensePayload::new(issued(), extra);
        assert_eq!(payload.version(), Some(PAYLOAD_VERSION));
        assert_eq!(payload.generated_on(), Some(issued()));
        assert_eq!(payload.extra().len(), 1);
        assert_eq!(payload.get("seats"), Some(&json!(3)));
    }

    #[test]
    fn trial_expiry_out_of_range() {
        assert!(matches!(
            trial_expiry(issued(), u32::MAX),
            Err(LicenseError::InvalidTrialDays(u32::MAX))
        ));
    }

    #[test]
    fn expiry_checks() {
        let expiry = trial_expiry(issued(), 10).unwrap();
        let payload = LicensePayload::new(issued(), Map::new()).with_expiry(expiry);
        let day = TimeDelta::days(1);
        assert!(!payload.is_expired_at(issued() + day * 9));
        assert!(payload.is_expired_at(issued() + day * 10));
        assert_eq!(payload.days_remaining_at(issued()), Some(10));
        assert_eq!(payload.days_remaining_at(issued() + day * 30), Some(0));
    }

    #[test]
    fn no_expiry_never_expires() {
        let payload = LicensePayload::new(issued(), Map::new());
        assert!(!payload.is_expired_at(issued() + TimeDelta::days(10_000)));
        assert_eq!(payload.days_remaining_at(issued()), None);
    }

    #[test]
    fn accepts_offset_timestamps() {
        let json = r#"{"generatedOn":"2026-01-05T12:20:30+02:00","version":"1.0"}"#;
        let payload: LicensePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.generated_on(), Some(issued()));
        assert!(payload.extra().is_empty());
    }

    #[test]
    fn mistyped_well_known_fields_stay_raw() {
        let json = r#"{"generatedOn":"yesterday","version":2,"expiryDate":null,"a":1}"#;
        let payload: LicensePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.generated_on(), None);
        assert_eq!(payload.version(), None);
        assert_eq!(payload.expiry_date(), None);
        assert_eq!(payload.get("generatedOn"), Some(&json!("yesterday")));
        assert_eq!(payload.get("version"), Some(&json!(2)));
        assert_eq!(payload.get("expiryDate"), Some(&Value::Null));

        let round_trip: Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(round_trip, serde_json::from_str::<Value>(json).unwrap());
    }
}
