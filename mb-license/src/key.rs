//! License key composition, parsing and validation.
//!
//! Keys use the format: `MB-{TYPE}-{CHECKSUM}-{PAYLOAD}`
//!
//! - `TYPE`: upper-case license type (`PREMIUM`, `TRIAL`, `FREE`)
//! - `CHECKSUM`: 1 to 8 upper-case hex digits over `TYPE + PAYLOAD`
//! - `PAYLOAD`: base64url JSON, see [`crate::codec`]
//!
//! The payload alphabet includes `-`, so a key may split into more than four
//! pieces. Everything after the third separator belongs to the payload.

use crate::checksum::ChecksumEngine;
use crate::codec;
use crate::error::{LicenseError, LicenseResult};
use crate::payload::{trial_expiry, LicensePayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Literal first segment of every key.
pub const KEY_PREFIX: &str = "MB";

/// Segment separator.
pub const SEPARATOR: char = '-';

/// Trial length used when the caller does not pick one.
pub const DEFAULT_TRIAL_DAYS: u32 = 14;

/// Number of keys `batch` produces when no count is given.
pub const DEFAULT_BATCH_COUNT: usize = 5;

/// The license type embedded in a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LicenseType {
    /// Full, non-expiring license.
    Premium,
    /// Time-limited license with an embedded expiry date.
    Trial,
    /// Recognized on the wire but never issued.
    Free,
}

impl LicenseType {
    /// Upper-case wire form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Premium => "PREMIUM",
            Self::Trial => "TRIAL",
            Self::Free => "FREE",
        }
    }

    /// Lower-case form, as reported by validation.
    #[must_use]
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            Self::Premium => "premium",
            Self::Trial => "trial",
            Self::Free => "free",
        }
    }

    /// Returns true if keys of this type may be generated.
    #[must_use]
    pub fn is_issuable(&self) -> bool {
        matches!(self, Self::Premium | Self::Trial)
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseType {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PREMIUM" => Ok(Self::Premium),
            "TRIAL" => Ok(Self::Trial),
            "FREE" => Ok(Self::Free),
            _ => Err(LicenseError::InvalidType(s.to_string())),
        }
    }
}

/// Caller input for key generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Trial length in days. Only used for [`LicenseType::Trial`].
    pub trial_days: Option<u32>,
    /// Extension fields merged into the payload.
    pub extra: Map<String, Value>,
}

impl GenerateOptions {
    /// Options for a trial of `days` days.
    #[must_use]
    pub fn trial(days: u32) -> Self {
        Self {
            trial_days: Some(days),
            ..Self::default()
        }
    }

    /// Adds an extension field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Client-side expiry state of a validated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// No expiry, or expiry still in the future.
    Active,
    /// The embedded expiry date has passed.
    Expired,
}

/// A parsed and verified license key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseKey {
    /// The raw key string.
    raw: String,
    /// Type segment as found in the key (upper case on issued keys).
    license_type: String,
    /// Checksum segment.
    checksum: String,
    /// Decoded payload.
    payload: LicensePayload,
}

impl LicenseKey {
    /// Returns the raw key string.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the type segment in lower case.
    #[must_use]
    pub fn license_type(&self) -> String {
        self.license_type.to_lowercase()
    }

    /// Returns the type if it is one of the recognized license types.
    #[must_use]
    pub fn known_type(&self) -> Option<LicenseType> {
        self.license_type.parse().ok()
    }

    /// Returns the checksum segment.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Returns the decoded payload.
    #[must_use]
    pub fn payload(&self) -> &LicensePayload {
        &self.payload
    }

    /// Consumes the key, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> LicensePayload {
        self.payload
    }

    /// Returns the expiry state at `now`.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> LicenseStatus {
        if self.payload.is_expired_at(now) {
            LicenseStatus::Expired
        } else {
            LicenseStatus::Active
        }
    }

    /// Returns the expiry state against the current time.
    #[must_use]
    pub fn status(&self) -> LicenseStatus {
        self.status_at(Utc::now())
    }
}

/// Outcome of [`LicenseKeyService::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the key is valid.
    pub valid: bool,
    /// Lower-case license type (if valid).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub license_type: Option<String>,
    /// Decoded payload (if valid).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<LicensePayload>,
    /// Failure reason (if invalid).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationResult {
    /// A positive result carrying the key's lower-case type and payload.
    #[must_use]
    pub fn success(key: LicenseKey) -> Self {
        Self {
            valid: true,
            license_type: Some(key.license_type()),
            payload: Some(key.into_payload()),
            reason: None,
        }
    }

    /// A negative result carrying only the failure reason.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            license_type: None,
            payload: None,
            reason: Some(reason.into()),
        }
    }
}

impl From<LicenseResult<LicenseKey>> for ValidationResult {
    fn from(result: LicenseResult<LicenseKey>) -> Self {
        match result {
            Ok(key) => Self::success(key),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

/// Issues and validates license keys with a configured checksum secret.
#[derive(Debug, Clone, Default)]
pub struct LicenseKeyService {
    engine: ChecksumEngine,
}

impl LicenseKeyService {
    /// Creates a service that checksums keys with `engine`.
    #[must_use]
    pub fn new(engine: ChecksumEngine) -> Self {
        Self { engine }
    }

    /// Returns the checksum engine.
    #[must_use]
    pub fn engine(&self) -> &ChecksumEngine {
        &self.engine
    }

    /// Generates a key issued now.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidType`] for types that cannot be issued,
    /// and [`LicenseError::InvalidTrialDays`] when the trial expiry is out of range.
    pub fn generate(
        &self,
        license_type: LicenseType,
        options: GenerateOptions,
    ) -> LicenseResult<String> {
        self.generate_at(license_type, options, Utc::now())
    }

    /// Generates a key issued at `now`.
    ///
    /// Trial keys get `expiryDate = now + trial_days` (default 14 days).
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidType`] for types that cannot be issued,
    /// and [`LicenseError::InvalidTrialDays`] when the trial expiry is out of range.
    pub fn generate_at(
        &self,
        license_type: LicenseType,
        options: GenerateOptions,
        now: DateTime<Utc>,
    ) -> LicenseResult<String> {
        if !license_type.is_issuable() {
            return Err(LicenseError::InvalidType(license_type.to_string()));
        }

        let payload = LicensePayload::new(now, options.extra);
        let payload = match license_type {
            LicenseType::Trial => {
                let days = options.trial_days.unwrap_or(DEFAULT_TRIAL_DAYS);
                payload.with_expiry(trial_expiry(now, days)?)
            }
            _ => payload,
        };

        let data = codec::encode(&payload)?;
        let type_segment = license_type.as_str();
        let checksum = self.engine.compute(&format!("{type_segment}{data}"));

        debug!(license_type = %license_type, "generated license key");
        Ok(format!(
            "{KEY_PREFIX}{SEPARATOR}{type_segment}{SEPARATOR}{checksum}{SEPARATOR}{data}"
        ))
    }

    /// Generates `ceil(count / 2)` premium keys followed by `floor(count / 2)`
    /// default-length trial keys.
    ///
    /// # Errors
    ///
    /// Propagates payload serialization failures.
    pub fn batch(&self, count: usize) -> LicenseResult<Vec<(LicenseType, String)>> {
        let premium = count.div_ceil(2);
        (0..count)
            .map(|i| {
                let (license_type, options) = if i < premium {
                    (LicenseType::Premium, GenerateOptions::default())
                } else {
                    (LicenseType::Trial, GenerateOptions::trial(DEFAULT_TRIAL_DAYS))
                };
                self.generate(license_type, options).map(|key| (license_type, key))
            })
            .collect()
    }

    /// Parses and verifies a key string.
    ///
    /// The key is cut at its first three separators; the remainder is the
    /// payload segment verbatim. Whitespace is not stripped: surrounding
    /// blanks make the prefix or the checksum fail.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::InvalidFormat`]: fewer than four segments or wrong prefix
    /// - [`LicenseError::ChecksumMismatch`]: type or payload was altered
    /// - [`LicenseError::Parse`]: payload segment does not decode
    pub fn parse(&self, key: &str) -> LicenseResult<LicenseKey> {
        let mut segments = key.splitn(4, SEPARATOR);
        let (Some(prefix), Some(license_type), Some(checksum), Some(data)) =
            (segments.next(), segments.next(), segments.next(), segments.next())
        else {
            return Err(LicenseError::InvalidFormat);
        };
        if prefix != KEY_PREFIX {
            return Err(LicenseError::InvalidFormat);
        }

        if !self.engine.verify(&format!("{license_type}{data}"), checksum) {
            return Err(LicenseError::ChecksumMismatch);
        }

        let payload = codec::decode(data).map_err(LicenseError::Parse)?;

        Ok(LicenseKey {
            raw: key.to_string(),
            license_type: license_type.to_string(),
            checksum: checksum.to_string(),
            payload,
        })
    }

    /// Validates a key string, reporting any failure as a negative result.
    #[must_use]
    pub fn validate(&self, key: &str) -> ValidationResult {
        let result = self.parse(key);
        match &result {
            Ok(parsed) => debug!(license_type = %parsed.license_type(), "license key valid"),
            Err(err) => warn!(reason = %err, "license key rejected"),
        }
        result.into()
    }
}
