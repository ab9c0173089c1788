//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
///
/// The `Display` text of the three validation failures is the reason string
/// reported by [`crate::ValidationResult`].
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Too few segments, or the key does not start with the expected prefix.
    #[error("Invalid format")]
    InvalidFormat,

    /// The embedded checksum does not match the one recomputed over `type + data`.
    #[error("Invalid checksum")]
    ChecksumMismatch,

    /// Checksum matched but the payload segment could not be decoded.
    #[error("Parse error")]
    Parse(#[source] DecodeError),

    /// The requested license type is unknown or cannot be issued.
    #[error("invalid license type: {0}")]
    InvalidType(String),

    /// The trial length pushes the expiry date out of range.
    #[error("invalid trial length: {0} days")]
    InvalidTrialDays(u32),

    /// Heartbeat file I/O failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures while turning an encoded payload segment back into a payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not valid base64url.
    #[error("invalid payload base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes are not UTF-8 text.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Text is not JSON.
    #[error("invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parsed, but it is not a field-to-value mapping.
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
