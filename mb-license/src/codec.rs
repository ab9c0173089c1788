//! Payload ⇄ key-segment encoding.
//!
//! The payload JSON is base64-encoded and made safe for a dash-delimited key
//! by mapping `+` to `-`, `/` to `_` and dropping `=` padding. That is the
//! base64url alphabet without padding, so the URL-safe engine does the work.

use crate::error::{DecodeError, LicenseResult};
use crate::payload::LicensePayload;
use base64::{
    alphabet,
    engine::{
        general_purpose::URL_SAFE_NO_PAD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig,
    },
    Engine,
};
use serde_json::{Map, Value};

/// Decoder that tolerates keys whose padding was left in place.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes a payload into a separator-safe text blob.
///
/// # Errors
///
/// Returns an error only if the payload cannot be serialized, which the
/// payload type itself never causes.
pub fn encode(payload: &LicensePayload) -> LicenseResult<String> {
    let json = serde_json::to_vec(payload)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a blob produced by [`encode`] back into a payload.
///
/// # Errors
///
/// Fails when the blob is not base64url, the bytes are not UTF-8, or the
/// text is not a JSON object. Missing or mistyped well-known fields are not
/// an error, see [`LicensePayload`].
pub fn decode(blob: &str) -> Result<LicensePayload, DecodeError> {
    decode_map(blob).map(LicensePayload::from)
}

/// Decodes a blob into its raw field map.
///
/// # Errors
///
/// Fails when the blob is not base64url, not UTF-8, or not a JSON object.
pub fn decode_map(blob: &str) -> Result<Map<String, Value>, DecodeError> {
    let bytes = URL_SAFE_LENIENT.decode(blob)?;
    let text = String::from_utf8(bytes)?;
    match serde_json::from_str(&text)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(DecodeError::NotAnObject),
    }
}
