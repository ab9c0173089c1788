//! Shared test helpers for license tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use mb_license::{compute_checksum, ChecksumEngine, LicenseKeyService};

/// Secret used by every test service.
pub const TEST_SECRET: &str = "test-secret";

/// Returns a service keyed with [`TEST_SECRET`].
pub fn test_service() -> LicenseKeyService {
    LicenseKeyService::new(ChecksumEngine::new(TEST_SECRET))
}

/// Fixed issue time for deterministic keys.
pub fn issued_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Builds a correctly checksummed key around an arbitrary payload text.
/// Lets tests reach the payload decoder with content `generate` never emits.
pub fn sign_raw(license_type: &str, payload_text: &str) -> String {
    let data = URL_SAFE_NO_PAD.encode(payload_text.as_bytes());
    sign_segment(license_type, &data)
}

/// Builds a correctly checksummed key around an already-encoded data segment.
pub fn sign_segment(license_type: &str, data: &str) -> String {
    let checksum = compute_checksum(TEST_SECRET, &format!("{license_type}{data}"));
    format!("MB-{license_type}-{checksum}-{data}")
}

/// Splits a key into (type, checksum, data), keeping dashes inside data.
pub fn split_key(key: &str) -> (String, String, String) {
    let parts: Vec<&str> = key.splitn(4, '-').collect();
    assert_eq!(parts.len(), 4, "not a four-segment key: {key}");
    (parts[1].to_string(), parts[2].to_string(), parts[3].to_string())
}

/// Replaces the character at `index` with a different character from the
/// same alphabet.
pub fn mutate_char(segment: &str, index: usize, alphabet: &str) -> String {
    let mut chars: Vec<char> = segment.chars().collect();
    let current = chars[index];
    chars[index] = alphabet.chars().find(|c| *c != current).unwrap();
    chars.into_iter().collect()
}

pub const HEX_ALPHABET: &str = "0123456789ABCDEF";
pub const B64URL_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
