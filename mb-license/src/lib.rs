//! License keys for MB.
//!
//! This crate handles:
//! - Issuing `MB-{TYPE}-{CHECKSUM}-{PAYLOAD}` license keys
//! - Parsing and validating keys, including tamper detection
//! - Client-side trial expiry checks
//! - The liveness heartbeat file format
//!
//! # Security
//!
//! The checksum is a keyed 32-bit rolling hash, not a signature. It catches
//! corrupted or hand-edited keys, nothing more. Anyone holding the secret and
//! the algorithm can mint keys.
//!
//! # Example
//!
//! ```
//! use mb_license::{ChecksumEngine, GenerateOptions, LicenseKeyService, LicenseType};
//!
//! let service = LicenseKeyService::new(ChecksumEngine::new("example-secret"));
//! let key = service.generate(LicenseType::Trial, GenerateOptions::trial(30)).unwrap();
//!
//! let result = service.validate(&key);
//! assert!(result.valid);
//! assert_eq!(result.license_type.as_deref(), Some("trial"));
//! ```

mod checksum;
pub mod codec;
mod error;
mod heartbeat;
mod key;
mod payload;

pub use checksum::{compute_checksum, ChecksumEngine, CHECKSUM_MAX_LEN, DEFAULT_SECRET};
pub use error::{DecodeError, LicenseError, LicenseResult};
pub use heartbeat::{parse_status, Heartbeat, HeartbeatStatus, HEARTBEAT_MAX_AGE};
pub use key::{
    GenerateOptions, LicenseKey, LicenseKeyService, LicenseStatus, LicenseType, ValidationResult,
    DEFAULT_BATCH_COUNT, DEFAULT_TRIAL_DAYS, KEY_PREFIX, SEPARATOR,
};
pub use payload::{trial_expiry, LicensePayload, PAYLOAD_VERSION, RESERVED_FIELDS};
