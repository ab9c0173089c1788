//! Keyed rolling-hash checksum used to detect corrupted or edited keys.
//!
//! This is not a MAC. It is a 32-bit `hash * 31 + c` rolling hash over
//! `secret + message`, rendered as unpadded upper-case hex. Issued keys
//! depend on the exact output, including its variable length.

/// Shared secret used when no other secret is configured.
pub const DEFAULT_SECRET: &str = "mb-license-secret-v1";

/// Maximum number of hex digits in a checksum.
pub const CHECKSUM_MAX_LEN: usize = 8;

/// Computes the checksum of `message` keyed by `secret`.
///
/// Arithmetic wraps at 32 bits. The absolute value of the accumulator is
/// printed without zero padding, so short checksums are valid output.
#[must_use]
pub fn compute_checksum(secret: &str, message: &str) -> String {
    let acc = secret.chars().chain(message.chars()).fold(0i32, |acc, c| {
        acc.wrapping_shl(5)
            .wrapping_sub(acc)
            .wrapping_add(c as i32)
    });

    let mut digest = format!("{:X}", acc.unsigned_abs());
    digest.truncate(CHECKSUM_MAX_LEN);
    digest
}

/// Computes and verifies checksums with an injected secret.
#[derive(Clone)]
pub struct ChecksumEngine {
    secret: String,
}

impl ChecksumEngine {
    /// Creates an engine keyed by `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Returns the checksum of `message`.
    #[must_use]
    pub fn compute(&self, message: &str) -> String {
        compute_checksum(&self.secret, message)
    }

    /// Returns true if `candidate` is exactly the checksum of `message`.
    ///
    /// The comparison is case-sensitive: `"abc"` never matches `"ABC"`.
    #[must_use]
    pub fn verify(&self, message: &str, candidate: &str) -> bool {
        self.compute(message) == candidate
    }
}

impl Default for ChecksumEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET)
    }
}

// Keep the secret out of logs and panic messages.
impl std::fmt::Debug for ChecksumEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumEngine")
            .field("secret", &"<redacted>")
            .finish()
    }
}
