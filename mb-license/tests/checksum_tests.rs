use mb_license::{compute_checksum, ChecksumEngine, CHECKSUM_MAX_LEN, DEFAULT_SECRET};

// ── Fixed vectors ────────────────────────────────────────────────

#[test]
fn empty_input_is_zero() {
    assert_eq!(compute_checksum("", ""), "0");
}

#[test]
fn single_char_is_its_code_point() {
    assert_eq!(compute_checksum("", "a"), "61");
}

#[test]
fn rolling_hash_over_short_message() {
    // 97 → 97*31+98 = 3105 → 3105*31+99 = 96354 = 0x17862
    assert_eq!(compute_checksum("", "abc"), "17862");
}

#[test]
fn secret_is_prepended() {
    assert_eq!(compute_checksum("secret", "hello"), "78DC87DE");
    assert_eq!(compute_checksum("", "secrethello"), "78DC87DE");
}

#[test]
fn wraps_at_32_bits() {
    assert_eq!(compute_checksum("", "hello world"), "6AEFE2C4");
}

#[test]
fn negative_accumulator_uses_absolute_value() {
    // Accumulator ends at -1910022912.
    assert_eq!(compute_checksum("", "zzzzzzzz"), "71D8A300");
}

#[test]
fn short_checksums_are_not_padded() {
    assert_eq!(compute_checksum("", "license"), "9F08441");
    assert_eq!(compute_checksum("", "AAa"), "FC41");
}

#[test]
fn default_secret_vectors() {
    assert_eq!(compute_checksum(DEFAULT_SECRET, ""), "3A391A0C");
    assert_eq!(compute_checksum(DEFAULT_SECRET, "PREMIUMabc"), "7CA51C41");
    assert_eq!(compute_checksum(DEFAULT_SECRET, "TRIALabc"), "4FC8D860");
}

#[test]
fn output_is_uppercase_hex_within_length() {
    for message in ["", "x", "PREMIUMeyJ2ZXJzaW9uIjoiMS4wIn0", "ünïcödé"] {
        let digest = compute_checksum("k", message);
        assert!(!digest.is_empty());
        assert!(digest.len() <= CHECKSUM_MAX_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }
}

// ── ChecksumEngine ───────────────────────────────────────────────

#[test]
fn engine_is_deterministic() {
    let engine = ChecksumEngine::new("s");
    assert_eq!(engine.compute("message"), engine.compute("message"));
}

#[test]
fn engine_matches_free_function() {
    let engine = ChecksumEngine::new("secret");
    assert_eq!(engine.compute("hello"), compute_checksum("secret", "hello"));
}

#[test]
fn default_engine_uses_default_secret() {
    assert_eq!(
        ChecksumEngine::default().compute("abc"),
        compute_checksum(DEFAULT_SECRET, "abc")
    );
}

#[test]
fn different_secrets_differ() {
    let a = ChecksumEngine::new("one");
    let b = ChecksumEngine::new("two");
    assert_ne!(a.compute("PREMIUMdata"), b.compute("PREMIUMdata"));
}

#[test]
fn verify_accepts_exact_digest() {
    let engine = ChecksumEngine::new("secret");
    assert!(engine.verify("hello", "78DC87DE"));
}

#[test]
fn verify_is_case_sensitive() {
    let engine = ChecksumEngine::new("secret");
    assert!(!engine.verify("hello", "78dc87de"));
}

#[test]
fn verify_rejects_zero_padding() {
    let engine = ChecksumEngine::new("");
    assert!(engine.verify("AAa", "FC41"));
    assert!(!engine.verify("AAa", "0000FC41"));
}

#[test]
fn debug_redacts_secret() {
    let engine = ChecksumEngine::new("super-secret-value");
    let debug = format!("{engine:?}");
    assert!(!debug.contains("super-secret-value"));
}
