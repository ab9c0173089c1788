//! Command-line surface for MB license keys.
//!
//! Each command renders its result into a [`Report`] instead of printing, so
//! the binary decides where output goes and which exit code to use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use mb_license::{
    ChecksumEngine, GenerateOptions, Heartbeat, HeartbeatStatus, LicenseError, LicenseKeyService,
    LicenseStatus, LicenseType, DEFAULT_BATCH_COUNT, DEFAULT_SECRET, DEFAULT_TRIAL_DAYS,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "mb-keygen")]
#[command(version, about = "Generate and validate MB license keys")]
pub struct Cli {
    /// Shared checksum secret
    #[arg(
        long,
        global = true,
        env = "MB_LICENSE_SECRET",
        default_value = DEFAULT_SECRET,
        hide_default_value = true,
        hide_env_values = true
    )]
    pub secret: String,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a single license key
    Generate {
        /// License type (PREMIUM or TRIAL)
        #[arg(default_value = "PREMIUM")]
        license_type: String,

        /// Trial length in days (TRIAL only)
        #[arg(default_value_t = DEFAULT_TRIAL_DAYS)]
        trial_days: u32,
    },
    /// Validate a license key and show its payload
    Validate {
        /// The license key to check
        key: String,
    },
    /// Generate a mix of PREMIUM and 14-day TRIAL keys
    Batch {
        /// Number of keys to generate
        #[arg(default_value_t = DEFAULT_BATCH_COUNT)]
        count: usize,
    },
    /// Check a liveness heartbeat file
    Heartbeat {
        /// Path to the heartbeat file
        path: PathBuf,

        /// Oldest ALIVE entry still considered alive, in seconds
        #[arg(long, default_value_t = 3)]
        max_age_secs: u64,
    },
}

/// Rendered command output and whether the command succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub output: String,
    pub success: bool,
}

impl Report {
    fn ok(output: String) -> Self {
        Self { output, success: true }
    }

    fn failed(output: String) -> Self {
        Self { output, success: false }
    }
}

/// Runs the parsed command line.
///
/// # Errors
///
/// Fails on an unusable license type, or when the heartbeat file cannot be read.
pub fn run(cli: &Cli) -> Result<Report> {
    let service = LicenseKeyService::new(ChecksumEngine::new(cli.secret.as_str()));

    match &cli.command {
        None => Ok(Report::ok(Cli::command().render_help().to_string())),
        Some(Command::Generate { license_type, trial_days }) => {
            generate(&service, license_type, *trial_days).map(Report::ok)
        }
        Some(Command::Validate { key }) => Ok(validate(&service, key)),
        Some(Command::Batch { count }) => batch(&service, *count).map(Report::ok),
        Some(Command::Heartbeat { path, max_age_secs }) => {
            heartbeat(path, Duration::from_secs(*max_age_secs))
        }
    }
}

/// Parses a license type given on the command line and checks it can be issued.
///
/// # Errors
///
/// Returns [`LicenseError::InvalidType`] for anything but PREMIUM or TRIAL.
pub fn issuable_type(arg: &str) -> Result<LicenseType, LicenseError> {
    let license_type: LicenseType = arg.parse()?;
    if !license_type.is_issuable() {
        return Err(LicenseError::InvalidType(arg.to_string()));
    }
    Ok(license_type)
}

/// Generates one key and describes it.
///
/// # Errors
///
/// Fails if `type_arg` is not PREMIUM or TRIAL, or if the trial expiry is
/// out of range.
pub fn generate(service: &LicenseKeyService, type_arg: &str, trial_days: u32) -> Result<String> {
    let license_type = issuable_type(type_arg).context("expected PREMIUM or TRIAL")?;
    let options = match license_type {
        LicenseType::Trial => GenerateOptions::trial(trial_days),
        _ => GenerateOptions::default(),
    };
    let key = service.generate(license_type, options)?;
    info!(license_type = %license_type, "issued license key");

    let mut out = format!("Generated {license_type} license key:\n{key}\nType: {license_type}\n");
    if license_type == LicenseType::Trial {
        out.push_str(&format!("Trial length: {trial_days} days\n"));
    }
    Ok(out)
}

/// Validates a key and describes the outcome.
///
/// Surrounding whitespace from copy-paste or shell quoting is stripped here,
/// before the key reaches the parser.
#[must_use]
pub fn validate(service: &LicenseKeyService, key: &str) -> Report {
    let parsed = match service.parse(key.trim()) {
        Ok(parsed) => parsed,
        Err(err) => return Report::failed(format!("Valid: false\nReason: {err}\n")),
    };

    let now = Utc::now();
    let status = match (parsed.status_at(now), parsed.payload().days_remaining_at(now)) {
        (LicenseStatus::Expired, _) => "expired".to_string(),
        (LicenseStatus::Active, Some(days)) => format!("active ({days} days remaining)"),
        (LicenseStatus::Active, None) => "active".to_string(),
    };
    let payload = serde_json::to_string_pretty(parsed.payload())
        .unwrap_or_else(|e| format!("<unprintable payload: {e}>"));

    Report::ok(format!(
        "Valid: true\nType: {}\nStatus: {status}\nPayload:\n{payload}\n",
        parsed.license_type()
    ))
}

/// Generates `ceil(count / 2)` PREMIUM and `floor(count / 2)` TRIAL keys.
///
/// # Errors
///
/// Propagates generation failures.
pub fn batch(service: &LicenseKeyService, count: usize) -> Result<String> {
    let keys = service.batch(count)?;
    info!(count = keys.len(), "issued license key batch");

    let mut out = format!("Generating {count} license keys:\n");
    for (i, (license_type, key)) in keys.iter().enumerate() {
        out.push_str(&format!("{}. [{license_type}] {key}\n", i + 1));
    }
    Ok(out)
}

/// Checks a heartbeat file. Only a live process counts as success.
///
/// # Errors
///
/// Fails if the file exists but cannot be read.
pub fn heartbeat(path: &Path, max_age: Duration) -> Result<Report> {
    let status = Heartbeat::new(path).with_max_age(max_age).check()?;
    let line = match &status {
        HeartbeatStatus::Alive { last_seen } => format!("alive (last seen {last_seen})"),
        HeartbeatStatus::Stale { last_seen, age_secs } => {
            format!("dead: last heartbeat {age_secs}s ago at {last_seen}")
        }
        HeartbeatStatus::Crashed { diagnostic } => format!("crashed: {diagnostic}"),
        HeartbeatStatus::Missing => format!("dead: no heartbeat file at {}", path.display()),
        HeartbeatStatus::Unreadable => "dead: heartbeat file has no ALIVE entry".to_string(),
    };
    let output = format!("{line}\n");
    Ok(if status.is_alive() {
        Report::ok(output)
    } else {
        Report::failed(output)
    })
}
