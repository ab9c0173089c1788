//! Liveness heartbeat file.
//!
//! A monitored process periodically overwrites a small text file with either
//! `ALIVE: <ISO-8601 timestamp>` or a line starting with `CRASHED` followed
//! by diagnostic text. A checker reads the file and decides whether the
//! process is still alive.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Oldest heartbeat still considered alive.
pub const HEARTBEAT_MAX_AGE: Duration = Duration::from_secs(3);

const ALIVE_MARKER: &str = "ALIVE:";
const CRASHED_MARKER: &str = "CRASHED";

/// What a heartbeat file says about its process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum HeartbeatStatus {
    /// Recent `ALIVE` entry.
    Alive { last_seen: DateTime<Utc> },
    /// `ALIVE` entry older than the allowed age.
    Stale { last_seen: DateTime<Utc>, age_secs: i64 },
    /// The process reported a crash.
    Crashed { diagnostic: String },
    /// No heartbeat file.
    Missing,
    /// The file exists but has no parseable `ALIVE` line.
    Unreadable,
}

impl HeartbeatStatus {
    /// Returns true only for [`HeartbeatStatus::Alive`].
    #[must_use]
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive { .. })
    }
}

/// A heartbeat file at a fixed path.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    path: PathBuf,
    max_age: Duration,
}

impl Heartbeat {
    /// Heartbeat at `path` with the default maximum age.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_age: HEARTBEAT_MAX_AGE,
        }
    }

    /// Overrides the maximum age of a live heartbeat.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Path of the heartbeat file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes an `ALIVE` entry stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the file cannot be written.
    pub fn write_alive(&self) -> LicenseResult<()> {
        self.write_alive_at(Utc::now())
    }

    /// Writes an `ALIVE` entry stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the file cannot be written.
    pub fn write_alive_at(&self, now: DateTime<Utc>) -> LicenseResult<()> {
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.write(&format!("{ALIVE_MARKER} {stamp}"))
    }

    /// Writes a `CRASHED` entry with diagnostic text.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the file cannot be written.
    pub fn write_crashed(&self, diagnostic: &str) -> LicenseResult<()> {
        self.write(&format!("{CRASHED_MARKER}: {diagnostic}"))
    }

    fn write(&self, contents: &str) -> LicenseResult<()> {
        fs::write(&self.path, contents).map_err(|e| {
            LicenseError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }

    /// Checks the heartbeat against the current time.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] for I/O failures other than a missing file.
    pub fn check(&self) -> LicenseResult<HeartbeatStatus> {
        self.check_at(Utc::now())
    }

    /// Checks the heartbeat against `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] for I/O failures other than a missing file.
    pub fn check_at(&self, now: DateTime<Utc>) -> LicenseResult<HeartbeatStatus> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HeartbeatStatus::Missing),
            Err(e) => {
                return Err(LicenseError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let status = parse_status(&contents, now, self.max_age);
        debug!(path = %self.path.display(), ?status, "checked heartbeat");
        Ok(status)
    }
}

/// Interprets heartbeat file contents at `now`.
#[must_use]
pub fn parse_status(contents: &str, now: DateTime<Utc>, max_age: Duration) -> HeartbeatStatus {
    if let Some(rest) = contents.strip_prefix(CRASHED_MARKER) {
        let diagnostic = rest.trim_start_matches(':').trim().to_string();
        return HeartbeatStatus::Crashed { diagnostic };
    }

    let Some(last_seen) = contents.lines().find_map(|line| {
        let stamp = line.trim().strip_prefix(ALIVE_MARKER)?;
        DateTime::parse_from_rfc3339(stamp.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }) else {
        return HeartbeatStatus::Unreadable;
    };

    let age = now - last_seen;
    let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
    if age > max_age {
        HeartbeatStatus::Stale {
            last_seen,
            age_secs: age.num_seconds(),
        }
    } else {
        HeartbeatStatus::Alive { last_seen }
    }
}
