//! Command-line parsing and validation helpers.

use crate::scan::{GuideMode, ScanTiming, DEFAULT_SCAN_DELAY_MS, DEFAULT_SCAN_GAP_MS};
use anyhow::{bail, Result};
use clap::Parser;
use std::{env, path::PathBuf};

const DEFAULT_POLL_MS: u64 = 25;
const DEFAULT_COMMENT_PREFIX: &str = "//";
const MAX_COMMENT_PREFIX_LEN: usize = 8;

/// CLI options for the pupil-shell session process. Validated values keep the
/// timer loops and the preference file sane.
#[derive(Debug, Parser, Clone)]
#[command(about = "Pupil editor session shell", author, version)]
pub struct AppConfig {
    /// Preference file location
    #[arg(long, default_value_os_t = default_prefs_file())]
    pub prefs_file: PathBuf,

    /// Scan highlight dwell time (milliseconds)
    #[arg(long = "scan-delay-ms", default_value_t = DEFAULT_SCAN_DELAY_MS)]
    pub scan_delay_ms: u64,

    /// Pause between scan highlights (milliseconds)
    #[arg(long = "scan-gap-ms", default_value_t = DEFAULT_SCAN_GAP_MS)]
    pub scan_gap_ms: u64,

    /// Regions visited by the section guide
    #[arg(long = "guide-mode", value_enum, default_value = "both")]
    pub guide_mode: GuideMode,

    /// Line comment prefix used by the comment toggle
    #[arg(long = "comment-prefix", default_value = DEFAULT_COMMENT_PREFIX)]
    pub comment_prefix: String,

    /// Main loop poll interval (milliseconds)
    #[arg(long = "poll-ms", default_value_t = DEFAULT_POLL_MS)]
    pub poll_ms: u64,

    /// Enable verbose timing logs
    #[arg(long)]
    pub log_timings: bool,
}

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values before the session starts.
    pub(crate) fn validate(&self) -> Result<()> {
        if !(50..=10_000).contains(&self.scan_delay_ms) {
            bail!(
                "--scan-delay-ms must be between 50 and 10000, got {}",
                self.scan_delay_ms
            );
        }
        if !(10..=5_000).contains(&self.scan_gap_ms) {
            bail!(
                "--scan-gap-ms must be between 10 and 5000, got {}",
                self.scan_gap_ms
            );
        }
        if !(5..=1_000).contains(&self.poll_ms) {
            bail!("--poll-ms must be between 5 and 1000, got {}", self.poll_ms);
        }

        let prefix = self.comment_prefix.as_str();
        if prefix.is_empty() {
            bail!("--comment-prefix cannot be empty");
        }
        if prefix.len() > MAX_COMMENT_PREFIX_LEN {
            bail!("--comment-prefix must be at most {MAX_COMMENT_PREFIX_LEN} bytes");
        }
        if prefix.chars().any(char::is_whitespace) {
            bail!("--comment-prefix cannot contain whitespace");
        }

        if self.prefs_file.as_os_str().is_empty() {
            bail!("--prefs-file cannot be empty");
        }

        Ok(())
    }

    /// Scan timing assembled from the CLI values.
    pub fn scan_timing(&self) -> ScanTiming {
        ScanTiming::from_millis(self.scan_delay_ms, self.scan_gap_ms)
    }
}

/// Default preference file next to the other per-user temp state.
fn default_prefs_file() -> PathBuf {
    env::temp_dir().join("pupil_shell_prefs.json")
}
