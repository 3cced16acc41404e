#![warn(missing_docs)]
//! # ponto-app
//!
//! ## Purpose
//! Orchestrates one electronic time-clock session: device info, captcha,
//! saved credentials, the live display clock and the mark-point submit.
//!
//! ## Responsibilities
//! - Own [`SessionState`](ponto_core::SessionState) and sequence every
//!   operation on it through [`SessionController`].
//! - Run the display clock on a cancellable [`Ticker`].
//! - Apply the configured [`PersistencePolicy`] to the saved-credentials
//!   record.
//! - Turn mark-point responses into alerts for the injected presenter.
//!
//! ## Data flow
//! Shell command -> [`SessionController`] -> API client / preference store ->
//! state update -> alert presenter and screen projection.
//!
//! ## Ownership and lifetimes
//! The controller owns its state outright. The display clock is the only
//! shared value; the ticker thread holds the other handle and is joined on
//! shutdown or drop.
//!
//! ## Error model
//! Load and submit failures are logged and folded into state
//! (`load_status`, [`SubmitOutcome::Failed`]). [`AppError`] covers the
//! remaining hard failures: bad configuration and ticker spawn.
//!
//! ## Security and privacy notes
//! - Passwords and captcha answers are never logged.
//! - Error details pass through [`redact_sensitive`] before they reach logs.

mod controller;
mod ticker;

use std::str::FromStr;
use std::time::Duration;

use ponto_api::ApiError;
use ponto_core::{CoreError, DEFAULT_DEVICE_ID};
use ponto_prefs::PrefsError;
use thiserror::Error;

pub use controller::{SessionController, SubmitFailure, SubmitOutcome};
pub use ticker::{SharedClock, Ticker};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("PONTO_CLOCK_VERSION");

/// Default display-clock tick interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// When the saved-credentials record is written or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistencePolicy {
    /// Immediately on every remember-credentials toggle, and again on submit.
    #[default]
    OnToggle,
    /// Only on submit.
    OnSubmit,
}

impl FromStr for PersistencePolicy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "on-toggle" => Ok(PersistencePolicy::OnToggle),
            "on-submit" => Ok(PersistencePolicy::OnSubmit),
            other => Err(AppError::InvalidConfig(format!(
                "unknown persistence policy {other:?}"
            ))),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Virtual clock selected at startup.
    pub device_id: u32,
    /// Saved-credentials write policy.
    pub persistence: PersistencePolicy,
    /// Display-clock tick interval.
    pub tick_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID,
            persistence: PersistencePolicy::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

const SENSITIVE_KEYS: [&str; 5] = ["password", "pass", "captcha", "token", "authorization"];

/// Redacts values assigned to secret-looking keys (`pass=...`,
/// `password: ...`) in log-safe output.
pub fn redact_sensitive(input: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `input`.
    let lower = input.to_ascii_lowercase();
    let mut redacted = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some((value_start, value_end)) = next_secret(&lower, cursor) {
        redacted.push_str(&input[cursor..value_start]);
        redacted.push_str("<redacted>");
        cursor = value_end;
    }

    redacted.push_str(&input[cursor..]);
    redacted
}

fn next_secret(lower: &str, from: usize) -> Option<(usize, usize)> {
    SENSITIVE_KEYS
        .iter()
        .filter_map(|key| find_assignment(lower, from, key))
        .min_by_key(|(value_start, _)| *value_start)
}

fn find_assignment(lower: &str, from: usize, key: &str) -> Option<(usize, usize)> {
    let mut search = from;
    while let Some(offset) = lower[search..].find(key) {
        let start = search + offset;
        let after_key = start + key.len();
        let at_boundary = lower[..start]
            .chars()
            .next_back()
            .is_none_or(|previous| !previous.is_ascii_alphanumeric() && previous != '_');

        if at_boundary && matches!(lower[after_key..].chars().next(), Some('=' | ':')) {
            let rest = &lower[after_key + 1..];
            let value_start = after_key + 1 + (rest.len() - rest.trim_start().len());
            let value_end = lower[value_start..]
                .find(|c: char| c.is_whitespace() || matches!(c, '&' | ',' | ';'))
                .map_or(lower.len(), |end| value_start + end);
            return Some((value_start, value_end));
        }

        search = after_key;
    }
    None
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration value rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Core model error (unknown device or function).
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// API client error.
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    /// Preference store error.
    #[error("preference error: {0}")]
    Prefs(#[from] PrefsError),
    /// Ticker thread could not be spawned.
    #[error("failed to spawn ticker thread: {0}")]
    TickerSpawn(#[source] std::io::Error),
}
