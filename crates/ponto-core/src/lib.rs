#![warn(missing_docs)]
//! # ponto-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `ponto-clock` workspace.
//!
//! ## Responsibilities
//! - Represent the selectable function codes and the virtual clock catalog.
//! - Hold the mutable session state edited by the session controller.
//! - Keep the captcha answer consistent with the captcha image it answers.
//! - Provide the display clock value advanced by the one-second ticker.
//!
//! ## Data flow
//! The controller owns one [`SessionState`]. Field edits mutate it directly,
//! remote loads replace [`DeviceCapabilities`] and the [`CaptchaChallenge`]
//! image, and the ticker advances the shared [`DisplayClock`].
//!
//! ## Ownership and lifetimes
//! All state values own their strings so snapshots can be cloned out to the
//! presentation layer without borrowing the controller.
//!
//! ## Error model
//! Parsing user-entered codes and device ids fails with [`CoreError`].
//!
//! ## Security and privacy notes
//! [`Credentials`] never prints its password through `Debug`.
//!
//! ## Example
//! ```rust
//! use ponto_core::{CaptchaChallenge, FunctionCode};
//!
//! let code: FunctionCode = "2".parse().expect("known code");
//! assert_eq!(code.code(), "2");
//!
//! let mut captcha = CaptchaChallenge::default();
//! captcha.set_answer("ab12");
//! captcha.replace_image("data:image/png;base64,AAAA");
//! assert!(captcha.answer().is_empty());
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Local, NaiveDateTime};
use thiserror::Error;

/// Device queried when the session starts.
pub const DEFAULT_DEVICE_ID: u32 = 8002;

/// Image shown before the first captcha arrives (1x1 transparent PNG).
pub const PLACEHOLDER_CAPTCHA_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Function performed by the mark-point request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FunctionCode {
    /// `1 - Ponto Eletrônico`: regular clock in/out.
    #[default]
    ElectronicPoint,
    /// `2 - Pausa NR Call Center`: regulated call-center break.
    CallCenterBreak,
}

impl FunctionCode {
    /// Every selectable function, in picker order.
    pub const ALL: [FunctionCode; 2] = [
        FunctionCode::ElectronicPoint,
        FunctionCode::CallCenterBreak,
    ];

    /// Wire code sent to the timekeeping API.
    pub fn code(self) -> &'static str {
        match self {
            FunctionCode::ElectronicPoint => "1",
            FunctionCode::CallCenterBreak => "2",
        }
    }

    /// Picker label.
    pub fn label(self) -> &'static str {
        match self {
            FunctionCode::ElectronicPoint => "1 - Ponto Eletrônico",
            FunctionCode::CallCenterBreak => "2 - Pausa NR Call Center",
        }
    }
}

impl FromStr for FunctionCode {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        FunctionCode::ALL
            .into_iter()
            .find(|function| function.code() == trimmed)
            .ok_or_else(|| CoreError::UnknownFunction(trimmed.to_string()))
    }
}

/// One remote-configured time-clock terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualClock {
    /// Numeric device identifier used by every remote call.
    pub device_id: u32,
    /// Region title shown above the clock.
    pub title: &'static str,
}

/// Devices offered to the user, by region.
pub const VIRTUAL_CLOCKS: [VirtualClock; 4] = [
    VirtualClock {
        device_id: 8002,
        title: "Horário de Brasília",
    },
    VirtualClock {
        device_id: 8003,
        title: "UTC-4 (Horario Amazonia)",
    },
    VirtualClock {
        device_id: 8009,
        title: "UTC-2 (Horario Ilhas)",
    },
    VirtualClock {
        device_id: 8010,
        title: "UTC-5 (Horario Acre)",
    },
];

/// Looks up a catalog device by id.
///
/// # Errors
/// Returns [`CoreError::UnknownDevice`] for ids outside [`VIRTUAL_CLOCKS`].
pub fn find_virtual_clock(device_id: u32) -> Result<VirtualClock, CoreError> {
    VIRTUAL_CLOCKS
        .iter()
        .find(|clock| clock.device_id == device_id)
        .copied()
        .ok_or(CoreError::UnknownDevice(device_id))
}

/// Flags reported by the device-info endpoint.
///
/// Informational only; the client does not enforce them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceCapabilities {
    /// Badge number is required.
    pub cracha: bool,
    /// Username and password are required.
    pub user_pwd: bool,
    /// Leave selector is enabled.
    pub leave: bool,
    /// Cost-center selector is enabled.
    pub cost_center: bool,
    /// Function selector is enabled.
    pub function: bool,
}

/// User-entered login credentials.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Server-issued captcha image plus the answer typed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaChallenge {
    image_source: String,
    answer: String,
}

impl CaptchaChallenge {
    /// Image URI (HTTP URL or base64 data URI).
    pub fn image_source(&self) -> &str {
        &self.image_source
    }

    /// Answer typed by the user for the current image.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Updates the typed answer.
    pub fn set_answer(&mut self, answer: impl Into<String>) {
        self.answer = answer.into();
    }

    /// Swaps in a new image.
    ///
    /// The previous answer belonged to the previous image, so it is cleared.
    pub fn replace_image(&mut self, image_source: impl Into<String>) {
        self.image_source = image_source.into();
        self.answer.clear();
    }
}

impl Default for CaptchaChallenge {
    fn default() -> Self {
        Self {
            image_source: PLACEHOLDER_CAPTCHA_IMAGE.to_string(),
            answer: String::new(),
        }
    }
}

/// Message severity reported by the mark-point endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// `tmNormal` (0).
    #[default]
    Normal,
    /// `tmOk` (1).
    Ok,
    /// `tmErro` (2).
    Error,
    /// `tmAtencao` (3).
    Warning,
}

impl Severity {
    /// Maps a wire code; unknown codes fall back to [`Severity::Normal`].
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Severity::Ok,
            2 => Severity::Error,
            3 => Severity::Warning,
            _ => Severity::Normal,
        }
    }

    /// Wire code for this severity.
    pub fn code(self) -> i64 {
        match self {
            Severity::Normal => 0,
            Severity::Ok => 1,
            Severity::Error => 2,
            Severity::Warning => 3,
        }
    }
}

/// Progress of the device-info and captcha loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A load is in flight.
    Loading,
    /// Last load completed.
    Healthy,
    /// Last load failed; state kept its previous values.
    Degraded,
}

/// Wall-clock value shown on screen.
///
/// Ticks only move forward. [`DisplayClock::resync`] replaces the value with
/// the device-reported time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayClock {
    now: NaiveDateTime,
}

impl DisplayClock {
    /// Creates a clock showing `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Creates a clock from the local wall clock.
    pub fn from_local_now() -> Self {
        Self::new(Local::now().naive_local())
    }

    /// Current displayed time.
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Advances by exactly one second.
    pub fn tick(&mut self) {
        self.advance(1);
    }

    /// Advances by `seconds` seconds, saturating at the calendar limit.
    pub fn advance(&mut self, seconds: u32) {
        if let Some(next) = self
            .now
            .checked_add_signed(Duration::seconds(i64::from(seconds)))
        {
            self.now = next;
        }
    }

    /// Replaces the displayed time with the device-reported one.
    pub fn resync(&mut self, device_time: NaiveDateTime) {
        self.now = device_time;
    }
}

/// Mutable state of one clock-in session.
///
/// The display clock is not part of this record: it is shared with the
/// ticker and owned separately by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Function sent with the next mark-point request.
    pub selected_function: FunctionCode,
    /// Virtual clock device queried and marked against.
    pub device_id: u32,
    /// Username/password fields.
    pub credentials: Credentials,
    /// Whether credentials are persisted locally.
    pub remember_credentials: bool,
    /// Whether the password field is masked.
    pub password_hidden: bool,
    /// Current captcha image and typed answer.
    pub captcha: CaptchaChallenge,
    /// Last capability flags reported by the device.
    pub capabilities: DeviceCapabilities,
    /// Outcome of the last device-info/captcha load.
    pub load_status: LoadStatus,
}

impl SessionState {
    /// Creates the initial state for `device_id`.
    pub fn new(device_id: u32) -> Self {
        Self {
            selected_function: FunctionCode::default(),
            device_id,
            credentials: Credentials::default(),
            remember_credentials: false,
            password_hidden: true,
            captcha: CaptchaChallenge::default(),
            capabilities: DeviceCapabilities::default(),
            load_status: LoadStatus::default(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_ID)
    }
}

/// Error type for core model parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Function code is not one of [`FunctionCode::ALL`].
    #[error("unknown function code: {0:?}")]
    UnknownFunction(String),
    /// Device id is not in [`VIRTUAL_CLOCKS`].
    #[error("unknown virtual clock device: {0}")]
    UnknownDevice(u32),
}
