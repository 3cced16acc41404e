#![warn(missing_docs)]
//! # ponto-ui
//!
//! ## Purpose
//! Defines the presentation-facing model of the clock-in screen.
//!
//! ## Responsibilities
//! - Build alerts from server messages, including the title-by-severity rule
//!   and the localized message rewrites.
//! - Format the display clock the way the screen shows it.
//! - Project [`SessionState`] into a flat, display-safe [`ScreenView`].
//!
//! ## Data flow
//! Controller state + display clock -> [`project_screen`] -> shell renderer.
//! Submit outcomes -> [`Alert::from_message`] -> [`AlertPresenter`].
//!
//! ## Error model
//! Pure projections; nothing here fails.
//!
//! ## Security and privacy notes
//! [`ScreenView`] masks the password while `password_hidden` is set and never
//! carries it otherwise than as typed by the user.

use chrono::NaiveDateTime;
use ponto_core::{FunctionCode, LoadStatus, SessionState, Severity, VIRTUAL_CLOCKS};

/// Fixed replacement for server messages about bad credentials.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Usuário e/ou Senha Inválidos!";

const INVALID_CREDENTIALS_MARKER: &str = "Usuário / Senha";

/// Modal alert shown after a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Title derived from the severity.
    pub title: String,
    /// Message body after rewrites.
    pub body: String,
    /// Severity the alert was raised with.
    pub severity: Severity,
}

impl Alert {
    /// Builds an alert from a raw server message.
    pub fn from_message(message: &str, severity: Severity) -> Self {
        Self {
            title: alert_title(severity).to_string(),
            body: rewrite_message(message),
            severity,
        }
    }
}

/// Receives alerts raised by the controller.
///
/// Dismissing an alert has no further effect on the session.
pub trait AlertPresenter: Send + Sync {
    /// Shows one alert.
    fn present(&self, alert: &Alert);
}

/// Title shown for a severity.
pub fn alert_title(severity: Severity) -> &'static str {
    match severity {
        Severity::Ok => "Sucesso",
        Severity::Error => "Erro",
        Severity::Warning | Severity::Normal => "Atenção",
    }
}

/// Collapses messages about the username/password pair into
/// [`INVALID_CREDENTIALS_MESSAGE`]; other messages pass through.
pub fn rewrite_message(message: &str) -> String {
    if message.contains(INVALID_CREDENTIALS_MARKER) {
        return INVALID_CREDENTIALS_MESSAGE.to_string();
    }
    message.to_string()
}

/// Rewords a rejection error: the server calls the captcha `Texto`.
pub fn reword_rejection(error: &str) -> String {
    error.replacen("Texto", "O Captcha", 1)
}

/// Clock formatted as (`DD/MM/YYYY`, `HH:mm:ss`).
pub fn format_clock(now: NaiveDateTime) -> (String, String) {
    (
        now.format("%d/%m/%Y").to_string(),
        now.format("%H:%M:%S").to_string(),
    )
}

/// Flat projection of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenView {
    /// Region title of the selected device.
    pub clock_title: String,
    /// `DD/MM/YYYY - HH:mm:ss`.
    pub clock_text: String,
    /// Picker label of the selected function.
    pub function_label: String,
    /// Username as typed.
    pub username: String,
    /// Password as typed, or one `*` per character while hidden.
    pub password: String,
    /// Remember-credentials checkbox.
    pub remember_credentials: bool,
    /// Current captcha image URI.
    pub captcha_image: String,
    /// Captcha answer as typed.
    pub captcha_answer: String,
    /// Load status line.
    pub load_status: String,
}

/// Projects session state and the display clock into a [`ScreenView`].
pub fn project_screen(state: &SessionState, now: NaiveDateTime) -> ScreenView {
    let (date, time) = format_clock(now);
    let clock_title = VIRTUAL_CLOCKS
        .iter()
        .find(|clock| clock.device_id == state.device_id)
        .map(|clock| clock.title.to_string())
        .unwrap_or_else(|| format!("Relógio {}", state.device_id));

    let password = if state.password_hidden {
        "*".repeat(state.credentials.password.chars().count())
    } else {
        state.credentials.password.clone()
    };

    ScreenView {
        clock_title,
        clock_text: format!("{date} - {time}"),
        function_label: state.selected_function.label().to_string(),
        username: state.credentials.username.clone(),
        password,
        remember_credentials: state.remember_credentials,
        captcha_image: state.captcha.image_source().to_string(),
        captcha_answer: state.captcha.answer().to_string(),
        load_status: load_status_text(state.load_status).to_string(),
    }
}

/// Picker entries as (`code`, `label`).
pub fn function_options() -> Vec<(&'static str, &'static str)> {
    FunctionCode::ALL
        .iter()
        .map(|function| (function.code(), function.label()))
        .collect()
}

fn load_status_text(status: LoadStatus) -> &'static str {
    match status {
        LoadStatus::Idle => "Aguardando",
        LoadStatus::Loading => "Carregando",
        LoadStatus::Healthy => "Conectado",
        LoadStatus::Degraded => "Falha ao carregar; use reload para tentar novamente",
    }
}
