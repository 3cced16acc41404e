use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDateTime;
use ponto_api::{ApiError, ClockApiClient, MarkPointResponse};
use ponto_core::{
    DisplayClock, FunctionCode, LoadStatus, SessionState, Severity, find_virtual_clock,
};
use ponto_prefs::{
    PreferenceStore, UserPreferences, load_preferences, reset_preferences, save_preferences,
};
use ponto_ui::{Alert, AlertPresenter, ScreenView, project_screen, reword_rejection};
use tracing::{debug, info, warn};

use crate::ticker::{SharedClock, Ticker};
use crate::{AppConfig, AppError, PersistencePolicy, redact_sensitive};

/// Path a submit took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server answered and an alert was presented.
    Presented(Alert),
    /// No alert: the request or its response failed.
    Failed(SubmitFailure),
}

/// Why a submit produced no alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitFailure {
    /// Network, TLS or HTTP status failure.
    Transport,
    /// Response body was malformed.
    Decode,
}

impl From<&ApiError> for SubmitFailure {
    fn from(error: &ApiError) -> Self {
        if error.is_transport() {
            SubmitFailure::Transport
        } else {
            SubmitFailure::Decode
        }
    }
}

/// Owns one clock-in session and sequences every operation on it.
pub struct SessionController {
    config: AppConfig,
    api: ClockApiClient,
    store: Arc<dyn PreferenceStore>,
    presenter: Arc<dyn AlertPresenter>,
    state: SessionState,
    clock: SharedClock,
    ticker: Ticker,
}

impl SessionController {
    /// Creates a controller with the display clock at the local wall time.
    ///
    /// # Errors
    /// Returns [`AppError::Core`] when the configured device is not a known
    /// virtual clock.
    pub fn new(
        config: AppConfig,
        api: ClockApiClient,
        store: Arc<dyn PreferenceStore>,
        presenter: Arc<dyn AlertPresenter>,
    ) -> Result<Self, AppError> {
        Self::with_clock(config, api, store, presenter, DisplayClock::from_local_now())
    }

    /// Creates a controller whose display clock starts at `clock`.
    ///
    /// # Errors
    /// Same as [`SessionController::new`].
    pub fn with_clock(
        config: AppConfig,
        api: ClockApiClient,
        store: Arc<dyn PreferenceStore>,
        presenter: Arc<dyn AlertPresenter>,
        clock: DisplayClock,
    ) -> Result<Self, AppError> {
        find_virtual_clock(config.device_id)?;
        let clock = Arc::new(Mutex::new(clock));
        Ok(Self {
            state: SessionState::new(config.device_id),
            ticker: Ticker::new(Arc::clone(&clock), config.tick_interval),
            clock,
            config,
            api,
            store,
            presenter,
        })
    }

    /// Loads device info and captcha, restores saved credentials, then
    /// starts the ticker.
    ///
    /// # Errors
    /// Returns [`AppError::TickerSpawn`] when the ticker thread cannot start.
    /// Load failures are not errors; they show up in
    /// [`SessionState::load_status`].
    pub fn initialize(&mut self) -> Result<(), AppError> {
        self.load_device_info_and_captcha();
        self.load_persisted_credentials();
        self.ticker.start()?;
        info!(device_id = self.state.device_id, "session initialized");
        Ok(())
    }

    /// Stops the ticker. Further ticks never happen.
    pub fn shutdown(&mut self) {
        self.ticker.stop();
        info!("session shut down");
    }

    /// Returns `true` while the ticker runs.
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Active configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current display-clock time.
    pub fn current_time(&self) -> NaiveDateTime {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner).now()
    }

    /// Display-safe projection of the screen.
    pub fn view(&self) -> ScreenView {
        project_screen(&self.state, self.current_time())
    }

    /// Sets the function sent with the next submit.
    pub fn select_function(&mut self, function: FunctionCode) {
        self.state.selected_function = function;
    }

    /// Sets the username field.
    pub fn edit_username(&mut self, text: impl Into<String>) {
        self.state.credentials.username = text.into();
    }

    /// Sets the password field.
    pub fn edit_password(&mut self, text: impl Into<String>) {
        self.state.credentials.password = text.into();
    }

    /// Sets the captcha answer field.
    pub fn edit_captcha_answer(&mut self, text: impl Into<String>) {
        self.state.captcha.set_answer(text);
    }

    /// Flips password masking and returns the new `password_hidden` value.
    pub fn toggle_password_visibility(&mut self) -> bool {
        self.state.password_hidden = !self.state.password_hidden;
        self.state.password_hidden
    }

    /// Flips "remember credentials" and returns the new value.
    ///
    /// Under [`PersistencePolicy::OnToggle`] the record is saved when the
    /// flag turns on and removed when it turns off. Under
    /// [`PersistencePolicy::OnSubmit`] nothing is written here.
    pub fn toggle_remember_credentials(&mut self) -> bool {
        self.state.remember_credentials = !self.state.remember_credentials;
        if self.config.persistence == PersistencePolicy::OnToggle {
            self.sync_preferences();
        }
        self.state.remember_credentials
    }

    /// Switches to another virtual clock and reloads device info and captcha.
    ///
    /// # Errors
    /// Returns [`AppError::Core`] for ids outside the virtual clock catalog;
    /// state is left unchanged.
    pub fn select_device(&mut self, device_id: u32) -> Result<(), AppError> {
        let clock = find_virtual_clock(device_id)?;
        self.state.device_id = clock.device_id;
        info!(device_id, title = clock.title, "virtual clock selected");
        self.load_device_info_and_captcha();
        Ok(())
    }

    /// Fetches device capabilities and clock time, then reloads the captcha
    /// whatever the device-info outcome was.
    pub fn load_device_info_and_captcha(&mut self) {
        self.state.load_status = LoadStatus::Loading;

        let device_loaded = match self.api.device_info(self.state.device_id) {
            Ok(info) => {
                self.state.capabilities = info.capabilities;
                self.clock
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .resync(info.clock_time);
                debug!(clock_time = %info.clock_time, "device clock resynced");
                true
            }
            Err(error) => {
                warn!(
                    device_id = self.state.device_id,
                    error = %redact_sensitive(&error.to_string()),
                    "device info load failed"
                );
                false
            }
        };

        let captcha_loaded = self.reload_captcha().is_ok();

        self.state.load_status = if device_loaded && captcha_loaded {
            LoadStatus::Healthy
        } else {
            LoadStatus::Degraded
        };
    }

    /// Fetches a fresh captcha; on success the image is replaced and the
    /// answer cleared.
    ///
    /// # Errors
    /// Returns the API error after logging it; the current image and answer
    /// stay as they were and the load status becomes degraded.
    pub fn reload_captcha(&mut self) -> Result<(), AppError> {
        match self.api.captcha(self.state.device_id) {
            Ok(image) => {
                self.state.captcha.replace_image(image.url_captcha);
                debug!(device_id = self.state.device_id, "captcha replaced");
                Ok(())
            }
            Err(error) => {
                warn!(
                    device_id = self.state.device_id,
                    error = %redact_sensitive(&error.to_string()),
                    "captcha load failed"
                );
                self.state.load_status = LoadStatus::Degraded;
                Err(error.into())
            }
        }
    }

    /// Restores username, password and the remember flag from the saved
    /// record. Missing or unreadable records are ignored.
    pub fn load_persisted_credentials(&mut self) {
        match load_preferences(self.store.as_ref()) {
            Ok(Some(preferences)) => {
                self.state.credentials.username = preferences.username;
                self.state.credentials.password = preferences.password;
                self.state.remember_credentials = preferences.save_user_and_pass;
                debug!("saved credentials restored");
            }
            Ok(None) => {}
            Err(error) => warn!(error = %error, "saved credentials ignored"),
        }
    }

    /// Submits a mark-point request.
    ///
    /// The saved record is written or removed first, according to
    /// `remember_credentials`. Exactly one captcha reload follows, whatever
    /// the outcome.
    pub fn submit(&mut self) -> SubmitOutcome {
        self.sync_preferences();

        let response = self.api.mark_point(
            self.state.device_id,
            self.state.selected_function,
            &self.state.credentials,
            self.state.captcha.answer(),
        );

        let outcome = match response {
            Ok(MarkPointResponse::Accepted { message, severity }) => {
                SubmitOutcome::Presented(self.present_result(&message, severity))
            }
            Ok(MarkPointResponse::Rejected { error }) => SubmitOutcome::Presented(
                self.present_result(&reword_rejection(&error), Severity::Error),
            ),
            Err(error) => {
                warn!(
                    device_id = self.state.device_id,
                    error = %redact_sensitive(&error.to_string()),
                    "mark point failed"
                );
                SubmitOutcome::Failed(SubmitFailure::from(&error))
            }
        };

        // Failure is already logged and reflected in the load status.
        let _ = self.reload_captcha();
        outcome
    }

    /// Builds an alert for `message` and hands it to the presenter.
    pub fn present_result(&self, message: &str, severity: Severity) -> Alert {
        let alert = Alert::from_message(message, severity);
        info!(title = %alert.title, severity = severity.code(), "presenting result");
        self.presenter.present(&alert);
        alert
    }

    fn sync_preferences(&self) {
        let result = if self.state.remember_credentials {
            save_preferences(
                self.store.as_ref(),
                &UserPreferences {
                    username: self.state.credentials.username.clone(),
                    password: self.state.credentials.password.clone(),
                    save_user_and_pass: true,
                },
            )
        } else {
            reset_preferences(self.store.as_ref())
        };

        if let Err(error) = result {
            warn!(error = %error, "preference store update failed");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for submit failure classification.

    use ponto_loose_json::DecodeError;

    use super::*;

    #[test]
    fn transport_errors_classify_as_transport() {
        let error = ApiError::Transport("timeout".to_string());
        assert_eq!(SubmitFailure::from(&error), SubmitFailure::Transport);
    }

    #[test]
    fn malformed_bodies_classify_as_decode() {
        let error = ApiError::Decode(DecodeError::TrailingCharacters { offset: 3 });
        assert_eq!(SubmitFailure::from(&error), SubmitFailure::Decode);
        let error = ApiError::InvalidResponse("no msg".to_string());
        assert_eq!(SubmitFailure::from(&error), SubmitFailure::Decode);
    }
}
