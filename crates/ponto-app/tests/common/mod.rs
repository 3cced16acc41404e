//! Shared fixtures for session controller integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use ponto_api::{ApiError, CaptchaImage, ClockApiClient, ClockTransport, MarkPointRequest};
use ponto_app::{AppConfig, PersistencePolicy, SessionController};
use ponto_core::DisplayClock;
use ponto_prefs::MemoryPreferenceStore;
use ponto_ui::{Alert, AlertPresenter};
use url::Url;

/// Scripted transport that counts calls per endpoint.
///
/// `None` bodies fail with a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    pub device_info: Mutex<Option<String>>,
    pub captcha_images: Mutex<Vec<String>>,
    pub mark_point: Mutex<Option<String>>,
    pub device_info_calls: AtomicUsize,
    pub captcha_calls: AtomicUsize,
    pub mark_point_requests: Mutex<Vec<MarkPointRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// Scripts the device-info body; `None` makes the call fail.
    pub fn set_device_info(&self, body: Option<&str>) {
        *self.device_info.lock().expect("device info lock") = body.map(str::to_string);
    }

    /// Queues captcha images returned in order; when empty, the call fails.
    pub fn push_captcha(&self, image: &str) {
        self.captcha_images
            .lock()
            .expect("captcha lock")
            .push(image.to_string());
    }

    /// Scripts the mark-point body; `None` makes the call fail.
    pub fn set_mark_point(&self, body: Option<&str>) {
        *self.mark_point.lock().expect("mark point lock") = body.map(str::to_string);
    }

    pub fn captcha_calls(&self) -> usize {
        self.captcha_calls.load(Ordering::SeqCst)
    }

    pub fn device_info_calls(&self) -> usize {
        self.device_info_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<MarkPointRequest> {
        self.mark_point_requests
            .lock()
            .expect("request lock")
            .last()
            .cloned()
    }
}

impl ClockTransport for ScriptedTransport {
    fn fetch_device_info(&self, _base_url: &Url, _device_id: u32) -> Result<String, ApiError> {
        self.device_info_calls.fetch_add(1, Ordering::SeqCst);
        self.device_info
            .lock()
            .expect("device info lock")
            .clone()
            .ok_or_else(|| ApiError::Transport("connection refused".to_string()))
    }

    fn fetch_captcha(&self, _base_url: &Url, _device_id: u32) -> Result<CaptchaImage, ApiError> {
        self.captcha_calls.fetch_add(1, Ordering::SeqCst);
        let mut images = self.captcha_images.lock().expect("captcha lock");
        if images.is_empty() {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(CaptchaImage {
            url_captcha: images.remove(0),
        })
    }

    fn mark_point(&self, _base_url: &Url, request: &MarkPointRequest) -> Result<String, ApiError> {
        self.mark_point_requests
            .lock()
            .expect("request lock")
            .push(request.clone());
        self.mark_point
            .lock()
            .expect("mark point lock")
            .clone()
            .ok_or_else(|| ApiError::Transport("connection reset".to_string()))
    }
}

/// Presenter that records every alert.
#[derive(Default)]
pub struct RecordingPresenter {
    pub alerts: Mutex<Vec<Alert>>,
}

#[allow(dead_code)]
impl RecordingPresenter {
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().expect("alerts lock").clone()
    }
}

impl AlertPresenter for RecordingPresenter {
    fn present(&self, alert: &Alert) {
        self.alerts.lock().expect("alerts lock").push(alert.clone());
    }
}

/// Controller wired to scripted collaborators.
pub struct Harness {
    pub controller: SessionController,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryPreferenceStore>,
    pub presenter: Arc<RecordingPresenter>,
}

/// Fixed display-clock start used by harnesses.
#[allow(dead_code)]
pub fn fixture_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .and_then(|date| date.and_hms_opt(7, 59, 0))
        .expect("valid fixture time")
}

/// Builds a harness with the default policy.
#[allow(dead_code)]
pub fn harness() -> Harness {
    harness_with(PersistencePolicy::OnToggle, Arc::new(MemoryPreferenceStore::new()))
}

/// Builds a harness with an explicit policy and store.
#[allow(dead_code)]
pub fn harness_with(persistence: PersistencePolicy, store: Arc<MemoryPreferenceStore>) -> Harness {
    let transport = Arc::new(ScriptedTransport::default());
    let presenter = Arc::new(RecordingPresenter::default());
    let api = ClockApiClient::new("https://ponto.example.test/rvirtual", transport.clone())
        .expect("client should build");
    let config = AppConfig {
        persistence,
        tick_interval: Duration::from_millis(10),
        ..AppConfig::default()
    };

    let controller = SessionController::with_clock(
        config,
        api,
        store.clone(),
        presenter.clone(),
        DisplayClock::new(fixture_time()),
    )
    .expect("controller should build");

    Harness {
        controller,
        transport,
        store,
        presenter,
    }
}
