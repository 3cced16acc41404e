#![warn(missing_docs)]
//! # ponto-api
//!
//! ## Purpose
//! Client for the remote timekeeping API consumed by the clock-in session.
//!
//! ## Responsibilities
//! - Validate the API base URL policy (absolute, HTTPS).
//! - Execute the device-info, captcha and mark-point calls through an
//!   injectable transport abstraction.
//! - Decode the loose-JSON responses into typed contracts.
//!
//! ## Data flow
//! Controller -> [`ClockApiClient`] -> [`ClockTransport`] (HTTP in
//! production, scripted in tests) -> raw body -> [`contract`] decoding ->
//! [`DeviceInfo`] / [`MarkPointResponse`].
//!
//! ## Ownership and lifetimes
//! Requests and responses are owned values so transports can be swapped
//! without lifetime coupling to controller state.
//!
//! ## Error model
//! Network failures surface as [`ApiError::Transport`]; malformed bodies as
//! [`ApiError::Decode`] or [`ApiError::InvalidResponse`]. A server-side
//! rejection is not an error: it is [`MarkPointResponse::Rejected`].
//!
//! ## Security and privacy notes
//! Passwords and captcha answers are never logged and are redacted from
//! `Debug` output of [`MarkPointRequest`].
//!
//! ## Example
//! ```rust
//! use ponto_api::validate_base_url;
//!
//! assert!(validate_base_url("https://ponto.example.test/api").is_ok());
//! assert!(validate_base_url("http://ponto.example.test/api").is_err());
//! ```

pub mod contract;
mod http;

use std::fmt;
use std::sync::Arc;

use ponto_core::{Credentials, FunctionCode};
use ponto_loose_json::DecodeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub use contract::{DeviceInfo, MarkPointResponse, decode_device_info, decode_mark_point};
pub use http::HttpClockTransport;

/// Relative path of the device-info endpoint.
pub const DEVICE_INFO_PATH: &str = "GetClockDeviceInfo";
/// Relative path of the captcha endpoint.
pub const CAPTCHA_PATH: &str = "GetCaptcha";
/// Relative path of the mark-point endpoint.
pub const MARK_POINT_PATH: &str = "MarkEletronicPoint";

/// Captcha image returned by the captcha endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaImage {
    /// HTTP URL or base64 data URI of the image.
    #[serde(rename = "urlcaptcha")]
    pub url_captcha: String,
}

/// Form body of one mark-point submission.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct MarkPointRequest {
    /// Virtual clock device id.
    #[serde(rename = "deviceID")]
    pub device_id: u32,
    /// Function wire code.
    pub function: String,
    /// Account username.
    pub user: String,
    /// Account password.
    pub pass: String,
    /// Answer typed for the current captcha.
    pub captcha: String,
}

impl fmt::Debug for MarkPointRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkPointRequest")
            .field("device_id", &self.device_id)
            .field("function", &self.function)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("captcha", &"<redacted>")
            .finish()
    }
}

/// Abstract transport used by [`ClockApiClient`].
pub trait ClockTransport: Send + Sync {
    /// Fetches the raw device-info body for `device_id`.
    fn fetch_device_info(&self, base_url: &Url, device_id: u32) -> Result<String, ApiError>;

    /// Fetches a fresh captcha for `device_id`.
    fn fetch_captcha(&self, base_url: &Url, device_id: u32) -> Result<CaptchaImage, ApiError>;

    /// Submits one mark-point request and returns the raw response body.
    fn mark_point(&self, base_url: &Url, request: &MarkPointRequest) -> Result<String, ApiError>;
}

/// API client that validates the base URL and decodes responses.
#[derive(Clone)]
pub struct ClockApiClient {
    base_url: Url,
    transport: Arc<dyn ClockTransport>,
}

impl ClockApiClient {
    /// Creates a validated client.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidEndpoint`] when the URL is not HTTPS or
    /// cannot serve as a base for relative endpoint paths.
    pub fn new(base_url: &str, transport: Arc<dyn ClockTransport>) -> Result<Self, ApiError> {
        let base_url = validate_base_url(base_url)?;
        Ok(Self {
            base_url,
            transport,
        })
    }

    /// Normalized base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches and decodes device capabilities and clock time.
    ///
    /// # Errors
    /// Propagates transport failures; returns [`ApiError::Decode`] when the
    /// body is malformed.
    pub fn device_info(&self, device_id: u32) -> Result<DeviceInfo, ApiError> {
        debug!(device_id, "fetching device info");
        let raw = self.transport.fetch_device_info(&self.base_url, device_id)?;
        decode_device_info(&raw)
    }

    /// Fetches a fresh captcha image.
    ///
    /// # Errors
    /// Propagates transport failures; returns [`ApiError::InvalidResponse`]
    /// when the image source is blank.
    pub fn captcha(&self, device_id: u32) -> Result<CaptchaImage, ApiError> {
        debug!(device_id, "fetching captcha");
        let image = self.transport.fetch_captcha(&self.base_url, device_id)?;
        if image.url_captcha.trim().is_empty() {
            return Err(ApiError::InvalidResponse(
                "captcha response has an empty urlcaptcha".to_string(),
            ));
        }
        Ok(image)
    }

    /// Submits a mark-point request and decodes the envelope.
    ///
    /// # Errors
    /// Propagates transport failures; returns [`ApiError::Decode`] or
    /// [`ApiError::InvalidResponse`] when the envelope is malformed.
    pub fn mark_point(
        &self,
        device_id: u32,
        function: FunctionCode,
        credentials: &Credentials,
        captcha_answer: &str,
    ) -> Result<MarkPointResponse, ApiError> {
        let request = MarkPointRequest {
            device_id,
            function: function.code().to_string(),
            user: credentials.username.clone(),
            pass: credentials.password.clone(),
            captcha: captcha_answer.to_string(),
        };
        debug!(device_id, function = function.code(), "submitting mark point");
        let raw = self.transport.mark_point(&self.base_url, &request)?;
        decode_mark_point(&raw)
    }
}

/// Validates and normalizes the API base URL.
///
/// # Errors
/// Returns [`ApiError::InvalidEndpoint`] for unparsable, non-HTTPS or
/// non-hierarchical URLs.
pub fn validate_base_url(base_url: &str) -> Result<Url, ApiError> {
    let mut parsed = Url::parse(base_url)
        .map_err(|error| ApiError::InvalidEndpoint(format!("invalid api url: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(ApiError::InvalidEndpoint(
            "api base url must use https".to_string(),
        ));
    }

    if parsed.cannot_be_a_base() {
        return Err(ApiError::InvalidEndpoint(
            "api base url cannot hold endpoint paths".to_string(),
        ));
    }

    // `Url::join` replaces the last segment unless the path ends with `/`.
    if !parsed.path().ends_with('/') {
        let path = format!("{}/", parsed.path());
        parsed.set_path(&path);
    }

    Ok(parsed)
}

/// Errors produced by the API client and transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL violates the endpoint policy.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Request could not be completed (network, TLS, non-2xx status).
    #[error("api transport failure: {0}")]
    Transport(String),
    /// Response body is not valid loose JSON or has the wrong shape.
    #[error("api decode failure: {0}")]
    Decode(#[from] DecodeError),
    /// Response decoded but violates the envelope contract.
    #[error("invalid api response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Returns `true` for network-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for endpoint policy and request redaction.

    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = validate_base_url("https://ponto.example.test/api/rvirtual").expect("valid url");
        assert_eq!(url.as_str(), "https://ponto.example.test/api/rvirtual/");
        assert_eq!(
            url.join(DEVICE_INFO_PATH).expect("join").as_str(),
            "https://ponto.example.test/api/rvirtual/GetClockDeviceInfo"
        );
    }

    #[test]
    fn rejects_plain_http_and_garbage() {
        assert!(matches!(
            validate_base_url("http://ponto.example.test"),
            Err(ApiError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            validate_base_url("not a url"),
            Err(ApiError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn request_debug_redacts_secrets() {
        let request = MarkPointRequest {
            device_id: 8002,
            function: "1".to_string(),
            user: "maria".to_string(),
            pass: "hunter2".to_string(),
            captcha: "x7k2".to_string(),
        };
        let rendered = format!("{request:?}");
        assert!(rendered.contains("maria"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("x7k2"));
    }
}
