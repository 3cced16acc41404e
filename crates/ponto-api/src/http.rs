use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::debug;
use url::Url;

use crate::{
    ApiError, CAPTCHA_PATH, CaptchaImage, ClockTransport, DEVICE_INFO_PATH, MARK_POINT_PATH,
    MarkPointRequest,
};

const USER_AGENT: &str = concat!("ponto-clock/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP transport backed by `reqwest`.
///
/// Every call is fire-once: no retries, no backoff.
#[derive(Debug, Clone)]
pub struct HttpClockTransport {
    http: Client,
}

impl HttpClockTransport {
    /// Builds a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    /// Returns [`ApiError::Transport`] when the HTTP client cannot be built
    /// (for example, TLS backend initialization failure).
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self { http })
    }
}

impl ClockTransport for HttpClockTransport {
    fn fetch_device_info(&self, base_url: &Url, device_id: u32) -> Result<String, ApiError> {
        let url = endpoint(base_url, DEVICE_INFO_PATH)?;
        let response = self
            .http
            .get(url)
            .query(&[("deviceID", device_id.to_string())])
            .send()
            .map_err(transport_error)?;
        read_body(response)
    }

    fn fetch_captcha(&self, base_url: &Url, device_id: u32) -> Result<CaptchaImage, ApiError> {
        let url = endpoint(base_url, CAPTCHA_PATH)?;
        let response = self
            .http
            .get(url)
            .query(&[("deviceID", device_id.to_string())])
            .send()
            .map_err(transport_error)?;
        let body = read_body(response)?;
        Ok(ponto_loose_json::decode_loose(&body)?)
    }

    fn mark_point(&self, base_url: &Url, request: &MarkPointRequest) -> Result<String, ApiError> {
        let url = endpoint(base_url, MARK_POINT_PATH)?;
        let response = self
            .http
            .post(url)
            .form(request)
            .send()
            .map_err(transport_error)?;
        read_body(response)
    }
}

fn endpoint(base_url: &Url, path: &str) -> Result<Url, ApiError> {
    base_url
        .join(path)
        .map_err(|error| ApiError::InvalidEndpoint(format!("cannot join {path}: {error}")))
}

fn read_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    debug!(status = status.as_u16(), url = %response.url(), "api response received");
    response
        .error_for_status()
        .map_err(transport_error)?
        .text()
        .map_err(transport_error)
}

fn transport_error(error: reqwest::Error) -> ApiError {
    ApiError::Transport(error.to_string())
}
