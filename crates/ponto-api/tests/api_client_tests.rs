//! Integration tests for the API client over a scripted transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ponto_api::{
    ApiError, CaptchaImage, ClockApiClient, ClockTransport, HttpClockTransport, MarkPointRequest,
    MarkPointResponse,
};
use ponto_core::{Credentials, FunctionCode, Severity};
use url::Url;

#[derive(Default)]
struct ScriptedTransport {
    device_info: Option<String>,
    captcha: Option<String>,
    mark_point: Option<String>,
    last_request: Mutex<Option<MarkPointRequest>>,
}

impl ClockTransport for ScriptedTransport {
    fn fetch_device_info(&self, _base_url: &Url, _device_id: u32) -> Result<String, ApiError> {
        self.device_info
            .clone()
            .ok_or_else(|| ApiError::Transport("connection refused".to_string()))
    }

    fn fetch_captcha(&self, _base_url: &Url, _device_id: u32) -> Result<CaptchaImage, ApiError> {
        self.captcha
            .clone()
            .map(|url_captcha| CaptchaImage { url_captcha })
            .ok_or_else(|| ApiError::Transport("connection refused".to_string()))
    }

    fn mark_point(&self, _base_url: &Url, request: &MarkPointRequest) -> Result<String, ApiError> {
        *self.last_request.lock().expect("request lock should work") = Some(request.clone());
        self.mark_point
            .clone()
            .ok_or_else(|| ApiError::Transport("connection reset".to_string()))
    }
}

fn client(transport: Arc<ScriptedTransport>) -> ClockApiClient {
    ClockApiClient::new("https://ponto.example.test/rvirtual", transport)
        .expect("client should build")
}

#[test]
fn api_client_tests_decodes_flat_device_info() {
    let transport = Arc::new(ScriptedTransport {
        device_info: Some(
            "{useCracha:true,useUserPwd:true,dtTimeEvent:new Date(2023,5,1,10,30,0)}".to_string(),
        ),
        ..ScriptedTransport::default()
    });

    let info = client(transport).device_info(8002).expect("device info should decode");
    assert!(info.capabilities.cracha);
    assert!(info.capabilities.user_pwd);
    assert_eq!(info.clock_time.to_string(), "2023-06-01 10:30:00");
}

#[test]
fn api_client_tests_sends_function_code_and_credentials() {
    let transport = Arc::new(ScriptedTransport {
        mark_point: Some("{success:true,msg:{msg:'Ponto registrado',type:1}}".to_string()),
        ..ScriptedTransport::default()
    });
    let credentials = Credentials {
        username: "maria".to_string(),
        password: "segredo".to_string(),
    };

    let response = client(Arc::clone(&transport))
        .mark_point(8003, FunctionCode::CallCenterBreak, &credentials, "k3j9")
        .expect("mark point should decode");

    assert_eq!(
        response,
        MarkPointResponse::Accepted {
            message: "Ponto registrado".to_string(),
            severity: Severity::Ok,
        }
    );
    let request = transport
        .last_request
        .lock()
        .expect("request lock should work")
        .clone()
        .expect("request should be recorded");
    assert_eq!(request.device_id, 8003);
    assert_eq!(request.function, "2");
    assert_eq!(request.user, "maria");
    assert_eq!(request.pass, "segredo");
    assert_eq!(request.captcha, "k3j9");
}

#[test]
fn api_client_tests_rejection_is_not_an_error() {
    let transport = Arc::new(ScriptedTransport {
        mark_point: Some("{success:false,error:\"Usuário / Senha incorretos\"}".to_string()),
        ..ScriptedTransport::default()
    });

    let response = client(transport)
        .mark_point(8002, FunctionCode::ElectronicPoint, &Credentials::default(), "")
        .expect("rejection should decode");
    assert_eq!(
        response,
        MarkPointResponse::Rejected {
            error: "Usuário / Senha incorretos".to_string(),
        }
    );
}

#[test]
fn api_client_tests_classifies_failures() {
    let transport = Arc::new(ScriptedTransport {
        mark_point: Some("<html>502 Bad Gateway</html>".to_string()),
        captcha: Some("   ".to_string()),
        ..ScriptedTransport::default()
    });
    let client = client(transport);

    let transport_error = client.device_info(8002).expect_err("device info should fail");
    assert!(transport_error.is_transport());

    let decode_error = client
        .mark_point(8002, FunctionCode::ElectronicPoint, &Credentials::default(), "")
        .expect_err("html body should not decode");
    assert!(matches!(decode_error, ApiError::Decode(_)));

    assert!(matches!(
        client.captcha(8002),
        Err(ApiError::InvalidResponse(_))
    ));
}

#[test]
fn api_client_tests_http_transport_builds_without_network() {
    let transport =
        HttpClockTransport::new(Duration::from_secs(5)).expect("transport should build");
    let client = ClockApiClient::new("https://ponto.example.test/rvirtual/", Arc::new(transport))
        .expect("client should build");
    assert_eq!(client.base_url().as_str(), "https://ponto.example.test/rvirtual/");
}
