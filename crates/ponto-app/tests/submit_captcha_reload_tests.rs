//! Integration tests for the one-reload-per-submit rule.

mod common;

use common::harness;
use ponto_app::{SubmitFailure, SubmitOutcome};

const SUCCESS: &str = "{success:true,msg:{msg:'Ponto registrado',type:1}}";
const REJECTED: &str = "{success:false,error:'Texto digitado incorreto'}";

#[test]
fn submit_captcha_reload_tests_reload_once_on_success() {
    let mut harness = harness();
    harness.transport.set_mark_point(Some(SUCCESS));
    harness.transport.push_captcha("https://ponto.example.test/captcha/2.png");

    let outcome = harness.controller.submit();

    assert!(matches!(outcome, SubmitOutcome::Presented(_)));
    assert_eq!(harness.transport.captcha_calls(), 1);
}

#[test]
fn submit_captcha_reload_tests_reload_once_on_business_failure() {
    let mut harness = harness();
    harness.transport.set_mark_point(Some(REJECTED));
    harness.transport.push_captcha("https://ponto.example.test/captcha/2.png");

    harness.controller.submit();

    assert_eq!(harness.transport.captcha_calls(), 1);
}

#[test]
fn submit_captcha_reload_tests_reload_once_on_decode_failure() {
    let mut harness = harness();
    harness.transport.set_mark_point(Some("<html>502 Bad Gateway</html>"));
    harness.transport.push_captcha("https://ponto.example.test/captcha/2.png");

    let outcome = harness.controller.submit();

    assert_eq!(outcome, SubmitOutcome::Failed(SubmitFailure::Decode));
    assert!(harness.presenter.alerts().is_empty());
    assert_eq!(harness.transport.captcha_calls(), 1);
}

#[test]
fn submit_captcha_reload_tests_reload_once_on_transport_failure() {
    let mut harness = harness();
    harness.transport.set_mark_point(None);
    harness.transport.push_captcha("https://ponto.example.test/captcha/2.png");

    let outcome = harness.controller.submit();

    assert_eq!(outcome, SubmitOutcome::Failed(SubmitFailure::Transport));
    assert!(harness.presenter.alerts().is_empty());
    assert_eq!(harness.transport.captcha_calls(), 1);
}

#[test]
fn submit_captcha_reload_tests_reload_clears_the_answer() {
    let mut harness = harness();
    harness.transport.set_mark_point(Some(SUCCESS));
    harness.transport.push_captcha("https://ponto.example.test/captcha/2.png");
    harness.controller.edit_captcha_answer("k3j9");

    harness.controller.submit();

    let state = harness.controller.state();
    assert_eq!(state.captcha.answer(), "");
    assert_eq!(
        state.captcha.image_source(),
        "https://ponto.example.test/captcha/2.png"
    );
}

#[test]
fn submit_captcha_reload_tests_failed_reload_keeps_the_answer() {
    let mut harness = harness();
    harness.controller.edit_captcha_answer("k3j9");

    assert!(harness.controller.reload_captcha().is_err());
    assert_eq!(harness.controller.state().captcha.answer(), "k3j9");
}

#[test]
fn submit_captcha_reload_tests_sends_current_fields() {
    let mut harness = harness();
    harness.transport.set_mark_point(Some(SUCCESS));
    harness.controller.select_function(ponto_core::FunctionCode::CallCenterBreak);
    harness.controller.edit_username("maria");
    harness.controller.edit_password("segredo");
    harness.controller.edit_captcha_answer("k3j9");

    harness.controller.submit();

    let request = harness.transport.last_request().expect("request recorded");
    assert_eq!(request.device_id, 8002);
    assert_eq!(request.function, "2");
    assert_eq!(request.user, "maria");
    assert_eq!(request.pass, "segredo");
    assert_eq!(request.captcha, "k3j9");
}
