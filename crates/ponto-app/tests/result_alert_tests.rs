//! Integration tests for alerts raised by submit results.

mod common;

use common::harness;
use ponto_app::SubmitOutcome;
use ponto_core::Severity;
use ponto_ui::INVALID_CREDENTIALS_MESSAGE;

#[test]
fn result_alert_tests_invalid_credentials_are_rewritten() {
    let mut harness = harness();
    harness
        .transport
        .set_mark_point(Some("{success:false, error:\"Usuário / Senha incorretos\"}"));

    harness.controller.submit();

    let alerts = harness.presenter.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].body, INVALID_CREDENTIALS_MESSAGE);
    assert_eq!(alerts[0].severity, Severity::Error);
    assert_eq!(alerts[0].title, "Erro");
}

#[test]
fn result_alert_tests_success_message_uses_success_title() {
    let mut harness = harness();
    harness
        .transport
        .set_mark_point(Some("{success:true, msg:{msg:\"Ponto registrado\", type:1}}"));

    let outcome = harness.controller.submit();

    let alerts = harness.presenter.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "Sucesso");
    assert_eq!(alerts[0].body, "Ponto registrado");
    assert_eq!(outcome, SubmitOutcome::Presented(alerts[0].clone()));
}

#[test]
fn result_alert_tests_rejection_names_the_captcha() {
    let mut harness = harness();
    harness
        .transport
        .set_mark_point(Some("{success:false,error:'Texto digitado não confere'}"));

    harness.controller.submit();

    assert_eq!(
        harness.presenter.alerts()[0].body,
        "O Captcha digitado não confere"
    );
}

#[test]
fn result_alert_tests_warning_and_unknown_types_use_attention_title() {
    let mut harness = harness();
    harness
        .transport
        .set_mark_point(Some("{success:true,msg:{msg:'Fora do horário',type:3}}"));
    harness.controller.submit();
    harness
        .transport
        .set_mark_point(Some("{success:true,msg:{msg:'Registrado',type:7}}"));
    harness.controller.submit();

    let alerts = harness.presenter.alerts();
    assert_eq!(alerts[0].title, "Atenção");
    assert_eq!(alerts[0].severity, Severity::Warning);
    assert_eq!(alerts[1].title, "Atenção");
    assert_eq!(alerts[1].severity, Severity::Normal);
}

#[test]
fn result_alert_tests_present_result_reaches_presenter() {
    let harness = harness();

    let alert = harness.controller.present_result("Erro interno", Severity::Error);

    assert_eq!(alert.title, "Erro");
    assert_eq!(harness.presenter.alerts(), vec![alert]);
}
