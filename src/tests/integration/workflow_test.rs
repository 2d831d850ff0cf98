use axum::http::StatusCode;
use std::sync::Arc;

use crate::client::{AvailabilityClient, WebhookClient};
use crate::config::FormConfig;
use crate::models::common::Source;
use crate::models::reservation::{Step, VisitType};
use crate::services::controller::{FormController, SelectionError, SubmitOutcome};
use crate::tests::fixtures::{spawn_test_server, test_session, test_today, time};
use crate::SessionContext;

fn controller_for(config: FormConfig, session: SessionContext) -> FormController {
    let webhook = WebhookClient::from_config(&config).unwrap();
    FormController::new(Arc::new(config), session, Arc::new(webhook)).with_today(test_today())
}

#[tokio::test]
async fn test_first_visit_reservation_end_to_end() {
    let server = spawn_test_server(StatusCode::OK, &[]).await;
    let config = FormConfig {
        webhook_url: server.webhook_url(),
        ..FormConfig::default()
    };
    let session = SessionContext::from_host(
        Some("U0123456789abcdef".to_string()),
        Some("https://liff.line.me/app?source=chat"),
        config.default_source,
    );
    let mut controller = controller_for(config, session);

    controller.select_visit_type(VisitType::First).unwrap();
    controller.select_menu("first_consult").unwrap();
    controller.advance().unwrap();

    controller.select_date(test_today()).unwrap();
    controller.select_time(time(17, 0)).unwrap();
    controller.advance().unwrap();

    controller.set_customer_name(" 山田太郎 ").unwrap();
    controller.set_phone("090-1234-5678").unwrap();
    controller.set_symptom_note("初めてです。腰が痛みます").unwrap();
    assert_eq!(controller.advance(), Ok(Step::Confirm));

    assert_eq!(controller.submit().await, SubmitOutcome::Completed);

    let received = server.received();
    assert_eq!(received.len(), 1);
    let payload = &received[0];
    assert_eq!(payload.user_id, "U0123456789abcdef");
    assert_eq!(payload.source, Source::Chat);
    assert_eq!(payload.menu_id, "first_consult");
    assert_eq!(payload.menu_name, "相談して決めたい");
    assert_eq!(payload.visit_type, VisitType::First);
    assert_eq!(payload.start_date_time, "2025-04-10T17:00:00+09:00");
    assert_eq!(payload.end_date_time, "2025-04-10T18:00:00+09:00");
    assert_eq!(payload.duration_min, 60);
    assert_eq!(payload.customer_name, "山田太郎");
    assert!(payload.client_timestamp.ends_with("+09:00"));

    assert_eq!(controller.submitted_payload(), Some(payload));
}

#[tokio::test]
async fn test_server_error_then_manual_retry() {
    let failing = spawn_test_server(StatusCode::SERVICE_UNAVAILABLE, &[]).await;
    let config = FormConfig {
        webhook_url: failing.webhook_url(),
        ..FormConfig::default()
    };
    let mut controller = controller_for(config, test_session());

    controller.select_visit_type(VisitType::Revisit).unwrap();
    controller.select_menu("headache").unwrap();
    controller.advance().unwrap();
    controller.select_date(test_today()).unwrap();
    controller.select_time(time(11, 0)).unwrap();
    controller.advance().unwrap();
    controller.set_customer_name("鈴木一郎").unwrap();
    controller.set_phone("0312345678").unwrap();
    controller.advance().unwrap();

    assert_eq!(controller.submit().await, SubmitOutcome::Failed);
    assert_eq!(controller.retry().await, SubmitOutcome::Failed);

    // Both attempts carried the same reservation
    let received = failing.received();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].start_date_time, received[1].start_date_time);
    assert!(!controller.is_submitting());
}

#[tokio::test]
async fn test_availability_lookup_over_http() {
    let server = spawn_test_server(StatusCode::OK, &["10:00", "15:00"]).await;
    let config = FormConfig {
        webhook_url: server.webhook_url(),
        availability_api_url: server.availability_url(),
        enable_availability_check: true,
        ..FormConfig::default()
    };
    assert!(config.availability_enabled());

    let availability = AvailabilityClient::new(config.availability_api_url.clone()).unwrap();
    let mut controller =
        controller_for(config, test_session()).with_availability(Arc::new(availability));

    controller.select_date(test_today()).unwrap();
    controller.settle_availability().await;

    assert_eq!(
        controller.select_time(time(9, 0)),
        Err(SelectionError::SlotUnavailable("09:00".to_string()))
    );
    controller.select_time(time(15, 0)).unwrap();
    assert_eq!(server.availability_queries(), vec!["2025-04-10".to_string()]);
}
