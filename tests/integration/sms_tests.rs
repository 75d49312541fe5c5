use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ticket_watcher::config::SmsConfig;
use ticket_watcher::models::ParsedPrice;
use ticket_watcher::plugins::notifiers::SmsNotifier;

use super::*;

const MESSAGES_PATH: &str = "/2010-04-01/Accounts/AC123/Messages.json";

fn sms_config(server: &MockServer) -> SmsConfig {
    SmsConfig {
        account_sid: Some("AC123".to_string()),
        auth_token: Some("token".to_string()),
        from_number: Some("+15550000001".to_string()),
        to_number: Some("+15550000002".to_string()),
        api_base: server.uri(),
    }
}

fn alert() -> Alert {
    Alert::new(
        "King Gizz Tickets",
        vec![ParsedPrice::new(80.0), ParsedPrice::new(95.5)],
    )
    .unwrap()
}

#[tokio::test]
async fn test_sms_posts_alert_to_twilio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .and(header("authorization", "Basic QUMxMjM6dG9rZW4="))
        .and(body_string_contains("80.0"))
        .and(body_string_contains("95.5"))
        .and(body_string_contains("To=%2B15550000002"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM42" })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = SmsNotifier::from_config(&sms_config(&server)).unwrap();
    let result = notifier.notify(&alert()).await.unwrap();

    assert_eq!(result.channel, "sms");
    assert_eq!(result.message_id.as_deref(), Some("SM42"));
}

#[tokio::test]
async fn test_sms_rejection_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("Authenticate"))
        .mount(&server)
        .await;

    let notifier = SmsNotifier::from_config(&sms_config(&server)).unwrap();
    let err = notifier.notify(&alert()).await.unwrap_err();

    assert!(matches!(err, AppError::Notification { .. }));
    assert!(err.to_string().contains("401"));
}
