//! Creator API client against a mock server.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use creator_storefront::config::CreatorApiConfig;
use creator_storefront::services::{CreatorApiClient, CreatorApiError};
use creator_storefront_core::analytics::{AnalyticsEvent, EventEnvelope};
use creator_storefront_core::{CreatorRef, Email, ReferralId};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CreatorApiClient {
    CreatorApiClient::new(&CreatorApiConfig {
        base_url: Url::parse(&server.uri()).unwrap(),
        api_key: Some(SecretString::from("k3y-Zq8#wP2!")),
        timeout: Duration::from_secs(2),
    })
    .unwrap()
}

#[tokio::test]
async fn test_pricing_delta_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/creators/maya/pricing-delta"))
        .and(header("authorization", "Bearer k3y-Zq8#wP2!"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "delta": "-10" })))
        .expect(1)
        .mount(&server)
        .await;

    let delta = client(&server)
        .pricing_delta(&CreatorRef::new("maya"))
        .await
        .unwrap();
    assert_eq!(delta.percent(), Decimal::new(-10, 0));
}

#[tokio::test]
async fn test_creator_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/creators/maya/products"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "products": ["tee", "cap"] })),
        )
        .mount(&server)
        .await;

    let products = client(&server)
        .creator_products(&CreatorRef::new("maya"))
        .await
        .unwrap();
    assert_eq!(products, vec!["tee".to_string(), "cap".to_string()]);
}

#[tokio::test]
async fn test_error_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("unknown creator"))
        .mount(&server)
        .await;

    let err = client(&server)
        .pricing_delta(&CreatorRef::new("nobody"))
        .await
        .unwrap_err();
    assert!(
        matches!(
            &err,
            CreatorApiError::Api { status: 404, message } if message == "unknown creator"
        ),
        "unexpected error {err:?}"
    );
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "delta": "lots" })))
        .mount(&server)
        .await;

    let err = client(&server)
        .pricing_delta(&CreatorRef::new("maya"))
        .await
        .unwrap_err();
    assert!(matches!(err, CreatorApiError::Parse(_)));
}

#[tokio::test]
async fn test_track_event_posts_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(body_partial_json(json!({
            "event": "email_signup",
            "creator_ref": "maya",
            "referral_id": "aff-1",
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = EventEnvelope::new(
        AnalyticsEvent::EmailSignup,
        CreatorRef::new("maya"),
        Some(ReferralId::new("aff-1")),
    );
    client(&server).track_event(&envelope).await.unwrap();
}

#[tokio::test]
async fn test_signup_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/email-signups"))
        .and(body_json(json!({ "email": "fan@example.com", "creator_ref": "maya" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .signup_email(&Email::parse("Fan@Example.com").unwrap(), &CreatorRef::new("maya"))
        .await
        .unwrap();
}
