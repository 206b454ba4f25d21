//! HTTP flows through the storefront router with in-memory sessions.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use creator_storefront_core::ReloadPolicy;
use creator_storefront_integration_tests::{TEST_CREATOR, TestClient, test_app, test_config};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(policy: ReloadPolicy) -> TestClient {
    TestClient::new(test_app(test_config(policy, None)))
}

fn tee(size: &str) -> Value {
    json!({
        "productId": "p1",
        "variantId": "v1",
        "handle": "creator-tee",
        "title": "Creator Tee",
        "unitPrice": "20.00",
        "size": size,
    })
}

#[tokio::test]
async fn test_health() {
    let mut client = client(ReloadPolicy::Preserve);
    let response = client.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"ok");
}

#[tokio::test]
async fn test_add_twice_makes_one_line() {
    let mut client = client(ReloadPolicy::Preserve);
    client.post_json("/api/cart/add", &tee("M")).await;
    let response = client.post_json("/api/cart/add", &tee("M")).await;

    assert_eq!(response.status, StatusCode::OK);
    let summary = response.json();
    assert_eq!(summary["items"].as_array().unwrap().len(), 1);
    assert_eq!(summary["items"][0]["quantity"], 2);
    assert_eq!(summary["item_count"], 2);
    assert_eq!(summary["subtotal"], "$40.00");
}

#[tokio::test]
async fn test_different_sizes_are_separate_lines() {
    let mut client = client(ReloadPolicy::Preserve);
    client.post_json("/api/cart/add", &tee("M")).await;
    client.post_json("/api/cart/add", &tee("L")).await;

    let summary = client.get("/api/cart").await.json();
    assert_eq!(summary["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_rejects_blank_variant() {
    let mut client = client(ReloadPolicy::Preserve);
    let mut body = tee("M");
    body["variantId"] = json!("");

    let response = client.post_json("/api/cart/add", &body).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["success"], false);
}

#[tokio::test]
async fn test_add_rejects_oversized_price() {
    let mut client = client(ReloadPolicy::Preserve);
    let huge = "79228162514264337593543950335";
    let mut body = tee("M");
    body["unitPrice"] = json!(huge);
    body["quantity"] = json!(2);

    let response = client.post_json("/api/cart/add", &body).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(client.get("/api/cart").await.json()["item_count"], 0);

    let response = client
        .post_json("/api/pricing/quote", &json!({ "base_price": huge }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_adjust_and_clear() {
    let mut client = client(ReloadPolicy::Preserve);
    client.post_json("/api/cart/add", &tee("M")).await;
    client.post_json("/api/cart/add", &tee("M")).await;

    let summary = client
        .post_json("/api/cart/adjust", &json!({ "index": 0, "delta": -1 }))
        .await
        .json();
    assert_eq!(summary["item_count"], 1);

    let summary = client
        .post_json("/api/cart/adjust", &json!({ "index": 0, "delta": -1 }))
        .await
        .json();
    assert!(summary["items"].as_array().unwrap().is_empty());

    client.post_json("/api/cart/add", &tee("M")).await;
    let summary = client.post_json("/api/cart/clear", &json!({})).await.json();
    assert_eq!(summary["item_count"], 0);
}

#[tokio::test]
async fn test_checkout_reload_and_thank_you() {
    let mut client = client(ReloadPolicy::Preserve);
    client.post_json("/api/cart/add", &tee("M")).await;
    client.post_json("/api/cart/add", &tee("M")).await;

    // Checkout redirects to the hosted cart permalink
    let response = client.post_form("/checkout", "email=fan%40example.com").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let location = response.location().unwrap();
    assert!(
        location.starts_with("https://creator-shop.myshopify.com/cart/v1:2"),
        "unexpected location {location}"
    );
    assert!(location.contains("checkout%5Bemail%5D=fan%40example.com"));
    assert!(location.contains(&format!("ref={TEST_CREATOR}")));

    // Coming back without finishing keeps the cart and resolves the flag
    let page = client.get("/").await.json();
    assert_eq!(page["lifecycle"]["decision"]["decision"], "checkout_abandoned");
    assert_eq!(page["lifecycle"]["flag_cleared"], true);
    assert_eq!(page["cart"]["item_count"], 2);

    // Next plain load is a fresh load
    let page = client.get("/cart").await.json();
    assert_eq!(page["lifecycle"]["decision"]["decision"], "fresh_load");
    assert_eq!(page["cart"]["item_count"], 2);
    assert_eq!(page["view"]["view"], "cart");

    // The thank-you page clears the cart
    let page = client.get("/thank-you").await.json();
    assert_eq!(page["lifecycle"]["decision"]["decision"], "order_completed");
    assert_eq!(page["cart"]["item_count"], 0);
    assert_eq!(client.get("/api/cart").await.json()["item_count"], 0);
}

#[tokio::test]
async fn test_order_status_page_clears_cart() {
    let mut client = client(ReloadPolicy::Preserve);
    client.post_json("/api/cart/add", &tee("M")).await;

    let page = client.get("/orders/1001").await.json();
    assert_eq!(page["lifecycle"]["cart_cleared"], true);
    assert_eq!(page["cart"]["item_count"], 0);
}

#[tokio::test]
async fn test_product_handle_mentioning_thank_you_keeps_cart() {
    let mut client = client(ReloadPolicy::Preserve);
    client.post_json("/api/cart/add", &tee("M")).await;

    let page = client.get("/products/thank-you-card").await.json();
    assert_eq!(page["lifecycle"]["decision"]["decision"], "fresh_load");
    assert_eq!(page["lifecycle"]["cart_cleared"], false);
    assert_eq!(page["cart"]["item_count"], 1);
    assert_eq!(page["product"]["handle"], "thank-you-card");
}

#[tokio::test]
async fn test_empty_cart_checkout_goes_back_to_cart() {
    let mut client = client(ReloadPolicy::Preserve);
    let response = client.post_form("/checkout", "").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/cart"));

    // No flag was set, so the next load is a plain one
    let page = client.get("/").await.json();
    assert_eq!(page["lifecycle"]["decision"]["decision"], "fresh_load");
}

#[tokio::test]
async fn test_clear_policy_empties_cart_on_plain_load() {
    let mut client = client(ReloadPolicy::Clear);
    client.post_json("/api/cart/add", &tee("M")).await;

    let page = client.get("/").await.json();
    assert_eq!(page["lifecycle"]["decision"]["policy"], "clear");
    assert_eq!(page["cart"]["item_count"], 0);
}

#[tokio::test]
async fn test_referral_from_query_is_used_at_checkout() {
    let mut client = client(ReloadPolicy::Preserve);
    client.get("/?ref=aff-42").await;
    client.post_json("/api/cart/add", &tee("M")).await;

    let response = client.post_form("/checkout", "").await;
    let location = response.location().unwrap();
    assert!(location.ends_with("?ref=aff-42"), "unexpected location {location}");
}

#[tokio::test]
async fn test_checkout_get_does_not_start_checkout() {
    let mut client = client(ReloadPolicy::Preserve);
    client.post_json("/api/cart/add", &tee("M")).await;

    let response = client.get("/checkout").await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);

    let page = client.get("/").await.json();
    assert_eq!(page["lifecycle"]["decision"]["decision"], "fresh_load");
    assert_eq!(page["cart"]["item_count"], 1);
}

#[tokio::test]
async fn test_view_actions() {
    let mut client = client(ReloadPolicy::Preserve);
    client.get("/products/creator-tee").await;

    let state = client
        .post_json("/api/view", &json!({ "action": "show_details" }))
        .await
        .json();
    assert_eq!(state["view"], "details");
    assert_eq!(state["selected_product"], "creator-tee");

    let state = client
        .post_json("/api/view", &json!({ "action": "open_cart" }))
        .await
        .json();
    assert_eq!(state["view"], "cart");

    let state = client
        .post_json("/api/view", &json!({ "action": "close_cart" }))
        .await
        .json();
    assert_eq!(state["view"], "details");
    assert_eq!(client.get("/api/view").await.json(), state);
}

#[tokio::test]
async fn test_newsletter_validates_email() {
    let mut client = client(ReloadPolicy::Preserve);

    let response = client
        .post_json("/api/newsletter", &json!({ "email": "not-an-email" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = client
        .post_json("/api/newsletter", &json!({ "email": "fan@example.com" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["success"], true);
}

#[tokio::test]
async fn test_events_are_accepted() {
    let mut client = client(ReloadPolicy::Preserve);
    let response = client
        .post_json(
            "/api/events",
            &json!({ "event": "product_view", "product_id": "p1", "handle": "creator-tee" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_pricing_is_cached_until_next_page_load() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/creators/{TEST_CREATOR}/pricing-delta")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "delta": "12.5" })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/creators/{TEST_CREATOR}/products")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "products": ["creator-tee"] })),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let mut client = TestClient::new(test_app(test_config(
        ReloadPolicy::Preserve,
        Some(&server.uri()),
    )));

    // First load fetches; API calls reuse the session cache
    let page = client.get("/products/creator-tee").await.json();
    assert_eq!(page["product"]["featured"], true);
    assert_eq!(page["pricing"]["delta_percent"], "12.5");

    let quote = client
        .post_json("/api/pricing/quote", &json!({ "base_price": "20.00" }))
        .await
        .json();
    assert_eq!(quote["display"], "$22.50");

    // The next page load purges the cache and fetches again
    client.get("/").await;
    let snapshot = client.get("/api/pricing").await.json();
    assert_eq!(snapshot["products"], json!(["creator-tee"]));
}

#[tokio::test]
async fn test_pricing_falls_back_when_api_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut client = TestClient::new(test_app(test_config(
        ReloadPolicy::Preserve,
        Some(&server.uri()),
    )));

    let quote = client
        .post_json("/api/pricing/quote", &json!({ "base_price": "20.00" }))
        .await;
    assert_eq!(quote.status, StatusCode::OK);
    assert_eq!(quote.json()["display"], "$20.00");
}
