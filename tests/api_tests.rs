//! In-process HTTP tests against the full router

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{memory_state, test_config};
use supplychain_server::config::Config;
use supplychain_server::middleware::RateLimiter;
use supplychain_server::routes::app_router;

fn app_with(config: Config) -> Router {
    let limiter = RateLimiter::new(config.rate_limit_rps);
    app_router(memory_state(&config), &config, limiter)
}

fn app() -> Router {
    app_with(test_config(5000))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Register and log in, returning the access token
async fn sign_in(app: &Router, role: &str, email: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "role": role,
            "name": "Test User",
            "email": email,
            "cnic": "12345-1234567-1",
            "address": "12 Market Street",
            "phone": "03001234567",
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["accessToken"].as_str().unwrap().to_string()
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let app = app();
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["chainValid"], true);
}

#[tokio::test]
async fn test_catalog_is_public() {
    let app = app();
    let (status, body) = send(&app, "GET", "/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app();
    let (status, body) = send(&app, "GET", "/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "MISSING_TOKEN");

    let (status, body) = send(&app, "GET", "/orders", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_register_rejects_bad_cnic_and_duplicates() {
    let app = app();
    let form = json!({
        "role": "vendor",
        "name": "Vera Vendor",
        "email": "vera@example.com",
        "cnic": "1234-567",
        "address": "12 Market Street",
        "phone": "03001234567",
        "password": "password123",
    });
    let (status, body) = send(&app, "POST", "/auth/register", None, Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    sign_in(&app, "vendor", "vera@example.com").await;
    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "role": "customer",
            "name": "Vera Again",
            "email": "VERA@example.com",
            "cnic": "12345-1234567-1",
            "address": "12 Market Street",
            "phone": "03001234567",
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let app = app();
    let token = sign_in(&app, "customer", "carl@example.com").await;

    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "carl@example.com");

    let (status, _) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "SESSION_REVOKED");
}

#[tokio::test]
async fn test_role_checks() {
    let app = app();
    let customer = sign_in(&app, "customer", "cora@example.com").await;
    let supplier = sign_in(&app, "supplier", "sam@example.com").await;

    let (status, body) = send(&app, "GET", "/dashboard/expert", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = send(&app, "GET", "/cart", Some(&supplier), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/transactions/verify", Some(&supplier), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_customer_checkout_over_http() {
    let app = app();
    let vendor = sign_in(&app, "vendor", "vic@example.com").await;
    let customer = sign_in(&app, "customer", "cleo@example.com").await;

    let (status, product) = send(
        &app,
        "POST",
        "/products",
        Some(&vendor),
        Some(json!({
            "name": "Pallet Jack",
            "description": "Manual pallet jack",
            "price": "40",
            "quantity": 3,
            "category": "Equipment",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", "/wallet", Some(&customer), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, cart) = send(
        &app,
        "POST",
        "/cart/items",
        Some(&customer),
        Some(json!({ "productId": product_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["itemCount"], 1);

    let (status, receipt) = send(&app, "POST", "/cart/checkout", Some(&customer), None).await;
    assert_eq!(status, StatusCode::CREATED);
    // 40 + 3.20 tax + 10 shipping
    assert_eq!(decimal(&receipt["order"]["total"]), Decimal::new(5320, 2));
    assert_eq!(receipt["payment"]["status"], "pending");

    let (status, balance) = send(&app, "GET", "/wallet/balance", Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&balance["balance"]), Decimal::new(494680, 2));

    let order_id = receipt["order"]["id"].as_str().unwrap();
    let (status, orders) = send(&app, "GET", "/orders", Some(&vendor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let (status, order) = send(
        &app,
        "POST",
        &format!("/orders/{}/advance", order_id),
        Some(&vendor),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "processing");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/orders/{}/advance", order_id),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_supplier_shipment_over_http() {
    let app = app();
    let supplier = sign_in(&app, "supplier", "sue@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/dashboard/supplier/inventory",
        Some(&supplier),
        Some(json!({
            "name": "Widgets",
            "category": "Parts",
            "quantity": 100,
            "unitPrice": "2",
            "supplier": "Acme",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, view) = send(
        &app,
        "POST",
        "/dashboard/supplier/shipments",
        Some(&supplier),
        Some(json!({ "vendor": "Corner Shop", "product": "Widgets", "units": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["inventory"][0]["quantity"], 70);
    assert_eq!(view["recentTransactions"][0]["type"], "sale");
    assert_eq!(decimal(&view["recentTransactions"][0]["amount"]), Decimal::from(72));

    let (status, body) = send(
        &app,
        "POST",
        "/dashboard/supplier/shipments",
        Some(&supplier),
        Some(json!({ "vendor": "Corner Shop", "product": "Widgets", "units": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
}

#[tokio::test]
async fn test_rate_limit_rejects_burst() {
    let mut config = test_config(5000);
    config.rate_limit_rps = 1;
    let app = app_with(config);

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-forwarded-for", "10.0.0.7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
        }
        statuses.push(response.status());
    }

    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );
}
