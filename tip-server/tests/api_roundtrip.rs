//! HTTP round trips through the fully layered router

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tip_server::api::build_app;
use tip_server::{Config, ErrorCode, ServerState};
use tower::ServiceExt;

fn app() -> Router {
    let config = Config::with_overrides(0, "UTC", 0);
    let state = ServerState::initialize(&config);
    build_app(&config).with_state(state)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => request
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn test_role_budget_conflict_carries_remaining() {
    let app = app();
    let roles = "/api/restaurants/1/roles";
    for (name, pct) in [("Mozo", 30), ("Cocinero", 25)] {
        let (status, _) = call(
            &app,
            Method::POST,
            roles,
            Some(json!({ "name": name, "color": "#112233", "percentage": pct })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(
        &app,
        Method::POST,
        roles,
        Some(json!({ "name": "Bartender", "color": "#112233", "percentage": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::RoleBudgetExceeded.code());
    assert_eq!(body["details"]["remaining"], 45);
    assert_eq!(body["message"], "percentage available: 45%");

    let (status, body) = call(&app, Method::GET, "/api/restaurants/1/roles/budget", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["allocated"], 55);
    assert_eq!(body["data"]["available"], 45);
}

// ============================================================================
// Payments / transfers
// ============================================================================

#[tokio::test]
async fn test_validate_transfer_twice() {
    let app = app();
    let now = shared::util::now_millis();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/restaurants/1/payments",
        Some(json!({
            "amount": "12.50",
            "occurred_at": now,
            "rail_type": "transfer",
            "status": "approved",
            "transaction_ref": "OP-77",
            "creditor_tax_id": "B12345678"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/payments/{id}/validate");

    let (status, body) = call(&app, Method::POST, &uri, Some(json!({ "operation_number": "OP-77" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "settled");

    let (status, body) = call(&app, Method::POST, &uri, Some(json!({ "operation_number": "OP-77" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::PaymentAlreadySettled.code());
}

#[tokio::test]
async fn test_unknown_payment_is_404() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/payments/424242", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], ErrorCode::PaymentNotFound.code());
}

// ============================================================================
// Statistics
// ============================================================================

#[tokio::test]
async fn test_statistics_and_comparison() {
    let app = app();
    let now = shared::util::now_millis();
    for (rid, amount) in [(1, "10"), (1, "5"), (2, "7")] {
        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/api/restaurants/{rid}/payments"),
            Some(json!({
                "amount": amount,
                "occurred_at": now - 1_000,
                "rail_type": "deposit",
                "table": "4"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/restaurants/1/statistics?dimension=table&window=last_week",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["grand_total"], "15");
    assert_eq!(body["data"]["groups"]["4"]["count"], 2);

    let (status, body) = call(&app, Method::GET, "/api/statistics/compare?main=1&comparison=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["main"]["grand_total"], "15");
    assert_eq!(body["data"]["comparison"]["grand_total"], "7");

    let (status, body) = call(&app, Method::GET, "/api/statistics/compare?main=1&comparison=1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], ErrorCode::ComparisonSameRestaurant.code());
}
