mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use marketplace_backend::{models::user::UserRole, utils::signature::sign_payload};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{get_request, json_request, lazy_app, read_json, token_for, PAYOUT_SECRET};

#[tokio::test]
async fn health_is_public() {
    let app = lazy_app();
    let resp = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["status"], "ok");
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let app = lazy_app();
    let resp = app
        .oneshot(get_request("/api/does-not-exist", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(resp).await["error"], "route_not_found");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = lazy_app();

    let resp = app
        .clone()
        .oneshot(get_request("/api/earnings", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(resp).await["error"], "missing_authorization");

    let resp = app
        .oneshot(get_request("/api/earnings", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(resp).await["error"], "invalid_token");
}

#[tokio::test]
async fn non_admins_are_forbidden_from_admin_routes() {
    let app = lazy_app();
    let token = token_for(Uuid::new_v4(), UserRole::Freelancer);

    for uri in [
        "/api/admin/withdrawal-requests",
        "/api/admin/messages",
        "/api/verification-requests",
    ] {
        let resp = app
            .clone()
            .oneshot(get_request(uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{}", uri);
    }

    let resp = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/admin/messages/{}/flag", Uuid::new_v4()),
            Some(&token),
            json!({ "isFlagged": true }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn withdrawal_below_minimum_is_rejected() {
    let app = lazy_app();
    let token = token_for(Uuid::new_v4(), UserRole::Freelancer);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/withdrawal-requests",
            Some(&token),
            json!({
                "amount": "50",
                "paymentMethod": "paypal",
                "accountDetails": "me@example.com"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("Minimum withdrawal"));
}

#[tokio::test]
async fn withdrawal_without_payout_target_is_rejected() {
    let app = lazy_app();
    let token = token_for(Uuid::new_v4(), UserRole::Freelancer);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/withdrawal-requests",
            Some(&token),
            json!({ "amount": "150" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(resp).await["error"], "payout account required");
}

#[tokio::test]
async fn review_cannot_target_pending() {
    let app = lazy_app();
    let token = token_for(Uuid::new_v4(), UserRole::Admin);

    let resp = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/verification-requests/{}/status", Uuid::new_v4()),
            Some(&token),
            json!({ "status": "pending" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let app = lazy_app();
    let token = token_for(Uuid::new_v4(), UserRole::Client);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/messages",
            Some(&token),
            json!({ "receiverId": Uuid::new_v4(), "content": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payout_callback_requires_valid_signature() {
    let app = lazy_app();
    let body = json!({
        "withdrawalId": Uuid::new_v4(),
        "paymentId": "po_123",
        "status": "paid"
    })
    .to_string();

    let missing = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payouts")
        .header("content-type", "application/json")
        .body(Body::from(body.clone()))
        .unwrap();
    let resp = app.clone().oneshot(missing).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let forged = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payouts")
        .header("content-type", "application/json")
        .header("x-payout-signature", sign_payload("wrong-secret", body.as_bytes()))
        .body(Body::from(body.clone()))
        .unwrap();
    let resp = app.clone().oneshot(forged).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(resp).await["error"], "invalid_payout_signature");

    // Signed correctly but not JSON: rejected after the signature check.
    let garbage = "not json";
    let malformed = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payouts")
        .header("x-payout-signature", sign_payload(PAYOUT_SECRET, garbage.as_bytes()))
        .body(Body::from(garbage))
        .unwrap();
    let resp = app.oneshot(malformed).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn video_sessions_are_unavailable_without_credentials() {
    let app = lazy_app();
    let token = token_for(Uuid::new_v4(), UserRole::Client);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/video/sessions",
            Some(&token),
            json!({ "partnerId": Uuid::new_v4() }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
