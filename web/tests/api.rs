//! HTTP-level tests over in-memory state.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use soiree_testing::FixedClock;
use soiree_web::{AppState, Config, build_router};
use std::sync::Arc;

fn server_with(config: Config) -> TestServer {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let state = AppState::for_testing(config, clock);
    TestServer::new(build_router(state)).unwrap()
}

fn server() -> TestServer {
    server_with(Config::for_testing())
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

async fn admin_token(server: &TestServer) -> String {
    let response = server
        .post("/api/admin/session")
        .json(&json!({ "secret": "test-secret" }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_answers() {
    let server = server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn admin_routes_refuse_anonymous_callers() {
    let server = server();
    for path in ["/api/guests", "/api/attendance", "/api/stats"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), 401, "{path} must be gated");
    }
}

#[tokio::test]
async fn wrong_secret_is_refused() {
    let server = server();
    let response = server
        .post("/api/admin/session")
        .json(&json!({ "secret": "guess" }))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn rsvp_returns_a_credential_for_the_qr_screen() {
    let server = server();
    let response = server
        .post("/api/rsvp")
        .json(&json!({
            "name": "Jane Doe",
            "attending": true,
            "message": "So excited!"
        }))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["name"], "Jane Doe");
    assert_eq!(body["attending"], true);
    assert!(!body["credential"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn rsvp_with_an_empty_name_is_a_validation_error() {
    let server = server();
    let response = server
        .post("/api/rsvp")
        .json(&json!({ "name": "  ", "attending": true }))
        .await;
    assert_eq!(response.status_code(), 422);
}

#[tokio::test]
async fn rsvp_after_the_deadline_is_refused() {
    let mut config = Config::for_testing();
    config.rsvp_deadline = Some(Utc::now() - Duration::days(1));
    let server = server_with(config);

    let response = server
        .post("/api/rsvp")
        .json(&json!({ "name": "Late Guest", "attending": true }))
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(
        response.json::<Value>()["message"]
            .as_str()
            .unwrap()
            .contains("deadline")
    );
}

#[tokio::test]
async fn scan_flow_over_http_admits_once_then_rejects() {
    let server = server();
    let token = admin_token(&server).await;
    let (name, value) = bearer(&token);

    // Jane RSVPs attending.
    let rsvp = server
        .post("/api/rsvp")
        .json(&json!({ "name": "Jane Doe", "attending": true }))
        .await
        .json::<Value>();
    let credential = rsvp["credential"].as_str().unwrap().to_string();

    // First scan admits her.
    let first = server
        .post("/api/checkin")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "token": credential }))
        .await;
    first.assert_status_ok();
    let body = first.json::<Value>();
    assert_eq!(body["outcome"], "welcomed");
    assert_eq!(body["guest_name"], "Jane Doe");

    // Second scan is a duplicate — still HTTP 200, distinct message.
    let second = server
        .post("/api/checkin")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "token": credential }))
        .await;
    second.assert_status_ok();
    let body = second.json::<Value>();
    assert_eq!(body["outcome"], "rejected");
    assert_eq!(body["reason"], "already_checked_in");

    // An unknown token is simply not found.
    let unknown = server
        .post("/api/checkin")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "token": "EVT-never-issued" }))
        .await;
    assert_eq!(unknown.json::<Value>()["reason"], "not_found");

    // The attendance view shows exactly one record.
    let attendance = server
        .get("/api/attendance")
        .add_header(name, value)
        .await
        .json::<Value>();
    assert_eq!(attendance.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn declined_guest_is_rejected_with_a_distinct_reason() {
    let server = server();
    let token = admin_token(&server).await;
    let (name, value) = bearer(&token);

    let rsvp = server
        .post("/api/rsvp")
        .json(&json!({ "name": "John Smith", "attending": false }))
        .await
        .json::<Value>();
    let credential = rsvp["credential"].as_str().unwrap();

    let response = server
        .post("/api/checkin")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "token": credential }))
        .await;
    assert_eq!(response.json::<Value>()["reason"], "not_attending");

    let attendance = server
        .get("/api/attendance")
        .add_header(name, value)
        .await
        .json::<Value>();
    assert!(attendance.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn pre_registration_conflicts_on_duplicate_names() {
    let server = server();
    let token = admin_token(&server).await;
    let (name, value) = bearer(&token);

    let created = server
        .post("/api/guests")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "name": "Invited Guest" }))
        .await;
    assert_eq!(created.status_code(), 201);

    let duplicate = server
        .post("/api/guests")
        .add_header(name, value)
        .json(&json!({ "name": "invited guest" }))
        .await;
    assert_eq!(duplicate.status_code(), 409);
}

#[tokio::test]
async fn stats_reflect_rsvps_and_checkins() {
    let server = server();
    let token = admin_token(&server).await;
    let (name, value) = bearer(&token);

    let rsvp = server
        .post("/api/rsvp")
        .json(&json!({ "name": "Jane Doe", "attending": true }))
        .await
        .json::<Value>();
    server
        .post("/api/rsvp")
        .json(&json!({ "name": "John Smith", "attending": false }))
        .await
        .assert_status_ok();
    server
        .post("/api/checkin")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "token": rsvp["credential"] }))
        .await
        .assert_status_ok();

    let stats = server
        .get("/api/stats")
        .add_header(name, value)
        .await
        .json::<Value>();
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["responded"], 2);
    assert_eq!(stats["attending"], 1);
    assert_eq!(stats["checked_in"], 1);
}

#[tokio::test]
async fn export_serves_quoted_csv() {
    let server = server();
    let token = admin_token(&server).await;
    let (name, value) = bearer(&token);

    server
        .post("/api/rsvp")
        .json(&json!({ "name": "Jane Doe", "attending": true }))
        .await
        .assert_status_ok();

    let response = server.get("/api/guests/export").add_header(name, value).await;
    response.assert_status_ok();
    assert!(
        response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );

    let csv = response.text();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().contains("\"Credential\""));
    assert!(lines.next().unwrap().contains("\"Jane Doe\""));
}
