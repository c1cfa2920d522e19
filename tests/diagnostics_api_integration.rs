//! Integration tests for the diagnostics API endpoints, driving the axum
//! router end-to-end against an in-memory SQLite store.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, NaiveDate, NaiveTime};
use netdiag::api::create_api_router;
use netdiag::auth::AuthService;
use netdiag::config::{AuthConfig, AuthMode};
use netdiag::models::NewDiagnostic;
use netdiag::storage::{DiagnosticsStore, SqliteStore};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const CITIES: [(&str, &str); 10] = [
    ("Salvador", "BA"),
    ("Feira de Santana", "BA"),
    ("São Paulo", "SP"),
    ("Rio de Janeiro", "RJ"),
    ("Belo Horizonte", "MG"),
    ("Brasília", "DF"),
    ("Recife", "PE"),
    ("Fortaleza", "CE"),
    ("Curitiba", "PR"),
    ("Porto Alegre", "RS"),
];

fn latest_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 7).unwrap()
}

async fn create_seeded_store() -> Arc<dyn DiagnosticsStore> {
    let store = SqliteStore::new("sqlite::memory:", 5).await.unwrap();
    store.init().await.unwrap();

    // 10 cities × 5 records/day × 7 days = 350 rows.
    for day_offset in 0..7 {
        let day = latest_day() - Duration::days(day_offset);
        for (city_idx, (city, state)) in CITIES.iter().enumerate() {
            for n in 0..5u32 {
                let time = NaiveTime::from_hms_opt(10 + n, city_idx as u32, 0).unwrap();
                store
                    .insert(&NewDiagnostic {
                        device_id: format!("DEV{:03}", city_idx * 5 + n as usize + 1),
                        city: city.to_string(),
                        state: state.to_string(),
                        latency_ms: 40.0 + city_idx as f64,
                        packet_loss: 1.0,
                        quality_of_service: 90.0 - city_idx as f64,
                        date: day.and_time(time),
                    })
                    .await
                    .unwrap();
            }
        }
    }

    Arc::new(store)
}

fn open_auth() -> Arc<AuthService> {
    Arc::new(
        AuthService::new(&AuthConfig {
            mode: AuthMode::None,
            secret_key: None,
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
            token_ttl_hours: 24,
        })
        .unwrap(),
    )
}

fn token_auth() -> Arc<AuthService> {
    Arc::new(
        AuthService::new(&AuthConfig {
            mode: AuthMode::Token,
            secret_key: Some("test-secret".to_string()),
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
            token_ttl_hours: 24,
        })
        .unwrap(),
    )
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn list_first_page_defaults() {
    let app = create_api_router(create_seeded_store().await, open_auth());

    let (status, json) = get_json(app, "/api/diagnostics").await;
    assert_eq!(status, StatusCode::OK);

    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 10);

    // Descending timestamp order (ISO strings compare lexicographically).
    let dates: Vec<&str> = data.iter().map(|r| r["date"].as_str().unwrap()).collect();
    for pair in dates.windows(2) {
        assert!(pair[0] >= pair[1]);
    }

    let pagination = &json["pagination"];
    assert_eq!(pagination["total"], 350);
    assert_eq!(pagination["page"], 1);
    assert_eq!(pagination["limit"], 10);
    assert_eq!(pagination["total_pages"], 35);
    assert_eq!(pagination["has_prev"], false);
    assert_eq!(pagination["has_next"], true);
    assert_eq!(pagination["next_url"], "/api/diagnostics?page=2&limit=10");
    assert_eq!(pagination["prev_url"], Value::Null);
}

#[tokio::test]
async fn list_filtered_by_city() {
    let app = create_api_router(create_seeded_store().await, open_auth());

    let (status, json) = get_json(app, "/api/diagnostics?city=Salvador&limit=100").await;
    assert_eq!(status, StatusCode::OK);

    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 35);
    assert!(data.iter().all(|r| r["city"] == "Salvador"));
    assert_eq!(json["pagination"]["total"], 35);
    assert_eq!(json["pagination"]["total_pages"], 1);
}

#[tokio::test]
async fn list_links_carry_filters() {
    let app = create_api_router(create_seeded_store().await, open_auth());

    let (status, json) = get_json(app, "/api/diagnostics?page=2&limit=10&city=Salvador").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pagination"]["total_pages"], 4);
    assert_eq!(
        json["pagination"]["next_url"],
        "/api/diagnostics?page=3&limit=10&city=Salvador"
    );
    assert_eq!(
        json["pagination"]["prev_url"],
        "/api/diagnostics?page=1&limit=10&city=Salvador"
    );
}

#[tokio::test]
async fn list_rejects_out_of_range_pagination() {
    let store = create_seeded_store().await;

    let app = create_api_router(Arc::clone(&store), open_auth());
    let (status, json) = get_json(app, "/api/diagnostics?page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("'page'"));

    let app = create_api_router(Arc::clone(&store), open_auth());
    let (status, json) = get_json(app, "/api/diagnostics?limit=101").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("'limit'"));

    let app = create_api_router(store, open_auth());
    let (status, _) = get_json(app, "/api/diagnostics?page=10001").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_by_id_and_not_found() {
    let store = create_seeded_store().await;

    let app = create_api_router(Arc::clone(&store), open_auth());
    let (status, json) = get_json(app, "/api/diagnostics/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], 1);
    assert!(json["data"]["latency_ms"].is_f64() || json["data"]["latency_ms"].is_i64());

    let app = create_api_router(store, open_auth());
    let (status, json) = get_json(app, "/api/diagnostics/99999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Diagnostic not found");
}

#[tokio::test]
async fn aggregate_by_state_sums_to_grand_total() {
    let app = create_api_router(create_seeded_store().await, open_auth());

    let (status, json) = get_json(app, "/api/diagnostics/aggregate?group_by=state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["group_by"], "state");

    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 9);
    let sum: i64 = data.iter().map(|r| r["total"].as_i64().unwrap()).sum();
    assert_eq!(sum, 350);
    // Ordered by total descending; BA covers two cities.
    assert_eq!(data[0]["state"], "BA");
    assert_eq!(data[0]["total"], 70);
}

#[tokio::test]
async fn aggregate_defaults_to_day_and_echoes_filters() {
    let app = create_api_router(create_seeded_store().await, open_auth());

    let (status, json) = get_json(app, "/api/diagnostics/aggregate?city=%20Salvador%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["group_by"], "day");
    assert_eq!(json["filters"]["city"], "Salvador");
    assert_eq!(json["filters"]["state"], Value::Null);

    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 7);
    for row in data {
        assert_eq!(row["total"], 5);
        assert!(row["day"].is_string());
        assert!(row["min_latency_ms"].is_number());
        assert!(row["max_latency_ms"].is_number());
    }
}

#[tokio::test]
async fn aggregate_rejects_unknown_group_by() {
    let app = create_api_router(create_seeded_store().await, open_auth());

    let (status, json) = get_json(app, "/api/diagnostics/aggregate?group_by=device").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("group_by"));
}

#[tokio::test]
async fn statistics_summary_and_empty_match() {
    let store = create_seeded_store().await;

    let app = create_api_router(Arc::clone(&store), open_auth());
    let (status, json) = get_json(app, "/api/diagnostics/statistics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total_diagnostics"], 350);
    assert_eq!(json["data"]["total_cities"], 10);
    assert_eq!(json["data"]["total_states"], 9);
    assert_eq!(json["data"]["avg_packet_loss"], 1.0);
    assert!(json["data"]["first_diagnostic"].is_string());
    assert!(json["data"]["last_diagnostic"].is_string());

    let app = create_api_router(store, open_auth());
    let (status, json) = get_json(app, "/api/diagnostics/statistics?city=Atlantis").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total_diagnostics"], 0);
    assert_eq!(json["data"]["avg_latency_ms"], 0.0);
    assert_eq!(json["data"]["first_diagnostic"], Value::Null);
    assert_eq!(json["filters"]["city"], "Atlantis");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let store = create_seeded_store().await;
    let auth = token_auth();

    // No Authorization header.
    let app = create_api_router(Arc::clone(&store), Arc::clone(&auth));
    let (status, json) = get_json(app, "/api/diagnostics").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Unauthorized");

    // Health stays open.
    let app = create_api_router(Arc::clone(&store), Arc::clone(&auth));
    let (status, json) = get_json(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");

    // A valid token passes the gate.
    let token = auth.issue_token("admin").unwrap();
    let app = create_api_router(store, auth);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/diagnostics?limit=1")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_issues_usable_tokens() {
    let store = create_seeded_store().await;
    let auth = token_auth();

    // Wrong password.
    let app = create_api_router(Arc::clone(&store), Arc::clone(&auth));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"username":"admin","password":"wrong"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct credentials return a token the verify endpoint accepts.
    let app = create_api_router(Arc::clone(&store), Arc::clone(&auth));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"username":"admin","password":"admin"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    let token = json["token"].as_str().unwrap().to_string();

    let app = create_api_router(store, auth);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/verify")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
