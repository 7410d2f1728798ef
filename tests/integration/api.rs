//! HTTP API over a SQLite-backed ledger.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use parlay_ledger::api::build_router;
use parlay_ledger::ledger::Ledger;
use parlay_ledger::storage::SqliteStore;

async fn app() -> Router {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    build_router(Arc::new(Ledger::with_store(Arc::new(store))))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn prizepicks_power(players: &[&str]) -> Value {
    let picks: Vec<Value> = players
        .iter()
        .map(|p| json!({"player_name": p, "stat_category": "Points", "line": 24.5, "direction": "higher"}))
        .collect();
    json!({
        "platform": "PrizePicks",
        "entry_type": "Power",
        "stake": 5,
        "picks": picks
    })
}

#[tokio::test]
async fn test_six_pick_limits_per_platform() {
    let app = app().await;
    let six = ["A", "B", "C", "D", "E", "F"];

    let (status, _) = send(&app, "POST", "/api/parlays", Some(prizepicks_power(&six))).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut underdog = prizepicks_power(&six);
    underdog["platform"] = json!("Underdog");
    underdog["entry_type"] = json!("Standard");
    let (status, body) = send(&app, "POST", "/api/parlays", Some(underdog)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at most 5"));
}

#[tokio::test]
async fn test_full_round_trip() {
    let app = app().await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/parlays",
        Some(prizepicks_power(&["Jokic", "Murray", "Porter"])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (_, parlay) = send(&app, "GET", &format!("/api/parlays/{id}"), None).await;
    assert_eq!(parlay["potential_payout"].as_f64(), Some(30.0));
    let picks: Vec<String> = parlay["picks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();

    let updates = json!({
        "updates": [
            {"pick_id": picks[0], "actual_value": 31},
            {"pick_id": picks[1], "actual_value": 25},
            {"pick_id": picks[2], "actual_value": 30}
        ]
    });
    let (status, summary) =
        send(&app, "PUT", &format!("/api/parlays/{id}/results"), Some(updates.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["status"], "won");
    assert_eq!(summary["payout"].as_f64(), Some(30.0));

    // Same batch again changes nothing.
    let (_, again) = send(&app, "PUT", &format!("/api/parlays/{id}/results"), Some(updates)).await;
    assert_eq!(again, summary);

    let (_, stats) = send(&app, "GET", "/api/stats?platform=prizepicks", None).await;
    assert_eq!(stats["won"], 1);
    assert_eq!(stats["total_profit"].as_f64(), Some(25.0));
    assert_eq!(stats["roi"].as_f64(), Some(500.0));

    let (status, _) = send(&app, "DELETE", &format!("/api/parlays/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/api/parlays/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = send(&app, "GET", "/api/parlays", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_pick_is_404() {
    let app = app().await;
    let (_, created) = send(&app, "POST", "/api/parlays", Some(prizepicks_power(&["A", "B"]))).await;
    let id = created["id"].as_str().unwrap();

    let updates = json!({"updates": [{"pick_id": uuid::Uuid::new_v4(), "result": "hit"}]});
    let (status, body) = send(&app, "PUT", &format!("/api/parlays/{id}/results"), Some(updates)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("Pick not found"));
}
