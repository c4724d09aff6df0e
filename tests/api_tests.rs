use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use movie_recommender::models::Item;
use movie_recommender::routes::{create_router, AppState};
use movie_recommender::services::Catalog;

const PLACEHOLDER: &str = "/static/placeholder.png";

fn test_catalog() -> Catalog {
    Catalog::new(vec![
        Item::new(1, "Blast Radius", 1995, "action hero explosions")
            .with_poster("https://img/1.jpg"),
        Item::new(2, "Summer Hearts", 1996, "romance drama love"),
        Item::new(3, "Agent Zero", 1997, "action spy explosions"),
        Item::new(4, "Deep Space", 1998, "space alien ship"),
        Item::new(5, "Red Planet Run", 1999, "space alien war"),
        Item::new(6, "Dust Trail", 2000, "western horse"),
        Item::new(7, "Ranch Hands", 2001, "horse ranch western"),
        Item::new(8, "Tidal", 2002, "ship war ocean"),
        Item::new(9, "Old Reel", 1950, "silent comedy"),
    ])
}

fn create_test_server() -> TestServer {
    let state = Arc::new(AppState::new(test_catalog(), PLACEHOLDER));
    TestServer::new(create_router(state)).unwrap()
}

async fn complete_session(server: &TestServer, liked: &[u64]) -> String {
    let response = server
        .post("/api/v1/sessions")
        .json(&json!({ "input_len": 5, "top_k": 5 }))
        .await;
    let session: Value = response.json();
    let id = session["id"].as_str().unwrap().to_string();

    server
        .post(&format!("/api/v1/sessions/{}/start", id))
        .await
        .assert_status_ok();

    for item_id in liked {
        server
            .post(&format!("/api/v1/sessions/{}/selections", id))
            .json(&json!({ "item_id": item_id, "event_id": Uuid::new_v4() }))
            .await
            .assert_status_ok();
    }
    id
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let id = Uuid::new_v4().to_string();
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_str(&id).unwrap(),
        )
        .await;
    assert_eq!(response.header("x-request-id").to_str().unwrap(), id);
}

#[tokio::test]
async fn test_catalog_filters_by_year() {
    let server = create_test_server();
    let response = server
        .get("/api/v1/catalog")
        .add_query_param("min_year", 1995)
        .add_query_param("max_year", 1997)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["total"], 3);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["poster"], "https://img/1.jpg");
    assert_eq!(items[1]["poster"], PLACEHOLDER);
}

#[tokio::test]
async fn test_catalog_item_not_found() {
    let server = create_test_server();
    let response = server.get("/api/v1/catalog/404").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stateless_content_recommendation() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "liked_ids": [1], "top_k": 1 }))
        .await;
    response.assert_status_ok();

    let recs: Vec<Value> = response.json();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["id"], 3);
}

#[tokio::test]
async fn test_recommendation_under_supply() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({
            "liked_ids": [4],
            "top_k": 10,
            "years": { "min": 1995, "max": 1999 }
        }))
        .await;
    response.assert_status_ok();

    let recs: Vec<Value> = response.json();
    assert_eq!(recs.len(), 4);
    assert_eq!(recs[0]["id"], 5);
}

#[tokio::test]
async fn test_random_strategy_with_empty_liked_set() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "liked_ids": [], "top_k": 4, "strategy": "random" }))
        .await;
    response.assert_status_ok();

    let recs: Vec<Value> = response.json();
    assert_eq!(recs.len(), 4);
    assert!(recs.iter().all(|r| r.get("score").is_none()));
}

#[tokio::test]
async fn test_unknown_liked_item_is_unprocessable() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "liked_ids": [999], "top_k": 3 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_invalid_session_settings() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/sessions")
        .json(&json!({ "top_k": 50 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_flow() {
    let server = create_test_server();

    let response = server.post("/api/v1/sessions").json(&json!({})).await;
    response.assert_status(StatusCode::CREATED);
    let session: Value = response.json();
    let id = session["id"].as_str().unwrap().to_string();
    assert_eq!(session["phase"], "configuring");

    // Pool is locked until the session starts
    server
        .get(&format!("/api/v1/sessions/{}/pool", id))
        .await
        .assert_status(StatusCode::CONFLICT);

    server
        .put(&format!("/api/v1/sessions/{}/settings", id))
        .json(&json!({ "input_len": 5, "top_k": 5, "years": { "min": 1990, "max": 2010 } }))
        .await
        .assert_status_ok();

    server
        .post(&format!("/api/v1/sessions/{}/start", id))
        .await
        .assert_status_ok();

    let response = server
        .get(&format!("/api/v1/sessions/{}/pool", id))
        .add_query_param("size", 20)
        .await;
    response.assert_status_ok();
    let pool: Value = response.json();
    // "Old Reel" falls outside 1990-2010
    assert_eq!(pool["items"].as_array().unwrap().len(), 8);

    // Recommendations are not ready yet
    server
        .get(&format!("/api/v1/sessions/{}/recommendations", id))
        .await
        .assert_status(StatusCode::CONFLICT);

    for item_id in [1, 4, 5, 6, 7] {
        let response = server
            .post(&format!("/api/v1/sessions/{}/selections", id))
            .json(&json!({ "item_id": item_id, "event_id": Uuid::new_v4() }))
            .await;
        response.assert_status_ok();
    }

    let session: Value = server
        .get(&format!("/api/v1/sessions/{}", id))
        .await
        .json();
    assert_eq!(session["phase"], "complete");
    assert_eq!(session["remaining"], 0);

    let response = server
        .get(&format!("/api/v1/sessions/{}/recommendations", id))
        .await;
    response.assert_status_ok();
    let recs: Value = response.json();
    let liked = [1, 4, 5, 6, 7];
    for list in ["random", "recommended"] {
        let entries = recs[list].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries
            .iter()
            .all(|e| !liked.contains(&e["id"].as_u64().unwrap())));
    }
}

#[tokio::test]
async fn test_replayed_selection_counts_once() {
    let server = create_test_server();
    let id = complete_session(&server, &[]).await;
    let event_id = Uuid::new_v4();

    for _ in 0..2 {
        server
            .post(&format!("/api/v1/sessions/{}/selections", id))
            .json(&json!({ "item_id": 2, "event_id": event_id }))
            .await
            .assert_status_ok();
    }

    let session: Value = server
        .get(&format!("/api/v1/sessions/{}", id))
        .await
        .json();
    assert_eq!(session["selected_count"], 1);
}

#[tokio::test]
async fn test_selection_outside_year_range_rejected() {
    let server = create_test_server();
    let id = complete_session(&server, &[]).await;

    server
        .post(&format!("/api/v1/sessions/{}/selections", id))
        .json(&json!({ "item_id": 9, "event_id": Uuid::new_v4() }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_retry_resets_session() {
    let server = create_test_server();
    let id = complete_session(&server, &[1, 2, 3, 4, 5]).await;

    let response = server
        .post(&format!("/api/v1/sessions/{}/retry", id))
        .await;
    response.assert_status_ok();
    let session: Value = response.json();
    assert_eq!(session["phase"], "configuring");
    assert_eq!(session["selected_count"], 0);
    assert_eq!(session["settings"]["input_len"], 5);
}

#[tokio::test]
async fn test_session_recommendations_with_sum_strategy() {
    let server = create_test_server();
    let id = complete_session(&server, &[4, 5, 1, 2, 6]).await;

    let response = server
        .get(&format!("/api/v1/sessions/{}/recommendations", id))
        .add_query_param("strategy", "content_rank")
        .await;
    response.assert_status_ok();

    let recs: Value = response.json();
    assert_eq!(recs["strategy"], "content_rank");
    // "Ranch Hands" shares two terms with "Dust Trail"
    let recommended = recs["recommended"].as_array().unwrap();
    let ids: Vec<u64> = recommended.iter().map(|r| r["id"].as_u64().unwrap()).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], 7);
    assert!(ids.contains(&3) && ids.contains(&8));
}

#[tokio::test]
async fn test_unknown_session() {
    let server = create_test_server();
    server
        .get(&format!("/api/v1/sessions/{}", Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
