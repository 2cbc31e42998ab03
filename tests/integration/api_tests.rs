//! Integration tests for the HTTP API
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`,
//! so no socket is bound.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use siteseek::api::{build_app, AppState};
use siteseek::config::{parse_config, Language};
use siteseek::crawler::IndexingController;
use siteseek::lemma::{LemmaExtractor, StemmingExtractor};
use siteseek::search::SearchEngine;
use siteseek::storage::{SharedStorage, SqliteStorage};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_state(site_url: &str) -> AppState {
    let toml = format!(
        r#"
        [storage]
        database-path = "unused.db"

        [crawler]
        timeout-ms = 2000
        language = "english"

        [search]
        live-titles = false

        [[sites]]
        url = "{}"
        name = "Test Site"
        "#,
        site_url
    );
    let config = Arc::new(parse_config(&toml).unwrap());
    let storage: SharedStorage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let extractor: Arc<dyn LemmaExtractor> =
        Arc::new(StemmingExtractor::new(Language::English).unwrap());

    let controller = Arc::new(
        IndexingController::new(config.clone(), storage.clone(), extractor.clone()).unwrap(),
    );
    let search = Arc::new(SearchEngine::new(config.clone(), storage.clone(), extractor).unwrap());

    AppState {
        config,
        storage,
        controller,
        search,
    }
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_statistics_lists_configured_sites() {
    let state = app_state("http://site.test");

    let (status, json) = send(&state, get("/api/statistics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"], true);
    assert_eq!(json["statistics"]["total"]["sites"], 1);
    assert_eq!(json["statistics"]["total"]["pages"], 0);
    assert_eq!(json["statistics"]["total"]["indexing"], false);

    let detailed = &json["statistics"]["detailed"][0];
    assert_eq!(detailed["url"], "http://site.test");
    assert_eq!(detailed["name"], "Test Site");
    assert_eq!(detailed["status"], "NOT_INDEXED");
}

#[tokio::test]
async fn test_search_with_empty_query() {
    let state = app_state("http://site.test");

    let (status, json) = send(&state, get("/api/search?query=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["result"], false);
    assert_eq!(json["error"], "Empty search query");

    let (status, json) = send(&state, get("/api/search")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["result"], false);
}

#[tokio::test]
async fn test_search_unknown_site() {
    let state = app_state("http://site.test");

    let (status, json) = send(
        &state,
        get("/api/search?query=cats&site=http%3A%2F%2Fother.test"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["result"], false);
}

#[tokio::test]
async fn test_stop_indexing_when_idle() {
    let state = app_state("http://site.test");

    let (status, json) = send(&state, get("/api/stopIndexing")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["result"], false);
    assert_eq!(json["error"], "Indexing is not running");
}

#[tokio::test]
async fn test_index_page_outside_sites() {
    let state = app_state("http://site.test");

    let request = Request::builder()
        .method("POST")
        .uri("/api/indexPage")
        .body(Body::from("url=https%3A%2F%2Felsewhere.test%2Fpage"))
        .unwrap();
    let (status, json) = send(&state, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["result"], false);
    assert_eq!(
        json["error"],
        "This page is outside the sites listed in the configuration file"
    );
}

#[tokio::test]
async fn test_index_page_then_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><head><title>News</title></head><body><p>Cats win again</p></body></html>",
            "text/html",
        ))
        .mount(&server)
        .await;

    let state = app_state(&server.uri());

    let request = Request::builder()
        .method("POST")
        .uri("/api/indexPage")
        .body(Body::from(format!("{}/news", server.uri())))
        .unwrap();
    let (status, json) = send(&state, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "result": true }));

    let (status, json) = send(&state, get("/api/search?query=cats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"], true);
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["uri"], "/news");
    assert_eq!(json["data"][0]["title"], "News");
    assert_eq!(json["data"][0]["siteName"], "Test Site");
    assert_eq!(json["data"][0]["relevance"], 1.0);

    let (_, json) = send(&state, get("/api/statistics")).await;
    assert_eq!(json["statistics"]["total"]["pages"], 1);
    assert_eq!(json["statistics"]["detailed"][0]["status"], "INDEXED");
}
