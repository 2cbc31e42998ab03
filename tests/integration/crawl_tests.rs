//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use parking_lot::Mutex;
use siteseek::config::{parse_config, Config, Language};
use siteseek::crawler::{IndexingController, IndexingError};
use siteseek::lemma::{LemmaExtractor, StemmingExtractor};
use siteseek::search::{SearchEngine, SearchError};
use siteseek::state::SiteStatus;
use siteseek::storage::{SharedStorage, SqliteStorage, Storage};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with one site rooted at `site_url`
fn create_test_config(site_url: &str) -> Config {
    let toml = format!(
        r#"
        [storage]
        database-path = "unused.db"

        [crawler]
        timeout-ms = 2000
        max-concurrent-tasks = 4
        language = "english"

        [search]
        live-titles = false

        [[sites]]
        url = "{}"
        name = "Test Site"
        "#,
        site_url
    );
    parse_config(&toml).unwrap()
}

struct Harness {
    config: Arc<Config>,
    storage: SharedStorage,
    extractor: Arc<dyn LemmaExtractor>,
    controller: IndexingController,
}

fn harness(site_url: &str) -> Harness {
    let config = Arc::new(create_test_config(site_url));
    let storage: SharedStorage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
    let extractor: Arc<dyn LemmaExtractor> =
        Arc::new(StemmingExtractor::new(Language::English).unwrap());
    let controller =
        IndexingController::new(config.clone(), storage.clone(), extractor.clone()).unwrap();
    Harness {
        config,
        storage,
        extractor,
        controller,
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_indexes_site() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Home</title></head><body>
                <p>Cats and dogs</p>
                <a href="/about">About</a>
                <a href="/about/">About again</a>
                <a href="/blog">Blog</a>
                <a href="/missing">Missing</a>
                <a href="/files/report.pdf">Report</a>
                <a href="https://elsewhere.example.com/page">External</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(
            r#"<html><head><title>About</title></head><body>
                <p>Our cats sleep</p>
                <a href="/">Home</a>
                <a href="/blog">Blog</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/blog",
        r#"<html><head><title>Blog</title></head><body><p>Dogs bark loudly</p></body></html>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/report.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.controller.start_indexing().await.unwrap();
    h.controller.wait_until_idle().await;
    assert!(!h.controller.is_indexing());

    let storage = h.storage.lock();
    let site = storage.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.last_error, "");

    // "/", "/about", "/blog" and "/missing"
    assert_eq!(storage.count_pages(site.id).unwrap(), 4);
    assert!(storage.page_exists(site.id, "/").unwrap());
    assert!(storage.page_exists(site.id, "/about").unwrap());
    assert!(!storage.page_exists(site.id, "/about/").unwrap());

    let missing = storage.find_page(site.id, "/missing").unwrap().unwrap();
    assert_eq!(missing.code, 404);
    assert_eq!(missing.content, "");
    assert!(storage.postings_for_page(missing.id).unwrap().is_empty());

    let cat = storage.find_lemma(site.id, "cat").unwrap().unwrap();
    assert_eq!(cat.frequency, 2);
    let dog = storage.find_lemma(site.id, "dog").unwrap().unwrap();
    assert_eq!(dog.frequency, 2);
    assert!(storage.count_lemmas(site.id).unwrap() > 0);
}

#[tokio::test]
async fn test_recrawl_replaces_previous_data() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><p>Cats everywhere</p></body></html>"#,
    )
    .await;

    let h = harness(&server.uri());
    for _ in 0..2 {
        h.controller.start_indexing().await.unwrap();
        h.controller.wait_until_idle().await;
    }

    let storage = h.storage.lock();
    let site = storage.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(storage.count_pages(site.id).unwrap(), 1);
    assert_eq!(
        storage.find_lemma(site.id, "cat").unwrap().unwrap().frequency,
        1
    );
}

#[tokio::test]
async fn test_root_server_error_fails_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.controller.start_indexing().await.unwrap();
    h.controller.wait_until_idle().await;

    let storage = h.storage.lock();
    let site = storage.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Failed);
    assert_eq!(site.last_error, "Main page returned HTTP 500");
    assert_eq!(storage.count_pages(site.id).unwrap(), 0);
}

#[tokio::test]
async fn test_root_not_found_completes_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.controller.start_indexing().await.unwrap();
    h.controller.wait_until_idle().await;

    let storage = h.storage.lock();
    let site = storage.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.last_error, "");

    let root = storage.find_page(site.id, "/").unwrap().unwrap();
    assert_eq!(root.code, 404);
    assert_eq!(root.content, "");
}

#[tokio::test]
async fn test_inner_server_error_is_stored() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><p>Home</p><a href="/boom">Boom</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/boom"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.controller.start_indexing().await.unwrap();
    h.controller.wait_until_idle().await;

    let storage = h.storage.lock();
    let site = storage.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.last_error, "");

    let boom = storage.find_page(site.id, "/boom").unwrap().unwrap();
    assert_eq!(boom.code, 500);
    assert_eq!(boom.content, "");
    assert!(storage.postings_for_page(boom.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_stop_during_crawl_fails_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html(r#"<html><body><a href="/slow">Slow</a></body></html>"#)
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html(r#"<html><body><p>Slow page</p></body></html>"#)
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.controller.start_indexing().await.unwrap();
    assert!(h.controller.is_indexing());

    tokio::time::sleep(Duration::from_millis(100)).await;
    h.controller.stop_indexing().unwrap();
    assert!(!h.controller.is_indexing());
    h.controller.wait_until_idle().await;

    let storage = h.storage.lock();
    let site = storage.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Failed);
    assert_eq!(site.last_error, "Indexing stopped by user");
}

#[tokio::test]
async fn test_stop_when_idle() {
    let server = MockServer::start().await;
    let h = harness(&server.uri());

    assert!(matches!(
        h.controller.stop_indexing(),
        Err(IndexingError::NotRunning)
    ));
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html(r#"<html><body><p>Home</p></body></html>"#).set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.controller.start_indexing().await.unwrap();
    assert!(matches!(
        h.controller.start_indexing().await,
        Err(IndexingError::AlreadyRunning)
    ));

    h.controller.wait_until_idle().await;
    assert!(!h.controller.is_indexing());
}

#[tokio::test]
async fn test_index_single_page() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/news",
        r#"<html><head><title>News</title></head><body><p>Cats win elections</p></body></html>"#,
    )
    .await;

    let h = harness(&server.uri());
    let page_url = format!("{}/news", server.uri());
    let body: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("url", &page_url)
        .finish();

    let indexed = h.controller.index_page(&body).await.unwrap();
    assert_eq!(indexed.site_url, server.uri());
    assert_eq!(indexed.path, "/news");
    assert_eq!(indexed.status_code, 200);
    assert!(indexed.postings > 0);

    // The raw url form indexes the same page again without doubling frequencies
    h.controller.index_page(&page_url).await.unwrap();

    let storage = h.storage.lock();
    let site = storage.get_site_by_url(&server.uri()).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(storage.count_pages(site.id).unwrap(), 1);
    assert_eq!(
        storage.find_lemma(site.id, "cat").unwrap().unwrap().frequency,
        1
    );
}

#[tokio::test]
async fn test_index_page_outside_sites() {
    let server = MockServer::start().await;
    let h = harness(&server.uri());

    let result = h.controller.index_page("https://elsewhere.example.com/page").await;
    assert!(matches!(result, Err(IndexingError::OutsideConfiguredSites)));
}

#[tokio::test]
async fn test_search_after_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <p>Welcome home</p>
            <a href="/cats">Kittens</a>
            <a href="/dogs">Puppies</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/cats",
        r#"<html><head><title>Cats</title></head><body><p>Cats purr. Cats sleep. Cats eat.</p></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/dogs",
        r#"<html><head><title>Dogs</title></head><body><p>Dogs bark and chase cats.</p></body></html>"#,
    )
    .await;

    let h = harness(&server.uri());
    h.controller.start_indexing().await.unwrap();
    h.controller.wait_until_idle().await;

    let engine = SearchEngine::new(h.config.clone(), h.storage.clone(), h.extractor.clone()).unwrap();

    let response = engine.search("cats", None, None, None).await.unwrap();
    assert_eq!(response.count, 2);
    assert_eq!(response.data[0].uri, "/cats");
    assert_eq!(response.data[0].title, "Cats");
    assert_eq!(response.data[0].site_name, "Test Site");
    assert!((response.data[0].relevance - 1.0).abs() < 1e-9);
    assert!(response.data[0].snippet.contains("<b>"));
    assert!(response.data[1].relevance < response.data[0].relevance);

    let scoped = engine
        .search("cats", Some(&server.uri()), Some(1), Some(5))
        .await
        .unwrap();
    assert_eq!(scoped.count, 2);
    assert_eq!(scoped.data.len(), 1);
    assert_eq!(scoped.data[0].uri, "/dogs");

    assert!(matches!(
        engine.search("zebra", None, None, None).await,
        Err(SearchError::NothingFound)
    ));
}
