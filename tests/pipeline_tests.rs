//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to stand in for both external collaborators:
//! the Overpass endpoints and the search index.

use placewalk::config::{Config, IndexConfig};
use placewalk::crawler::{Harvester, OverpassFetcher};
use placewalk::grid::BoundingBox;
use placewalk::index::{ElasticIndex, IndexError, SearchIndex};
use placewalk::HarvestError;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INTERPRETER_PATH: &str = "/api/interpreter";

fn test_bbox() -> BoundingBox {
    BoundingBox::new(37.0, 126.5, 37.7, 127.1).unwrap()
}

/// Creates a test configuration pointing at mock servers, with delays short
/// enough for tests
fn test_config(overpass_endpoints: Vec<String>, es_node: &str, bboxes: &str) -> Config {
    let mut config = Config::default();
    config.crawl.endpoints = overpass_endpoints;
    config.crawl.bboxes = Some(bboxes.to_string());
    config.crawl.max_retries = 3;
    config.crawl.base_delay_ms = 10;
    config.crawl.query_timeout_secs = 2;
    config.index.node = es_node.to_string();
    config.index.startup_retries = 3;
    config.index.startup_delay_ms = 10;
    config
}

fn test_index_config(es_node: &str) -> IndexConfig {
    IndexConfig {
        node: es_node.to_string(),
        startup_retries: 5,
        startup_delay_ms: 10,
        ..IndexConfig::default()
    }
}

/// Three raw elements: a cafe node, a bakery way, and one element the
/// normalizer rejects
fn overpass_elements() -> serde_json::Value {
    json!({
        "version": 0.6,
        "elements": [
            {
                "type": "node", "id": 1, "lat": 37.5665, "lon": 126.978,
                "tags": { "amenity": "cafe", "name": "Cafe Mori" }
            },
            {
                "type": "way", "id": 2,
                "center": { "lat": 37.57, "lon": 126.99 },
                "tags": { "shop": "bakery", "name": "Morning Loaf", "addr:city": "Seoul" }
            },
            {
                "type": "node", "id": 3, "lat": 37.58, "lon": 126.97,
                "tags": { "amenity": "fountain", "name": "Not A Shop" }
            }
        ]
    })
}

async fn mount_ready_index(es: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tagline": "ok" })))
        .mount(es)
        .await;
}

#[tokio::test]
async fn test_full_pipeline_dedupes_across_overlapping_boxes() {
    let overpass = MockServer::start().await;
    let es = MockServer::start().await;

    // Both boxes get the same answer, as overlapping cells would
    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_elements()))
        .expect(2)
        .mount(&overpass)
        .await;

    mount_ready_index(&es).await;
    Mock::given(method("HEAD"))
        .and(path("/places"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&es)
        .await;
    Mock::given(method("PUT"))
        .and(path("/places"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&es)
        .await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "errors": false, "items": [] })),
        )
        .expect(1)
        .mount(&es)
        .await;

    let config = test_config(
        vec![format!("{}{}", overpass.uri(), INTERPRETER_PATH)],
        &es.uri(),
        "37.0,126.5,37.7,127.1;37.4,126.8,38.0,127.4",
    );

    let index = ElasticIndex::new(&config.index).expect("failed to build index client");
    let harvester = Harvester::new(config, index).expect("failed to build harvester");
    let report = harvester.run().await.expect("harvest failed");

    assert_eq!(report.boxes, 2);
    assert_eq!(report.elements, 6);
    assert_eq!(report.rejected, 2);
    assert_eq!(report.unique, 2);
    assert_eq!(report.indexed, 2);

    // The single bulk request carries both surviving documents, once each
    let requests = es.received_requests().await.unwrap();
    let bulk_bodies: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path() == "/_bulk")
        .map(|r| String::from_utf8(r.body.clone()).unwrap())
        .collect();
    assert_eq!(bulk_bodies.len(), 1);
    let body = &bulk_bodies[0];
    assert_eq!(body.matches("node-1").count(), 2); // action line + document
    assert_eq!(body.matches("way-2").count(), 2);
    assert!(!body.contains("node-3"));
}

#[tokio::test]
async fn test_rerun_targets_identical_document_ids() {
    let overpass = MockServer::start().await;
    let es = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_elements()))
        .mount(&overpass)
        .await;

    mount_ready_index(&es).await;
    Mock::given(method("HEAD"))
        .and(path("/places"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&es)
        .await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "errors": false, "items": [] })),
        )
        .expect(2)
        .mount(&es)
        .await;

    let config = test_config(
        vec![format!("{}{}", overpass.uri(), INTERPRETER_PATH)],
        &es.uri(),
        "37.0,126.5,37.7,127.1",
    );

    for _ in 0..2 {
        let index = ElasticIndex::new(&config.index).unwrap();
        let harvester = Harvester::new(config.clone(), index).unwrap();
        let report = harvester.run().await.expect("harvest failed");
        assert_eq!(report.indexed, 2);
    }

    // Upserts address the same deterministic ids both times, so the second
    // run overwrites instead of duplicating
    let requests = es.received_requests().await.unwrap();
    let action_lines: Vec<Vec<String>> = requests
        .iter()
        .filter(|r| r.url.path() == "/_bulk")
        .map(|r| {
            String::from_utf8(r.body.clone())
                .unwrap()
                .lines()
                .step_by(2)
                .map(str::to_string)
                .collect()
        })
        .collect();
    assert_eq!(action_lines.len(), 2);
    assert_eq!(action_lines[0], action_lines[1]);
}

#[tokio::test]
async fn test_fetch_rotates_to_failover_endpoint() {
    let primary = MockServer::start().await;
    let failover = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_elements()))
        .expect(1)
        .mount(&failover)
        .await;

    let config = test_config(
        vec![
            format!("{}{}", primary.uri(), INTERPRETER_PATH),
            format!("{}{}", failover.uri(), INTERPRETER_PATH),
        ],
        "http://localhost:9200",
        "37.0,126.5,37.7,127.1",
    );

    let fetcher = OverpassFetcher::new(&config.crawl).unwrap();
    let elements = fetcher.fetch(&test_bbox()).await.unwrap();
    assert_eq!(elements.len(), 3);
}

#[tokio::test]
async fn test_fetch_retries_rate_limiting_until_success() {
    let overpass = MockServer::start().await;

    // First two attempts are rate limited, third succeeds
    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate_limited"))
        .up_to_n_times(2)
        .mount(&overpass)
        .await;
    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_elements()))
        .mount(&overpass)
        .await;

    let config = test_config(
        vec![format!("{}{}", overpass.uri(), INTERPRETER_PATH)],
        "http://localhost:9200",
        "37.0,126.5,37.7,127.1",
    );

    let fetcher = OverpassFetcher::new(&config.crawl).unwrap();
    let elements = fetcher.fetch(&test_bbox()).await.unwrap();
    assert_eq!(elements.len(), 3);

    let requests = overpass.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_fetch_exhausts_after_exactly_the_configured_attempts() {
    let overpass = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate_limited"))
        .expect(4)
        .mount(&overpass)
        .await;

    let mut config = test_config(
        vec![format!("{}{}", overpass.uri(), INTERPRETER_PATH)],
        "http://localhost:9200",
        "37.0,126.5,37.7,127.1",
    );
    config.crawl.max_retries = 4;

    let fetcher = OverpassFetcher::new(&config.crawl).unwrap();
    let err = fetcher.fetch(&test_bbox()).await.unwrap_err();

    match err {
        HarvestError::FetchExhausted { attempts, .. } => assert_eq!(attempts, 4),
        other => panic!("unexpected error: {other}"),
    }

    let requests = overpass.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_fetch_terminal_status_carries_context() {
    let overpass = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad query near line 1"))
        .expect(2)
        .mount(&overpass)
        .await;

    let mut config = test_config(
        vec![format!("{}{}", overpass.uri(), INTERPRETER_PATH)],
        "http://localhost:9200",
        "37.0,126.5,37.7,127.1",
    );
    config.crawl.max_retries = 2;

    let fetcher = OverpassFetcher::new(&config.crawl).unwrap();
    let err = fetcher.fetch(&test_bbox()).await.unwrap_err();

    match err {
        HarvestError::Endpoint { status, body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("bad query"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_fetch_retries_unparsable_success_body() {
    let overpass = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .up_to_n_times(1)
        .mount(&overpass)
        .await;
    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(overpass_elements()))
        .mount(&overpass)
        .await;

    let config = test_config(
        vec![format!("{}{}", overpass.uri(), INTERPRETER_PATH)],
        "http://localhost:9200",
        "37.0,126.5,37.7,127.1",
    );

    let fetcher = OverpassFetcher::new(&config.crawl).unwrap();
    let elements = fetcher.fetch(&test_bbox()).await.unwrap();
    assert_eq!(elements.len(), 3);

    let requests = overpass.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_bulk_partial_failure_aborts_the_run() {
    let overpass = MockServer::start().await;
    let es = MockServer::start().await;

    // Three distinct cafes so chunk size 1 produces three chunks
    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [
                {"type": "node", "id": 1, "lat": 37.51, "lon": 126.91,
                 "tags": {"amenity": "cafe", "name": "Alpha"}},
                {"type": "node", "id": 2, "lat": 37.52, "lon": 126.92,
                 "tags": {"amenity": "cafe", "name": "Beta"}},
                {"type": "node", "id": 3, "lat": 37.53, "lon": 126.93,
                 "tags": {"amenity": "cafe", "name": "Gamma"}}
            ]
        })))
        .mount(&overpass)
        .await;

    mount_ready_index(&es).await;
    Mock::given(method("HEAD"))
        .and(path("/places"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&es)
        .await;
    // First chunk is accepted, the second reports a per-document error
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "errors": false, "items": [] })),
        )
        .up_to_n_times(1)
        .mount(&es)
        .await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": true,
            "items": [
                {"index": {"_id": "node-2", "status": 400,
                 "error": {"type": "mapper_parsing_exception", "reason": "failed to parse"}}}
            ]
        })))
        .mount(&es)
        .await;

    let mut config = test_config(
        vec![format!("{}{}", overpass.uri(), INTERPRETER_PATH)],
        &es.uri(),
        "37.0,126.5,37.7,127.1",
    );
    config.index.chunk_size = 1;

    let index = ElasticIndex::new(&config.index).unwrap();
    let harvester = Harvester::new(config, index).unwrap();
    let err = harvester.run().await.unwrap_err();

    match err {
        HarvestError::Index(IndexError::BulkPartialFailure { chunk, failed, .. }) => {
            assert_eq!(chunk, 2);
            assert_eq!(failed, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The third chunk was never issued
    let requests = es.received_requests().await.unwrap();
    let bulk_count = requests.iter().filter(|r| r.url.path() == "/_bulk").count();
    assert_eq!(bulk_count, 2);
}

#[tokio::test]
async fn test_ensure_index_skips_creation_when_present() {
    let es = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/places"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&es)
        .await;
    Mock::given(method("PUT"))
        .and(path("/places"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&es)
        .await;

    let index = ElasticIndex::new(&test_index_config(&es.uri())).unwrap();
    index.ensure_index().await.unwrap();
}

#[tokio::test]
async fn test_wait_ready_probes_until_the_index_answers() {
    let es = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("starting up"))
        .up_to_n_times(1)
        .mount(&es)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tagline": "ok" })))
        .mount(&es)
        .await;

    let index = ElasticIndex::new(&test_index_config(&es.uri())).unwrap();
    index.wait_ready().await.unwrap();

    let requests = es.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}
