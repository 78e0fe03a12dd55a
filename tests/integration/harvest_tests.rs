//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the retailer API and exercise
//! pagination, retry, enrichment and reconciliation end-to-end.

use catalog_harvester::config::{parse_config, Config, PaginationConfig};
use catalog_harvester::harvest::{
    department_scope, Coordinator, DepartmentStrategy, DetailEndpoint, Enricher, Fetcher,
    HarvestOptions, LinkStrategy, RunStatus, Walker,
};
use catalog_harvester::output::RunStats;
use catalog_harvester::record::CatalogItem;
use catalog_harvester::snapshot::read_jsonl;
use catalog_harvester::{FetchError, HarvestError};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCTS: &str = "/api/v3/products";

/// Creates a test configuration pointing at the mock server with near-zero
/// delays and backoff
fn create_test_config(base_url: &str, output: &Path) -> Config {
    parse_config(&format!(
        r#"
[source]
base-url = "{}"
per-page = 100

[user-agent]
harvester-name = "TestHarvester"
harvester-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[retry]
max-attempts = 6
initial-backoff-ms = 1
max-backoff-ms = 4
timeout-secs = 5

[throttle]
listing-delay-ms = 0
detail-delay-ms = 0
reconcile-delay-ms = 0
tally-delay-ms = 0

[output]
path = '{}'
"#,
        base_url,
        output.display()
    ))
    .expect("test config should be valid")
}

fn products(ids: std::ops::RangeInclusive<u64>) -> Vec<Value> {
    ids.map(|id| json!({"id": id, "name": format!("Vare {}", id)}))
        .collect()
}

fn listing_page(items: Vec<Value>, next: Option<&str>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": items,
        "links": {"next": next},
    }))
}

fn ids(items: &[CatalogItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.id().expect("item id").to_string())
        .collect()
}

async fn mount_listing_page(server: &MockServer, page: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(query_param("page", page))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: u64, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", PRODUCTS, id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": body })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_link_walk_collects_every_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("out.jsonl"));

    mount_listing_page(&server, "1", listing_page(products(1..=100), Some("next-1"))).await;
    mount_listing_page(&server, "2", listing_page(products(101..=200), Some("next-2"))).await;
    mount_listing_page(&server, "3", listing_page(products(201..=237), None)).await;

    let fetcher = Fetcher::new(&config).unwrap();
    let walker = Walker::new(LinkStrategy::from_config(&config.source), Duration::ZERO);
    let mut stats = RunStats::default();

    let items = walker.walk(&fetcher, &mut stats).await.unwrap();

    assert_eq!(items.len(), 237);
    assert_eq!(ids(&items)[236], "237");
    assert_eq!(stats.errors, 0);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3, "walk must stop after the short third page");
}

#[tokio::test]
async fn test_listing_requests_carry_identifying_headers() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("out.jsonl"));

    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .and(query_param("per_page", "100"))
        .and(header(
            "user-agent",
            "TestHarvester/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .and(header("accept", "application/json"))
        .respond_with(listing_page(products(1..=3), None))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&config).unwrap();
    let walker = Walker::new(LinkStrategy::from_config(&config.source), Duration::ZERO);
    let items = walker.walk(&fetcher, &mut RunStats::default()).await.unwrap();

    assert_eq!(items.len(), 3);
}

#[tokio::test]
async fn test_department_batch_queries_only_its_departments() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("out.jsonl"));

    for (department, page, items) in [
        ("3", "1", products(1..=2)),
        ("4", "1", products(3..=3)),
        ("3", "2", vec![]),
        ("4", "2", vec![]),
    ] {
        Mock::given(method("GET"))
            .and(path(PRODUCTS))
            .and(query_param("department", department))
            .and(query_param("page", page))
            .respond_with(listing_page(items, None))
            .mount(&server)
            .await;
    }

    let scope = department_scope(&PaginationConfig::default().departments, 2, Some(2)).unwrap();
    let strategy = DepartmentStrategy::from_config(&config.source, &config.pagination, scope);
    let fetcher = Fetcher::new(&config).unwrap();
    let mut stats = RunStats::default();

    let items = Walker::new(strategy, Duration::ZERO)
        .walk(&fetcher, &mut stats)
        .await
        .unwrap();

    assert_eq!(ids(&items), vec!["1", "2", "3"]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
    for request in &requests {
        let department = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "department")
            .map(|(_, value)| value.into_owned());
        assert!(
            matches!(department.as_deref(), Some("3") | Some("4")),
            "unexpected department query {:?}",
            department
        );
    }
}

#[tokio::test]
async fn test_item_cap_truncates_first_batch() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("out.jsonl"));

    mount_listing_page(&server, "1", listing_page(products(1..=100), Some("next"))).await;
    mount_listing_page(&server, "2", listing_page(products(101..=200), Some("next"))).await;

    let fetcher = Fetcher::new(&config).unwrap();
    let walker =
        Walker::new(LinkStrategy::from_config(&config.source), Duration::ZERO).with_cap(Some(5));

    let items = walker.walk(&fetcher, &mut RunStats::default()).await.unwrap();

    assert_eq!(ids(&items), vec!["1", "2", "3", "4", "5"]);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_always_unavailable_gives_up_after_six_attempts() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("out.jsonl"));

    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .respond_with(ResponseTemplate::new(503))
        .expect(6)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&config).unwrap();
    let result = fetcher.fetch(PRODUCTS, &[]).await;

    match result {
        Err(FetchError::TooManyRetries { url, attempts, .. }) => {
            assert_eq!(attempts, 6);
            assert!(url.ends_with(PRODUCTS));
        }
        other => panic!("expected TooManyRetries, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_then_success_retries() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("out.jsonl"));

    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&config).unwrap();
    let body = fetcher.fetch(PRODUCTS, &[]).await.unwrap();

    assert_eq!(body, json!({"data": []}));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_enrichment_merges_and_degrades() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("out.jsonl"));

    mount_detail(
        &server,
        1,
        json!({"id": 1, "name": "ØKO MÆLK", "department": {"id": 84, "name": "Mejeri"}}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/2", PRODUCTS)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let items: Vec<CatalogItem> = [
        json!({"id": 1, "name": "MÆLK", "underline": "1 L"}),
        json!({"id": 2, "name": "SMØR"}),
        json!({"name": "NO ID"}),
    ]
    .into_iter()
    .filter_map(CatalogItem::from_value)
    .collect();

    let fetcher = Fetcher::new(&config).unwrap();
    let enricher = Enricher::new(DetailEndpoint::from_config(&config.source), Duration::ZERO)
        .with_resolver(Some(
            catalog_harvester::category::CategoryResolver::from_config(&config.categories),
        ));
    let mut stats = RunStats::default();

    let records = enricher.enrich(&fetcher, items, &mut stats).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name(), Some("ØKO MÆLK"));
    assert_eq!(records[0].get("underline"), Some(&json!("1 L")));
    assert_eq!(records[0].get("category"), Some(&json!("Frost")));
    assert_eq!(records[1].name(), Some("SMØR"));
    assert_eq!(records[1].get("category"), None);
    assert_eq!(stats.errors, 2);
}

#[tokio::test]
async fn test_first_listing_failure_writes_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.jsonl");
    let config = create_test_config(&server.uri(), &output);

    Mock::given(method("GET"))
        .and(path(PRODUCTS))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config, HarvestOptions::default(), None).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.status, RunStatus::NoProducts);
    assert_eq!(report.written, 0);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_later_slice_failure_is_absorbed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("out.jsonl"));

    mount_listing_page(&server, "1", listing_page(products(1..=100), Some("next"))).await;
    mount_listing_page(&server, "2", ResponseTemplate::new(500)).await;

    let fetcher = Fetcher::new(&config).unwrap();
    let walker = Walker::new(LinkStrategy::from_config(&config.source), Duration::ZERO);
    let mut stats = RunStats::default();

    let items = walker.walk(&fetcher, &mut stats).await.unwrap();

    assert_eq!(items.len(), 100);
    assert_eq!(stats.errors, 1);
}

#[tokio::test]
async fn test_first_request_error_surfaces_from_walker() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir.path().join("out.jsonl"));

    mount_listing_page(&server, "1", ResponseTemplate::new(200).set_body_string("<html>")).await;

    let fetcher = Fetcher::new(&config).unwrap();
    let walker = Walker::new(LinkStrategy::from_config(&config.source), Duration::ZERO);

    let result = walker.walk(&fetcher, &mut RunStats::default()).await;
    assert!(matches!(result, Err(HarvestError::FirstRequest { .. })));
}

/// Mounts a listing of products 1..=3 and their detail records
async fn mount_catalog(server: &MockServer, prices: [Value; 3]) {
    mount_listing_page(server, "1", listing_page(products(1..=3), None)).await;
    for (id, prices) in (1..=3).zip(prices) {
        mount_detail(
            server,
            id,
            json!({"id": id, "name": format!("Vare {}", id), "prices": prices}),
        )
        .await;
    }
}

#[tokio::test]
async fn test_update_run_classifies_and_carries_over() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("prior.jsonl");
    let output = dir.path().join("out.jsonl");

    std::fs::write(
        &snapshot,
        [
            json!({"id": 99, "name": "Udgået vare"}).to_string(),
            json!({"id": 1, "name": "Vare 1", "prices": [{"price": 10}]}).to_string(),
            json!({"id": 2, "name": "Vare 2", "note": "stored", "prices": [{"price": 10}]})
                .to_string(),
        ]
        .join("\n"),
    )
    .unwrap();

    mount_catalog(
        &server,
        [
            json!([{"price": 10}]),
            json!([{"price": 10}, {"price": 12}]),
            json!([{"price": 5}]),
        ],
    )
    .await;

    let config = create_test_config(&server.uri(), &output);
    let options = HarvestOptions {
        update_snapshot: Some(snapshot),
        ..HarvestOptions::default()
    };
    let report = Coordinator::new(config, options, None)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stats.added, 1);
    assert_eq!(report.stats.updated, 1);
    assert_eq!(report.stats.unchanged, 1);
    assert_eq!(report.stats.changed, 1);
    assert_eq!(report.written, 4);

    let written = read_jsonl(&output).unwrap().records;
    let order: Vec<u64> = written
        .iter()
        .map(|r| r.value["id"].as_u64().unwrap())
        .collect();
    assert_eq!(order, vec![1, 2, 3, 99]);
    assert_eq!(written[1].value["note"], json!("stored"));
    assert_eq!(written[1].value["prices"], json!([{"price": 10}, {"price": 12}]));
}

#[tokio::test]
async fn test_reconciling_unchanged_catalog_is_idempotent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.jsonl");

    mount_catalog(
        &server,
        [
            json!([{"price": 10, "is_campaign": false}]),
            json!([{"price": 20, "is_advertised": true}]),
            json!([]),
        ],
    )
    .await;

    let config = create_test_config(&server.uri(), &first);
    let report = Coordinator::new(config.clone(), HarvestOptions::default(), None)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(report.stats.added, 3);

    let mut snapshot = first;
    for round in 1..=2 {
        let output = dir.path().join(format!("round-{}.jsonl", round));
        let options = HarvestOptions {
            update_snapshot: Some(snapshot.clone()),
            output: Some(output.clone()),
            ..HarvestOptions::default()
        };
        let report = Coordinator::new(config.clone(), options, None)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.stats.changed, 0, "round {}", round);
        assert_eq!(report.stats.added, 0, "round {}", round);
        assert_eq!(report.stats.unchanged, 3, "round {}", round);
        snapshot = output;
    }
}

#[tokio::test]
async fn test_capped_batch_fills_cap_despite_repeated_ids() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.jsonl");

    for (department, items) in [("1", products(1..=3)), ("2", products(3..=10))] {
        Mock::given(method("GET"))
            .and(path(PRODUCTS))
            .and(query_param("department", department))
            .and(query_param("page", "1"))
            .respond_with(listing_page(items, None))
            .mount(&server)
            .await;
    }
    for id in 1..=10 {
        mount_detail(&server, id, json!({"id": id, "name": format!("Vare {}", id)})).await;
    }

    let config = create_test_config(&server.uri(), &output);
    let options = HarvestOptions {
        batch: Some(1),
        limit: Some(5),
        ..HarvestOptions::default()
    };
    let report = Coordinator::new(config, options, None)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.written, 5);
    assert_eq!(report.stats.duplicates_removed, 1);

    let order: Vec<u64> = read_jsonl(&output)
        .unwrap()
        .records
        .iter()
        .map(|r| r.value["id"].as_u64().unwrap())
        .collect();
    assert_eq!(order, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_failed_price_check_keeps_stored_record() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("prior.jsonl");
    let output = dir.path().join("out.jsonl");

    std::fs::write(
        &snapshot,
        (1..=3)
            .map(|id| {
                json!({
                    "id": id,
                    "name": format!("Vare {}", id),
                    "note": "stored",
                    "prices": [{"price": 10}],
                })
                .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n"),
    )
    .unwrap();

    mount_listing_page(&server, "1", listing_page(products(1..=3), None)).await;
    mount_detail(&server, 1, json!({"id": 1, "prices": [{"price": 10}]})).await;

    // Enrichment succeeds for id 2; the later price check does not.
    Mock::given(method("GET"))
        .and(path(format!("{}/2", PRODUCTS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": 2, "prices": [{"price": 99}]},
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/2", PRODUCTS)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    mount_detail(&server, 3, json!({"id": 3, "prices": [{"price": 7}]})).await;

    let config = create_test_config(&server.uri(), &output);
    let options = HarvestOptions {
        update_snapshot: Some(snapshot),
        ..HarvestOptions::default()
    };
    let report = Coordinator::new(config, options, None)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.unchanged, 2);
    assert_eq!(report.stats.updated, 1);
    assert_eq!(report.stats.changed, 1);
    assert_eq!(report.written, 3);

    let written = read_jsonl(&output).unwrap().records;
    assert_eq!(written[1].value["id"], json!(2));
    assert_eq!(written[1].value["note"], json!("stored"));
    assert_eq!(written[1].value["prices"], json!([{"price": 10}]));
    assert_eq!(written[2].value["prices"], json!([{"price": 7}]));
    assert_eq!(written[2].value["note"], json!("stored"));
}
