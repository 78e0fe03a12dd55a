//! Integration tests for record sinks and snapshot utilities

use catalog_harvester::config::{ImportConfig, UserAgentConfig};
use catalog_harvester::output::{ImportSink, JsonlSink, RecordSink};
use catalog_harvester::record::EnrichedRecord;
use catalog_harvester::snapshot::{dedupe, read_jsonl, select_batches, Snapshot, BATCH_SIZE};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn records(count: u64) -> Vec<EnrichedRecord> {
    (1..=count)
        .map(|id| {
            let fields = json!({"id": id, "name": format!("Vare {}", id)});
            EnrichedRecord::from_fields(fields.as_object().unwrap().clone())
        })
        .collect()
}

fn import_config(server: &MockServer) -> ImportConfig {
    ImportConfig {
        endpoint: format!("{}/import", server.uri()),
        batch_size: 50,
        api_key: Some("secret".to_string()),
    }
}

fn import_mock(status: u16) -> Mock {
    Mock::given(method("POST"))
        .and(path("/import"))
        .and(header("apikey", "secret"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(status))
}

#[tokio::test]
async fn test_jsonl_round_trip_keeps_stream_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.jsonl");

    let mut written = records(3);
    written.reverse();
    let report = JsonlSink::new(&path).write_all(&written).await.unwrap();
    assert_eq!(report.written, 3);

    let snapshot = Snapshot::load(&path).unwrap();
    let ids: Vec<String> = snapshot
        .records()
        .iter()
        .map(|r| r.id().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["3", "2", "1"]);
}

#[tokio::test]
async fn test_import_posts_batches_and_continues_after_failure() {
    let server = MockServer::start().await;

    import_mock(200).up_to_n_times(1).mount(&server).await;
    import_mock(500).up_to_n_times(1).mount(&server).await;
    import_mock(200).mount(&server).await;

    let mut sink = ImportSink::new(&import_config(&server), &UserAgentConfig::default()).unwrap();
    let report = sink.write_all(&records(120)).await.unwrap();

    assert_eq!(report.failed_batches, vec![2]);
    assert_eq!(report.written, 70);

    let requests = server.received_requests().await.unwrap();
    let sizes: Vec<usize> = requests
        .iter()
        .map(|request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            body["products"].as_array().unwrap().len()
        })
        .collect();
    assert_eq!(sizes, vec![50, 50, 20]);
}

#[tokio::test]
async fn test_import_of_empty_stream_sends_nothing() {
    let server = MockServer::start().await;
    import_mock(200).expect(0).mount(&server).await;

    let mut sink = ImportSink::new(&import_config(&server), &UserAgentConfig::default()).unwrap();
    let report = sink.write_all(&[]).await.unwrap();

    assert_eq!(report.written, 0);
    assert!(report.is_complete());
}

#[test]
fn test_dedupe_file_by_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("products.jsonl");
    std::fs::write(
        &path,
        [
            r#"{"id":1,"name":"Hvedemel"}"#,
            r#"{"id":2,"name":"HVEDEMEL"}"#,
            r#"{"id":3,"name":"Sukker"}"#,
            r#"{"id":4,"name":"  hvedemel "}"#,
            r#"{"id":5,"name":"Salt"}"#,
        ]
        .join("\n"),
    )
    .unwrap();

    let report = dedupe(read_jsonl(&path).unwrap().records);

    let kept: Vec<u64> = report
        .kept
        .iter()
        .map(|r| r.value["id"].as_u64().unwrap())
        .collect();
    assert_eq!(kept, vec![1, 3, 5]);
    assert_eq!(report.removed, 2);
    assert_eq!(report.first_duplicates.len(), 2);
}

#[test]
fn test_extract_second_batch_with_renumbering() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("products.jsonl");
    let lines: Vec<String> = (1..=230)
        .map(|id| json!({"id": id * 7, "name": format!("Vare {}", id)}).to_string())
        .collect();
    std::fs::write(&path, lines.join("\n")).unwrap();

    let selected =
        select_batches(read_jsonl(&path).unwrap().records, 2, Some(3), BATCH_SIZE, true).unwrap();

    assert_eq!(selected.len(), 130);
    assert_eq!(selected[0].value["id"], json!(1));
    assert_eq!(selected[0].value["name"], json!("Vare 101"));
    assert_eq!(selected[129].value["id"], json!(130));
}
