//! End-to-end imports against a mock import server.

use std::time::Duration;

use import_client::{ImportFile, JobId, ValidationError};
use import_session::{ImportSession, ImportSessionController, Phase, SessionError};
use importer_config::ImporterConfig;
use progress_tracking::ProcessingSnapshot;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ImporterConfig {
    let mut config = ImporterConfig::default().with_endpoint(server.uri());
    config.client.upload_reporting_block_size = 100;
    // Keep succeeded sessions visible for the whole test.
    config.session.success_reset_delay = Duration::from_secs(600);
    config
}

fn products_csv() -> ImportFile {
    ImportFile::new("products.csv", vec![b'p'; 1000])
}

fn sse(events: &[&str]) -> String {
    events.iter().map(|data| format!("event: progress\ndata: {data}\n\n")).collect()
}

async fn mount_upload(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_progress(server: &MockServer, job_id: &str, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/progress/{job_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Collects every session value published until the session reaches a terminal phase.
fn record_sessions(controller: &ImportSessionController) -> tokio::task::JoinHandle<Vec<ImportSession>> {
    let mut rx = controller.watch();
    tokio::spawn(async move {
        let mut seen = vec![rx.borrow_and_update().clone()];
        while rx.changed().await.is_ok() {
            let session = rx.borrow_and_update().clone();
            let done = session.phase.is_terminal();
            seen.push(session);
            if done {
                break;
            }
        }
        seen
    })
}

#[tokio::test]
async fn test_upload_and_processing_succeed() {
    let server = MockServer::start().await;
    mount_upload(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"job_id": "abc123", "message": "File uploaded successfully."})),
    )
    .await;
    mount_progress(
        &server,
        "abc123",
        sse(&[
            r#"{"percent":50,"status":"processing","current":5,"total":10}"#,
            r#"{"percent":100,"status":"processing","current":10,"total":10}"#,
            r#"{"state":"SUCCESS"}"#,
        ]),
        1,
    )
    .await;

    let controller = ImportSessionController::from_config(&config_for(&server)).unwrap();
    let recording = record_sessions(&controller);

    controller.start_with(products_csv()).unwrap();
    let session = controller.wait_for_terminal().await;

    assert_eq!(session.phase, Phase::Succeeded);
    assert_eq!(session.job_id, JobId::new("abc123"));
    assert_eq!(session.upload_percent, 100);
    assert_eq!(session.processing_snapshot, Some(ProcessingSnapshot::new(100, "processing", 10, 10)));

    let seen = recording.await.unwrap();
    let percents: Vec<u8> = seen
        .iter()
        .filter(|s| s.phase == Phase::Uploading)
        .map(|s| s.upload_percent)
        .collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "upload percent went backwards: {percents:?}");

    assert!(seen
        .iter()
        .filter(|s| matches!(s.phase, Phase::Processing | Phase::Succeeded))
        .all(|s| s.upload_percent == 100));

    // Observers may miss intermediate values, but never see phases out of order.
    let order = [Phase::Idle, Phase::Uploading, Phase::Processing, Phase::Succeeded];
    let ranks: Vec<usize> = seen
        .iter()
        .map(|s| order.iter().position(|p| *p == s.phase).unwrap())
        .collect();
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "phases out of order: {ranks:?}");
    assert_eq!(seen.last().map(|s| s.phase), Some(Phase::Succeeded));
}

#[tokio::test]
async fn test_rejected_upload_never_subscribes() {
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(400).set_body_json(serde_json::json!({"detail": "invalid CSV header"})))
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let controller = ImportSessionController::from_config(&config_for(&server)).unwrap();
    controller.start_with(products_csv()).unwrap();
    let session = controller.wait_for_terminal().await;

    assert_eq!(session.phase, Phase::Failed);
    assert_eq!(session.error_detail.as_deref(), Some("invalid CSV header"));
    assert!(session.job_id.is_none());
    assert!(session.processing_snapshot.is_none());
}

#[tokio::test]
async fn test_unparseable_event_fails_session() {
    let server = MockServer::start().await;
    mount_upload(&server, ResponseTemplate::new(200).set_body_json(serde_json::json!({"task_id": "xyz"}))).await;
    mount_progress(&server, "xyz", "event: progress\ndata: <html>oops</html>\n\n".to_owned(), 1).await;

    let controller = ImportSessionController::from_config(&config_for(&server)).unwrap();
    controller.start_with(products_csv()).unwrap();
    let session = controller.wait_for_terminal().await;

    assert_eq!(session.phase, Phase::Failed);
    assert_eq!(session.job_id, JobId::new("xyz"));
    assert!(session.error_detail.unwrap().starts_with("failed to decode progress event"));
}

#[tokio::test]
async fn test_wrong_file_type_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let controller = ImportSessionController::from_config(&config_for(&server)).unwrap();
    controller.select_file(ImportFile::new("report.txt", "not a csv")).unwrap();

    let err = controller.start().unwrap_err();
    assert!(matches!(err, SessionError::Validation(ValidationError::InvalidFileType { .. })));
    assert_eq!(controller.status().phase, Phase::Idle);
}

#[tokio::test]
async fn test_server_failure_then_retry_after_dismiss() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"task_id": "job-1"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_upload(&server, ResponseTemplate::new(200).set_body_json(serde_json::json!({"task_id": "job-2"}))).await;
    mount_progress(
        &server,
        "job-1",
        sse(&[
            r#"{"state":"PROGRESS","percent":20,"status":"Processing... 20%","current":2,"total":10}"#,
            r#"{"state":"FAILURE","percent":0,"status":"Import failed","error":"Missing required columns: ['sku']"}"#,
        ]),
        1,
    )
    .await;
    mount_progress(&server, "job-2", sse(&[r#"{"state":"SUCCESS","result":{"processed":10,"total":10}}"#]), 1).await;

    let controller = ImportSessionController::from_config(&config_for(&server)).unwrap();
    controller.start_with(products_csv()).unwrap();
    let failed = controller.wait_for_terminal().await;
    assert_eq!(failed.phase, Phase::Failed);
    assert_eq!(failed.error_detail.as_deref(), Some("Missing required columns: ['sku']"));

    controller.dismiss().unwrap();
    controller.start().unwrap();
    let restarted = controller.status();
    assert_eq!(restarted.phase, Phase::Uploading);
    assert!(restarted.job_id.is_none());
    assert!(restarted.processing_snapshot.is_none());

    let session = controller.wait_for_terminal().await;
    assert_eq!(session.phase, Phase::Succeeded);
    assert_eq!(session.job_id, JobId::new("job-2"));
    assert_eq!(session.result, Some(serde_json::json!({"processed": 10, "total": 10})));
}
