//! Job client against a mock job server

use std::time::Duration;

use httpmock::prelude::*;
use sheetlingo_rewrite::{
    Direction, JobClient, JobClientConfig, JobHandle, JobOutput, JobRequest, JobStatus,
    RewriteError,
};

fn client(server: &MockServer) -> JobClient {
    JobClient::new(JobClientConfig {
        base_url: server.base_url(),
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
        max_wait: Duration::from_secs(5),
    })
    .unwrap()
}

#[test]
fn test_submit_returns_handle() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(POST).path("/translate-excel");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({
                "success": true,
                "job_id": "ab12cd34",
                "message": "started"
            }));
    });

    let request = JobRequest {
        direction: Direction::KoreanToChinese,
        preserve_english: true,
        add_new_sheet: true,
        exclude_sheets: vec!["Notes".into()],
        exclude_cells: vec!["Sheet1!A1".into(), "Sheet1!B2".into()],
        exclude_patterns: vec![],
    };
    let handle = client(&server)
        .submit("order.xlsx", b"PK\x03\x04".to_vec(), &request)
        .unwrap();

    m.assert();
    assert_eq!(handle.id, "ab12cd34");
}

#[test]
fn test_submit_rejected() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/translate-excel");
        then.status(400)
            .json_body(serde_json::json!({ "error": "no file" }));
    });

    let err = client(&server)
        .submit("order.xlsx", vec![], &JobRequest::default())
        .unwrap_err();
    assert!(matches!(err, RewriteError::Http(400, _)));
}

#[test]
fn test_wait_until_completed_and_download() {
    let server = MockServer::start();
    let status = server.mock(|when, then| {
        when.method(GET).path("/translation-status/job1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({
                "status": "completed",
                "progress": 100,
                "message": "done",
                "file_id": "job1",
                "download_filename": "translated_job1_order.xlsx"
            }));
    });
    let download = server.mock(|when, then| {
        when.method(GET)
            .path("/download/job1/translated_job1_order.xlsx");
        then.status(200).body(b"PK\x03\x04rest");
    });

    let c = client(&server);
    let handle = JobHandle { id: "job1".into() };
    let mut seen = Vec::new();
    let output = c.wait(&handle, |p, _| seen.push(p)).unwrap();

    assert_eq!(
        output,
        JobOutput {
            file_id: "job1".into(),
            filename: "translated_job1_order.xlsx".into()
        }
    );
    assert_eq!(seen, vec![100]);

    let bytes = c.download(&output).unwrap();
    assert_eq!(bytes, b"PK\x03\x04rest");

    status.assert_calls(1);
    download.assert();
}

#[test]
fn test_poll_running() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/translation-status/job2");
        then.status(200)
            .json_body(serde_json::json!({
                "status": "running",
                "progress": 50,
                "message": "Sheet2"
            }));
    });

    let status = client(&server)
        .poll(&JobHandle { id: "job2".into() })
        .unwrap();
    assert_eq!(
        status,
        JobStatus::Running {
            progress: 50,
            message: "Sheet2".into()
        }
    );
}

#[test]
fn test_wait_reports_job_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/translation-status/job3");
        then.status(200)
            .json_body(serde_json::json!({ "status": "error", "error": "corrupt workbook" }));
    });

    let err = client(&server)
        .wait(&JobHandle { id: "job3".into() }, |_, _| {})
        .unwrap_err();
    match err {
        RewriteError::JobFailed(msg) => assert_eq!(msg, "corrupt workbook"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_failed_poll_is_not_retried() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET).path("/translation-status/gone");
        then.status(404)
            .json_body(serde_json::json!({ "error": "not found" }));
    });

    let err = client(&server)
        .wait(&JobHandle { id: "gone".into() }, |_, _| {})
        .unwrap_err();

    m.assert_calls(1);
    assert!(matches!(err, RewriteError::Http(404, _)));
}
