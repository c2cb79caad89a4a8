//! Integration tests for the mirror pipeline
//!
//! These tests use wiremock to create mock HTTP servers and drive the
//! fetch, retry, sanitize and write stages end-to-end.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_mirror::config::Config;
use sumi_mirror::crawler::{mirror, Coordinator};
use sumi_mirror::output::{OutputResult, PageOutcome, PageSink};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sink that keeps every write in memory
#[derive(Default)]
struct RecordingSink {
    writes: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingSink {
    fn writes(&self) -> Vec<(PathBuf, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSink for RecordingSink {
    async fn write(&self, path: &Path, content: &str) -> OutputResult<()> {
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), content.to_string()));
        Ok(())
    }
}

/// Creates a test configuration pointing at the mock server with fast retries
fn create_test_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.mirror.protocol = "http://".to_string();
    config.mirror.output_dir = output_dir.to_path_buf();
    config.mirror.max_concurrent = 4;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config
}

/// Tracked (scheme-less) URL for a path on the mock server
fn tracked(server: &MockServer, page: &str) -> String {
    format!("{}{}", server.address(), page)
}

#[tokio::test]
async fn test_retry_on_server_error_then_write_once() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/faq"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .expect(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/faq"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>answers</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let coordinator = Coordinator::with_sink(&create_test_config(dir.path()), sink.clone()).unwrap();

    let url = tracked(&mock_server, "/faq");
    let outcome = coordinator.mirror_one(&url).await;

    assert!(outcome.is_written());
    let writes = sink.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, dir.path().join(mock_server.address().to_string()).join("faq.html"));
    assert_eq!(writes[0].1, "<p>answers</p>");
}

#[tokio::test]
async fn test_not_modified_is_written() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let coordinator = Coordinator::with_sink(&create_test_config(dir.path()), sink.clone()).unwrap();

    let outcome = coordinator.mirror_one(&tracked(&mock_server, "/cached")).await;

    assert!(outcome.is_written());
    let writes = sink.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        writes[0].0,
        dir.path()
            .join(mock_server.address().to_string())
            .join("cached.html")
    );
}

#[tokio::test]
async fn test_timed_out_page_is_retried() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("stale")
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(dir.path());
    config.fetch.timeout_secs = 1;
    let sink = Arc::new(RecordingSink::default());
    let coordinator = Coordinator::with_sink(&config, sink.clone()).unwrap();

    let outcome = coordinator.mirror_one(&tracked(&mock_server, "/slow")).await;

    assert!(outcome.is_written());
    let writes = sink.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].1, "fresh");
}

#[tokio::test]
async fn test_not_found_is_skipped_without_retry() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let coordinator = Coordinator::with_sink(&create_test_config(dir.path()), sink.clone()).unwrap();

    let outcome = coordinator.mirror_one(&tracked(&mock_server, "/gone")).await;

    assert_eq!(outcome, PageOutcome::Skipped { status: 404 });
    assert!(sink.writes().is_empty());
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let coordinator = Coordinator::with_sink(&create_test_config(dir.path()), sink.clone()).unwrap();

    let outcome = coordinator.mirror_one(&tracked(&mock_server, "/old")).await;

    assert_eq!(outcome, PageOutcome::Skipped { status: 302 });
    assert!(sink.writes().is_empty());
}

#[tokio::test]
async fn test_written_page_is_sanitized() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let body = concat!(
        "<link href=\"/css/site.css?hash=3f9a1c\">\n",
        "<a href=\"/auth?passport_ssid=a1b2_c3d4_e5f6\">login</a>\n",
        "<script>var cfg = {\"nonce\":\"ab12_cd34_ef56\"};</script>\n",
        "<!-- page generated in 12.34ms -->\n"
    );
    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(&create_test_config(dir.path())).unwrap();
    let outcome = coordinator.mirror_one(&tracked(&mock_server, "/blog")).await;

    let expected_path = dir
        .path()
        .join(mock_server.address().to_string())
        .join("blog.html");
    assert_eq!(
        outcome,
        PageOutcome::Written {
            path: expected_path.clone(),
            bytes: std::fs::read(&expected_path).unwrap().len(),
        }
    );

    let written = std::fs::read_to_string(&expected_path).unwrap();
    assert_eq!(
        written,
        concat!(
            "<link href=\"/css/site.css?hash=sumimirror\">\n",
            "<a href=\"/auth?passport_ssid=sumimirror\">login</a>\n",
            "<script>var cfg = {\"nonce\":\"sumimirror\"};</script>\n",
            "\n"
        )
    );
}

#[tokio::test]
async fn test_unchanged_page_mirrors_to_identical_bytes() {
    let mock_server = MockServer::start().await;
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    // the volatile parts differ between the two responses
    Mock::given(method("GET"))
        .and(path("/apps"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<img src=\"/a.png?hash=aaa111\"><!-- page generated in 1ms -->"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/apps"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<img src=\"/a.png?hash=bbb222\"><!-- page generated in 9ms -->"),
        )
        .mount(&mock_server)
        .await;

    let url = tracked(&mock_server, "/apps");
    for dir in [&first, &second] {
        let coordinator = Coordinator::new(&create_test_config(dir.path())).unwrap();
        assert!(coordinator.mirror_one(&url).await.is_written());
    }

    let relative = Path::new(&mock_server.address().to_string()).join("apps.html");
    assert_eq!(
        std::fs::read(first.path().join(&relative)).unwrap(),
        std::fs::read(second.path().join(&relative)).unwrap()
    );
}

#[tokio::test]
async fn test_paginated_listing_is_assembled() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let listing = "/en/stickers/popular/";

    Mock::given(method("GET"))
        .and(path(listing))
        .respond_with(ResponseTemplate::new(200).set_body_string("<main>first screen</main>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    for (offset, html) in [(0, "<a>1</a>"), (200, "<a>2?hash=ff00</a>"), (400, "")] {
        Mock::given(method("POST"))
            .and(path(listing))
            .and(wiremock::matchers::body_string(format!("offset={}&more=1", offset)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "more_html": html })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let sink = Arc::new(RecordingSink::default());
    let coordinator = Coordinator::with_sink(&create_test_config(dir.path()), sink.clone()).unwrap();

    let outcome = coordinator.mirror_one(&tracked(&mock_server, listing)).await;

    assert!(outcome.is_written());
    let writes = sink.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        writes[0].0,
        dir.path()
            .join(mock_server.address().to_string())
            .join("en/stickers/popular.html")
    );
    assert_eq!(writes[0].1, "<a>1</a>\n<a>2?hash=sumimirror</a>");
}

#[tokio::test]
async fn test_failing_url_does_not_block_siblings() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .mount(&mock_server)
        .await;

    // unlimited retries and a single request slot
    let mut config = create_test_config(dir.path());
    config.retry.max_attempts = 0;
    config.mirror.max_concurrent = 1;
    let coordinator = Coordinator::new(&config).unwrap();

    let down = coordinator.clone();
    let down_url = tracked(&mock_server, "/down");
    let stuck = tokio::spawn(async move { down.mirror_one(&down_url).await });

    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        coordinator.mirror_one(&tracked(&mock_server, "/up")),
    )
    .await
    .expect("sibling pipeline was blocked");

    assert!(outcome.is_written());
    assert!(dir
        .path()
        .join(mock_server.address().to_string())
        .join("up.html")
        .exists());
    assert!(!stuck.is_finished());
    stuck.abort();
}

#[tokio::test]
async fn test_exhausted_retries_are_reported() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(dir.path());
    config.retry.max_attempts = 3;
    let coordinator = Coordinator::new(&config).unwrap();

    let down = tracked(&mock_server, "/down");
    let up = tracked(&mock_server, "/up");
    let report = coordinator.run(vec![down.clone(), up.clone()]).await;

    assert_eq!(report.total(), 2);
    assert_eq!(report.written(), 1);
    assert_eq!(report.failed_urls(), vec![down.as_str()]);
    assert!(matches!(report.outcome(&down), Some(PageOutcome::Failed { .. })));
    assert!(report.outcome(&up).unwrap().is_written());
}

#[tokio::test]
async fn test_mirror_run_from_input_file() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("home"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/js/app.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("var a;"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let host = mock_server.address().to_string();
    let input = dir.path().join("tracked_links.txt");
    std::fs::write(
        &input,
        format!("{host}\n\n{host}/js/app.js\n  {host}/private  \n{host}\n"),
    )
    .unwrap();

    let output = dir.path().join("data");
    let failed_list = dir.path().join("failed_links.txt");
    let mut config = create_test_config(&output);
    config.mirror.input_file = input;
    config.mirror.failed_list = Some(failed_list.clone());

    let report = mirror(config).await.unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.written(), 2);
    assert_eq!(report.skipped(), 1);
    assert_eq!(
        std::fs::read_to_string(output.join(format!("{host}.html"))).unwrap(),
        "home"
    );
    assert_eq!(
        std::fs::read_to_string(output.join(&host).join("js/app.js")).unwrap(),
        "var a;"
    );
    assert!(!output.join(&host).join("private.html").exists());
    assert_eq!(std::fs::read_to_string(&failed_list).unwrap(), "");
}

#[tokio::test]
async fn test_mirror_fails_on_missing_input() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.mirror.input_file = dir.path().join("missing.txt");

    assert!(mirror(config).await.is_err());
}
