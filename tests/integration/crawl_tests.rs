//! End-to-end crawl tests

use crate::test_config;
use sitewalk::crawler::Coordinator;
use sitewalk::output::{write_results, SqlitePageSink};
use sitewalk::storage::{SqliteStorage, Storage};
use sitewalk::{CrawlState, FetchError};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head><title>Home</title></head><body>
            <p>Welcome   home</p>
            <a href="/page1">Page 1</a>
            <a href="{base_url}/page1#section">Page 1 again</a>
            <a href="page2">Page 2</a>
            <a href="/manual.PDF">Manual</a>
            <a href="https://elsewhere.example.org/">Elsewhere</a>
            <a href="mailto:team@example.com">Mail</a>
            </body></html>"#
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(
            r#"<html><head><title>Page One</title></head><body>
            <script>var hidden = 1;</script>
            <p>First page</p>
            <a href="/">Home</a>
            </body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/manual.PDF"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = test_config(&format!("{}/", base_url), "", "");
    let report = Coordinator::new(config).unwrap().run().await;

    assert_eq!(report.state, CrawlState::Completed);
    assert_eq!(report.visited_count, 3);
    assert!(report.pending.is_empty());

    assert_eq!(report.pages.len(), 2);
    let home = &report.pages[0];
    assert_eq!(home.url, format!("{}/", base_url));
    assert_eq!(home.title, "Home");
    assert!(home.text.contains("Welcome\nhome"));
    assert_eq!(home.extracted_link_count, 3);

    let page1 = &report.pages[1];
    assert_eq!(page1.title, "Page One");
    assert!(page1.text.contains("First page"));
    assert!(!page1.text.contains("hidden"));

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, format!("{}/page2", base_url));
    assert_eq!(
        report.failures[0].error,
        FetchError::HttpStatus { status: 500 }
    );
}

#[tokio::test]
async fn test_max_pages_cap() {
    let mock_server = MockServer::start().await;

    for (from, to) in [("/", "/1"), ("/1", "/2"), ("/2", "/3"), ("/3", "/4")] {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(html(format!(
                r#"<html><body><a href="{}">next</a></body></html>"#,
                to
            )))
            .mount(&mock_server)
            .await;
    }

    let config = test_config(&format!("{}/", mock_server.uri()), "max-pages = 2", "");
    let report = Coordinator::new(config).unwrap().run().await;

    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.visited_count, 2);
    assert_eq!(report.pending.len(), 1);
    assert_eq!(report.pending[0].path(), "/2");
}

#[tokio::test]
async fn test_identity_user_agent_without_stealth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(html("<html><title>UA</title></html>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&format!("{}/", mock_server.uri()), "", "");
    let report = Coordinator::new(config).unwrap().run().await;

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.pages[0].title, "UA");
}

#[tokio::test]
async fn test_sqlite_sink_and_json_export() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Start</title></head><body>
            <p>Café menu</p><a href="/about">About</a></body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(
            "<html><head><title>About</title></head><body>About us</body></html>".to_string(),
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let storage = Arc::new(Mutex::new(
        SqliteStorage::new(&dir.path().join("pages.db")).unwrap(),
    ));

    let seed = format!("{}/", mock_server.uri());
    let config = test_config(&seed, "preview-length = 4", "");
    let report = Coordinator::new(config)
        .unwrap()
        .with_sink(Arc::new(SqlitePageSink::new(storage.clone())))
        .run()
        .await;

    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.pages[0].text, "Star");

    {
        let storage = storage.lock().unwrap();
        let stats = storage.get_statistics().unwrap();
        assert_eq!(stats.total_pages, 2);

        let home = storage.get_page(&seed).unwrap().unwrap();
        assert!(home.content.contains("Café menu"));
        assert_eq!(home.links_count, 1);
    }

    let results_path = dir.path().join("results.json");
    write_results(&results_path, &report.pages).unwrap();

    let raw = std::fs::read_to_string(&results_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[0]["url"], seed.as_str());
    assert_eq!(parsed[0]["title"], "Start");
}
