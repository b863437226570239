//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a small mock site and drive the
//! orchestrator end-to-end through its public query surface.

use prospect::config::{Config, CrawlerConfig, FetchConfig, OutputConfig, UserAgentConfig};
use prospect::crawler::{FetchPipeline, Orchestrator, SharedStore, TaskStatus};
use prospect::extract::ContactExtractor;
use prospect::storage::{CompanyStore, SqliteCompanyStore};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with a small politeness delay
fn create_test_config(max_pages: u32, db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_pages_per_task: max_pages,
            politeness_delay_ms: 10, // Very short for testing
            max_concurrent_tasks: 4,
            queue_when_saturated: true,
        },
        fetch: FetchConfig {
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        seeds: vec![],
    }
}

/// Builds an orchestrator with the real default fetch strategies and a
/// fresh in-memory company store
fn create_orchestrator(config: Config) -> (Orchestrator, SharedStore) {
    let store: SharedStore =
        Arc::new(Mutex::new(SqliteCompanyStore::new_in_memory().unwrap()));
    let user_agent = config.user_agent.header_value();
    let pipeline = FetchPipeline::with_default_strategies(&user_agent, &config.fetch)
        .expect("Failed to build fetch pipeline");
    let orchestrator = Orchestrator::new(
        config,
        pipeline,
        ContactExtractor::new(),
        Arc::clone(&store),
    );
    (orchestrator, store)
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_full_crawl_discovers_and_persists() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Index page links to the contact and about pages
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(format!(
            r#"<html><head><title>Acme Corporation</title></head><body>
                <a href="{}/contact">Contact</a>
                <a href="{}/about">About</a>
            </body></html>"#,
            base_url, base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html_response(
            r#"<html><head><title>Contact Acme</title></head><body>
                Email <a href="mailto:sales@acme.test">sales@acme.test</a>
                or call (555) 123-4567.
            </body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_response(
            "<html><head><title>About</title></head><body>Founded 1949.</body></html>"
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let (orchestrator, store) = create_orchestrator(create_test_config(100, ":memory:"));

    let task_id = orchestrator
        .start_crawl(vec![format!("{}/", base_url)])
        .expect("Failed to start crawl");
    let snapshot = orchestrator.wait(&task_id).await.expect("Wait failed");

    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert_eq!(snapshot.pages_crawled, 3);
    assert_eq!(orchestrator.total_pages_crawled(), 3);

    // The mock site's host is the website identity key
    let host = url::Url::parse(&base_url)
        .unwrap()
        .host_str()
        .unwrap()
        .to_string();
    let origin = format!("http://{}", host);
    let store = store.lock().unwrap();
    assert_eq!(store.count_companies().unwrap(), 1);
    let company = store
        .find_by_website(&origin)
        .unwrap()
        .expect("company should be persisted");
    assert!(company.emails.contains(&"sales@acme.test".to_string()));
    assert!(company.phones.contains(&"5551234567".to_string()));
}

#[tokio::test]
async fn test_pages_fetched_at_most_once_across_tasks() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // /a links to /b; /c links to both. Each page may be fetched once.
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_response(format!(
            r#"<html><body><a href="{}/b">B</a></body></html>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_response("<html><body>B</body></html>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html_response(format!(
            r#"<html><body><a href="{}/a">A</a><a href="{}/b">B</a></body></html>"#,
            base_url, base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (orchestrator, _store) = create_orchestrator(create_test_config(100, ":memory:"));

    // First task covers /a and /b
    let first = orchestrator
        .start_crawl(vec![format!("{}/a", base_url)])
        .unwrap();
    let first = orchestrator.wait(&first).await.unwrap();
    assert_eq!(first.status, TaskStatus::Completed);
    assert_eq!(first.pages_crawled, 2);

    // The second task's seed links only to already-visited pages
    let second = orchestrator
        .start_crawl(vec![format!("{}/c", base_url)])
        .unwrap();
    let second = orchestrator.wait(&second).await.unwrap();
    assert_eq!(second.status, TaskStatus::Completed);
    assert_eq!(second.pages_crawled, 1);

    assert_eq!(orchestrator.total_pages_crawled(), 3);

    // Wiremock verifies the expect(1) counts when the server drops
}

#[tokio::test]
async fn test_budget_stops_crawl_normally() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // A chain longer than the budget: / -> /p1 -> /p2
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(format!(
            r#"<html><body><a href="{}/p1">Next</a></body></html>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p1"))
        .respond_with(html_response(format!(
            r#"<html><body><a href="{}/p2">Next</a></body></html>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;

    // Never reached with a budget of 2
    Mock::given(method("GET"))
        .and(path("/p2"))
        .respond_with(html_response("<html><body>Too far</body></html>".to_string()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (orchestrator, _store) = create_orchestrator(create_test_config(2, ":memory:"));

    let task_id = orchestrator
        .start_crawl(vec![format!("{}/", base_url)])
        .unwrap();
    let snapshot = orchestrator.wait(&task_id).await.unwrap();

    // Budget exhaustion is normal completion, not a failure
    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert_eq!(snapshot.pages_crawled, 2);
}

#[tokio::test]
async fn test_failed_fetches_do_not_fail_the_task() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(format!(
            r#"<html><body>
                <a href="{}/broken">Broken</a>
                <a href="{}/ok">Ok</a>
            </body></html>"#,
            base_url, base_url
        )))
        .mount(&mock_server)
        .await;

    // Every strategy sees a server error for this page
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html_response("<html><body>Fine</body></html>".to_string()))
        .mount(&mock_server)
        .await;

    let (orchestrator, store) = create_orchestrator(create_test_config(100, ":memory:"));

    let task_id = orchestrator
        .start_crawl(vec![format!("{}/", base_url)])
        .unwrap();
    let snapshot = orchestrator.wait(&task_id).await.unwrap();

    // The broken page is counted but contributes nothing; the task survives
    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert_eq!(snapshot.pages_crawled, 3);
    assert_eq!(store.lock().unwrap().count_companies().unwrap(), 0);
}

#[tokio::test]
async fn test_company_database_on_disk() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(
            r#"<html><head><title>Globex</title></head><body>
                Questions? hello@globex.test
            </body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("companies.db");
    let db_path_str = db_path.to_str().unwrap().to_string();

    let config = create_test_config(100, &db_path_str);
    let store: SharedStore = Arc::new(Mutex::new(
        SqliteCompanyStore::new(&db_path).expect("Failed to open db"),
    ));
    let user_agent = config.user_agent.header_value();
    let pipeline = FetchPipeline::with_default_strategies(&user_agent, &config.fetch).unwrap();
    let orchestrator = Orchestrator::new(config, pipeline, ContactExtractor::new(), store);

    let task_id = orchestrator
        .start_crawl(vec![format!("{}/", base_url)])
        .unwrap();
    let snapshot = orchestrator.wait(&task_id).await.unwrap();
    assert_eq!(snapshot.status, TaskStatus::Completed);

    // Reopen the database independently and find the persisted company
    let reopened = SqliteCompanyStore::new(&db_path).expect("Failed to reopen db");
    assert_eq!(reopened.count_companies().unwrap(), 1);
    let companies = reopened.find_by_email("hello@globex.test").unwrap();
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].name, "Globex");
}
