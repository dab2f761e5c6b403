//! Authentication tests against a mock login flow

use crate::test_config;
use sitewalk::crawler::Coordinator;
use sitewalk::FetchError;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"<html><body><form method="post" action="/login">
    <input type="hidden" name="atl_token" value="tok123">
    <input name="os_username"><input name="os_password" type="password">
    </form></body></html>"#;

fn auto_cookies(base_url: &str) -> String {
    format!(
        r#"
[auth]
mode = "auto_cookies"
username = "alice"
password = "secret"
login-url = "{base_url}/login"
username-field = "os_username"
password-field = "os_password"
"#
    )
}

async fn mount_login(server: &MockServer, expected_posts: u64) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("os_username=alice"))
        .and(body_string_contains("os_password=secret"))
        .and(body_string_contains("atl_token=tok123"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "JSESSIONID=abc; Path=/"),
        )
        .expect(expected_posts)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_with_anti_forgery_token() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_login(&mock_server, 1).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "JSESSIONID=abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><title>Dashboard</title><body>secret stuff</body></html>"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&format!("{}/", base_url), "", &auto_cookies(&base_url));
    let report = Coordinator::new(config).unwrap().run().await;

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.pages[0].title, "Dashboard");
    assert!(report.auth_state.is_authenticated());
}

#[tokio::test]
async fn test_expired_session_triggers_one_relogin() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    // One eager login plus one re-login after the 401
    mount_login(&mock_server, 2).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><title>Back in</title></html>"),
        )
        .with_priority(2)
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&format!("{}/", base_url), "", &auto_cookies(&base_url));
    let report = Coordinator::new(config).unwrap().run().await;

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.pages[0].title, "Back in");
}

#[tokio::test]
async fn test_still_expired_after_retry_fails_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_login(&mock_server, 2).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = test_config(&format!("{}/", base_url), "", &auto_cookies(&base_url));
    let report = Coordinator::new(config).unwrap().run().await;

    assert!(report.pages.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        FetchError::AuthExpired { status: 403, .. }
    ));
}

#[tokio::test]
async fn test_basic_auth_credentials_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("authorization", "Basic YWxpY2U6c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Basic</title>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = r#"
[auth]
mode = "basic"
username = "alice"
password = "secret"
"#;
    let config = test_config(&format!("{}/", mock_server.uri()), "", auth);
    let report = Coordinator::new(config).unwrap().run().await;

    assert_eq!(report.pages.len(), 1);
    assert!(report.auth_state.is_authenticated());
}

#[tokio::test]
async fn test_static_cookies_and_bearer_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "session=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Cookie</title>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cookies = r#"
[auth]
mode = "cookies"
cookies = { session = "s1" }
"#;
    let config = test_config(&format!("{}/", mock_server.uri()), "", cookies);
    let report = Coordinator::new(config).unwrap().run().await;
    assert_eq!(report.pages.len(), 1);

    let bearer_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Bearer</title>"))
        .expect(1)
        .mount(&bearer_server)
        .await;

    let headers = r#"
[auth]
mode = "headers"
bearer-token = "t0ken"
"#;
    let config = test_config(&format!("{}/", bearer_server.uri()), "", headers);
    let report = Coordinator::new(config).unwrap().run().await;
    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.pages[0].title, "Bearer");
}
