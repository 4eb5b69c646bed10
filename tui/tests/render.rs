//! Rendering tests against ratatui's in-memory backend.

use std::time::Duration;

use finlab_engine::finlab_types::ApiKey;
use finlab_engine::ui::Screen;
use finlab_engine::{App, BackendConfig, Settings};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_for(base: &str) -> App {
    let backend =
        BackendConfig::new(Url::parse(base).unwrap(), ApiKey::new("test-key").unwrap()).unwrap();
    App::new(Settings {
        backend,
        username: Some("alice".to_string()),
        high_contrast: false,
    })
    .unwrap()
}

fn render(app: &App, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| finlab_tui::draw(frame, app)).unwrap();

    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

async fn settle(app: &mut App) {
    for _ in 0..400 {
        app.tick();
        if !app.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("app still busy");
}

async fn logged_in(server: &MockServer) -> App {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("abc"))
        .mount(server)
        .await;
    let mut app = app_for(&server.uri());
    app.submit_login();
    settle(&mut app).await;
    assert_eq!(app.screen(), Screen::Accounts);
    app
}

#[test]
fn login_screen_shows_form_and_prefill() {
    let app = app_for("http://127.0.0.1:9");
    let screen = render(&app, 80, 20);
    assert!(screen.contains("Login"));
    assert!(screen.contains("Username"));
    assert!(screen.contains("alice"));
    assert!(screen.contains("signed out"));
    assert!(!screen.contains("IBAN Lookup"));
}

#[test]
fn login_error_is_rendered() {
    let mut app = app_for("http://127.0.0.1:9");
    app.login_draft_mut().unwrap().clear();
    app.submit_login();
    let screen = render(&app, 80, 20);
    assert!(screen.contains("Please enter a username"));
}

#[test]
fn tiny_terminal_does_not_panic() {
    let app = app_for("http://127.0.0.1:9");
    let _ = render(&app, 10, 3);
}

#[tokio::test]
async fn lookup_screen_lists_history_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts/GB33BUKB20201555555555"))
        .respond_with(ResponseTemplate::new(200).set_body_string("BLOCK"))
        .mount(&server)
        .await;

    let mut app = logged_in(&server).await;
    app.lookup_draft_mut().enter_text("GB33BUKB20201555555555");
    app.submit_lookup();
    settle(&mut app).await;

    let screen = render(&app, 100, 24);
    assert!(screen.contains("IBAN Lookup"));
    assert!(screen.contains("logged in"));
    assert!(screen.contains("Lookup History (1)"));
    assert!(screen.contains("GB33BUKB20201555555555"));
    assert!(screen.contains("BLOCK"));
}

#[tokio::test]
async fn empty_history_has_placeholder() {
    let server = MockServer::start().await;
    let app = logged_in(&server).await;
    let screen = render(&app, 100, 24);
    assert!(screen.contains("No lookups yet"));
}

#[tokio::test]
async fn results_screen_shows_rows_and_details() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "testId": "test1",
                "testName": "Normal Load Test",
                "executionDate": "2025-10-21T10:00:00",
                "fileName": "test1.jtl"
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/test1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "testId": "test1",
            "testName": "Normal Load Test",
            "executionDate": "2025-10-21T10:00:00",
            "totalRequests": 1000,
            "successfulRequests": 950,
            "failedRequests": 50,
            "errorRate": 5.0,
            "averageResponseTime": 250.5,
            "minResponseTime": 100,
            "maxResponseTime": 1500,
            "p90ResponseTime": 450,
            "p95ResponseTime": 600,
            "throughput": 100
        })))
        .mount(&server)
        .await;

    let mut app = logged_in(&server).await;
    app.navigate(Screen::Results);
    settle(&mut app).await;

    let screen = render(&app, 120, 30);
    assert!(screen.contains("Normal Load Test"));
    assert!(screen.contains("2025-10-21 10:00"));
    assert!(screen.contains("test1.jtl"));

    app.view_selected_details();
    settle(&mut app).await;
    let screen = render(&app, 120, 30);
    assert!(screen.contains("Details"));
    assert!(screen.contains("250.5 ms  [good]"));
    assert!(screen.contains("450.0 ms  [warning]"));
    assert!(screen.contains("600.0 ms  [bad]"));
    assert!(screen.contains("5.00%"));
}

#[tokio::test]
async fn unauthorized_response_renders_login_with_notice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/results"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let mut app = logged_in(&server).await;
    app.navigate(Screen::Results);
    settle(&mut app).await;

    let screen = render(&app, 100, 24);
    assert!(screen.contains("Username"));
    assert!(screen.contains("Session expired"));
}

#[tokio::test]
async fn pasted_escape_sequences_are_not_drawn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("abc"))
        .mount(&server)
        .await;

    let mut app = app_for(&server.uri());
    let draft = app.login_draft_mut().unwrap();
    draft.clear();
    draft.enter_text("\x1b[2Jbob");
    let screen = render(&app, 80, 20);
    assert!(screen.contains("bob"));
    assert!(!screen.contains("[2J"));

    app.submit_login();
    settle(&mut app).await;
    app.lookup_draft_mut().enter_text("\x1b[31mDE89\x1b[0m");

    let screen = render(&app, 100, 24);
    assert!(screen.contains("Logged in as bob"));
    assert!(screen.contains("DE89"));
    assert!(!screen.contains("[2J"));
    assert!(!screen.contains("[31m"));
    assert!(!screen.contains("[0m"));
}
