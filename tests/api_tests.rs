use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::NaiveDate;
use mockall::mock;
use serde_json::{json, Value};

use drama_bot::{
    api::{create_router, AppState},
    error::{LookupError, PoolError},
    models::Drama,
    services::{DramaFinder, ReplyFormatter},
};

const TOKEN: &str = "test-token";

mock! {
    pub Finder {}

    #[async_trait]
    impl DramaFinder for Finder {
        async fn find(&self, query: &str) -> Result<Option<Drama>, LookupError>;
        async fn ping(&self) -> Result<(), LookupError>;
    }
}

fn goblin() -> Drama {
    Drama {
        title: "Goblin".to_string(),
        year: 2016,
        rating: 8.8,
        rating_count: 91022,
        description: "A cursed immortal seeks a human bride to end his life.".to_string(),
        country: "South Korea".to_string(),
        episodes: 16,
        airing_start: NaiveDate::from_ymd_opt(2016, 12, 2),
        airing_end: None,
        network: "tvN".to_string(),
        duration: "1 hr. 22 min.".to_string(),
        content_rating: "15+ - Teens 15 or older".to_string(),
        genre: Some("Comedy, Romance, Fantasy".to_string()),
        trailer_url: "https://example.com/trailer/goblin".to_string(),
        image_url: "https://example.com/image/goblin.jpg".to_string(),
    }
}

fn create_test_server(finder: MockFinder) -> TestServer {
    let state = AppState::new(
        Arc::new(finder),
        ReplyFormatter::new("MoviesGamabot"),
        TOKEN,
    );
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn token_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-bot-token"),
        HeaderValue::from_static(TOKEN),
    )
}

fn message(text: &str) -> Value {
    json!({
        "user": { "display_name": "Alice" },
        "text": text
    })
}

async fn send(server: &TestServer, text: &str) -> axum_test::TestResponse {
    let (name, value) = token_header();
    server
        .post("/api/v1/messages")
        .add_header(name, value)
        .json(&message(text))
        .await
}

#[tokio::test]
async fn test_health_check() {
    let mut finder = MockFinder::new();
    finder.expect_ping().times(1).returning(|| Ok(()));
    let server = create_test_server(finder);

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_health_check_database_down() {
    let mut finder = MockFinder::new();
    finder
        .expect_ping()
        .returning(|| Err(LookupError::Pool(PoolError::Closed)));
    let server = create_test_server(finder);

    let response = server.get("/health").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_message_requires_bot_token() {
    let server = create_test_server(MockFinder::new());

    let response = server.post("/api/v1/messages").json(&message("Goblin")).await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/v1/messages")
        .add_header(
            HeaderName::from_static("x-bot-token"),
            HeaderValue::from_static("wrong-token"),
        )
        .json(&message("Goblin"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_start_command_greets() {
    let server = create_test_server(MockFinder::new());

    let response = send(&server, "/start").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["reply"], "Hello! Send me a drama name to search.");
    assert_eq!(body["parse_mode"], "Plain");
}

#[tokio::test]
async fn test_search_found() {
    let mut finder = MockFinder::new();
    finder
        .expect_find()
        .withf(|query| query.to_string() == "goblin")
        .times(1)
        .returning(|_| Ok(Some(goblin())));
    let server = create_test_server(finder);

    let response = send(&server, "  goblin ").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let reply = body["reply"].as_str().unwrap();
    assert_eq!(body["parse_mode"], "Markdown");
    assert!(reply.starts_with("**Alice via @MoviesGamabot**\n**Goblin (2016)**"));
    assert!(reply.contains("**Aired**: `Dec 02, 2016 - Unknown`"));
    assert!(reply.contains("**Genre**: #Comedy #Romance #Fantasy"));
}

#[tokio::test]
async fn test_search_not_found() {
    let mut finder = MockFinder::new();
    finder.expect_find().times(1).returning(|_| Ok(None));
    let server = create_test_server(finder);

    let response = send(&server, "Nonexistent").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["reply"],
        "Sorry, Alice, no details found for the requested drama."
    );
}

#[tokio::test]
async fn test_lookup_failure_is_not_leaked() {
    let mut finder = MockFinder::new();
    finder.expect_find().returning(|_| {
        Err(LookupError::Failed(sqlx::Error::Protocol(
            "syntax error at or near \"dramas\"".to_string(),
        )))
    });
    let server = create_test_server(finder);

    let response = send(&server, "Goblin").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let reply = body["reply"].as_str().unwrap();
    assert!(reply.contains("no details found"));
    assert!(!reply.contains("syntax error"));
}

#[tokio::test]
async fn test_exhausted_pool_asks_to_retry() {
    let mut finder = MockFinder::new();
    finder
        .expect_find()
        .returning(|_| Err(PoolError::Exhausted { waited_ms: 5000 }.into()));
    let server = create_test_server(finder);

    let response = send(&server, "Goblin").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["reply"].as_str().unwrap().contains("try again"));
}

#[tokio::test]
async fn test_unknown_command_has_no_reply() {
    let server = create_test_server(MockFinder::new());

    let response = send(&server, "/settings").await;
    response.assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let server = create_test_server(MockFinder::new());

    let response = send(&server, "   ").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_id_echoed() {
    let server = create_test_server(MockFinder::new());
    let id = "3f2b8c1e-6d4a-4f0e-9a7b-2c5d8e1f4a6b";

    let (name, value) = token_header();
    let response = server
        .post("/api/v1/messages")
        .add_header(name, value)
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(id),
        )
        .json(&message("/start"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-request-id"), id);
}
