use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use rag_assistant_client::models::{ChatRequest, MessageRole};
use rag_assistant_client::{
    AppError, ChatService, ConversationStore, DashboardService, DashboardStore, Gateway,
    HttpGateway, Phase,
};

#[derive(Clone, Default)]
struct Backend {
    questions: Arc<Mutex<Vec<String>>>,
}

async fn handle_chat(State(backend): State<Backend>, Json(req): Json<ChatRequest>) -> Json<Value> {
    backend.questions.lock().unwrap().push(req.question.clone());
    Json(json!({
        "answer": format!("You asked: {}", req.question),
        "timestamp": "2024-01-01T09:30:00.123456",
        "sources": ["articles/rust.md", "projects/rag.json"]
    }))
}

async fn handle_stats() -> Json<Value> {
    Json(json!({
        "total_articles": 14,
        "total_projects": 3,
        "total_conversations": 27,
        "last_updated": "2024-02-03T04:05:06"
    }))
}

async fn handle_history(Path(date): Path<String>) -> Json<Value> {
    Json(json!({
        "date": date,
        "conversations": [{
            "id": "20240101_093000",
            "question": "What is RAG?",
            "answer": "Retrieval-augmented generation.",
            "timestamp": "2024-01-01T09:30:00",
            "sources": []
        }]
    }))
}

async fn handle_health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": "2024-01-01T00:00:00Z",
        "services": {
            "rag_service": "operational",
            "gemini_service": "operational",
            "history_service": "operational"
        }
    }))
}

async fn spawn_backend(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn spawn_healthy_backend() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/chat", post(handle_chat))
        .route("/stats", get(handle_stats))
        .route("/history/{date}", get(handle_history))
        .route("/health", get(handle_health))
        .with_state(backend.clone());
    (spawn_backend(app).await, backend)
}

async fn spawn_failing_backend() -> String {
    let app = Router::new()
        .route(
            "/chat",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Error processing chat") }),
        )
        .route("/stats", get(|| async { "<html>not json</html>" }));
    spawn_backend(app).await
}

fn gateway(base_url: &str) -> HttpGateway {
    HttpGateway::new(base_url, Duration::from_secs(5)).expect("gateway")
}

#[tokio::test]
async fn ask_posts_question_and_parses_answer() {
    let (url, backend) = spawn_healthy_backend().await;
    let response = gateway(&url).ask("What is Rust?").await.unwrap();

    assert_eq!(response.answer, "You asked: What is Rust?");
    assert_eq!(response.sources, vec!["articles/rust.md", "projects/rag.json"]);
    assert_eq!(response.timestamp.to_rfc3339(), "2024-01-01T09:30:00.123456+00:00");
    assert_eq!(*backend.questions.lock().unwrap(), vec!["What is Rust?".to_string()]);
}

#[tokio::test]
async fn reads_statistics_history_and_health() {
    let (url, _) = spawn_healthy_backend().await;
    let gateway = gateway(&url);

    let stats = gateway.fetch_statistics().await.unwrap();
    assert_eq!((stats.article_count, stats.project_count, stats.conversation_count), (14, 3, 27));

    let history = gateway.fetch_history("2024-01-01").await.unwrap();
    assert_eq!(history.date, "2024-01-01");
    assert_eq!(history.conversations.len(), 1);
    assert_eq!(history.conversations[0].question, "What is RAG?");

    let health = gateway.check_health().await.unwrap();
    assert!(health.is_healthy());
    assert_eq!(health.service_statuses.len(), 3);
    assert!(health.degraded_services().is_empty());
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let url = spawn_failing_backend().await;
    let err = gateway(&url).ask("anything").await.unwrap_err();
    assert!(matches!(err, AppError::HttpStatus { status: 500, .. }), "{err}");
}

#[tokio::test]
async fn unparseable_body_is_an_error() {
    let url = spawn_failing_backend().await;
    let err = gateway(&url).fetch_statistics().await.unwrap_err();
    assert!(matches!(err, AppError::MalformedBody { .. }), "{err}");
}

#[tokio::test]
async fn unknown_route_is_an_error() {
    let url = spawn_failing_backend().await;
    let err = gateway(&url).check_health().await.unwrap_err();
    assert!(matches!(err, AppError::HttpStatus { status: 404, .. }), "{err}");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = gateway(&format!("http://{addr}")).check_health().await.unwrap_err();
    assert!(matches!(err, AppError::Network { .. }), "{err}");
    assert!(err.is_transport());
}

#[tokio::test]
async fn chat_service_round_trip_publishes_placeholder_then_answer() {
    let (url, _) = spawn_healthy_backend().await;
    let store = ConversationStore::new();
    let mut rx = store.subscribe();
    let chat = ChatService::new(Arc::new(gateway(&url)), store.clone());

    let answer = chat.ask("Tell me about the projects").await.unwrap();
    assert_eq!(answer.content, "You asked: Tell me about the projects");

    let state = rx.borrow_and_update().clone();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].role, MessageRole::User);
    assert_eq!(state.messages[1].id, answer.id);
    assert!(!state.messages[1].pending);
    assert_eq!(state.phase(), Phase::Idle);
}

#[tokio::test]
async fn chat_service_records_backend_failure() {
    let url = spawn_failing_backend().await;
    let store = ConversationStore::new();
    let chat = ChatService::new(Arc::new(gateway(&url)), store.clone());

    chat.ask("anything").await.unwrap_err();

    let state = store.snapshot();
    assert_eq!(state.phase(), Phase::Errored);
    assert!(state.last_error.unwrap().contains("status: 500"));
    assert_eq!(state.messages.len(), 2);
}

#[tokio::test]
async fn dashboard_keeps_last_good_stats_when_backend_breaks() {
    let (good_url, _) = spawn_healthy_backend().await;
    let bad_url = spawn_failing_backend().await;
    let store = DashboardStore::new();

    DashboardService::new(Arc::new(gateway(&good_url)), store.clone())
        .refresh()
        .await
        .unwrap();
    DashboardService::new(Arc::new(gateway(&bad_url)), store.clone())
        .refresh()
        .await
        .unwrap_err();

    let state = store.snapshot();
    assert_eq!(state.stats.map(|s| s.article_count), Some(14));
    assert!(state.last_error.is_some());
    assert!(!state.busy);
}
