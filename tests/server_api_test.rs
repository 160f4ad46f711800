//! HTTP API tests driven through the router with `tower::ServiceExt::oneshot`.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    routing::post,
};
use http_body_util::BodyExt;
use prize_tictactoe::{
    AppConfig, AppState, GameReport, Notifier, NotifyError, TelegramConfig, dispatch, router,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tictactoe_core::ScriptedRandom;
use tower::ServiceExt;

/// Notifier that remembers every message instead of sending it.
#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Notifier whose every delivery fails.
struct FailingNotifier;

#[async_trait::async_trait]
impl Notifier for FailingNotifier {
    async fn deliver(&self, _text: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Upstream {
            status: 502,
            body: "bad gateway".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Router with instant replies and scripted computer choices.
fn scripted_app(
    picks: impl IntoIterator<Item = usize>,
    notifier: Arc<dyn Notifier>,
) -> Router {
    let state = AppState::from_config(&instant())
        .with_notifier(notifier)
        .with_random(ScriptedRandom::new(picks));
    router(state)
}

/// Creates a game and plays `moves` for X, waiting out each reply.
async fn play_game(app: &Router, difficulty: &str, moves: &[usize]) -> Value {
    let (_, game) = call(
        app,
        "POST",
        "/api/games",
        Some(json!({ "difficulty": difficulty })),
    )
    .await;
    let id = game["id"].as_str().unwrap().to_string();

    let mut game = game;
    for &index in moves {
        let (status, view) = call(
            app,
            "POST",
            &format!("/api/games/{id}/moves"),
            Some(json!({ "index": index })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "move {index} rejected: {view}");
        game = wait_for_reply(app, &id).await;
    }
    game
}

/// Waits for `count` messages to reach the recorder.
async fn recorded(notifier: &RecordingNotifier, count: usize) -> Vec<String> {
    for _ in 0..100 {
        let sent = notifier.sent.lock().unwrap().clone();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} notifications");
}

fn test_app(config: AppConfig) -> Router {
    let state =
        AppState::from_config(&config).with_notifier(Arc::new(RecordingNotifier::default()));
    router(state)
}

/// Config whose computer replies immediately.
fn instant() -> AppConfig {
    AppConfig::default().with_thinking_delay_ms(0)
}

/// Config whose computer never replies within a test.
fn slow() -> AppConfig {
    AppConfig::default().with_thinking_delay_ms(60_000)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Polls the game until the computer has replied.
async fn wait_for_reply(app: &Router, id: &str) -> Value {
    for _ in 0..100 {
        let (status, game) = call(app, "GET", &format!("/api/games/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        if game["input_locked"] == json!(false) {
            return game;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("computer never replied");
}

#[tokio::test]
async fn test_health() {
    let app = test_app(instant());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_game_uses_configured_difficulty() {
    let app = test_app(instant());

    let (status, game) = call(&app, "POST", "/api/games", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(game["board"], Value::Array(vec![Value::Null; 9]));
    assert_eq!(game["to_move"], "X");
    assert_eq!(game["status"], "in_progress");
    assert_eq!(game["difficulty"], "hard");
    assert_eq!(game["input_locked"], false);

    let (_, game) = call(
        &app,
        "POST",
        "/api/games",
        Some(json!({ "difficulty": "easy" })),
    )
    .await;
    assert_eq!(game["difficulty"], "easy");
}

#[tokio::test]
async fn test_move_locks_input_while_computer_thinks() {
    let app = test_app(slow());
    let (_, game) = call(&app, "POST", "/api/games", Some(json!({}))).await;
    let id = game["id"].as_str().unwrap().to_string();
    let moves = format!("/api/games/{id}/moves");

    let (status, game) = call(&app, "POST", &moves, Some(json!({ "index": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["board"][0], "X");
    assert_eq!(game["input_locked"], true);

    let (status, body) = call(&app, "POST", &moves, Some(json!({ "index": 1 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_computer_replies_and_unlocks() {
    let app = test_app(instant());
    let (_, game) = call(&app, "POST", "/api/games", Some(json!({}))).await;
    let id = game["id"].as_str().unwrap().to_string();
    let moves = format!("/api/games/{id}/moves");

    call(&app, "POST", &moves, Some(json!({ "index": 0 }))).await;
    let game = wait_for_reply(&app, &id).await;
    // Hard answers a corner opening with the center.
    assert_eq!(game["board"][4], "O");
    assert_eq!(game["to_move"], "X");

    let (status, _) = call(&app, "POST", &moves, Some(json!({ "index": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_moves() {
    let app = test_app(instant());
    let (_, game) = call(&app, "POST", "/api/games", Some(json!({}))).await;
    let id = game["id"].as_str().unwrap().to_string();
    let moves = format!("/api/games/{id}/moves");

    let (status, _) = call(&app, "POST", &moves, Some(json!({ "index": 9 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    call(&app, "POST", &moves, Some(json!({ "index": 4 }))).await;
    wait_for_reply(&app, &id).await;
    let (status, _) = call(&app, "POST", &moves, Some(json!({ "index": 4 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = call(
        &app,
        "POST",
        "/api/games/nope/moves",
        Some(json!({ "index": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = call(&app, "GET", "/api/games/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reset_clears_board_and_unlocks() {
    let app = test_app(slow());
    let (_, game) = call(&app, "POST", "/api/games", Some(json!({}))).await;
    let id = game["id"].as_str().unwrap().to_string();

    call(
        &app,
        "POST",
        &format!("/api/games/{id}/moves"),
        Some(json!({ "index": 0 })),
    )
    .await;

    let (status, game) = call(
        &app,
        "POST",
        &format!("/api/games/{id}/reset"),
        Some(json!({ "difficulty": "medium" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["board"], Value::Array(vec![Value::Null; 9]));
    assert_eq!(game["input_locked"], false);
    assert_eq!(game["difficulty"], "medium");
    assert_eq!(game["reward_code"], Value::Null);
}

#[tokio::test]
async fn test_telegram_proxy_without_credentials() {
    let app = test_app(instant());
    let (status, body) = call(
        &app,
        "POST",
        "/api/telegram",
        Some(json!({ "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Telegram credentials not configured");
}

/// Fake Telegram API. Records bodies and answers with `status`.
async fn spawn_fake_telegram(status: StatusCode) -> (String, Arc<Mutex<Vec<Value>>>) {
    let received: Arc<Mutex<Vec<Value>>> = Arc::default();
    let app = Router::new()
        .route(
            "/{bot}/sendMessage",
            post(
                move |State(received): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
                    received.lock().unwrap().push(body);
                    (status, Json(json!({ "ok": status.is_success() })))
                },
            ),
        )
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), received)
}

fn telegram_config(api_base: &str) -> AppConfig {
    AppConfig::default().with_telegram(Some(
        TelegramConfig::new("123:abc".to_string(), "42".to_string()).with_api_base(api_base),
    ))
}

#[tokio::test]
async fn test_telegram_proxy_forwards_message() {
    let (api_base, received) = spawn_fake_telegram(StatusCode::OK).await;
    let app = test_app(telegram_config(&api_base));

    let (status, body) = call(
        &app,
        "POST",
        "/api/telegram",
        Some(json!({ "message": "Draw!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["chat_id"], "42");
    assert_eq!(received[0]["text"], "Draw!");
}

#[tokio::test]
async fn test_telegram_proxy_passes_upstream_status() {
    let (api_base, _) = spawn_fake_telegram(StatusCode::FORBIDDEN).await;
    let app = test_app(telegram_config(&api_base));

    let (status, body) = call(
        &app,
        "POST",
        "/api/telegram",
        Some(json!({ "message": "Defeat" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Failed to send message to Telegram");
}

#[tokio::test]
async fn test_dispatch_delivers_report_text() {
    let notifier = RecordingNotifier::default();
    let delivered = dispatch(Arc::new(notifier.clone()), GameReport::ComputerWon)
        .await
        .unwrap();
    assert!(delivered);
    assert_eq!(*notifier.sent.lock().unwrap(), vec!["Defeat".to_string()]);
}

#[tokio::test]
async fn test_human_win_notifies_with_reward_code() {
    // Easy replies land on 3 and then 4; the exhausted script yields code AAAAA.
    let notifier = RecordingNotifier::default();
    let app = scripted_app([2, 1], Arc::new(notifier.clone()));

    let game = play_game(&app, "easy", &[0, 1, 2]).await;
    assert_eq!(game["status"], "won");
    assert_eq!(game["winner"], "X");
    assert_eq!(game["reward_code"], "AAAAA");

    let sent = recorded(&notifier, 1).await;
    assert_eq!(sent, vec!["Victory! Promo code issued: AAAAA".to_string()]);
}

#[tokio::test]
async fn test_computer_win_notifies_defeat() {
    // Hard: center, corner 0, then the 0-4-8 diagonal.
    let notifier = RecordingNotifier::default();
    let app = scripted_app([], Arc::new(notifier.clone()));

    let game = play_game(&app, "hard", &[1, 3, 7]).await;
    assert_eq!(game["status"], "won");
    assert_eq!(game["winner"], "O");
    assert_eq!(game["reward_code"], Value::Null);
    assert_eq!(game["scoreboard"]["computer"], 1);

    assert_eq!(recorded(&notifier, 1).await, vec!["Defeat".to_string()]);
}

#[tokio::test]
async fn test_draw_notifies_draw() {
    let notifier = RecordingNotifier::default();
    let app = scripted_app([], Arc::new(notifier.clone()));

    let game = play_game(&app, "hard", &[0, 8, 6, 5, 1]).await;
    assert_eq!(game["status"], "draw");
    assert_eq!(game["winner"], Value::Null);
    assert_eq!(game["scoreboard"]["draws"], 1);

    assert_eq!(recorded(&notifier, 1).await, vec!["Draw!".to_string()]);
}

#[tokio::test]
async fn test_failed_notification_keeps_result() {
    let app = scripted_app([2, 1], Arc::new(FailingNotifier));

    let game = play_game(&app, "easy", &[0, 1, 2]).await;
    let id = game["id"].as_str().unwrap().to_string();
    assert_eq!(game["status"], "won");

    // Let the failed delivery run, then check nothing moved.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let (status, after) = call(&app, "GET", &format!("/api/games/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["status"], "won");
    assert_eq!(after["reward_code"], "AAAAA");
    assert_eq!(after["scoreboard"]["human"], 1);
    assert_eq!(after["input_locked"], false);
}
