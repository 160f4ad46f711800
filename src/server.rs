//! HTTP server: JSON game API and the Telegram proxy route.

use crate::config::AppConfig;
use crate::notify::{
    self, DisabledNotifier, Notifier, NotifyError, TELEGRAM_PROXY_PATH, TelegramNotifier,
};
use crate::reward::RewardCode;
use crate::session::{GameSession, Scoreboard, SessionError, SessionId, SessionManager};
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tictactoe_core::{Difficulty, GameError, Mark, Outcome, RandomSource};
use tower::ServiceBuilder;
use tracing::{debug, error, info, instrument, warn};

/// Body of `POST /api/games`. Send `{}` for defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGameRequest {
    /// Difficulty for the new game; server default when absent.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// Body of `POST /api/games/{id}/reset`. Send `{}` to keep the difficulty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetRequest {
    /// Difficulty to switch to.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// Body of `POST /api/games/{id}/moves`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Cell index 0-8, row-major.
    pub index: usize,
}

/// Body of `POST /api/telegram`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramProxyRequest {
    /// Text to post to the chat.
    pub message: String,
}

/// Coarse game status for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Game is ongoing.
    InProgress,
    /// Someone completed a line; see `winner`.
    Won,
    /// Board full, no line.
    Draw,
}

/// JSON view of a session returned by every game endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    /// Session id.
    pub id: SessionId,
    /// Nine cells, `"X"`, `"O"` or `null`.
    pub board: Vec<Option<Mark>>,
    /// Mark on turn.
    pub to_move: Mark,
    /// Game status.
    pub status: GameStatus,
    /// Winner when `status` is `won`.
    pub winner: Option<Mark>,
    /// Computer difficulty.
    pub difficulty: Difficulty,
    /// True while the computer's reply is pending.
    pub input_locked: bool,
    /// Code issued if the human won this game.
    pub reward_code: Option<RewardCode>,
    /// Results so far in this session.
    pub scoreboard: Scoreboard,
}

impl From<&GameSession> for GameView {
    fn from(session: &GameSession) -> Self {
        let game = session.game();
        let outcome = game.outcome();
        Self {
            id: session.id().to_string(),
            board: game.board().squares().iter().map(|s| s.mark()).collect(),
            to_move: game.to_move(),
            status: match outcome {
                Outcome::InProgress => GameStatus::InProgress,
                Outcome::Won(_) => GameStatus::Won,
                Outcome::Draw => GameStatus::Draw,
            },
            winner: outcome.winner(),
            difficulty: game.difficulty(),
            input_locked: session.is_input_locked(),
            reward_code: session.reward_code().cloned(),
            scoreboard: session.scoreboard(),
        }
    }
}

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    sessions: SessionManager,
    random: Arc<Mutex<dyn RandomSource + Send>>,
    notifier: Arc<dyn Notifier>,
    telegram: Option<TelegramNotifier>,
    thinking_delay: Duration,
    difficulty: Difficulty,
}

impl AppState {
    /// Builds state from configuration. Outcomes go straight to Telegram
    /// when credentials are present.
    #[instrument(skip(config))]
    pub fn from_config(config: &AppConfig) -> Self {
        let telegram = config.telegram().clone().map(TelegramNotifier::new);
        let notifier: Arc<dyn Notifier> = match &telegram {
            Some(telegram) => Arc::new(telegram.clone()),
            None => {
                warn!("Telegram not configured, outcome notifications disabled");
                Arc::new(DisabledNotifier)
            }
        };
        Self {
            sessions: SessionManager::new().with_max_sessions(*config.max_sessions()),
            random: Arc::new(Mutex::new(StdRng::from_os_rng())),
            notifier,
            telegram,
            thinking_delay: config.thinking_delay(),
            difficulty: *config.difficulty(),
        }
    }

    /// Replaces the outcome notifier. The proxy route keeps using Telegram.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replaces the random source behind computer moves and reward codes.
    pub fn with_random(mut self, random: impl RandomSource + Send + 'static) -> Self {
        let random: Arc<Mutex<dyn RandomSource + Send>> = Arc::new(Mutex::new(random));
        self.random = random;
        self
    }

    /// Session store.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    fn random(&self) -> MutexGuard<'_, dyn RandomSource + Send + 'static> {
        self.random.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::InputLocked | SessionError::StaleReply(_) => StatusCode::CONFLICT,
            SessionError::Game(GameError::InvalidMove { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::Game(GameError::GameOver(_) | GameError::WrongTurn(_)) => {
                StatusCode::CONFLICT
            }
            SessionError::Game(GameError::NoMovesAvailable) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/games", post(create_game))
        .route("/api/games/{id}", get(get_game))
        .route("/api/games/{id}/moves", post(make_move))
        .route("/api/games/{id}/reset", post(reset_game))
        .route(TELEGRAM_PROXY_PATH, post(telegram_proxy))
        .layer(ServiceBuilder::new().map_request(log_request))
        .with_state(state)
}

fn log_request(req: Request<Body>) -> Request<Body> {
    debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
    req
}

/// Binds and serves until Ctrl+C.
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config);
    spawn_session_sweeper(state.sessions.clone(), config.session_idle());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!("Server ready at http://{}:{}/", config.host(), config.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

/// Periodically drops sessions idle for longer than `max_idle`.
fn spawn_session_sweeper(sessions: SessionManager, max_idle: Duration) {
    let period = (max_idle / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            sessions.evict_idle(max_idle, Instant::now());
        }
    });
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip(state))]
async fn create_game(
    State(state): State<AppState>,
    Json(req): Json<NewGameRequest>,
) -> (StatusCode, Json<GameView>) {
    let difficulty = req.difficulty.unwrap_or(state.difficulty);
    let session = state.sessions.create_session(difficulty);
    info!(session_id = %session.id(), %difficulty, "Game created");
    (StatusCode::CREATED, Json(GameView::from(&session)))
}

#[instrument(skip(state))]
async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Json<GameView>, SessionError> {
    state
        .sessions
        .get_session(&id)
        .map(|session| Json(GameView::from(&session)))
        .ok_or(SessionError::NotFound(id))
}

#[instrument(skip(state))]
async fn make_move(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<GameView>, SessionError> {
    let (turn, view) = state.sessions.with_session(&id, |session| {
        let mut random = state.random();
        let mut rng = &mut *random;
        let turn = session.human_move(req.index, &mut rng)?;
        Ok((turn, GameView::from(&*session)))
    })?;

    if let Some(report) = turn.report {
        notify::dispatch(state.notifier.clone(), report);
    }
    if let Some(ticket) = turn.reply_ticket {
        schedule_reply(state, id, ticket);
    }

    Ok(Json(view))
}

#[instrument(skip(state))]
async fn reset_game(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<GameView>, SessionError> {
    let view = state.sessions.with_session(&id, |session| {
        session.reset(req.difficulty);
        Ok(GameView::from(&*session))
    })?;
    Ok(Json(view))
}

/// Plays the computer's reply after the thinking delay.
fn schedule_reply(state: AppState, id: SessionId, ticket: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(state.thinking_delay).await;

        let result = state.sessions.with_session(&id, |session| {
            let mut random = state.random();
            let mut rng = &mut *random;
            session.computer_move(ticket, &mut rng)
        });

        match result {
            Ok(turn) => {
                if let Some(report) = turn.report {
                    notify::dispatch(state.notifier.clone(), report);
                }
            }
            Err(SessionError::StaleReply(_)) | Err(SessionError::NotFound(_)) => {
                debug!(session_id = %id, ticket, "Reply no longer wanted");
            }
            Err(e) => {
                error!(session_id = %id, ticket, error = %e, "Computer reply failed");
            }
        }
    });
}

#[instrument(skip(state, req))]
async fn telegram_proxy(
    State(state): State<AppState>,
    Json(req): Json<TelegramProxyRequest>,
) -> Response {
    let Some(telegram) = &state.telegram else {
        error!("Telegram credentials not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Telegram credentials not configured" })),
        )
            .into_response();
    };

    match telegram.deliver(&req.message).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(NotifyError::Upstream { status, .. }) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(json!({ "error": "Failed to send message to Telegram" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Error sending Telegram message");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
