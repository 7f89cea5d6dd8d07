use std::{sync::Arc, time::Duration};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

const GREETING: &str = "Hello, how can I help you today?";

/// Knobs for the simulated flakiness of the credits routes.
#[derive(Clone, Debug, PartialEq)]
pub struct MockConfig {
    /// Probability in `[0, 1]` that a credits call answers 500.
    pub failure_rate: f64,
    /// Upper bound of the random delay before a credits call answers.
    pub max_latency: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.0,
            max_latency: Duration::ZERO,
        }
    }
}

impl MockConfig {
    /// Read `MOCK_FAILURE_RATE` and `MOCK_MAX_LATENCY_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let failure_rate = std::env::var("MOCK_FAILURE_RATE")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .map(|r| r.clamp(0.0, 1.0))
            .unwrap_or(defaults.failure_rate);
        let max_latency = std::env::var("MOCK_MAX_LATENCY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.max_latency);
        Self {
            failure_rate,
            max_latency,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// In-memory demo state.
#[derive(Debug)]
pub struct Backend {
    pub logged_in: bool,
    pub user: User,
    pub credits: i64,
    pub messages: Vec<Message>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            logged_in: false,
            user: User {
                username: "brightsidedeveloper".to_string(),
                first_name: "Tim".to_string(),
                last_name: "Van Lerberg".to_string(),
            },
            credits: 1000,
            messages: vec![Message {
                role: "assistant".to_string(),
                content: GREETING.to_string(),
            }],
        }
    }
}

pub type Db = Arc<RwLock<Backend>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    config: MockConfig,
}

/// Failures, rendered as `{"error": "..."}` with a non-2xx status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Not Logged In")]
    NotLoggedIn,
    #[error("Server Error")]
    ServerError,
    /// The body was not JSON or was sent without a JSON content type.
    #[error("{}", .0.body_text())]
    Rejected(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotLoggedIn => StatusCode::UNAUTHORIZED,
            ApiError::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rejected(rejection) => rejection.status(),
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Backend::default())),
        config,
    };
    Router::new()
        .route("/rest/signin", post(sign_in))
        .route("/rest/signin/signout", post(sign_out))
        .route("/rest/user", get(get_user).put(update_user))
        .route("/rest/credits", get(get_credits).post(add_credits))
        .route("/rest/chat", get(get_chat).post(post_chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

/// A JSON string field, treating empty strings as absent.
fn text(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

async fn require_login(db: &Db) -> Result<(), ApiError> {
    if db.read().await.logged_in {
        Ok(())
    } else {
        Err(ApiError::NotLoggedIn)
    }
}

/// Random delay, then a random 500 at the configured rate.
async fn flaky(config: &MockConfig) -> Result<(), ApiError> {
    let max_ms = u64::try_from(config.max_latency.as_millis()).unwrap_or(u64::MAX);
    if max_ms > 0 {
        let ms = rand::rng().random_range(0..=max_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
    if config.failure_rate > 0.0 && rand::random::<f64>() < config.failure_rate {
        tracing::warn!("simulated server error");
        return Err(ApiError::ServerError);
    }
    Ok(())
}

fn assistant_reply(prompt: &str) -> String {
    format!("You said: {prompt}")
}

async fn sign_in(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let (Some(username), Some(password)) = (text(&body, "username"), text(&body, "password")) else {
        return Err(ApiError::BadRequest("Username & Password Required"));
    };
    if !username.eq_ignore_ascii_case("tim") || !password.eq_ignore_ascii_case("password") {
        return Err(ApiError::BadRequest("Invalid Username or Password"));
    }
    state.db.write().await.logged_in = true;
    tracing::info!(%username, "signed in");
    Ok(Json(json!({ "success": true })))
}

async fn sign_out(State(state): State<AppState>) -> Json<Value> {
    state.db.write().await.logged_in = false;
    tracing::info!("signed out");
    Json(json!({ "success": true }))
}

async fn get_user(State(state): State<AppState>) -> Result<Json<User>, ApiError> {
    let db = state.db.read().await;
    if !db.logged_in {
        return Err(ApiError::NotLoggedIn);
    }
    Ok(Json(db.user.clone()))
}

async fn update_user(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let mut db = state.db.write().await;
    if !db.logged_in {
        return Err(ApiError::NotLoggedIn);
    }
    let username = text(&body, "username").ok_or(ApiError::BadRequest("Username Required"))?;
    db.user.username = username;
    Ok(Json(json!({ "success": true })))
}

async fn get_credits(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    require_login(&state.db).await?;
    flaky(&state.config).await?;
    let credits = state.db.read().await.credits;
    Ok(Json(json!({ "credits": credits })))
}

async fn add_credits(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    require_login(&state.db).await?;
    flaky(&state.config).await?;
    let amount = match body.get("multiplier").and_then(Value::as_i64) {
        Some(1) => 1000,
        Some(2) => 5000,
        Some(3) => 10000,
        _ => return Err(ApiError::BadRequest("Invalid Multiplier")),
    };
    let mut db = state.db.write().await;
    db.credits += amount;
    tracing::info!(amount, total = db.credits, "credits added");
    Ok(Json(json!({})))
}

async fn get_chat(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let db = state.db.read().await;
    if !db.logged_in {
        return Err(ApiError::NotLoggedIn);
    }
    Ok(Json(json!({ "messages": db.messages })))
}

async fn post_chat(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let mut db = state.db.write().await;
    if !db.logged_in {
        return Err(ApiError::NotLoggedIn);
    }
    let prompt = text(&body, "prompt").ok_or(ApiError::BadRequest("Prompt Required"))?;
    let reply = assistant_reply(&prompt);
    db.messages.push(Message {
        role: "user".to_string(),
        content: prompt,
    });
    db.messages.push(Message {
        role: "assistant".to_string(),
        content: reply,
    });
    Ok(Json(json!({})))
}
