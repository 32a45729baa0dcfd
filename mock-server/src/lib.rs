//! In-memory word-list service speaking the word-game wire protocol.
//!
//! Successful calls answer 200 with JSON (or an empty body); failures answer
//! with an error-details payload naming the server-side kind, the way the
//! real game services do.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const NOT_FOUND_KIND: &str = "WordNotFoundException";
pub const AUTH_KIND: &str = "AuthorizationException";
pub const ILLEGAL_ARGUMENT_KIND: &str = "java.lang.IllegalArgumentException";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Word {
    pub id: Uuid,
    pub text: String,
    #[serde(default)]
    pub clues: Vec<String>,
}

#[derive(Deserialize)]
pub struct NewWord {
    pub text: String,
}

#[derive(Deserialize)]
pub struct NewClue {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page_size: Option<usize>,
    pub page_no: Option<usize>,
    pub filter: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub exception_class: String,
    pub error_message: String,
    pub params: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct FailParams {
    pub message: Option<String>,
}

/// A failure answered with an error-details body.
pub struct ApiError {
    status: StatusCode,
    details: ErrorDetails,
}

impl ApiError {
    pub fn new(status: StatusCode, class: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            details: ErrorDetails {
                exception_class: class.to_string(),
                error_message: message.into(),
                params: Vec::new(),
            },
        }
    }

    fn with_params(mut self, params: Vec<serde_json::Value>) -> Self {
        self.details.params = params;
        self
    }

    fn word_not_found(id: Uuid) -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_FOUND_KIND, format!("Word {id} not found"))
            .with_params(vec![serde_json::Value::String(id.to_string())])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.details)).into_response()
    }
}

pub type Db = Arc<RwLock<HashMap<Uuid, Word>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    let api = Router::new()
        .route("/ping", get(ping))
        .route("/touch", post(touch))
        .route("/secure/ping", get(secure_ping))
        .route("/words", get(list_words).post(create_word))
        .route("/words/count", post(count_words))
        .route("/words/{id}", get(get_word))
        .route("/words/{id}/clues", post(add_clue))
        .route("/fail/{class}", get(fail))
        .route("/broken", get(broken))
        .with_state(db);
    Router::new().nest("/webapi", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock word-game service listening");
    }
    axum::serve(listener, app()).await
}

async fn ping() -> StatusCode {
    StatusCode::OK
}

async fn touch() -> StatusCode {
    StatusCode::OK
}

async fn secure_ping(headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let signed = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("OAuth ") && v.contains("oauth_signature="));
    if signed {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::new(StatusCode::UNAUTHORIZED, AUTH_KIND, "Request is not signed"))
    }
}

async fn list_words(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<Vec<Word>> {
    let words = db.read().await;
    let mut list: Vec<Word> = words
        .values()
        .filter(|w| params.filter.as_deref().map_or(true, |f| w.text.contains(f)))
        .cloned()
        .collect();
    match params.order.as_deref() {
        Some("-text") => list.sort_by(|a, b| b.text.cmp(&a.text)),
        _ => list.sort_by(|a, b| a.text.cmp(&b.text)),
    }
    let size = params.page_size.unwrap_or(list.len().max(1));
    let skip = params.page_no.unwrap_or(0).saturating_mul(size);
    Json(list.into_iter().skip(skip).take(size).collect())
}

async fn create_word(State(db): State<Db>, Json(input): Json<NewWord>) -> Result<Json<Word>, ApiError> {
    if input.text.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            ILLEGAL_ARGUMENT_KIND,
            "Word text must not be empty",
        ));
    }
    let word = Word {
        id: Uuid::new_v4(),
        text: input.text,
        clues: Vec::new(),
    };
    db.write().await.insert(word.id, word.clone());
    Ok(Json(word))
}

async fn count_words(State(db): State<Db>) -> Json<usize> {
    Json(db.read().await.len())
}

async fn get_word(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Word>, ApiError> {
    let words = db.read().await;
    words.get(&id).cloned().map(Json).ok_or_else(|| ApiError::word_not_found(id))
}

async fn add_clue(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<NewClue>,
) -> Result<StatusCode, ApiError> {
    let mut words = db.write().await;
    let word = words.get_mut(&id).ok_or_else(|| ApiError::word_not_found(id))?;
    word.clues.push(input.text);
    Ok(StatusCode::OK)
}

async fn fail(Path(class): Path<String>, Query(params): Query<FailParams>) -> ApiError {
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        &class,
        params.message.unwrap_or_else(|| format!("{class} raised")),
    )
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
