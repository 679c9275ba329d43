//! HTTP ingest API (axum).
//!
//! Score producers push single or batched updates here; reads are open,
//! writes require the static bearer token when one is configured. Every
//! write is a full load-mutate-save cycle against the board store and is
//! persisted before the response goes out.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use tlb_core::{
    board::{self, Entry},
    store::BoardStore,
    Error, Result,
};

#[derive(Clone)]
pub struct ApiState {
    /// `None` disables auth entirely (open endpoints).
    pub api_key: Option<String>,
    pub board: BoardStore,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/update_entry", post(update_entry))
        .route("/api/update_batch", post(update_batch))
        .route("/api/get", get(get_entries))
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: ApiState, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(Error::Io)?;
    tracing::info!("HTTP API listening on port {port}");
    axum::serve(listener, router(state)).await.map_err(Error::Io)?;
    Ok(())
}

// ── Validation ────────────────────────────────────────────────────────

/// A validated single-entry update. Raw JSON never crosses past this point.
#[derive(Debug)]
struct UpdateEntry {
    kind: String,
    name: String,
    value: Value,
}

/// A validated batch update. Entries without a usable name are dropped here.
#[derive(Debug)]
struct UpdateBatch {
    kind: String,
    entries: Vec<Entry>,
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn value_or_null(v: Option<&Value>) -> Value {
    v.cloned().unwrap_or(Value::Null)
}

fn parse_update_entry(payload: &Value) -> std::result::Result<UpdateEntry, &'static str> {
    match (
        non_empty_str(payload.get("kind")),
        non_empty_str(payload.get("name")),
    ) {
        (Some(kind), Some(name)) => Ok(UpdateEntry {
            kind: kind.to_string(),
            name: name.to_string(),
            value: value_or_null(payload.get("value")),
        }),
        _ => Err("missing kind or name"),
    }
}

fn parse_update_batch(payload: &Value) -> std::result::Result<UpdateBatch, &'static str> {
    let kind = non_empty_str(payload.get("kind"));
    let items = payload.get("entries").and_then(Value::as_array);
    let (Some(kind), Some(items)) = (kind, items) else {
        return Err("missing kind or entries");
    };

    let entries = items
        .iter()
        .filter_map(|item| {
            let name = non_empty_str(item.get("name"))?;
            Some(Entry::new(name, value_or_null(item.get("value"))))
        })
        .collect();

    Ok(UpdateBatch {
        kind: kind.to_string(),
        entries,
    })
}

// ── Auth ──────────────────────────────────────────────────────────────

fn authorized(api_key: &Option<String>, headers: &HeaderMap) -> bool {
    let Some(key) = api_key else {
        return true;
    };
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(|header| header == format!("Bearer {key}"))
        .unwrap_or(false)
}

// ── Handlers ──────────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

fn persist(store: &BoardStore, board: &board::Board) -> Response {
    match store.save(board) {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => {
            tracing::error!("board save failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to persist board")
        }
    }
}

async fn update_entry(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    if !authorized(&state.api_key, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let req = match parse_update_entry(&payload) {
        Ok(req) => req,
        Err(msg) => return json_error(StatusCode::BAD_REQUEST, msg),
    };

    let mut board = state.board.load_or_default();
    board::upsert_entry(&mut board, &req.kind, &req.name, req.value);
    persist(&state.board, &board)
}

async fn update_batch(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    if !authorized(&state.api_key, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let req = match parse_update_batch(&payload) {
        Ok(req) => req,
        Err(msg) => return json_error(StatusCode::BAD_REQUEST, msg),
    };

    let mut board = state.board.load_or_default();
    board::merge_batch(&mut board, &req.kind, req.entries);
    persist(&state.board, &board)
}

#[derive(Deserialize)]
struct GetQuery {
    kind: Option<String>,
}

/// Returns the stored list verbatim (no ranking cap). No auth.
async fn get_entries(State(state): State<ApiState>, Query(q): Query<GetQuery>) -> Response {
    let board = state.board.load_or_default();
    let entries: Vec<Entry> = q
        .kind
        .as_deref()
        .and_then(|kind| board.get(kind))
        .cloned()
        .unwrap_or_default();
    Json(entries).into_response()
}
