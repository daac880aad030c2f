use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::{EntryKind, EntryMetrics, LogEntry, LogRow};
use crate::state::AppState;

/// Newest entries shown on the dashboard by default.
const DEFAULT_JOURNAL_LIMIT: i64 = 5;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/journal", get(list_entries).post(create_entry))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct NewEntry {
    #[serde(rename = "type")]
    kind: EntryKind,
    content: String,
    image_url: Option<String>,
    #[serde(default)]
    metrics: Option<Value>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    limit: Option<i64>,
}

/// Entries are immutable once written; there is no update route.
async fn create_entry(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<NewEntry>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if body.content.is_empty() {
        return Err(AppError::Validation("Type and content are required.".to_string()));
    }

    let metrics = match body.metrics {
        Some(v) if !v.is_null() => {
            Some(EntryMetrics::from_value(body.kind, v).map_err(AppError::Validation)?)
        }
        _ if body.kind == EntryKind::KetoneReading => {
            return Err(AppError::Validation("A ketone entry requires a reading.".to_string()))
        }
        _ => None,
    };
    // The stored kind column always matches the validated bag's variant.
    let kind = metrics.as_ref().map_or(body.kind, |m| m.kind());
    let macros = metrics
        .map(|m| serde_json::to_value(m))
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO logs (id, user_id, type, content, image_url, macros, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, NOW())",
    )
    .bind(id)
    .bind(user.id)
    .bind(kind.as_str())
    .bind(&body.content)
    .bind(body.image_url.as_deref())
    .bind(macros)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_entries(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LogEntry>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_JOURNAL_LIMIT).clamp(1, 100);

    let rows = sqlx::query_as::<_, LogRow>(
        "SELECT id, type, content, image_url, macros, created_at \
         FROM logs \
         WHERE user_id = $1 \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(user.id)
    .bind(limit)
    .fetch_all(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("❌ Failed to fetch journal entries: {e}");
        AppError::Database(e)
    })?;

    let entries = rows
        .into_iter()
        .filter_map(|row| match LogEntry::from_row(row) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable log row: {e}");
                None
            }
        })
        .collect();
    Ok(Json(entries))
}
