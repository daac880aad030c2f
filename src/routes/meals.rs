use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::ai;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::{EntryKind, EntryMetrics, LogEntry, LogRow, MacroSet, MealAnalysis, MealMetrics};
use crate::state::AppState;

const DEFAULT_MEAL_LOGS_LIMIT: i64 = 20;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/meals", get(meal_history).post(log_meal))
        .route("/meals/analyze", post(analyze_meal))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct MealLogRequest {
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    macros: MacroSet,
    vegetables: Option<i32>,
    proteins: Option<i32>,
    carb_warning: Option<String>,
}

async fn log_meal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<MealLogRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if body.name.is_empty() {
        return Err(AppError::Validation("Meal name is required.".to_string()));
    }

    let mut content = body.name.clone();
    if let Some(description) = &body.description {
        content.push('\n');
        content.push_str(description);
    }
    if let Some(warning) = &body.carb_warning {
        content.push_str(&format!("\n⚠️ {warning}"));
    }

    let metrics = EntryMetrics::Meal(MealMetrics {
        carbs: body.macros.carbs,
        protein: body.macros.protein,
        fat: body.macros.fat,
        calories: body.macros.calories,
        vegetables: body.vegetables,
        proteins: body.proteins,
        carb_warning: body.carb_warning.clone(),
    });
    let macros =
        serde_json::to_value(&metrics).map_err(|e| AppError::Validation(e.to_string()))?;

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO logs (id, user_id, type, content, image_url, macros, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, NOW())",
    )
    .bind(id)
    .bind(user.id)
    .bind(EntryKind::MealNote.as_str())
    .bind(&content)
    .bind(body.image_url.as_deref())
    .bind(macros)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    limit: Option<i64>,
}

async fn meal_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<LogEntry>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_MEAL_LOGS_LIMIT).clamp(1, 100);

    let rows = sqlx::query_as::<_, LogRow>(
        "SELECT id, type, content, image_url, macros, created_at \
         FROM logs \
         WHERE user_id = $1 AND type = $2 \
         ORDER BY created_at DESC \
         LIMIT $3",
    )
    .bind(user.id)
    .bind(EntryKind::MealNote.as_str())
    .bind(limit)
    .fetch_all(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("❌ Failed to fetch meal history: {e}");
        AppError::Database(e)
    })?;

    let entries = rows
        .into_iter()
        .filter_map(|row| LogEntry::from_row(row).ok())
        .collect();
    Ok(Json(entries))
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    image_base64: String,
}

/// Vision pass over a meal photo; the caller decides whether to log the
/// returned estimate.
async fn analyze_meal(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<MealAnalysis>, AppError> {
    if body.image_base64.is_empty() {
        return Err(AppError::Validation("No image provided.".to_string()));
    }
    let analysis = ai::meal::analyze_meal_image(&state.ai, &body.image_base64).await?;
    Ok(Json(analysis))
}
