use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/pantry", get(get_pantry).post(add_item).put(replace_items))
        .route("/pantry/:name", delete(remove_item))
        .with_state(state)
}

#[derive(Serialize)]
pub struct PantryView {
    ingredients: Vec<String>,
}

async fn get_pantry(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<PantryView>, AppError> {
    let ingredients = sqlx::query_scalar::<_, String>(
        "SELECT ingredient_name FROM pantry WHERE user_id = $1 ORDER BY ingredient_name ASC",
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(PantryView { ingredients }))
}

#[derive(Deserialize)]
pub struct NewItem {
    ingredient_name: String,
}

async fn add_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<NewItem>,
) -> Result<StatusCode, AppError> {
    let name = body.ingredient_name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Ingredient name is required.".to_string()));
    }

    let result = sqlx::query("INSERT INTO pantry (user_id, ingredient_name) VALUES ($1, $2)")
        .bind(user.id)
        .bind(name)
        .execute(&state.pool)
        .await;

    match result {
        Ok(_) => Ok(StatusCode::CREATED),
        // Already in the pantry is fine.
        Err(e) if is_unique_violation(&e) => Ok(StatusCode::OK),
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

async fn remove_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    sqlx::query("DELETE FROM pantry WHERE user_id = $1 AND ingredient_name = $2")
        .bind(user.id)
        .bind(&name)
        .execute(&state.pool)
        .await?;

    // Removing an absent item is not an error; the pantry ends up in the
    // requested state either way.
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ReplaceItems {
    ingredients: Vec<String>,
}

/// Clears and re-creates the user's pantry in one request, the shape the
/// pantry editor saves in.
async fn replace_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ReplaceItems>,
) -> Result<Json<PantryView>, AppError> {
    sqlx::query("DELETE FROM pantry WHERE user_id = $1")
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    let mut ingredients = Vec::new();
    for ingredient in &body.ingredients {
        let name = ingredient.trim();
        if name.is_empty() {
            continue;
        }
        let result =
            sqlx::query("INSERT INTO pantry (user_id, ingredient_name) VALUES ($1, $2)")
                .bind(user.id)
                .bind(name)
                .execute(&state.pool)
                .await;
        match result {
            Ok(_) => ingredients.push(name.to_string()),
            Err(e) if is_unique_violation(&e) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Json(PantryView { ingredients }))
}
