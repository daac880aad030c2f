use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::ai;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::{ActionResponse, Recipe, RecipeCategory, RecipeDifficulty};
use crate::state::AppState;

const RECIPES_PAGE_SIZE: i64 = 10;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/generate", post(generate))
        .route("/recipes/:id", get(get_recipe).delete(delete_recipe))
        .route("/recipes/:id/favorite", post(toggle_favorite))
        .route("/recipes/:id/visibility", put(set_visibility))
        .with_state(state)
}

#[derive(Deserialize, Default)]
pub struct GenerateBody {
    #[serde(default)]
    ingredients: Vec<String>,
}

/// Generates a keto recipe from the posted ingredients, falling back to the
/// user's saved pantry when none are given.
async fn generate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<GenerateBody>,
) -> Result<Json<Value>, AppError> {
    let mut ingredients: Vec<String> = body
        .ingredients
        .iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();

    if ingredients.is_empty() {
        ingredients = sqlx::query_scalar::<_, String>(
            "SELECT ingredient_name FROM pantry WHERE user_id = $1 ORDER BY ingredient_name ASC",
        )
        .bind(user.id)
        .fetch_all(&state.pool)
        .await?;
    }
    if ingredients.is_empty() {
        return Err(AppError::Validation("Please provide at least one ingredient.".to_string()));
    }

    let recipe = ai::recipe::generate_recipe(&state.ai, &ingredients).await?;
    Ok(Json(json!({ "recipe": recipe })))
}

#[derive(Deserialize)]
pub struct NewRecipe {
    title: String,
    ingredients: Value,
    instructions: String,
    macros: Option<Value>,
    cooking_time: Option<i32>,
    difficulty: Option<String>,
    category: Option<String>,
    #[serde(default)]
    is_public: bool,
}

async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<NewRecipe>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if body.title.is_empty() || body.instructions.is_empty() || body.ingredients.is_null() {
        return Err(AppError::Validation(
            "Missing required fields: title, ingredients, and instructions are required."
                .to_string(),
        ));
    }
    if let Some(difficulty) = body.difficulty.as_deref() {
        RecipeDifficulty::from_str(difficulty).map_err(AppError::Validation)?;
    }
    if let Some(category) = body.category.as_deref() {
        RecipeCategory::from_str(category).map_err(AppError::Validation)?;
    }

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO recipes \
             (id, user_id, title, ingredients, instructions, macros, cooking_time, difficulty, \
              category, is_public, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW()) \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&body.title)
    .bind(&body.ingredients)
    .bind(&body.instructions)
    .bind(&body.macros)
    .bind(body.cooking_time)
    .bind(body.difficulty.as_deref())
    .bind(body.category.as_deref())
    .bind(body.is_public)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[derive(Deserialize)]
pub struct ListQuery {
    limit: Option<i64>,
}

const RECIPE_COLUMNS: &str = "id, user_id, title, ingredients, instructions, cooking_time, \
     difficulty, category, macros, is_public, created_at";

/// The user's own recipes plus everything shared publicly, newest first.
async fn list_recipes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    let limit = query.limit.unwrap_or(RECIPES_PAGE_SIZE).clamp(1, 100);

    let recipes = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes \
         WHERE user_id = $1 OR is_public \
         ORDER BY created_at DESC \
         LIMIT $2"
    ))
    .bind(user.id)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(recipes))
}

async fn get_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Recipe>, AppError> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;

    match recipe {
        Some(r) if r.is_public || r.user_id == Some(user.id) => Ok(Json(r)),
        // Private recipes of other users look absent, not forbidden.
        _ => Err(AppError::NotFound),
    }
}

async fn delete_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM recipe_favorites WHERE user_id = $1 AND recipe_id = $2",
    )
    .bind(user.id)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;

    match existing {
        Some(favorite_id) => {
            sqlx::query("DELETE FROM recipe_favorites WHERE id = $1")
                .bind(favorite_id)
                .execute(&state.pool)
                .await?;
            Ok(Json(json!({ "favorited": false })))
        }
        None => {
            sqlx::query(
                "INSERT INTO recipe_favorites (id, user_id, recipe_id) VALUES ($1, $2, $3)",
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(id)
            .execute(&state.pool)
            .await?;
            Ok(Json(json!({ "favorited": true })))
        }
    }
}

#[derive(Deserialize)]
pub struct VisibilityBody {
    is_public: bool,
}

async fn set_visibility(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<VisibilityBody>,
) -> Result<Json<ActionResponse>, AppError> {
    let result = sqlx::query("UPDATE recipes SET is_public = $3 WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .bind(body.is_public)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(Json(ActionResponse::ok()))
}
