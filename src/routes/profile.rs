use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::db::{PgProfiles, ProfileStore};
use crate::error::AppError;
use crate::models::{ActionResponse, Gender, Profile};
use crate::profile::{is_profile_complete, missing_profile_fields};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/onboarding", post(complete_onboarding))
        .with_state(state)
}

#[derive(Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    profile: Profile,
    is_complete: bool,
    missing_fields: Vec<&'static str>,
}

async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileView>, AppError> {
    let profile = PgProfiles(state.pool.clone()).fetch(user.id).await?;
    let Some(profile) = profile else {
        return Err(AppError::NotFound);
    };
    Ok(Json(ProfileView {
        is_complete: is_profile_complete(Some(&profile)),
        missing_fields: missing_profile_fields(Some(&profile)),
        profile,
    }))
}

#[derive(Deserialize)]
pub struct ProfileForm {
    full_name: String,
    dob: Option<NaiveDate>,
    gender: Option<String>,
    last_period_end: Option<NaiveDate>,
    address: Option<String>,
    city: Option<String>,
    fasting_goal: i32,
}

fn validated_gender(gender: Option<&str>) -> Result<Option<&'static str>, AppError> {
    match gender {
        None | Some("") => Ok(None),
        Some(g) => Gender::from_str(g)
            .map(|g| Some(g.as_str()))
            .map_err(AppError::Validation),
    }
}

/// Upserts the onboarding answers onto the (possibly minimal) profile row
/// created at sign-up.
async fn complete_onboarding(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<ProfileForm>,
) -> Result<Json<ActionResponse>, AppError> {
    if form.full_name.is_empty() {
        return Err(AppError::Validation("Full name is required.".to_string()));
    }
    let gender = validated_gender(form.gender.as_deref())?;

    sqlx::query(
        "INSERT INTO profile \
             (id, full_name, email, dob, gender, last_period_end, address, city, fasting_goal, \
              created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()) \
         ON CONFLICT (id) DO UPDATE SET \
             full_name = EXCLUDED.full_name, \
             dob = EXCLUDED.dob, \
             gender = EXCLUDED.gender, \
             last_period_end = EXCLUDED.last_period_end, \
             address = EXCLUDED.address, \
             city = EXCLUDED.city, \
             fasting_goal = EXCLUDED.fasting_goal, \
             updated_at = NOW()",
    )
    .bind(user.id)
    .bind(&form.full_name)
    .bind(user.email.as_deref().unwrap_or(""))
    .bind(form.dob)
    .bind(gender)
    .bind(form.last_period_end)
    .bind(form.address.as_deref())
    .bind(form.city.as_deref())
    .bind(form.fasting_goal)
    .execute(&state.pool)
    .await?;

    Ok(Json(ActionResponse::redirect("/dashboard")))
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<ProfileForm>,
) -> Result<Json<ActionResponse>, AppError> {
    if form.full_name.is_empty() {
        return Err(AppError::Validation("Full name is required.".to_string()));
    }
    let gender = validated_gender(form.gender.as_deref())?;

    let result = sqlx::query(
        "UPDATE profile SET \
             full_name = $2, \
             dob = $3, \
             gender = $4, \
             last_period_end = $5, \
             address = $6, \
             city = $7, \
             fasting_goal = $8, \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(user.id)
    .bind(&form.full_name)
    .bind(form.dob)
    .bind(gender)
    .bind(form.last_period_end)
    .bind(form.address.as_deref())
    .bind(form.city.as_deref())
    .bind(form.fasting_goal)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(Json(ActionResponse::ok()))
}
