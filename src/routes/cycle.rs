use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::cycle::{cycle_day, in_luteal_fasting_warning, phase_for_day, PhaseInfo};
use crate::db::{PgProfiles, ProfileStore};
use crate::error::AppError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/cycle", get(get_cycle_summary))
        .with_state(state)
}

#[derive(Serialize)]
pub struct CycleSummary {
    pub last_period_end: Option<NaiveDate>,
    pub cycle_day: Option<i64>,
    pub phase: Option<PhaseInfo>,
    pub luteal_fasting_warning: bool,
}

/// Period-tracker card data. Without a recorded period end there is nothing
/// to derive, so the whole calculation is skipped and every field is null.
async fn get_cycle_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CycleSummary>, AppError> {
    let profile = PgProfiles(state.pool.clone()).fetch(user.id).await?;

    let Some(last_period_end) = profile.and_then(|p| p.last_period_end) else {
        return Ok(Json(CycleSummary {
            last_period_end: None,
            cycle_day: None,
            phase: None,
            luteal_fasting_warning: false,
        }));
    };

    let today = Utc::now().date_naive();
    let day = cycle_day(last_period_end, today);

    Ok(Json(CycleSummary {
        last_period_end: Some(last_period_end),
        cycle_day: Some(day),
        phase: Some(phase_for_day(day)),
        luteal_fasting_warning: in_luteal_fasting_warning(day),
    }))
}
