use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::db::{PgProfiles, ProfileStore};
use crate::error::AppError;
use crate::fasting::{monthly_fasting_stats, FastingStats, DEFAULT_FASTING_GOAL_HOURS};
use crate::models::{EntryKind, EntryMetrics, KetosisStatus, LogEntry, LogRow};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/reports/monthly", get(monthly_report))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct MonthQuery {
    /// Reporting month as `YYYY-MM`; defaults to the current month.
    month: Option<String>,
}

#[derive(Serialize)]
pub struct KetonePoint {
    pub date: NaiveDate,
    pub value: f64,
    pub status: KetosisStatus,
}

#[derive(Serialize)]
pub struct MonthlyReport {
    pub month: String,
    pub total_logs: usize,
    pub meal_logs: usize,
    pub personal_notes: usize,
    pub ketone_readings: usize,
    pub avg_energy: Option<f64>,
    pub avg_mood: Option<f64>,
    pub avg_ketone: Option<f64>,
    pub ketones: Vec<KetonePoint>,
    pub fasting: FastingStats,
}

fn month_bounds(
    month: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = match month {
        Some(m) => NaiveDate::parse_from_str(&format!("{m}-01"), "%Y-%m-%d").map_err(|_| {
            AppError::Validation("Invalid month format (expected YYYY-MM)".to_string())
        })?,
        None => NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
            .ok_or_else(|| AppError::Validation("Invalid month".to_string()))?,
    };
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| AppError::Validation("Invalid month".to_string()))?;
    Ok((start, end))
}

fn average(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// One ascending scan of the month's logs, reduced in memory to the monthly
/// overview, the ketone series and the fasting statistics.
async fn monthly_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyReport>, AppError> {
    let today = Utc::now().date_naive();
    let (month_start, month_end) = month_bounds(query.month.as_deref(), today)?;

    let rows = sqlx::query_as::<_, LogRow>(
        "SELECT id, type, content, image_url, macros, created_at \
         FROM logs \
         WHERE user_id = $1 AND created_at::date >= $2 AND created_at::date <= $3 \
         ORDER BY created_at ASC",
    )
    .bind(user.id)
    .bind(month_start)
    .bind(month_end)
    .fetch_all(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("❌ DB error in monthly_report: {e:?}");
        AppError::Database(e)
    })?;

    let entries: Vec<LogEntry> = rows
        .into_iter()
        .filter_map(|row| LogEntry::from_row(row).ok())
        .collect();

    let mut meal_times = Vec::new();
    let mut energy = Vec::new();
    let mut mood = Vec::new();
    let mut ketones = Vec::new();
    let mut meal_logs = 0;
    let mut personal_notes = 0;
    let mut ketone_readings = 0;

    for entry in &entries {
        match entry.kind {
            EntryKind::MealNote => {
                meal_logs += 1;
                meal_times.push(entry.created_at);
            }
            EntryKind::PersonalNote => {
                personal_notes += 1;
                if let Some(EntryMetrics::Personal(p)) = &entry.metrics {
                    if let Some(level) = p.energy_level {
                        energy.push(f64::from(level));
                    }
                    if let Some(m) = p.mood {
                        mood.push(f64::from(m));
                    }
                }
            }
            EntryKind::KetoneReading => {
                ketone_readings += 1;
                if let Some(EntryMetrics::Ketone(k)) = &entry.metrics {
                    ketones.push(KetonePoint {
                        date: entry.created_at.date_naive(),
                        value: k.ketone_reading,
                        status: KetosisStatus::from_reading(k.ketone_reading),
                    });
                }
            }
        }
    }

    let profile = PgProfiles(state.pool.clone()).fetch(user.id).await?;
    let goal = profile
        .and_then(|p| p.fasting_goal)
        .map_or(DEFAULT_FASTING_GOAL_HOURS, i64::from);

    let fasting = monthly_fasting_stats(goal, &meal_times, month_start, month_end, today);
    let ketone_values: Vec<f64> = ketones.iter().map(|k| k.value).collect();

    Ok(Json(MonthlyReport {
        month: month_start.format("%Y-%m").to_string(),
        total_logs: entries.len(),
        meal_logs,
        personal_notes,
        ketone_readings,
        avg_energy: average(&energy),
        avg_mood: average(&mood),
        avg_ketone: average(&ketone_values),
        ketones,
        fasting,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn explicit_month_parses_to_full_bounds() {
        let (start, end) = month_bounds(Some("2026-02"), date(2026, 8, 6)).unwrap();
        assert_eq!(start, date(2026, 2, 1));
        assert_eq!(end, date(2026, 2, 28));
    }

    #[test]
    fn default_month_is_the_current_one() {
        let (start, end) = month_bounds(None, date(2026, 8, 6)).unwrap();
        assert_eq!(start, date(2026, 8, 1));
        assert_eq!(end, date(2026, 8, 31));
    }

    #[test]
    fn malformed_month_is_rejected() {
        assert!(month_bounds(Some("August"), date(2026, 8, 6)).is_err());
        assert!(month_bounds(Some("2026-13"), date(2026, 8, 6)).is_err());
    }

    #[test]
    fn average_of_nothing_is_none() {
        assert_eq!(average(&[]), None);
        assert_eq!(average(&[2.0, 4.0]), Some(3.0));
    }
}
