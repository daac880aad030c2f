use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Minimum gap between two meals that counts as an intermittent fast.
pub const MIN_FASTING_HOURS: i64 = 12;

/// Goal assumed when the profile has none (a 16:8 schedule).
pub const DEFAULT_FASTING_GOAL_HOURS: i64 = 16;

/// A gap of at least [`MIN_FASTING_HOURS`] between two consecutive meal
/// logs. `date` is the day the fast was broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastingWindow {
    pub date: NaiveDate,
    pub hours: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FastingStats {
    pub windows: Vec<FastingWindow>,
    /// Number of windows in the period. Not distinct days: two fasts broken
    /// on the same day count twice.
    pub window_count: usize,
    /// Days covered by the report, clipped to today for the running month.
    pub days_in_period: i64,
    pub average_hours: Option<f64>,
    pub longest_hours: Option<i64>,
    pub windows_met_goal: usize,
}

impl FastingStats {
    fn empty(days_in_period: i64) -> Self {
        Self {
            windows: Vec::new(),
            window_count: 0,
            days_in_period,
            average_hours: None,
            longest_hours: None,
            windows_met_goal: 0,
        }
    }
}

/// Derives fasting windows from the meal timestamps of one reporting period
/// and reduces them to summary statistics. Never errors: with fewer than two
/// meals every derived field degrades to its empty shape.
///
/// Hours are the truncated whole-hour difference between adjacent meals, so
/// an 11-hour-59-minute gap is 11 hours and never a fast.
pub fn monthly_fasting_stats(
    goal_hours: i64,
    meal_times: &[DateTime<Utc>],
    period_start: NaiveDate,
    period_end: NaiveDate,
    today: NaiveDate,
) -> FastingStats {
    let total_days = (period_end - period_start).num_days() + 1;
    let days_in_period = if period_end > today {
        (today - period_start).num_days() + 1
    } else {
        total_days
    };

    if meal_times.len() < 2 {
        return FastingStats::empty(days_in_period);
    }

    let mut sorted = meal_times.to_vec();
    sorted.sort();

    let mut windows = Vec::new();
    for pair in sorted.windows(2) {
        let hours = (pair[1] - pair[0]).num_hours();
        if hours >= MIN_FASTING_HOURS {
            windows.push(FastingWindow { date: pair[1].date_naive(), hours });
        }
    }

    let window_count = windows.len();
    let total_hours: i64 = windows.iter().map(|w| w.hours).sum();
    let average_hours = (window_count > 0).then(|| total_hours as f64 / window_count as f64);
    let longest_hours = windows.iter().map(|w| w.hours).max();
    let windows_met_goal = windows.iter().filter(|w| w.hours >= goal_hours).count();

    FastingStats {
        windows,
        window_count,
        days_in_period,
        average_hours,
        longest_hours,
        windows_met_goal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 8, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn short_gaps_are_not_fasts() {
        let meals = vec![t0(), t0() + Duration::hours(10), t0() + Duration::hours(22)];
        let stats = monthly_fasting_stats(
            16,
            &meals,
            date(2026, 8, 1),
            date(2026, 8, 31),
            date(2026, 8, 31),
        );

        assert_eq!(stats.window_count, 1);
        assert_eq!(stats.windows[0].hours, 12);
        assert_eq!(stats.average_hours, Some(12.0));
        assert_eq!(stats.longest_hours, Some(12));
        assert_eq!(stats.windows_met_goal, 0);
    }

    #[test]
    fn unordered_input_is_sorted_first() {
        let meals = vec![t0() + Duration::hours(40), t0(), t0() + Duration::hours(18)];
        let stats = monthly_fasting_stats(
            16,
            &meals,
            date(2026, 8, 1),
            date(2026, 8, 31),
            date(2026, 8, 31),
        );

        // 18h then 22h once sorted.
        assert_eq!(stats.window_count, 2);
        assert_eq!(stats.longest_hours, Some(22));
        assert_eq!(stats.average_hours, Some(20.0));
        assert_eq!(stats.windows_met_goal, 2);
    }

    #[test]
    fn fractional_hours_truncate() {
        let meals = vec![t0(), t0() + Duration::minutes(11 * 60 + 59)];
        let stats = monthly_fasting_stats(
            16,
            &meals,
            date(2026, 8, 1),
            date(2026, 8, 31),
            date(2026, 8, 31),
        );
        assert!(stats.windows.is_empty());

        let meals = vec![t0(), t0() + Duration::minutes(16 * 60 + 45)];
        let stats = monthly_fasting_stats(
            16,
            &meals,
            date(2026, 8, 1),
            date(2026, 8, 31),
            date(2026, 8, 31),
        );
        assert_eq!(stats.windows[0].hours, 16);
        assert_eq!(stats.windows_met_goal, 1);
    }

    #[test]
    fn fewer_than_two_meals_degrades_to_empty() {
        let stats = monthly_fasting_stats(
            16,
            &[t0()],
            date(2026, 8, 1),
            date(2026, 8, 31),
            date(2026, 8, 31),
        );

        assert_eq!(stats.window_count, 0);
        assert_eq!(stats.average_hours, None);
        assert_eq!(stats.longest_hours, None);
        assert_eq!(stats.windows_met_goal, 0);
        assert!(stats.windows.is_empty());
        assert_eq!(stats.days_in_period, 31);
    }

    #[test]
    fn running_month_clips_days_to_today() {
        let stats = monthly_fasting_stats(
            16,
            &[],
            date(2026, 8, 1),
            date(2026, 8, 31),
            date(2026, 8, 6),
        );
        assert_eq!(stats.days_in_period, 6);

        // A fully elapsed month reports its real length.
        let stats = monthly_fasting_stats(
            16,
            &[],
            date(2026, 7, 1),
            date(2026, 7, 31),
            date(2026, 8, 6),
        );
        assert_eq!(stats.days_in_period, 31);
    }
}
