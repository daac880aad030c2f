use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::Serialize;

/// Assumed fixed cycle length, in days.
pub const CYCLE_LENGTH_DAYS: i64 = 28;

/// Days reported as the luteal phase by [`phase_for_day`].
pub const LUTEAL_PHASE_RANGE: RangeInclusive<i64> = 17..=28;

/// Days that trigger the fasting-difficulty warning. Deliberately narrower
/// than [`LUTEAL_PHASE_RANGE`]; product has not decided whether the two
/// should be unified, so they stay distinct.
pub const LUTEAL_FASTING_WARNING_RANGE: RangeInclusive<i64> = 21..=28;

/// Day position in the assumed 28-day cycle, counted from the recorded end
/// of the last period. Both dates are day-granular; a period that ended
/// today is day 1.
pub fn cycle_day(last_period_end: NaiveDate, today: NaiveDate) -> i64 {
    let days_since = (today - last_period_end).num_days();
    let day = (days_since % CYCLE_LENGTH_DAYS) + 1;
    // Guards the modulus boundary when days_since is negative or lands
    // exactly on a cycle edge.
    if day > CYCLE_LENGTH_DAYS {
        day - CYCLE_LENGTH_DAYS
    } else {
        day
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseInfo {
    pub phase: CyclePhase,
    pub name: &'static str,
    pub description: &'static str,
}

const LUTEAL_INFO: PhaseInfo = PhaseInfo {
    phase: CyclePhase::Luteal,
    name: "Luteal Phase",
    description: "Progesterone is high. Fasting may be more challenging.",
};

/// Non-overlapping partition of the cycle into four named bands, each with a
/// one-line fasting advisory.
pub fn phase_for_day(day: i64) -> PhaseInfo {
    match day {
        1..=5 => PhaseInfo {
            phase: CyclePhase::Menstrual,
            name: "Menstrual Phase",
            description: "Your period. Rest and recovery are important.",
        },
        6..=13 => PhaseInfo {
            phase: CyclePhase::Follicular,
            name: "Follicular Phase",
            description: "Estrogen is rising. Great time for fasting!",
        },
        14..=16 => PhaseInfo {
            phase: CyclePhase::Ovulation,
            name: "Ovulation",
            description: "Peak fertility. Moderate fasting recommended.",
        },
        d if LUTEAL_PHASE_RANGE.contains(&d) => LUTEAL_INFO,
        // Out-of-range days degrade to the luteal copy rather than panic.
        _ => LUTEAL_INFO,
    }
}

/// Whether the day falls in the band where fasting is hardest. Uses the
/// narrow warning range, not the phase band above.
pub fn in_luteal_fasting_warning(day: i64) -> bool {
    LUTEAL_FASTING_WARNING_RANGE.contains(&day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_one_on_period_end() {
        let today = date(2026, 8, 6);
        assert_eq!(cycle_day(today, today), 1);
    }

    #[test]
    fn wraps_after_full_cycle() {
        let today = date(2026, 8, 6);
        assert_eq!(cycle_day(date(2026, 7, 10), today), 28);
        assert_eq!(cycle_day(date(2026, 7, 9), today), 1);
    }

    #[test]
    fn phase_bands() {
        assert_eq!(phase_for_day(1).phase, CyclePhase::Menstrual);
        assert_eq!(phase_for_day(5).phase, CyclePhase::Menstrual);
        assert_eq!(phase_for_day(10).phase, CyclePhase::Follicular);
        assert_eq!(phase_for_day(15).phase, CyclePhase::Ovulation);
        assert_eq!(phase_for_day(20).phase, CyclePhase::Luteal);
        assert_eq!(phase_for_day(28).phase, CyclePhase::Luteal);
    }

    // The phase band and the warning band disagree on days 17-20. That gap
    // is in the product as shipped and stays until product reconciles it.
    #[test]
    fn warning_band_is_narrower_than_phase_band() {
        assert_eq!(phase_for_day(20).phase, CyclePhase::Luteal);
        assert!(!in_luteal_fasting_warning(20));
        assert!(in_luteal_fasting_warning(21));
        assert!(in_luteal_fasting_warning(28));
        assert!(LUTEAL_PHASE_RANGE.contains(&17));
        assert!(!LUTEAL_FASTING_WARNING_RANGE.contains(&17));
    }
}
