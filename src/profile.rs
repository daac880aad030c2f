use crate::models::Profile;

/// Fields a profile must carry before the user may leave onboarding.
pub const REQUIRED_PROFILE_FIELDS: [&str; 3] = ["full_name", "city", "fasting_goal"];

fn has_text(field: Option<&str>) -> bool {
    field.is_some_and(|s| !s.is_empty())
}

// A stored goal of exactly 0 counts as unset. A real zero-hour goal is
// indistinguishable from "not answered"; product has not changed the
// representation, so neither do we.
fn has_goal(goal: Option<i32>) -> bool {
    goal.is_some_and(|g| g != 0)
}

/// Whether the profile satisfies every required field. Gates navigation from
/// onboarding to the main application.
pub fn is_profile_complete(profile: Option<&Profile>) -> bool {
    let Some(p) = profile else { return false };
    has_text(p.full_name.as_deref()) && has_text(p.city.as_deref()) && has_goal(p.fasting_goal)
}

/// Names of the required fields still missing, for user-facing messaging.
pub fn missing_profile_fields(profile: Option<&Profile>) -> Vec<&'static str> {
    let Some(p) = profile else {
        return REQUIRED_PROFILE_FIELDS.to_vec();
    };

    let mut missing = Vec::new();
    if !has_text(p.full_name.as_deref()) {
        missing.push("full_name");
    }
    if !has_text(p.city.as_deref()) {
        missing.push("city");
    }
    if !has_goal(p.fasting_goal) {
        missing.push("fasting_goal");
    }
    missing
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    pub(crate) fn blank_profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            user_name: None,
            full_name: None,
            email: "a@example.com".into(),
            dob: None,
            gender: None,
            last_period_end: None,
            address: None,
            city: None,
            activity_level: None,
            fasting_goal: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn complete_profile() -> Profile {
        Profile {
            full_name: Some("A".into()),
            city: Some("B".into()),
            fasting_goal: Some(16),
            ..blank_profile()
        }
    }

    #[test]
    fn absent_profile_is_incomplete() {
        assert!(!is_profile_complete(None));
        assert_eq!(
            missing_profile_fields(None),
            vec!["full_name", "city", "fasting_goal"]
        );
    }

    #[test]
    fn all_required_fields_present() {
        assert!(is_profile_complete(Some(&complete_profile())));
        assert!(missing_profile_fields(Some(&complete_profile())).is_empty());
    }

    #[test]
    fn zero_goal_counts_as_missing() {
        let p = Profile { fasting_goal: Some(0), ..complete_profile() };
        assert!(!is_profile_complete(Some(&p)));
        assert_eq!(missing_profile_fields(Some(&p)), vec!["fasting_goal"]);
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let p = Profile { city: Some(String::new()), ..complete_profile() };
        assert!(!is_profile_complete(Some(&p)));
        assert_eq!(missing_profile_fields(Some(&p)), vec!["city"]);
    }
}
