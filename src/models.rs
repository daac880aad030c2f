use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One row of the `profile` table. Created at sign-up (possibly minimal),
/// filled in during onboarding, never hard-deleted.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_name: Option<String>,
    pub full_name: Option<String>,
    pub email: String,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub last_period_end: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub activity_level: Option<String>,
    pub fasting_goal: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            other => Err(format!("Invalid gender: {other}")),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

/// Journal entry kinds, stored in the `type` column of `logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    MealNote,
    PersonalNote,
    KetoneReading,
}

impl EntryKind {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "meal_note" => Ok(Self::MealNote),
            "personal_note" => Ok(Self::PersonalNote),
            "ketone_reading" => Ok(Self::KetoneReading),
            other => Err(format!("Invalid journal entry type: {other}")),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MealNote => "meal_note",
            Self::PersonalNote => "personal_note",
            Self::KetoneReading => "ketone_reading",
        }
    }
}

/// Macros per serving, shared by meal logs, generated recipes and meal
/// analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroSet {
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub calories: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MealMetrics {
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub calories: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegetables: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proteins: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carb_warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonalMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KetoneMetrics {
    pub ketone_reading: f64,
}

/// The `macros` column holds a different shape per entry kind. Each variant
/// carries only the fields valid for its kind; fields from another kind are
/// rejected at construction, not silently accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntryMetrics {
    Meal(MealMetrics),
    Personal(PersonalMetrics),
    Ketone(KetoneMetrics),
}

impl EntryMetrics {
    /// Parses the loose JSON bag against the shape dictated by the entry
    /// kind. The kind lives in its own column, so the JSON itself carries no
    /// tag.
    pub fn from_value(kind: EntryKind, value: Value) -> Result<Self, String> {
        let parsed = match kind {
            EntryKind::MealNote => serde_json::from_value(value).map(Self::Meal),
            EntryKind::PersonalNote => serde_json::from_value(value).map(Self::Personal),
            EntryKind::KetoneReading => serde_json::from_value(value).map(Self::Ketone),
        };
        parsed.map_err(|e| format!("Invalid metrics for {}: {e}", kind.as_str()))
    }

    pub const fn kind(&self) -> EntryKind {
        match self {
            Self::Meal(_) => EntryKind::MealNote,
            Self::Personal(_) => EntryKind::PersonalNote,
            Self::Ketone(_) => EntryKind::KetoneReading,
        }
    }
}

/// Raw `logs` row as fetched. `type` and `macros` are decoded into their
/// typed forms by [`LogEntry::from_row`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LogRow {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub content: String,
    pub image_url: Option<String>,
    pub macros: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub content: String,
    pub image_url: Option<String>,
    pub metrics: Option<EntryMetrics>,
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// Metrics are validated strictly on write; on read a malformed bag is
    /// dropped with a warning instead of failing the whole listing.
    pub fn from_row(row: LogRow) -> Result<Self, String> {
        let kind = EntryKind::from_str(&row.kind)?;
        let metrics = row.macros.and_then(|v| match EntryMetrics::from_value(kind, v) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!("dropping unreadable metrics on log {}: {e}", row.id);
                None
            }
        });
        Ok(Self {
            id: row.id,
            kind,
            content: row.content,
            image_url: row.image_url,
            metrics,
            created_at: row.created_at,
        })
    }
}

/// Ketosis classification of a blood/breath ketone reading (mmol/L).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KetosisStatus {
    Optimal,
    Light,
    Below,
}

impl KetosisStatus {
    pub fn from_reading(mmol: f64) -> Self {
        if mmol >= 1.5 {
            Self::Optimal
        } else if mmol >= 0.5 {
            Self::Light
        } else {
            Self::Below
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeDifficulty {
    Easy,
    Medium,
    Hard,
}

impl RecipeDifficulty {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(format!("Invalid difficulty: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Dessert,
}

impl RecipeCategory {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" => Ok(Self::Snack),
            "dessert" => Ok(Self::Dessert),
            other => Err(format!("Invalid category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub ingredients: Value,
    pub instructions: Option<String>,
    pub cooking_time: Option<i32>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub macros: Option<Value>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub amount: String,
}

/// Shape the recipe generator asks the model for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedRecipe {
    pub title: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: String,
    pub macros: MacroSet,
    pub cooking_time: i32,
    pub difficulty: RecipeDifficulty,
    pub category: RecipeCategory,
}

/// Shape the meal-photo analyzer asks the model for. Field names mirror the
/// provider reply, hence camelCase on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysis {
    pub vegetables: i32,
    pub proteins: i32,
    pub estimated_macros: MacroSet,
    pub carb_warning: Option<String>,
    pub description: String,
}

/// Uniform reply for form-style actions: either an error message or an
/// optional next location for the client to navigate to.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self { success: true, error: None, redirect_to: None }
    }

    pub fn redirect(to: impl Into<String>) -> Self {
        Self { success: true, error: None, redirect_to: Some(to.into()) }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, error: Some(message.into()), redirect_to: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metrics_parse_by_kind() {
        let meal = EntryMetrics::from_value(
            EntryKind::MealNote,
            json!({"carbs": 8.0, "protein": 30.0, "fat": 22.0, "calories": 410.0}),
        )
        .unwrap();
        assert_eq!(meal.kind(), EntryKind::MealNote);

        let ketone =
            EntryMetrics::from_value(EntryKind::KetoneReading, json!({"ketone_reading": 1.7}))
                .unwrap();
        assert_eq!(
            ketone,
            EntryMetrics::Ketone(KetoneMetrics { ketone_reading: 1.7 })
        );
    }

    #[test]
    fn metrics_reject_mismatched_fields() {
        // Mood on a meal note is a different kind's field.
        let err = EntryMetrics::from_value(
            EntryKind::MealNote,
            json!({"carbs": 1.0, "protein": 2.0, "fat": 3.0, "calories": 4.0, "mood": 5}),
        )
        .unwrap_err();
        assert!(err.contains("meal_note"));

        // A ketone entry without a reading is meaningless.
        assert!(EntryMetrics::from_value(EntryKind::KetoneReading, json!({})).is_err());
    }

    #[test]
    fn metrics_serialize_flat() {
        let personal = EntryMetrics::Personal(PersonalMetrics {
            energy_level: Some(7),
            mood: None,
        });
        assert_eq!(
            serde_json::to_value(&personal).unwrap(),
            json!({"energy_level": 7})
        );
    }

    #[test]
    fn ketosis_bands() {
        assert_eq!(KetosisStatus::from_reading(2.1), KetosisStatus::Optimal);
        assert_eq!(KetosisStatus::from_reading(1.5), KetosisStatus::Optimal);
        assert_eq!(KetosisStatus::from_reading(0.9), KetosisStatus::Light);
        assert_eq!(KetosisStatus::from_reading(0.2), KetosisStatus::Below);
    }

    #[test]
    fn entry_kind_round_trip() {
        for kind in [EntryKind::MealNote, EntryKind::PersonalNote, EntryKind::KetoneReading] {
            assert_eq!(EntryKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(EntryKind::from_str("nap_note").is_err());
    }
}
