use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Profile;

const PROFILE_COLUMNS: &str = "id, user_name, full_name, email, dob, gender, last_period_end, \
     address, city, activity_level, fasting_goal, created_at, updated_at";

/// Keyed profile access as the callback state machine sees it. The machine
/// holds the only conditional write in the system, so the port stays small:
/// a point-read and a create-if-missing.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch(&self, user_id: Uuid) -> Result<Option<Profile>, sqlx::Error>;

    /// Inserts a minimal row (identity, email, timestamps) unless one
    /// already exists.
    async fn insert_minimal(&self, user_id: Uuid, email: &str) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct PgProfiles(pub PgPool);

#[async_trait]
impl ProfileStore for PgProfiles {
    async fn fetch(&self, user_id: Uuid) -> Result<Option<Profile>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profile WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.0)
        .await
    }

    async fn insert_minimal(&self, user_id: Uuid, email: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO profile (id, email, created_at, updated_at) \
             VALUES ($1, $2, NOW(), NOW()) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(user_id)
        .bind(email)
        .execute(&self.0)
        .await?;
        Ok(())
    }
}
