//! PostgreSQL implementation of `radarr_sync::QualityProfileStore` (§4.6
//! step 1), over a dedicated `sync_quality_profiles` table distinct
//! from the teacher's legacy `quality_profiles` table in
//! `quality_profile.rs` (which keys on an `i32` id rather than the new
//! opaque-quality-id `Uuid`-keyed profile). `definitions` is stored as
//! `jsonb` since it's a small, profile-owned list with no independent
//! query needs of its own, the same call `custom_formats.rs` makes for
//! its format list.
//!
//! Grounded in `repositories/settings.rs`'s raw-query idiom.

use async_trait::async_trait;
use radarr_core::{RadarrError, Result};
use radarr_decision::quality::QualityProfile;
use radarr_sync::QualityProfileStore;
use sqlx::Row;
use uuid::Uuid;

use crate::database::DatabasePool;

pub struct PostgresQualityProfileStore {
    pool: DatabasePool,
}

impl PostgresQualityProfileStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QualityProfileStore for PostgresQualityProfileStore {
    async fn get_profile(&self, id: Uuid) -> Result<QualityProfile> {
        let row = sqlx::query(
            "SELECT id, name, cutoff_id, definitions, min_format_score, upgrade_allowed
             FROM sync_quality_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| RadarrError::NotFound { resource: format!("quality profile {id}") })?;

        let definitions_json: serde_json::Value = row.try_get("definitions")?;
        let definitions = serde_json::from_value(definitions_json)
            .map_err(|e| RadarrError::DatabaseError { message: format!("invalid quality profile definitions: {e}") })?;

        Ok(QualityProfile {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            cutoff_id: row.try_get("cutoff_id")?,
            definitions,
            min_format_score: row.try_get("min_format_score")?,
            upgrade_allowed: row.try_get("upgrade_allowed")?,
        })
    }
}
