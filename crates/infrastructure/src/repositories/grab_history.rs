//! PostgreSQL implementation of `GrabHistoryRepository`: the durable
//! dedup fabric per §9 ("History as the dedup fabric").
//!
//! New functionality the teacher never had; grounded in
//! `repositories/download.rs`'s raw-query idiom. `RECENT_GRAB_WINDOW`
//! mirrors the "recent" window `score_and_grab` relies on to suppress
//! re-grabbing an item whose previous grab hasn't resolved yet.

use async_trait::async_trait;
use chrono::Duration;
use radarr_core::domain::repositories::GrabHistoryRepository;
use radarr_core::models::MediaType;
use radarr_core::Result;
use sqlx::Row;
use uuid::Uuid;

use crate::repositories::wanted::PostgresAcquisitionRepository;

const RECENT_GRAB_WINDOW: Duration = Duration::hours(12);

#[async_trait]
impl GrabHistoryRepository for PostgresAcquisitionRepository {
    async fn list_version_slots(&self, media_type: MediaType, media_id: Uuid) -> Result<Vec<i32>> {
        let rows = sqlx::query(
            "SELECT DISTINCT target_slot_id FROM grab_history
             WHERE media_type = $1 AND media_id = $2 AND target_slot_id IS NOT NULL",
        )
        .bind(media_type.to_string())
        .bind(media_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| row.try_get::<i32, _>("target_slot_id").map_err(Into::into)).collect()
    }

    async fn has_recent_grab(&self, media_type: MediaType, media_id: Uuid) -> Result<bool> {
        let cutoff = chrono::Utc::now() - RECENT_GRAB_WINDOW;
        let row = sqlx::query(
            "SELECT EXISTS(
                SELECT 1 FROM grab_history
                WHERE media_type = $1 AND media_id = $2 AND grabbed_at > $3
             ) AS exists_flag",
        )
        .bind(media_type.to_string())
        .bind(media_id)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("exists_flag")?)
    }

    /// `RecordGrabHistory` only carries `(media_type, media_id)`, and for
    /// season grabs `media_id` is the series id (§season_searchable_item
    /// sets it that way) with no season-number column alongside it. We
    /// can therefore only dedup at series granularity here, not per
    /// season; a recent grab of any season suppresses this one too.
    async fn has_recent_season_grab(&self, series_id: Uuid, _season_number: i32) -> Result<bool> {
        let cutoff = chrono::Utc::now() - RECENT_GRAB_WINDOW;
        let row = sqlx::query(
            "SELECT EXISTS(
                SELECT 1 FROM grab_history
                WHERE media_type = 'season' AND media_id = $1 AND grabbed_at > $2
             ) AS exists_flag",
        )
        .bind(series_id)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("exists_flag")?)
    }

    async fn record_grab_history(
        &self,
        media_type: MediaType,
        media_id: Uuid,
        quality_name: &str,
        is_upgrade: bool,
        client_name: &str,
        download_id: &str,
        target_slot_id: Option<i32>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO grab_history
                (id, media_type, media_id, quality_name,
                 is_upgrade, client_name, download_id, target_slot_id, grabbed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(Uuid::new_v4())
        .bind(media_type.to_string())
        .bind(media_id)
        .bind(quality_name)
        .bind(is_upgrade)
        .bind(client_name)
        .bind(download_id)
        .bind(target_slot_id)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
