//! PostgreSQL implementation of `DownloadClientRepository`: client
//! configuration, download-mapping persistence, and queue-media rows
//! (§4.7, §6).
//!
//! Grounded in `repositories/download.rs`'s raw-query + `row.try_get`
//! idiom; `list_downloading_movies`/`list_downloading_episodes` project
//! the `movies`/`episodes` tables onto `MediaItem` the same way
//! `wanted.rs` projects them onto `SearchableItem`.

use async_trait::async_trait;
use radarr_core::domain::repositories::DownloadClientRepository;
use radarr_core::models::{CleanupMode, DownloadClientRecord, DownloadMapping, MediaItem, MediaStatus, MediaType, QueueFileStatus, QueueMedia};
use radarr_core::{RadarrError, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

fn parse_cleanup_mode(s: &str) -> CleanupMode {
    match s {
        "delete_after_import" => CleanupMode::DeleteAfterImport,
        "delete_after_seed_ratio" => CleanupMode::DeleteAfterSeedRatio,
        _ => CleanupMode::Leave,
    }
}

fn parse_status(s: &str) -> MediaStatus {
    match s {
        "unreleased" => MediaStatus::Unreleased,
        "available" => MediaStatus::Available,
        "upgradable" => MediaStatus::Upgradable,
        "downloading" => MediaStatus::Downloading,
        "failed" => MediaStatus::Failed,
        _ => MediaStatus::Missing,
    }
}

fn parse_file_status(s: &str) -> QueueFileStatus {
    match s {
        "downloading" => QueueFileStatus::Downloading,
        "ready" => QueueFileStatus::Ready,
        "importing" => QueueFileStatus::Importing,
        "imported" => QueueFileStatus::Imported,
        "failed" => QueueFileStatus::Failed,
        _ => QueueFileStatus::Pending,
    }
}

fn file_status_str(status: QueueFileStatus) -> &'static str {
    match status {
        QueueFileStatus::Pending => "pending",
        QueueFileStatus::Downloading => "downloading",
        QueueFileStatus::Ready => "ready",
        QueueFileStatus::Importing => "importing",
        QueueFileStatus::Imported => "imported",
        QueueFileStatus::Failed => "failed",
    }
}

fn row_to_client(row: PgRow) -> Result<DownloadClientRecord> {
    let port: i32 = row.try_get("port")?;
    Ok(DownloadClientRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        client_type: row.try_get("client_type")?,
        host: row.try_get("host")?,
        port: port as u16,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
        api_key: row.try_get("api_key")?,
        url_base: row.try_get("url_base")?,
        use_ssl: row.try_get("use_ssl")?,
        category: row.try_get("category")?,
        priority: row.try_get("priority")?,
        enabled: row.try_get("enabled")?,
        import_delay_seconds: row.try_get::<i32, _>("import_delay_seconds")? as u32,
        cleanup_mode: parse_cleanup_mode(&row.try_get::<String, _>("cleanup_mode")?),
        seed_ratio_target: row.try_get("seed_ratio_target")?,
    })
}

fn row_to_mapping(row: PgRow) -> Result<DownloadMapping> {
    Ok(DownloadMapping {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        download_id: row.try_get("download_id")?,
        movie_id: row.try_get("movie_id")?,
        series_id: row.try_get("series_id")?,
        season_number: row.try_get("season_number")?,
        episode_id: row.try_get("episode_id")?,
        is_season_pack: row.try_get("is_season_pack")?,
        is_complete_series: row.try_get("is_complete_series")?,
        target_slot_id: row.try_get("target_slot_id")?,
    })
}

fn row_to_queue_media(row: PgRow) -> Result<QueueMedia> {
    Ok(QueueMedia {
        id: row.try_get("id")?,
        download_mapping_id: row.try_get("download_mapping_id")?,
        movie_id: row.try_get("movie_id")?,
        episode_id: row.try_get("episode_id")?,
        file_path: row.try_get("file_path")?,
        file_status: parse_file_status(&row.try_get::<String, _>("file_status")?),
        error_message: row.try_get("error_message")?,
        import_attempts: row.try_get("import_attempts")?,
        target_slot_id: row.try_get("target_slot_id")?,
    })
}

#[async_trait]
impl DownloadClientRepository for super::wanted::PostgresAcquisitionRepository {
    async fn list_enabled_download_clients(&self) -> Result<Vec<DownloadClientRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, client_type, host, port, username, password, api_key, url_base,
                    use_ssl, category, priority, enabled, import_delay_seconds, cleanup_mode, seed_ratio_target
             FROM download_clients WHERE enabled = true ORDER BY priority ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_client).collect()
    }

    async fn list_active_download_mappings(&self) -> Result<Vec<DownloadMapping>> {
        let rows = sqlx::query(
            "SELECT id, client_id, download_id, movie_id, series_id, season_number, episode_id,
                    is_season_pack, is_complete_series, target_slot_id
             FROM download_mappings",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_mapping).collect()
    }

    async fn list_downloading_movies(&self) -> Result<Vec<MediaItem>> {
        let rows = sqlx::query(
            "SELECT id, imdb_id, tmdb_id, quality_profile_id, monitored, status,
                    current_quality_id, active_download_id, status_message, target_slot_id
             FROM movies WHERE status = 'downloading'",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_movie_media_item).collect()
    }

    async fn list_downloading_episodes(&self) -> Result<Vec<MediaItem>> {
        let rows = sqlx::query(
            "SELECT id, series_id, season_number, episode_number, imdb_id, tmdb_id, quality_profile_id,
                    monitored, status, current_quality_id, active_download_id, status_message, target_slot_id
             FROM episodes WHERE status = 'downloading'",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_episode_media_item).collect()
    }

    async fn create_download_mapping(&self, mapping: &DownloadMapping) -> Result<DownloadMapping> {
        sqlx::query(
            "INSERT INTO download_mappings
                (id, client_id, download_id, movie_id, series_id, season_number, episode_id,
                 is_season_pack, is_complete_series, target_slot_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(mapping.id)
        .bind(mapping.client_id)
        .bind(&mapping.download_id)
        .bind(mapping.movie_id)
        .bind(mapping.series_id)
        .bind(mapping.season_number)
        .bind(mapping.episode_id)
        .bind(mapping.is_season_pack)
        .bind(mapping.is_complete_series)
        .bind(mapping.target_slot_id)
        .execute(&self.pool)
        .await?;
        Ok(mapping.clone())
    }

    async fn get_download_mapping(&self, client_id: i32, download_id: &str) -> Result<Option<DownloadMapping>> {
        let row = sqlx::query(
            "SELECT id, client_id, download_id, movie_id, series_id, season_number, episode_id,
                    is_season_pack, is_complete_series, target_slot_id
             FROM download_mappings WHERE client_id = $1 AND download_id = $2",
        )
        .bind(client_id)
        .bind(download_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_mapping).transpose()
    }

    async fn delete_download_mapping(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM download_mappings WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn clear_download_mapping_slot(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE download_mappings SET target_slot_id = NULL WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn update_movie_status_with_details(
        &self,
        movie_id: Uuid,
        status: MediaStatus,
        active_download_id: Option<String>,
        status_message: Option<String>,
    ) -> Result<()> {
        let affected = sqlx::query(
            "UPDATE movies SET status = $2, active_download_id = $3, status_message = $4 WHERE id = $1",
        )
        .bind(movie_id)
        .bind(status.to_string())
        .bind(active_download_id)
        .bind(status_message)
        .execute(&self.pool)
        .await?;

        if affected.rows_affected() == 0 {
            return Err(RadarrError::MovieNotFound { id: movie_id.to_string() });
        }
        Ok(())
    }

    async fn update_episode_status_with_details(
        &self,
        episode_id: Uuid,
        status: MediaStatus,
        active_download_id: Option<String>,
        status_message: Option<String>,
    ) -> Result<()> {
        let affected = sqlx::query(
            "UPDATE episodes SET status = $2, active_download_id = $3, status_message = $4 WHERE id = $1",
        )
        .bind(episode_id)
        .bind(status.to_string())
        .bind(active_download_id)
        .bind(status_message)
        .execute(&self.pool)
        .await?;

        if affected.rows_affected() == 0 {
            return Err(RadarrError::NotFound { resource: format!("episode {episode_id}") });
        }
        Ok(())
    }

    async fn create_queue_media(&self, media: &QueueMedia) -> Result<QueueMedia> {
        sqlx::query(
            "INSERT INTO queue_media
                (id, download_mapping_id, movie_id, episode_id, file_path, file_status,
                 error_message, import_attempts, target_slot_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(media.id)
        .bind(media.download_mapping_id)
        .bind(media.movie_id)
        .bind(media.episode_id)
        .bind(&media.file_path)
        .bind(file_status_str(media.file_status))
        .bind(&media.error_message)
        .bind(media.import_attempts)
        .bind(media.target_slot_id)
        .execute(&self.pool)
        .await?;
        Ok(media.clone())
    }

    async fn update_queue_media(&self, media: &QueueMedia) -> Result<QueueMedia> {
        let affected = sqlx::query(
            "UPDATE queue_media SET file_path = $2, file_status = $3, error_message = $4,
                import_attempts = $5, target_slot_id = $6
             WHERE id = $1",
        )
        .bind(media.id)
        .bind(&media.file_path)
        .bind(file_status_str(media.file_status))
        .bind(&media.error_message)
        .bind(media.import_attempts)
        .bind(media.target_slot_id)
        .execute(&self.pool)
        .await?;

        if affected.rows_affected() == 0 {
            return Err(RadarrError::NotFound { resource: format!("queue_media {}", media.id) });
        }
        Ok(media.clone())
    }

    async fn delete_queue_media(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM queue_media WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn list_queue_media_by_mapping(&self, mapping_id: Uuid) -> Result<Vec<QueueMedia>> {
        let rows = sqlx::query(
            "SELECT id, download_mapping_id, movie_id, episode_id, file_path, file_status,
                    error_message, import_attempts, target_slot_id
             FROM queue_media WHERE download_mapping_id = $1",
        )
        .bind(mapping_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_queue_media).collect()
    }
}

fn row_to_movie_media_item(row: PgRow) -> Result<MediaItem> {
    Ok(MediaItem {
        media_type: MediaType::Movie,
        media_id: row.try_get("id")?,
        imdb_id: row.try_get("imdb_id")?,
        tmdb_id: row.try_get("tmdb_id")?,
        tvdb_id: None,
        quality_profile_id: row.try_get("quality_profile_id")?,
        monitored: row.try_get("monitored")?,
        status: parse_status(&row.try_get::<String, _>("status")?),
        current_quality_id: row.try_get("current_quality_id")?,
        active_download_id: row.try_get("active_download_id")?,
        status_message: row.try_get("status_message")?,
        target_slot_id: row.try_get("target_slot_id")?,
        series_id: None,
        season_number: None,
        episode_number: None,
    })
}

fn row_to_episode_media_item(row: PgRow) -> Result<MediaItem> {
    Ok(MediaItem {
        media_type: MediaType::Episode,
        media_id: row.try_get("id")?,
        imdb_id: row.try_get("imdb_id")?,
        tmdb_id: row.try_get("tmdb_id")?,
        tvdb_id: None,
        quality_profile_id: row.try_get("quality_profile_id")?,
        monitored: row.try_get("monitored")?,
        status: parse_status(&row.try_get::<String, _>("status")?),
        current_quality_id: row.try_get("current_quality_id")?,
        active_download_id: row.try_get("active_download_id")?,
        status_message: row.try_get("status_message")?,
        target_slot_id: row.try_get("target_slot_id")?,
        series_id: row.try_get("series_id")?,
        season_number: row.try_get("season_number")?,
        episode_number: row.try_get("episode_number")?,
    })
}
