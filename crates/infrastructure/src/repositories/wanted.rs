//! `PostgresAcquisitionRepository` and its `WantedRepository` impl (§4.1).
//!
//! `PostgresAcquisitionRepository` is the single concrete type backing
//! `crates/sync::SyncRepo` (`WantedRepository + DownloadClientRepository
//! + IndexerRssRepository + GrabHistoryRepository`); the other three
//! trait impls live in `download_client.rs`/`indexer_rss.rs`/
//! `grab_history.rs` as separate `impl ... for PostgresAcquisitionRepository`
//! blocks over the same struct, so each concern still gets its own file
//! the way the teacher splits one repository per file.
//!
//! Grounded in `repositories/download.rs`'s raw `sqlx::query` +
//! `row.try_get` idiom rather than `query_as!`, since the projected
//! `SearchableItem`/`EpisodeRow` shapes don't map 1:1 onto any single
//! table row.

use async_trait::async_trait;
use radarr_core::domain::repositories::{EpisodeRow, SeasonRow, WantedRepository};
use radarr_core::models::{MediaStatus, MediaType, SearchableItem};
use radarr_core::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::database::DatabasePool;

pub struct PostgresAcquisitionRepository {
    pub(crate) pool: DatabasePool,
}

impl PostgresAcquisitionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
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

fn row_to_movie_item(row: PgRow, has_file: bool) -> Result<SearchableItem> {
    Ok(SearchableItem {
        media_type: MediaType::Movie,
        media_id: row.try_get("id")?,
        title: row.try_get("title")?,
        year: row.try_get("year")?,
        imdb_id: row.try_get("imdb_id")?,
        tmdb_id: row.try_get("tmdb_id")?,
        tvdb_id: None,
        series_id: None,
        season_number: None,
        episode_number: None,
        quality_profile_id: row.try_get("quality_profile_id")?,
        has_file,
        current_quality_id: row.try_get("current_quality_id")?,
        target_slot_id: row.try_get("target_slot_id")?,
    })
}

fn row_to_episode(row: PgRow) -> Result<EpisodeRow> {
    Ok(EpisodeRow {
        episode_id: row.try_get("id")?,
        series_id: row.try_get("series_id")?,
        season_number: row.try_get("season_number")?,
        episode_number: row.try_get("episode_number")?,
        title: row.try_get("title")?,
        year: row.try_get("year")?,
        imdb_id: row.try_get("imdb_id")?,
        tmdb_id: row.try_get("tmdb_id")?,
        tvdb_id: row.try_get("tvdb_id")?,
        quality_profile_id: row.try_get("quality_profile_id")?,
        monitored: row.try_get("monitored")?,
        status: parse_status(&row.try_get::<String, _>("status")?),
        has_file: row.try_get("has_file")?,
        current_quality_id: row.try_get("current_quality_id")?,
        target_slot_id: row.try_get("target_slot_id")?,
    })
}

const EPISODE_COLUMNS: &str = "id, series_id, season_number, episode_number, title, year,
     imdb_id, tmdb_id, tvdb_id, quality_profile_id, monitored, status,
     has_file, current_quality_id, target_slot_id";

#[async_trait]
impl WantedRepository for PostgresAcquisitionRepository {
    async fn list_missing_movies(&self) -> Result<Vec<SearchableItem>> {
        let rows = sqlx::query(
            "SELECT id, title, year, imdb_id, tmdb_id, quality_profile_id, current_quality_id, target_slot_id
             FROM movies
             WHERE monitored = true AND status = 'missing'",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| row_to_movie_item(row, false)).collect()
    }

    async fn list_movie_upgrade_candidates(&self) -> Result<Vec<SearchableItem>> {
        let rows = sqlx::query(
            "SELECT id, title, year, imdb_id, tmdb_id, quality_profile_id, current_quality_id, target_slot_id
             FROM movies
             WHERE monitored = true AND status = 'upgradable' AND has_file = true",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| row_to_movie_item(row, true)).collect()
    }

    async fn list_missing_episodes(&self) -> Result<Vec<EpisodeRow>> {
        let query = format!("SELECT {EPISODE_COLUMNS} FROM episodes WHERE monitored = true AND status = 'missing'");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_episode).collect()
    }

    async fn list_episode_upgrade_candidates(&self) -> Result<Vec<EpisodeRow>> {
        let query =
            format!("SELECT {EPISODE_COLUMNS} FROM episodes WHERE monitored = true AND status = 'upgradable' AND has_file = true");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_episode).collect()
    }

    async fn get_season_by_number(&self, series_id: Uuid, season_number: i32) -> Result<Option<SeasonRow>> {
        let row = sqlx::query("SELECT series_id, season_number, monitored FROM seasons WHERE series_id = $1 AND season_number = $2")
            .bind(series_id)
            .bind(season_number)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| {
            Ok(SeasonRow {
                series_id: r.try_get("series_id")?,
                season_number: r.try_get("season_number")?,
                monitored: r.try_get("monitored")?,
            })
        })
        .transpose()
    }

    async fn list_episodes_by_season(&self, series_id: Uuid, season_number: i32) -> Result<Vec<EpisodeRow>> {
        let query = format!("SELECT {EPISODE_COLUMNS} FROM episodes WHERE series_id = $1 AND season_number = $2");
        let rows = sqlx::query(&query).bind(series_id).bind(season_number).fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_episode).collect()
    }
}
