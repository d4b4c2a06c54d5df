//! Quality-profile lookup by id (§4.6 step 1).
//!
//! `radarr_decision::quality::QualityProfile` is decision-crate-owned, so
//! this trait lives here rather than on `radarr_core`'s repository module
//! (which cannot depend on `radarr_decision`).

use async_trait::async_trait;
use radarr_core::Result;
use radarr_decision::quality::QualityProfile;
use uuid::Uuid;

#[async_trait]
pub trait QualityProfileStore: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> Result<QualityProfile>;
}
