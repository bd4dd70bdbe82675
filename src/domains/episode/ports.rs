use crate::common::ReplayResult;
use async_trait::async_trait;
use std::path::Path;

use super::model::Episode;

/// Port trait the episode domain depends on for obtaining recorded runs.
/// Adapters provide filesystem- or network-backed sources; the domain only
/// sees a validated Episode.
#[async_trait]
pub trait EpisodeSource: Send + Sync {
    async fn load(&self, path: &Path) -> ReplayResult<Episode>;
}
