use std::path::Path;
use std::sync::Arc;

use crate::common::ReplayResult;
use crate::domains::episode::{
    derive_transform, normalize_units, Episode, EpisodeSource, TransformConfig,
};

/// Operator overrides for the metadata-derived transform. `None` keeps the
/// derived value.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOverrides {
    pub scale: Option<f64>,
    pub invert_z: Option<bool>,
}

/// Loads an episode and produces the working copy in simulator-native
/// meters. Every consumer downstream of this sees normalized data only.
pub async fn load_normalized(
    source: &Arc<dyn EpisodeSource>,
    path: &Path,
) -> ReplayResult<Episode> {
    let episode = source.load(path).await?;
    normalize_units(&episode)
}

/// Transform for this run: derived from metadata, then overridden where the
/// operator asked for it.
pub fn resolve_transform(
    episode: &Episode,
    overrides: &TransformOverrides,
) -> ReplayResult<TransformConfig> {
    let derived = derive_transform(&episode.metadata)?;
    TransformConfig::new(
        overrides.scale.unwrap_or(derived.scale),
        overrides.invert_z.unwrap_or(derived.invert_z),
    )
}
