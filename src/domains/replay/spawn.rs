use std::collections::BTreeMap;

use crate::common::ReplayResult;
use crate::domains::episode::{transform_position, Episode, Pose, Semantics, TransformConfig};

/// Transformed initial pose for every tracked entity, taken from the first
/// frame under command semantics. The result is handed to the spawn-config
/// writer before the simulator process starts; the core never persists
/// configuration itself.
pub fn project_spawn_poses(
    episode: &Episode,
    config: &TransformConfig,
) -> ReplayResult<BTreeMap<String, Pose>> {
    episode.validate()?;

    let first = &episode.frames[0];
    let mut poses = BTreeMap::new();
    for (name, sample) in &first.agents {
        let position = transform_position(&sample.pos, config, Semantics::Command);
        let yaw = sample.rpy.map(|rpy| rpy.z).unwrap_or(0.0);
        poses.insert(name.clone(), Pose::new(position, yaw));
    }
    Ok(poses)
}
