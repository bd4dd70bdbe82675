use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::common::ApplicationResult;
use crate::config::Config;
use crate::domains::episode::{EpisodeSource, Pose};
use crate::domains::logger::DynLogger;
use crate::domains::replay::{project_spawn_poses, SpawnConfigSink};

use super::prep::{load_normalized, resolve_transform, TransformOverrides};

/// Projects transformed initial poses out of an episode and hands them to
/// the configuration writer. Runs before the simulator process starts, so it
/// never touches the simulator connection.
pub struct SpawnConfigService {
    config: Config,
    episodes: Arc<dyn EpisodeSource>,
    sink: Arc<dyn SpawnConfigSink>,
    logger: DynLogger,
}

impl SpawnConfigService {
    pub fn new(
        config: Config,
        episodes: Arc<dyn EpisodeSource>,
        sink: Arc<dyn SpawnConfigSink>,
        logger: DynLogger,
    ) -> Self {
        Self {
            config,
            episodes,
            sink,
            logger,
        }
    }

    pub async fn project_and_write(
        &self,
        episode_path: &Path,
        overrides: &TransformOverrides,
        settings_path: Option<&Path>,
    ) -> ApplicationResult<BTreeMap<String, Pose>> {
        let episode = load_normalized(&self.episodes, episode_path).await?;
        let transform = resolve_transform(&episode, overrides)?;
        let poses = project_spawn_poses(&episode, &transform)?;

        let default_path = PathBuf::from(&self.config.simulator.settings_path);
        let target = settings_path.unwrap_or(default_path.as_path());
        self.sink.write_spawn_poses(target, &poses).await?;

        self.logger.info(&format!(
            "wrote spawn poses for {} entities to {} (restart the simulator to apply)",
            poses.len(),
            target.display()
        ));
        Ok(poses)
    }
}
