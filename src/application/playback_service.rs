use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::common::ApplicationResult;
use crate::config::Config;
use crate::domains::episode::{classify, EpisodeSource, MotionClassification};
use crate::domains::logger::DynLogger;
use crate::domains::replay::{
    build_paths, DynSimulator, FrameRange, PlaybackReport, PlaybackScheduler,
};

use super::prep::{load_normalized, resolve_transform, TransformOverrides};

#[derive(Debug, Clone)]
pub struct ReplayRequest {
    pub episode_path: PathBuf,
    pub overrides: TransformOverrides,
    /// `None` keeps the configured default speed.
    pub speed: Option<f64>,
    pub range: FrameRange,
    pub show_trails: Option<bool>,
    pub show_markers: Option<bool>,
}

/// Orchestrates one playback run: load and normalize the episode, classify
/// entities, query true spawn poses, build the dual paths, then hand
/// everything to the scheduler.
pub struct PlaybackService {
    config: Config,
    episodes: Arc<dyn EpisodeSource>,
    sim: DynSimulator,
    logger: DynLogger,
}

impl PlaybackService {
    pub fn new(
        config: Config,
        episodes: Arc<dyn EpisodeSource>,
        sim: DynSimulator,
        logger: DynLogger,
    ) -> Self {
        Self {
            config,
            episodes,
            sim,
            logger,
        }
    }

    pub async fn replay(&self, request: &ReplayRequest) -> ApplicationResult<PlaybackReport> {
        let episode = load_normalized(&self.episodes, &request.episode_path).await?;
        let transform = resolve_transform(&episode, &request.overrides)?;
        let classifications = classify(&episode, self.config.playback.motion_threshold);

        let moving = classifications
            .values()
            .filter(|class| **class == MotionClassification::Moving)
            .count();
        self.logger.info(&format!(
            "episode loaded: {} frames, {} entities ({} moving), scale {}x, invert_z {}",
            episode.frame_count(),
            classifications.len(),
            moving,
            transform.scale,
            transform.invert_z
        ));

        // True post-spawn poses, queried before any path exists. A failure
        // here is a connection-level problem and aborts the run.
        let mut spawn_poses = BTreeMap::new();
        for (name, class) in &classifications {
            if *class == MotionClassification::Moving {
                let pose = self.sim.spawn_pose(name).await?;
                self.logger.info(&format!(
                    "agent {} spawned at ({:.3}, {:.3}, {:.3})",
                    name, pose.position.x, pose.position.y, pose.position.z
                ));
                spawn_poses.insert(name.clone(), pose);
            }
        }

        let paths = build_paths(
            &episode,
            &transform,
            &classifications,
            &spawn_poses,
            &request.range,
        )?;
        let span = request.range.resolve(episode.frame_count())?;

        let mut options = self.config.playback_options();
        if let Some(speed) = request.speed {
            options.speed_multiplier = speed;
        }
        // Velocity follows the scale so the flight takes the same wall-clock
        // time regardless of how far the path is stretched.
        options.velocity = self.config.playback.velocity * transform.scale;
        if let Some(show) = request.show_trails {
            options.show_trails = show;
        }
        if let Some(show) = request.show_markers {
            options.show_markers = show;
        }

        let mut scheduler = PlaybackScheduler::new(self.sim.clone(), self.logger.clone(), options);
        let report = scheduler.run(&paths, span).await?;
        Ok(report)
    }

    pub async fn save_report(&self, report: &PlaybackReport, path: &Path) -> ApplicationResult<()> {
        let json = serde_json::to_string_pretty(report).map_err(crate::common::ReplayError::from)?;
        tokio::fs::write(path, json).await?;
        self.logger
            .info(&format!("playback report saved to {}", path.display()));
        Ok(())
    }
}
