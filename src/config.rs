use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domains::episode::DEFAULT_MOTION_THRESHOLD;
use crate::domains::replay::{PlaybackOptions, VisualOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub simulator: SimulatorConfig,
    pub playback: PlaybackConfig,
    pub visuals: VisualConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub host: String,
    pub port: u16,
    /// Settings file the simulator reads at startup; spawn poses are merged
    /// into it before launch.
    pub settings_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub base_interval_ms: u64,
    pub default_speed: f64,
    /// Base move velocity in m/s, multiplied by the transform scale so the
    /// apparent speed stays constant when paths are blown up or compressed.
    pub velocity: f64,
    pub trail_refresh_ticks: usize,
    pub settle_ms: u64,
    pub drain_ms: u64,
    pub motion_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualConfig {
    pub show_trails: bool,
    pub show_markers: bool,
    pub trail_thickness: f32,
    pub marker_size: f32,
    pub marker_duration_secs: f32,
    pub palette: Vec<[f32; 4]>,
    pub stationary_color: [f32; 4],
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Scheduler options with the configured defaults; callers override the
    /// run-specific knobs (speed, velocity scaling, show flags) on top.
    pub fn playback_options(&self) -> PlaybackOptions {
        PlaybackOptions {
            base_interval: Duration::from_millis(self.playback.base_interval_ms),
            speed_multiplier: self.playback.default_speed,
            velocity: self.playback.velocity,
            trail_refresh_ticks: self.playback.trail_refresh_ticks,
            settle: Duration::from_millis(self.playback.settle_ms),
            drain: Duration::from_millis(self.playback.drain_ms),
            show_trails: self.visuals.show_trails,
            show_markers: self.visuals.show_markers,
            visuals: VisualOptions {
                trail_thickness: self.visuals.trail_thickness,
                marker_size: self.visuals.marker_size,
                marker_duration_secs: self.visuals.marker_duration_secs,
                palette: self.visuals.palette.clone(),
                stationary_color: self.visuals.stationary_color,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig {
                host: "127.0.0.1".to_string(),
                port: 41451,
                settings_path: "settings.json".to_string(),
            },
            playback: PlaybackConfig {
                base_interval_ms: 50,
                default_speed: 1.0,
                velocity: 5.0,
                trail_refresh_ticks: 10,
                settle_ms: 500,
                drain_ms: 2000,
                motion_threshold: DEFAULT_MOTION_THRESHOLD,
            },
            visuals: VisualConfig {
                show_trails: true,
                show_markers: true,
                trail_thickness: 5.0,
                marker_size: 25.0,
                marker_duration_secs: 0.5,
                palette: vec![
                    [0.0, 1.0, 0.0, 1.0],
                    [1.0, 0.0, 0.0, 1.0],
                    [1.0, 1.0, 0.0, 1.0],
                    [1.0, 0.0, 1.0, 1.0],
                ],
                stationary_color: [0.0, 1.0, 1.0, 1.0],
            },
        }
    }
}
