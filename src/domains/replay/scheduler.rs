use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use uuid::Uuid;

use crate::common::{ReplayError, ReplayResult};
use crate::domains::episode::{MotionClassification, Vec3};
use crate::domains::logger::DynLogger;

use super::paths::AgentPaths;
use super::ports::{DynSimulator, MotionHandle, Rgba};

/// Marker/trail duration treated as "persistent" by the simulator.
const PERSISTENT_SECS: f32 = 9999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Idle,
    Armed,
    Running,
    Draining,
    Done,
}

#[derive(Debug, Clone)]
pub struct VisualOptions {
    pub trail_thickness: f32,
    pub marker_size: f32,
    pub marker_duration_secs: f32,
    pub palette: Vec<Rgba>,
    pub stationary_color: Rgba,
}

impl Default for VisualOptions {
    fn default() -> Self {
        Self {
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
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackOptions {
    /// Pacing between ticks before the speed multiplier divides it.
    pub base_interval: Duration,
    pub speed_multiplier: f64,
    /// Velocity handed to every move command, meters per second.
    pub velocity: f64,
    /// Trails are redrawn every this many ticks.
    pub trail_refresh_ticks: usize,
    /// Pause between cancelling outstanding moves and issuing terminal
    /// commands.
    pub settle: Duration,
    /// Pause after terminal commands before the run is declared done.
    pub drain: Duration,
    pub show_trails: bool,
    pub show_markers: bool,
    pub visuals: VisualOptions,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(50),
            speed_multiplier: 1.0,
            velocity: 5.0,
            trail_refresh_ticks: 10,
            settle: Duration::from_millis(500),
            drain: Duration::from_secs(2),
            show_trails: true,
            show_markers: true,
            visuals: VisualOptions::default(),
        }
    }
}

/// Intended vs actual pose for one agent at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: usize,
    pub frame_index: usize,
    pub agent: String,
    pub intended: Vec3,
    pub actual: Option<Vec3>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackReport {
    pub run_id: String,
    pub state: PlaybackState,
    pub ticks_issued: usize,
    pub records: Vec<TickRecord>,
    pub failed_agents: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Drives one playback run: Idle -> Armed -> Running -> Draining -> Done.
///
/// Per tick, every enabled moving agent receives its move command before the
/// tick's sleep begins; commands for one agent always go out in recorded
/// order. The scheduler never blocks on a move completing - it keeps the
/// returned handle so the move can be cancelled at shutdown.
pub struct PlaybackScheduler {
    sim: DynSimulator,
    logger: DynLogger,
    options: PlaybackOptions,
    state: PlaybackState,
    pending: BTreeMap<String, MotionHandle>,
    disabled: BTreeSet<String>,
    trails_enabled: bool,
    markers_enabled: bool,
}

impl PlaybackScheduler {
    pub fn new(sim: DynSimulator, logger: DynLogger, options: PlaybackOptions) -> Self {
        Self {
            sim,
            logger,
            options,
            state: PlaybackState::Idle,
            pending: BTreeMap::new(),
            disabled: BTreeSet::new(),
            trails_enabled: true,
            markers_enabled: true,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Plays the prepared paths over the resolved frame span and returns the
    /// execution report. One tick is issued per in-range frame.
    pub async fn run(
        &mut self,
        paths: &BTreeMap<String, AgentPaths>,
        span: Range<usize>,
    ) -> ReplayResult<PlaybackReport> {
        if !(self.options.speed_multiplier.is_finite() && self.options.speed_multiplier > 0.0) {
            return Err(ReplayError::Configuration {
                reason: format!(
                    "speed multiplier must be positive, got {}",
                    self.options.speed_multiplier
                ),
            });
        }

        let tick_count = span.len();
        let colors = assign_colors(paths, &self.options.visuals);

        // Absolute per-tick targets for every moving agent.
        let mut waypoints: BTreeMap<&str, Vec<Vec3>> = BTreeMap::new();
        for (name, agent_paths) in paths {
            if let Some(command) = &agent_paths.command {
                let points = command.waypoints();
                if points.len() != tick_count {
                    return Err(ReplayError::Configuration {
                        reason: format!(
                            "agent {} has {} command waypoints for {} ticks",
                            name,
                            points.len(),
                            tick_count
                        ),
                    });
                }
                waypoints.insert(name.as_str(), points);
            }
        }

        self.state = PlaybackState::Armed;
        self.logger.info(&format!(
            "armed: {} agents ({} moving), frames {}..{}",
            paths.len(),
            waypoints.len(),
            span.start,
            span.end
        ));

        self.draw_initial_artifacts(paths, &colors).await;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let mut records = Vec::new();
        let mut ticks_issued = 0usize;

        self.state = PlaybackState::Running;
        let interval = Duration::from_secs_f64(
            self.options.base_interval.as_secs_f64() / self.options.speed_multiplier,
        );

        for (tick, frame_index) in span.clone().enumerate() {
            // Command phase: every enabled agent gets its target for this
            // tick before anyone sleeps.
            let mut intended: Vec<(String, Vec3)> = Vec::new();
            for (name, points) in &waypoints {
                if self.disabled.contains(*name) {
                    continue;
                }
                let target = points[tick];
                match self
                    .sim
                    .move_toward(name, target, self.options.velocity)
                    .await
                {
                    Ok(handle) => {
                        self.pending.insert(name.to_string(), handle);
                        intended.push((name.to_string(), target));
                    }
                    Err(err) => {
                        self.disabled.insert(name.to_string());
                        self.logger.error(&format!(
                            "tick {}: agent {} disabled after rejected command: {}",
                            tick, name, err
                        ));
                    }
                }
            }
            ticks_issued += 1;

            if !waypoints.is_empty() && self.disabled.len() == waypoints.len() {
                self.logger
                    .warn("all moving agents unavailable, stopping playback early");
                break;
            }

            sleep(interval).await;

            // Poll phase: log where each agent actually is against where it
            // was told to go.
            let timestamp = Utc::now();
            for (name, target) in &intended {
                let actual = match self.sim.current_pose(name).await {
                    Ok(pose) => Some(pose.position),
                    Err(err) => {
                        self.logger
                            .warn(&format!("tick {}: pose poll failed for {}: {}", tick, name, err));
                        None
                    }
                };
                records.push(TickRecord {
                    tick,
                    frame_index,
                    agent: name.clone(),
                    intended: *target,
                    actual,
                    timestamp,
                });
            }

            self.refresh_markers(&intended, &colors).await;
            if (tick + 1) % self.options.trail_refresh_ticks.max(1) == 0 {
                self.refresh_trails(paths, &colors).await;
                self.logger
                    .info(&format!("tick {}/{}", tick + 1, tick_count));
            }
        }

        self.shutdown(paths).await;

        let report = PlaybackReport {
            run_id,
            state: self.state,
            ticks_issued,
            records,
            failed_agents: self.disabled.iter().cloned().collect(),
            started_at,
            finished_at: Utc::now(),
        };
        self.logger.info(&format!(
            "playback done: {} ticks, {} failed agents",
            report.ticks_issued,
            report.failed_agents.len()
        ));
        Ok(report)
    }

    /// Cancel every outstanding move, let the agents settle, then issue the
    /// terminal maneuver for everyone that flew. Skipping the cancel step
    /// would leave any agent with a pending move drifting after the run.
    async fn shutdown(&mut self, paths: &BTreeMap<String, AgentPaths>) {
        self.state = PlaybackState::Draining;
        self.logger.info("draining: cancelling outstanding moves");

        let pending = std::mem::take(&mut self.pending);
        for (name, handle) in &pending {
            if let Err(err) = self.sim.cancel(handle).await {
                self.logger
                    .warn(&format!("cancel failed for {}: {}", name, err));
            }
        }
        sleep(self.options.settle).await;

        for (name, agent_paths) in paths {
            if agent_paths.command.is_none() {
                continue;
            }
            if let Err(err) = self.sim.land_or_stop(name).await {
                self.logger
                    .warn(&format!("terminal command failed for {}: {}", name, err));
            }
        }
        sleep(self.options.drain).await;

        self.state = PlaybackState::Done;
    }

    /// Persistent start markers and, when enabled, the initial trails.
    /// Stationary entities get their single held marker here and are not
    /// touched again.
    async fn draw_initial_artifacts(
        &mut self,
        paths: &BTreeMap<String, AgentPaths>,
        colors: &BTreeMap<String, Rgba>,
    ) {
        if !self.options.show_markers {
            self.markers_enabled = false;
        }
        if !self.options.show_trails {
            self.trails_enabled = false;
        }

        if self.markers_enabled {
            for (name, agent_paths) in paths {
                let color = match agent_paths.classification {
                    MotionClassification::Stationary => self.options.visuals.stationary_color,
                    MotionClassification::Moving => colors[name],
                };
                let start = [agent_paths.display.points[0]];
                let result = self
                    .sim
                    .draw_points(
                        &start,
                        color,
                        self.options.visuals.marker_size,
                        PERSISTENT_SECS,
                    )
                    .await;
                if self.degrade_markers_on_error(name, result) {
                    break;
                }
            }
        }

        if self.trails_enabled {
            self.refresh_trails(paths, colors).await;
        }
    }

    async fn refresh_markers(&mut self, intended: &[(String, Vec3)], colors: &BTreeMap<String, Rgba>) {
        if !self.markers_enabled {
            return;
        }
        for (name, target) in intended {
            let result = self
                .sim
                .draw_points(
                    &[*target],
                    colors[name],
                    self.options.visuals.marker_size,
                    self.options.visuals.marker_duration_secs,
                )
                .await;
            if self.degrade_markers_on_error(name, result) {
                break;
            }
        }
    }

    async fn refresh_trails(
        &mut self,
        paths: &BTreeMap<String, AgentPaths>,
        colors: &BTreeMap<String, Rgba>,
    ) {
        if !self.trails_enabled {
            return;
        }
        for (name, agent_paths) in paths {
            if agent_paths.command.is_none() || agent_paths.display.points.len() < 2 {
                continue;
            }
            let result = self
                .sim
                .draw_path(
                    &agent_paths.display.points,
                    colors[name],
                    self.options.visuals.trail_thickness,
                )
                .await;
            match result {
                Ok(()) => {}
                Err(ReplayError::VisualizationUnsupported { primitive }) => {
                    self.trails_enabled = false;
                    self.logger.warn(&format!(
                        "trails disabled for this run: {} not supported",
                        primitive
                    ));
                    break;
                }
                Err(err) => {
                    self.logger
                        .warn(&format!("trail drawing failed for {}: {}", name, err));
                }
            }
        }
    }

    /// Returns true when marker drawing was just disabled for the run.
    fn degrade_markers_on_error(&mut self, agent: &str, result: ReplayResult<()>) -> bool {
        match result {
            Ok(()) => false,
            Err(ReplayError::VisualizationUnsupported { primitive }) => {
                self.markers_enabled = false;
                self.logger.warn(&format!(
                    "markers disabled for this run: {} not supported",
                    primitive
                ));
                true
            }
            Err(err) => {
                self.logger
                    .warn(&format!("marker drawing failed for {}: {}", agent, err));
                false
            }
        }
    }
}

fn assign_colors(
    paths: &BTreeMap<String, AgentPaths>,
    visuals: &VisualOptions,
) -> BTreeMap<String, Rgba> {
    paths
        .keys()
        .enumerate()
        .map(|(index, name)| {
            let color = if visuals.palette.is_empty() {
                [1.0, 1.0, 1.0, 1.0]
            } else {
                visuals.palette[index % visuals.palette.len()]
            };
            (name.clone(), color)
        })
        .collect()
}
