use std::collections::BTreeMap;
use std::ops::Range;

use crate::common::{ReplayError, ReplayResult};
use crate::domains::episode::{
    transform_position, Episode, MotionClassification, Pose, Semantics, TransformConfig, Vec3,
};
use serde::{Deserialize, Serialize};

/// Half-open slice of the episode's frame indices. `end = None` means "to
/// the last frame".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl FrameRange {
    pub fn full() -> Self {
        Self {
            start: 0,
            end: None,
        }
    }

    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Clamps the range to the actual frame count and rejects empty spans.
    pub fn resolve(&self, frame_count: usize) -> ReplayResult<Range<usize>> {
        let end = self.end.unwrap_or(frame_count).min(frame_count);
        if self.start >= end {
            return Err(ReplayError::Configuration {
                reason: format!(
                    "frame range {}..{} selects no frames (episode has {})",
                    self.start, end, frame_count
                ),
            });
        }
        Ok(self.start..end)
    }
}

impl Default for FrameRange {
    fn default() -> Self {
        Self::full()
    }
}

/// Motion instructions for one agent: relative displacements anchored at the
/// spawn pose the simulator actually reported, command semantics on all
/// three axes. The recorded shape of motion is reproduced at the chosen
/// scale regardless of any offset between recorded and true spawn location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPath {
    pub anchor: Vec3,
    pub deltas: Vec<Vec3>,
}

impl CommandPath {
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Absolute targets: the prefix sum of the deltas. The first waypoint is
    /// exactly the anchor, so index i is where the agent should sit at the
    /// i-th in-range frame.
    pub fn waypoints(&self) -> Vec<Vec3> {
        let mut points = Vec::with_capacity(self.deltas.len() + 1);
        points.push(self.anchor);
        let mut current = self.anchor;
        for delta in &self.deltas {
            current = current.translated(delta);
            points.push(current);
        }
        points
    }
}

/// Absolute positions used for trails and markers, display semantics
/// (vertical axis never scaled or inverted). Not anchored to the spawn
/// pose: when spawn offset is non-trivial the drawn geometry and the flown
/// path diverge, and that divergence is an accepted property of the design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayPath {
    pub points: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPaths {
    pub classification: MotionClassification,
    pub command: Option<CommandPath>,
    pub display: DisplayPath,
}

/// Builds both path representations for every classified entity in one pass
/// over one frame slice, so the two can never be derived from different
/// frame sequences or scales.
pub fn build_paths(
    episode: &Episode,
    config: &TransformConfig,
    classifications: &BTreeMap<String, MotionClassification>,
    spawn_poses: &BTreeMap<String, Pose>,
    range: &FrameRange,
) -> ReplayResult<BTreeMap<String, AgentPaths>> {
    let span = range.resolve(episode.frame_count())?;
    let frames = &episode.frames[span];

    let mut paths = BTreeMap::new();
    for (name, classification) in classifications {
        let mut command_points = Vec::with_capacity(frames.len());
        let mut display_points = Vec::with_capacity(frames.len());
        for frame in frames {
            let sample = frame.agents.get(name).ok_or_else(|| {
                ReplayError::Configuration {
                    reason: format!("entity {} missing from frame in selected range", name),
                }
            })?;
            command_points.push(transform_position(&sample.pos, config, Semantics::Command));
            display_points.push(transform_position(&sample.pos, config, Semantics::Display));
        }

        let (command, display) = match classification {
            MotionClassification::Moving => {
                let spawn = spawn_poses.get(name).ok_or_else(|| {
                    ReplayError::Configuration {
                        reason: format!("no spawn pose reported for moving agent {}", name),
                    }
                })?;
                let deltas = command_points
                    .windows(2)
                    .map(|pair| pair[1].delta_from(&pair[0]))
                    .collect();
                (
                    Some(CommandPath {
                        anchor: spawn.position,
                        deltas,
                    }),
                    DisplayPath {
                        points: display_points,
                    },
                )
            }
            MotionClassification::Stationary => (
                None,
                DisplayPath {
                    points: vec![display_points[0]],
                },
            ),
        };

        paths.insert(
            name.clone(),
            AgentPaths {
                classification: *classification,
                command,
                display,
            },
        );
    }

    Ok(paths)
}
