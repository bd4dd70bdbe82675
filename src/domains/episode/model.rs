use crate::common::{ReplayError, ReplayResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position or displacement in simulator space. Serialized as a plain
/// `[x, y, z]` array to match the episode file format.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Displacement that carries `prev` onto `self`.
    pub fn delta_from(&self, prev: &Vec3) -> Vec3 {
        Vec3::new(self.x - prev.x, self.y - prev.y, self.z - prev.z)
    }

    pub fn translated(&self, delta: &Vec3) -> Vec3 {
        Vec3::new(self.x + delta.x, self.y + delta.y, self.z + delta.z)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

/// Pose as the simulator reports it: position plus yaw in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub yaw: f64,
}

impl Pose {
    pub fn new(position: Vec3, yaw: f64) -> Self {
        Self { position, yaw }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSample {
    pub pos: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vel: Option<Vec3>,
    /// Roll/pitch/yaw in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpy: Option<Vec3>,
}

/// One timestamped snapshot of every tracked entity. Entity samples sit next
/// to `t` in the JSON object, keyed by entity name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub t: f64,
    #[serde(flatten)]
    pub agents: BTreeMap<String, AgentSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    #[serde(default)]
    pub episode: Option<u64>,
    #[serde(default = "default_coordinate_system")]
    pub coordinate_system: String,
    #[serde(default = "default_units", alias = "converted_units")]
    pub units: String,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub total_reward: Option<f64>,
}

fn default_coordinate_system() -> String {
    "NED".to_string()
}

fn default_units() -> String {
    "meters".to_string()
}

impl Default for EpisodeMetadata {
    fn default() -> Self {
        Self {
            episode: None,
            coordinate_system: default_coordinate_system(),
            units: default_units(),
            outcome: None,
            total_reward: None,
        }
    }
}

/// A full recorded run: metadata plus the ordered frame sequence. Immutable
/// once loaded; everything downstream works on references into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub metadata: EpisodeMetadata,
    pub frames: Vec<Frame>,
}

impl Episode {
    /// Enforces the structural invariants every consumer relies on: at least
    /// one frame, non-decreasing timestamps, and an identical entity set in
    /// every frame.
    pub fn validate(&self) -> ReplayResult<()> {
        if self.frames.is_empty() {
            return Err(ReplayError::Configuration {
                reason: "episode contains no frames".to_string(),
            });
        }

        let mut last_t = f64::NEG_INFINITY;
        for (index, frame) in self.frames.iter().enumerate() {
            if frame.t < last_t {
                return Err(ReplayError::Configuration {
                    reason: format!(
                        "frame {} timestamp {} precedes previous timestamp {}",
                        index, frame.t, last_t
                    ),
                });
            }
            last_t = frame.t;
        }

        let first_names: Vec<&String> = self.frames[0].agents.keys().collect();
        for (index, frame) in self.frames.iter().enumerate().skip(1) {
            let names: Vec<&String> = frame.agents.keys().collect();
            if names != first_names {
                return Err(ReplayError::Configuration {
                    reason: format!("frame {} tracks a different entity set than frame 0", index),
                });
            }
        }

        Ok(())
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.frames
            .first()
            .map(|frame| frame.agents.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn duration(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.t - first.t,
            _ => 0.0,
        }
    }
}
