use std::collections::BTreeMap;

use crate::common::{ReplayError, ReplayResult};
use serde::{Deserialize, Serialize};

use super::model::{Episode, EpisodeMetadata};
use super::transform::TransformConfig;

/// Default displacement (meters) an entity must exceed, relative to its
/// first sample, to count as moving.
pub const DEFAULT_MOTION_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionClassification {
    Stationary,
    Moving,
}

/// Classifies every tracked entity by comparing the maximum Euclidean
/// distance from its first-frame position against `threshold`. Single-frame
/// episodes classify everything Stationary.
pub fn classify(episode: &Episode, threshold: f64) -> BTreeMap<String, MotionClassification> {
    let mut classes = BTreeMap::new();
    let Some(first) = episode.frames.first() else {
        return classes;
    };

    for (name, sample) in &first.agents {
        let origin = sample.pos;
        let moving = episode.frames[1..].iter().any(|frame| {
            frame
                .agents
                .get(name)
                .map(|later| later.pos.distance_to(&origin) > threshold)
                .unwrap_or(false)
        });
        let class = if moving {
            MotionClassification::Moving
        } else {
            MotionClassification::Stationary
        };
        classes.insert(name.clone(), class);
    }

    classes
}

/// Derives the default transform from episode metadata: no inversion when the
/// recorded convention already points down-positive like the simulator's
/// native NED frame, inversion otherwise. Scale always starts at 1.0.
pub fn derive_transform(metadata: &EpisodeMetadata) -> ReplayResult<TransformConfig> {
    let convention = metadata.coordinate_system.trim();
    if convention.is_empty() {
        return Err(ReplayError::Configuration {
            reason: "episode metadata declares no coordinate system".to_string(),
        });
    }
    let invert_z = !convention.eq_ignore_ascii_case("NED");
    TransformConfig::new(1.0, invert_z)
}

/// Multiplier that carries the recorded unit into meters.
pub fn unit_factor(units: &str) -> ReplayResult<f64> {
    match units.trim().to_ascii_lowercase().as_str() {
        "m" | "meter" | "meters" => Ok(1.0),
        "cm" | "centimeter" | "centimeters" => Ok(0.01),
        "mm" | "millimeter" | "millimeters" => Ok(0.001),
        other => Err(ReplayError::Configuration {
            reason: format!("unknown unit string in episode metadata: {:?}", other),
        }),
    }
}

/// Produces a working copy of the episode in simulator-native meters. Applied
/// exactly once, before classification and path building; the user-facing
/// scale factor is a separate concern and is never folded in here.
pub fn normalize_units(episode: &Episode) -> ReplayResult<Episode> {
    let factor = unit_factor(&episode.metadata.units)?;
    if factor == 1.0 {
        return Ok(episode.clone());
    }

    let mut normalized = episode.clone();
    for frame in &mut normalized.frames {
        for sample in frame.agents.values_mut() {
            sample.pos.x *= factor;
            sample.pos.y *= factor;
            sample.pos.z *= factor;
            if let Some(vel) = sample.vel.as_mut() {
                vel.x *= factor;
                vel.y *= factor;
                vel.z *= factor;
            }
        }
    }
    normalized.metadata.units = "meters".to_string();
    Ok(normalized)
}
