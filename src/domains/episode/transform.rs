use crate::common::{ReplayError, ReplayResult};
use serde::{Deserialize, Serialize};

use super::model::Vec3;

/// Scale and vertical-axis settings for one playback run. Derived once from
/// episode metadata (or overridden by the operator) and never mutated while
/// a run is in flight.
///
/// The scale here is a presentation/command scale only. Unit normalization
/// (e.g. centimeters to meters) happens once in the classifier, before any
/// transform is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub scale: f64,
    pub invert_z: bool,
}

impl TransformConfig {
    pub fn new(scale: f64, invert_z: bool) -> ReplayResult<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ReplayError::Configuration {
                reason: format!("scale factor must be positive, got {}", scale),
            });
        }
        Ok(Self { scale, invert_z })
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            invert_z: false,
        }
    }
}

/// Which of the two path representations a point is being transformed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantics {
    /// Motion commands sent to the simulator: all axes scaled, vertical axis
    /// negated when the recorded convention points up-positive.
    Command,
    /// Trails and markers: horizontal axes scaled, vertical axis passed
    /// through untouched so drawn geometry stays at the recorded altitude.
    Display,
}

pub fn transform_position(pos: &Vec3, config: &TransformConfig, semantics: Semantics) -> Vec3 {
    match semantics {
        Semantics::Command => {
            let z = pos.z * config.scale;
            Vec3::new(
                pos.x * config.scale,
                pos.y * config.scale,
                if config.invert_z { -z } else { z },
            )
        }
        Semantics::Display => Vec3::new(pos.x * config.scale, pos.y * config.scale, pos.z),
    }
}
