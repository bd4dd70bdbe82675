pub mod classifier;
pub mod model;
pub mod ports;
pub mod transform;

pub use classifier::{
    classify, derive_transform, normalize_units, unit_factor, MotionClassification,
    DEFAULT_MOTION_THRESHOLD,
};
pub use model::{AgentSample, Episode, EpisodeMetadata, Frame, Pose, Vec3};
pub use ports::EpisodeSource;
pub use transform::{transform_position, Semantics, TransformConfig};
