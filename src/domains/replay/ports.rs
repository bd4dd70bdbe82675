use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::common::ReplayResult;
use crate::domains::episode::{Pose, Vec3};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// RGBA color in the 0.0..=1.0 range, the form the simulator's drawing API
/// accepts directly.
pub type Rgba = [f32; 4];

/// Handle to an in-flight asynchronous motion command. Kept per agent so the
/// scheduler can cancel the last issued operation before changing what kind
/// of command it sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionHandle {
    pub agent: String,
    pub id: u64,
}

/// Capability port for the external simulator. One implementation speaks to
/// the real process over the wire; an in-memory stub backs tests and dry
/// runs. The scheduler is the sole caller, so implementations may assume
/// command issuance and pose polling for one agent never interleave.
#[async_trait]
pub trait SimulatorClient: Send + Sync {
    /// True current pose of an entity after spawn, as opposed to whatever
    /// the recorded first sample claims.
    async fn spawn_pose(&self, agent: &str) -> ReplayResult<Pose>;

    /// Non-blocking "fly toward this point at this velocity". Returns a
    /// cancellable handle; the move continues after this call returns.
    async fn move_toward(&self, agent: &str, target: Vec3, velocity: f64)
        -> ReplayResult<MotionHandle>;

    /// Best-effort cancellation of an in-flight move.
    async fn cancel(&self, handle: &MotionHandle) -> ReplayResult<()>;

    async fn current_pose(&self, agent: &str) -> ReplayResult<Pose>;

    /// Terminal maneuver (land for aerial agents, stop otherwise).
    async fn land_or_stop(&self, agent: &str) -> ReplayResult<MotionHandle>;

    /// Best-effort marker drawing. Implementations surface missing support
    /// as `ReplayError::VisualizationUnsupported`; callers degrade instead
    /// of aborting.
    async fn draw_points(
        &self,
        points: &[Vec3],
        color: Rgba,
        size: f32,
        duration_secs: f32,
    ) -> ReplayResult<()>;

    /// Best-effort trail drawing, same degradation contract as
    /// `draw_points`.
    async fn draw_path(&self, points: &[Vec3], color: Rgba, thickness: f32) -> ReplayResult<()>;
}

pub type DynSimulator = Arc<dyn SimulatorClient>;

/// Port for persisting projected spawn poses to whatever configuration store
/// the simulator reads at startup. The act of writing is outside the replay
/// core; the poses are the payload.
#[async_trait]
pub trait SpawnConfigSink: Send + Sync {
    async fn write_spawn_poses(
        &self,
        path: &Path,
        poses: &BTreeMap<String, Pose>,
    ) -> ReplayResult<()>;
}
