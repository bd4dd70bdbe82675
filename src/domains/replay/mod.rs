pub mod paths;
pub mod ports;
pub mod scheduler;
pub mod spawn;

pub use paths::{build_paths, AgentPaths, CommandPath, DisplayPath, FrameRange};
pub use ports::{DynSimulator, MotionHandle, Rgba, SimulatorClient, SpawnConfigSink};
pub use scheduler::{
    PlaybackOptions, PlaybackReport, PlaybackScheduler, PlaybackState, TickRecord, VisualOptions,
};
pub use spawn::project_spawn_poses;
