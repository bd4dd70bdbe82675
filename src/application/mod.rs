pub mod playback_service;
pub mod prep;
pub mod spawn_service;

pub use playback_service::{PlaybackService, ReplayRequest};
pub use prep::TransformOverrides;
pub use spawn_service::SpawnConfigService;
