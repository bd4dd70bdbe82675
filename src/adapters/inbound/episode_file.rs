use crate::common::{ReplayError, ReplayResult};
use crate::domains::episode::{Episode, EpisodeSource};
use async_trait::async_trait;
use std::path::Path;

/// File-based EpisodeSource implementation.
///
/// Reads the recorded episode format: a JSON object with `metadata` and a
/// `frames` array where each frame carries `t` plus one sample object per
/// tracked entity. The returned episode is already validated.
pub struct JsonEpisodeFile;

impl JsonEpisodeFile {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonEpisodeFile {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EpisodeSource for JsonEpisodeFile {
    async fn load(&self, path: &Path) -> ReplayResult<Episode> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ReplayError::Configuration {
                reason: format!("failed to read episode file {}: {}", path.display(), e),
            }
        })?;

        let episode: Episode = serde_json::from_str(&content)?;
        episode.validate()?;
        Ok(episode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_and_validates_episode() {
        let file = write_temp(
            r#"{
                "metadata": {"episode": 7, "coordinate_system": "NED", "converted_units": "meters"},
                "frames": [
                    {"t": 0.0, "drone": {"pos": [0.0, 0.0, -2.0], "rpy": [0.0, 0.0, 1.57]}},
                    {"t": 0.1, "drone": {"pos": [1.0, 0.0, -2.0]}}
                ]
            }"#,
        );

        let episode = JsonEpisodeFile::new().load(file.path()).await.unwrap();
        assert_eq!(episode.frame_count(), 2);
        assert_eq!(episode.metadata.episode, Some(7));
        assert_eq!(episode.metadata.units, "meters");
        let sample = &episode.frames[0].agents["drone"];
        assert_eq!(sample.pos.z, -2.0);
        assert!(sample.rpy.is_some());
        assert!(sample.vel.is_none());
    }

    #[tokio::test]
    async fn rejects_inconsistent_entity_sets() {
        let file = write_temp(
            r#"{
                "metadata": {},
                "frames": [
                    {"t": 0.0, "a": {"pos": [0, 0, 0]}},
                    {"t": 0.1, "b": {"pos": [0, 0, 0]}}
                ]
            }"#,
        );

        let result = JsonEpisodeFile::new().load(file.path()).await;
        assert!(matches!(
            result,
            Err(ReplayError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn missing_file_is_a_configuration_error() {
        let result = JsonEpisodeFile::new()
            .load(Path::new("/nonexistent/episode.json"))
            .await;
        assert!(matches!(result, Err(ReplayError::Configuration { .. })));
    }
}
