use std::collections::BTreeMap;
use std::path::Path;

use crate::common::{ReplayError, ReplayResult};
use crate::domains::episode::Pose;
use crate::domains::replay::SpawnConfigSink;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Merges projected spawn poses into the settings file the simulator reads
/// at startup. Existing settings are preserved; only the `Vehicles` section
/// is rewritten. The simulator must be restarted for the poses to apply.
pub struct SpawnSettingsFile;

impl SpawnSettingsFile {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SpawnSettingsFile {
    fn default() -> Self {
        Self::new()
    }
}

fn io_error(path: &Path, action: &str, err: std::io::Error) -> ReplayError {
    ReplayError::Configuration {
        reason: format!("failed to {} settings file {}: {}", action, path.display(), err),
    }
}

#[async_trait]
impl SpawnConfigSink for SpawnSettingsFile {
    async fn write_spawn_poses(
        &self,
        path: &Path,
        poses: &BTreeMap<String, Pose>,
    ) -> ReplayResult<()> {
        let mut settings: Value = match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content)?,
            // Missing file: start from a minimal settings skeleton.
            Err(_) => json!({
                "SettingsVersion": 1.2,
                "SimMode": "Multirotor",
                "ViewMode": "SpringArmChase",
            }),
        };

        let root = settings
            .as_object_mut()
            .ok_or_else(|| ReplayError::Configuration {
                reason: format!("settings file {} is not a JSON object", path.display()),
            })?;
        let vehicles = root
            .entry("Vehicles")
            .or_insert_with(|| json!({}))
            .as_object_mut()
            .ok_or_else(|| ReplayError::Configuration {
                reason: "settings Vehicles section is not a JSON object".to_string(),
            })?;

        for (name, pose) in poses {
            vehicles.insert(
                name.clone(),
                json!({
                    "VehicleType": "SimpleFlight",
                    "X": pose.position.x,
                    "Y": pose.position.y,
                    "Z": pose.position.z,
                    "Yaw": pose.yaw.to_degrees(),
                }),
            );
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| io_error(path, "create directory for", e))?;
            }
        }
        let content = serde_json::to_string_pretty(&settings)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| io_error(path, "write", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::episode::Vec3;

    #[tokio::test]
    async fn creates_settings_with_vehicle_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut poses = BTreeMap::new();
        poses.insert(
            "Defender".to_string(),
            Pose::new(Vec3::new(1.0, 2.0, -3.0), std::f64::consts::FRAC_PI_2),
        );
        SpawnSettingsFile::new()
            .write_spawn_poses(&path, &poses)
            .await
            .unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["SimMode"], "Multirotor");
        let vehicle = &written["Vehicles"]["Defender"];
        assert_eq!(vehicle["VehicleType"], "SimpleFlight");
        assert_eq!(vehicle["X"], 1.0);
        assert_eq!(vehicle["Z"], -3.0);
        assert!((vehicle["Yaw"].as_f64().unwrap() - 90.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn preserves_unrelated_settings_on_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"SettingsVersion": 1.2, "ClockSpeed": 20, "Vehicles": {"Old": {"X": 9.0}}}"#,
        )
        .unwrap();

        let mut poses = BTreeMap::new();
        poses.insert("Attacker".to_string(), Pose::new(Vec3::new(0.5, 0.0, -1.0), 0.0));
        SpawnSettingsFile::new()
            .write_spawn_poses(&path, &poses)
            .await
            .unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["ClockSpeed"], 20);
        assert_eq!(written["Vehicles"]["Old"]["X"], 9.0);
        assert_eq!(written["Vehicles"]["Attacker"]["Y"], 0.0);
    }
}
