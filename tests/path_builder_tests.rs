use std::collections::BTreeMap;

use skyreplay::common::ReplayError;
use skyreplay::domains::episode::{
    classify, normalize_units, AgentSample, Episode, EpisodeMetadata, Frame,
    MotionClassification, Pose, TransformConfig, Vec3, DEFAULT_MOTION_THRESHOLD,
};
use skyreplay::domains::replay::{build_paths, FrameRange};

fn sample(x: f64, y: f64, z: f64) -> AgentSample {
    AgentSample {
        pos: Vec3::new(x, y, z),
        vel: None,
        rpy: None,
    }
}

fn episode_of(units: &str, frames: Vec<Frame>) -> Episode {
    Episode {
        metadata: EpisodeMetadata {
            episode: None,
            coordinate_system: "NED".to_string(),
            units: units.to_string(),
            outcome: None,
            total_reward: None,
        },
        frames,
    }
}

fn single_agent_frames(name: &str, positions: &[(f64, f64, f64)]) -> Vec<Frame> {
    positions
        .iter()
        .enumerate()
        .map(|(index, (x, y, z))| {
            let mut agents = BTreeMap::new();
            agents.insert(name.to_string(), sample(*x, *y, *z));
            Frame {
                t: index as f64 * 0.1,
                agents,
            }
        })
        .collect()
}

fn moving(name: &str) -> BTreeMap<String, MotionClassification> {
    let mut classes = BTreeMap::new();
    classes.insert(name.to_string(), MotionClassification::Moving);
    classes
}

fn spawn_at(name: &str, x: f64, y: f64, z: f64) -> BTreeMap<String, Pose> {
    let mut poses = BTreeMap::new();
    poses.insert(name.to_string(), Pose::new(Vec3::new(x, y, z), 0.0));
    poses
}

#[test]
fn command_path_has_one_delta_per_frame_pair() {
    let ep = episode_of(
        "meters",
        single_agent_frames(
            "drone",
            &[(0.0, 0.0, -2.0), (1.0, 0.0, -2.0), (2.0, 1.0, -2.0), (3.0, 1.0, -3.0)],
        ),
    );
    let config = TransformConfig::default();
    let paths = build_paths(
        &ep,
        &config,
        &moving("drone"),
        &spawn_at("drone", 0.0, 0.0, -2.0),
        &FrameRange::full(),
    )
    .unwrap();

    let drone = &paths["drone"];
    let command = drone.command.as_ref().unwrap();
    assert_eq!(command.len(), ep.frame_count() - 1);
    assert_eq!(drone.display.points.len(), ep.frame_count());
}

#[test]
fn command_path_is_anchored_at_the_reported_spawn_pose() {
    // Spawn pose deliberately offset from the recorded first sample.
    let ep = episode_of(
        "meters",
        single_agent_frames("drone", &[(0.0, 0.0, -2.0), (1.0, 0.0, -2.0)]),
    );
    let config = TransformConfig::default();
    let spawn = spawn_at("drone", 10.0, -4.0, -1.5);
    let paths = build_paths(&ep, &config, &moving("drone"), &spawn, &FrameRange::full()).unwrap();

    let command = paths["drone"].command.as_ref().unwrap();
    let waypoints = command.waypoints();
    assert_eq!(waypoints[0], Vec3::new(10.0, -4.0, -1.5));
    // The recorded shape survives: one 1m step along x from wherever the
    // agent actually starts.
    assert_eq!(waypoints[1], Vec3::new(11.0, -4.0, -1.5));
}

#[test]
fn centimeter_episode_replays_normalized_deltas() {
    // 2-frame episode recorded in centimeters: (0,0,-2) then (1,0,-2).
    let ep = episode_of(
        "centimeters",
        single_agent_frames("A", &[(0.0, 0.0, -2.0), (1.0, 0.0, -2.0)]),
    );
    let normalized = normalize_units(&ep).unwrap();
    let config = TransformConfig::default();
    let spawn = spawn_at("A", 0.0, 0.0, -0.02);

    let paths = build_paths(
        &normalized,
        &config,
        &moving("A"),
        &spawn,
        &FrameRange::full(),
    )
    .unwrap();

    let command = paths["A"].command.as_ref().unwrap();
    assert_eq!(command.deltas, vec![Vec3::new(0.01, 0.0, 0.0)]);
    assert_eq!(
        paths["A"].display.points,
        vec![Vec3::new(0.0, 0.0, -0.02), Vec3::new(0.01, 0.0, -0.02)]
    );
}

#[test]
fn stationary_entity_gets_a_single_display_point() {
    let positions = [(5.0, 5.0, 0.0); 10];
    let ep = episode_of("meters", single_agent_frames("Base", &positions));
    let classes = classify(&ep, DEFAULT_MOTION_THRESHOLD);
    assert_eq!(classes["Base"], MotionClassification::Stationary);

    let config = TransformConfig::new(2.0, false).unwrap();
    let paths = build_paths(&ep, &config, &classes, &BTreeMap::new(), &FrameRange::full()).unwrap();

    let base = &paths["Base"];
    assert!(base.command.is_none());
    // X/Y scaled, Z untouched.
    assert_eq!(base.display.points, vec![Vec3::new(10.0, 10.0, 0.0)]);
}

#[test]
fn scale_and_inversion_shape_the_command_path_only() {
    let ep = episode_of(
        "meters",
        single_agent_frames("drone", &[(0.0, 0.0, -2.0), (1.0, 1.0, -3.0)]),
    );
    let config = TransformConfig::new(2.0, true).unwrap();
    let spawn = spawn_at("drone", 0.0, 0.0, 4.0);
    let paths = build_paths(&ep, &config, &moving("drone"), &spawn, &FrameRange::full()).unwrap();

    let command = paths["drone"].command.as_ref().unwrap();
    // Recorded delta (1,1,-1) scaled by 2 with z negated: (2,2,2).
    assert_eq!(command.deltas, vec![Vec3::new(2.0, 2.0, 2.0)]);

    // Display keeps recorded altitude, scales the rest.
    assert_eq!(
        paths["drone"].display.points,
        vec![Vec3::new(0.0, 0.0, -2.0), Vec3::new(2.0, 2.0, -3.0)]
    );
}

#[test]
fn moving_agent_without_spawn_pose_is_rejected() {
    let ep = episode_of(
        "meters",
        single_agent_frames("drone", &[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)]),
    );
    let config = TransformConfig::default();
    let result = build_paths(
        &ep,
        &config,
        &moving("drone"),
        &BTreeMap::new(),
        &FrameRange::full(),
    );
    assert!(matches!(result, Err(ReplayError::Configuration { .. })));
}

#[test]
fn frame_range_narrows_both_paths() {
    let ep = episode_of(
        "meters",
        single_agent_frames(
            "drone",
            &[
                (0.0, 0.0, 0.0),
                (1.0, 0.0, 0.0),
                (2.0, 0.0, 0.0),
                (3.0, 0.0, 0.0),
                (4.0, 0.0, 0.0),
            ],
        ),
    );
    let config = TransformConfig::default();
    let range = FrameRange::new(1, Some(4));
    let paths = build_paths(
        &ep,
        &config,
        &moving("drone"),
        &spawn_at("drone", 1.0, 0.0, 0.0),
        &range,
    )
    .unwrap();

    let drone = &paths["drone"];
    assert_eq!(drone.display.points.len(), 3);
    assert_eq!(drone.command.as_ref().unwrap().len(), 2);
}

#[test]
fn empty_frame_range_is_rejected() {
    assert!(matches!(
        FrameRange::new(5, Some(5)).resolve(10),
        Err(ReplayError::Configuration { .. })
    ));
    assert!(matches!(
        FrameRange::new(20, None).resolve(10),
        Err(ReplayError::Configuration { .. })
    ));
    // End past the episode clamps instead of failing.
    assert_eq!(FrameRange::new(8, Some(50)).resolve(10).unwrap(), 8..10);
}

#[test]
fn builder_is_idempotent() {
    let ep = episode_of(
        "meters",
        single_agent_frames("drone", &[(0.0, 0.0, -2.0), (1.5, 0.5, -2.5), (3.0, 1.0, -3.0)]),
    );
    let config = TransformConfig::new(1.5, true).unwrap();
    let spawn = spawn_at("drone", 0.2, 0.1, -1.9);

    let first = build_paths(&ep, &config, &moving("drone"), &spawn, &FrameRange::full()).unwrap();
    let second = build_paths(&ep, &config, &moving("drone"), &spawn, &FrameRange::full()).unwrap();
    assert_eq!(first, second);
}
