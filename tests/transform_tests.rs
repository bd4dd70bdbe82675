use skyreplay::common::ReplayError;
use skyreplay::domains::episode::{transform_position, Semantics, TransformConfig, Vec3};

#[test]
fn command_semantics_scales_all_axes() {
    let config = TransformConfig::new(2.0, false).unwrap();
    let point = Vec3::new(1.0, -2.0, 3.0);

    let out = transform_position(&point, &config, Semantics::Command);
    assert_eq!(out, Vec3::new(2.0, -4.0, 6.0));
}

#[test]
fn command_semantics_negates_vertical_axis_when_inverted() {
    let config = TransformConfig::new(2.0, true).unwrap();
    let point = Vec3::new(1.0, -2.0, 3.0);

    let out = transform_position(&point, &config, Semantics::Command);
    assert_eq!(out, Vec3::new(2.0, -4.0, -6.0));
}

#[test]
fn display_semantics_never_touches_vertical_axis() {
    let point = Vec3::new(1.0, -2.0, 3.0);

    // Regardless of the inversion flag, display output keeps the recorded
    // altitude and scales only the horizontal axes.
    for invert_z in [false, true] {
        let config = TransformConfig::new(2.0, invert_z).unwrap();
        let out = transform_position(&point, &config, Semantics::Display);
        assert_eq!(out, Vec3::new(2.0, -4.0, 3.0));
    }
}

#[test]
fn unit_scale_is_identity_for_command_without_inversion() {
    let config = TransformConfig::default();
    let point = Vec3::new(0.25, -0.88, -2.0);

    assert_eq!(
        transform_position(&point, &config, Semantics::Command),
        point
    );
    assert_eq!(
        transform_position(&point, &config, Semantics::Display),
        point
    );
}

#[test]
fn non_positive_scale_is_rejected() {
    for scale in [0.0, -1.0, f64::NAN] {
        let result = TransformConfig::new(scale, false);
        assert!(matches!(result, Err(ReplayError::Configuration { .. })));
    }
}
