use super::super::config::{active_config, ShakeDetectorConfig};
use super::*;

fn unit_gravity_config() -> ShakeDetectorConfig {
    ShakeDetectorConfig {
        standard_gravity: 1.0,
        ..*active_config()
    }
}

#[test]
fn resting_device_reads_one_g() {
    let sample = AccelerationSample::new(0, 0.0, 0.0, STANDARD_GRAVITY);
    let g = g_force(&sample, STANDARD_GRAVITY);
    assert!((g - 1.0).abs() < 1e-6, "g={g}");
}

#[test]
fn magnitude_combines_all_axes() {
    let sample = AccelerationSample::new(0, 3.0, 4.0, 12.0);
    assert_eq!(g_force(&sample, 1.0), 13.0);
}

#[test]
fn magnitude_exactly_at_threshold_is_not_a_spike() {
    let cfg = unit_gravity_config();
    let at = assess_sample(&AccelerationSample::new(0, 1.5, 0.0, 0.0), None, &cfg);
    assert!(at.accepted);
    assert!(!at.spike);
    assert_eq!(at.reason, RejectReason::BelowThreshold);

    let above = assess_sample(&AccelerationSample::new(0, 1.51, 0.0, 0.0), None, &cfg);
    assert!(above.spike);
    assert_eq!(above.reason, RejectReason::None);
}

#[test]
fn throttle_rejects_inside_interval_and_accepts_on_boundary() {
    assert!(!is_throttled(None, 0, 100));
    assert!(is_throttled(Some(1_000), 1_099, 100));
    assert!(!is_throttled(Some(1_000), 1_100, 100));
    // Clock going backwards saturates to a zero gap.
    assert!(is_throttled(Some(1_000), 900, 100));
}

#[test]
fn window_expires_only_past_boundary() {
    assert!(!spike_window_expired(None, 10_000, 500));
    assert!(!spike_window_expired(Some(1_000), 1_500, 500));
    assert!(spike_window_expired(Some(1_000), 1_501, 500));
}

#[test]
fn non_finite_samples_are_invalid_before_throttle() {
    let cfg = unit_gravity_config();
    let nan = assess_sample(
        &AccelerationSample::new(50, f32::NAN, 0.0, 0.0),
        Some(0),
        &cfg,
    );
    assert!(!nan.accepted);
    assert_eq!(nan.reason, RejectReason::InvalidSample);

    let inf = assess_sample(
        &AccelerationSample::new(500, 0.0, f32::INFINITY, 0.0),
        None,
        &cfg,
    );
    assert_eq!(inf.reason, RejectReason::InvalidSample);
}

#[test]
fn throttled_samples_report_no_magnitude() {
    let cfg = unit_gravity_config();
    let out = assess_sample(&AccelerationSample::new(150, 9.0, 0.0, 0.0), Some(100), &cfg);
    assert!(!out.accepted);
    assert!(!out.spike);
    assert_eq!(out.reason, RejectReason::Throttled);
}
