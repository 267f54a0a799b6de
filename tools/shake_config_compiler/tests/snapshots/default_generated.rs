// @generated by shake_config_compiler; do not edit.
pub static SHAKE_DETECTOR_CONFIG: ShakeDetectorConfig = ShakeDetectorConfig {
    throttle: ThrottleConfig {
        min_sample_interval_ms: 100,
    },
    spike: SpikeConfig {
        threshold_g: 1.5,
        reset_window_ms: 500,
        required_spikes: 2,
    },
    standard_gravity: 9.80665,
    sample_rate: SampleRate::Ui,
    tapp: TappConfig {
        pacing_ms: 500,
    },
};
