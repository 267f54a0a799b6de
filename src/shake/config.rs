use super::types::SampleRate;

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    pub min_sample_interval_ms: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct SpikeConfig {
    pub threshold_g: f32,
    pub reset_window_ms: u64,
    pub required_spikes: u8,
}

#[derive(Clone, Copy, Debug)]
pub struct TappConfig {
    pub pacing_ms: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct ShakeDetectorConfig {
    pub throttle: ThrottleConfig,
    pub spike: SpikeConfig,
    pub standard_gravity: f32,
    pub sample_rate: SampleRate,
    pub tapp: TappConfig,
}

include!(concat!(env!("OUT_DIR"), "/shake_config.rs"));

pub fn active_config() -> &'static ShakeDetectorConfig {
    &SHAKE_DETECTOR_CONFIG
}
