use super::{
    config::ShakeDetectorConfig,
    types::{AccelerationSample, RejectReason},
};

/// Earth gravity in m/s², as used by the platform sensor stack.
pub const STANDARD_GRAVITY: f32 = 9.80665;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SampleAssessment {
    pub accepted: bool,
    pub spike: bool,
    pub g_force: f32,
    pub reason: RejectReason,
}

pub fn g_force(sample: &AccelerationSample, gravity: f32) -> f32 {
    let gx = sample.x / gravity;
    let gy = sample.y / gravity;
    let gz = sample.z / gravity;
    (gx * gx + gy * gy + gz * gz).sqrt()
}

pub fn is_throttled(last_sample_at_ms: Option<u64>, now_ms: u64, min_interval_ms: u64) -> bool {
    last_sample_at_ms.is_some_and(|last| now_ms.saturating_sub(last) < min_interval_ms)
}

/// Strictly later than the window: a spike exactly on the boundary still chains.
pub fn spike_window_expired(last_spike_at_ms: Option<u64>, now_ms: u64, window_ms: u64) -> bool {
    last_spike_at_ms.is_some_and(|last| now_ms.saturating_sub(last) > window_ms)
}

pub fn assess_sample(
    sample: &AccelerationSample,
    last_sample_at_ms: Option<u64>,
    cfg: &ShakeDetectorConfig,
) -> SampleAssessment {
    if !sample.is_finite() {
        return SampleAssessment {
            accepted: false,
            spike: false,
            g_force: 0.0,
            reason: RejectReason::InvalidSample,
        };
    }

    if is_throttled(
        last_sample_at_ms,
        sample.now_ms,
        cfg.throttle.min_sample_interval_ms,
    ) {
        return SampleAssessment {
            accepted: false,
            spike: false,
            g_force: 0.0,
            reason: RejectReason::Throttled,
        };
    }

    let g_force = g_force(sample, cfg.standard_gravity);
    let spike = g_force > cfg.spike.threshold_g;
    SampleAssessment {
        accepted: true,
        spike,
        g_force,
        reason: if spike {
            RejectReason::None
        } else {
            RejectReason::BelowThreshold
        },
    }
}

#[cfg(test)]
mod tests;
