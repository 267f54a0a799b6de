use super::types::{ClassifierStateId, RejectReason};

/// Snapshot of the classifier after its most recent step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClassifierTrace {
    pub now_ms: u64,
    pub state_id: ClassifierStateId,
    pub reject_reason: RejectReason,
    pub spike_count: u8,
    pub spike: u8,
    pub g_force: f32,
    pub window_ms: u16,
}
