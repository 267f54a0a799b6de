/// One accelerometer reading in m/s², stamped with the delivery time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AccelerationSample {
    pub now_ms: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelerationSample {
    pub const fn new(now_ms: u64, x: f32, y: f32, z: f32) -> Self {
        Self { now_ms, x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A deliberate back-and-forth shake. Carries no payload.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ShakeEvent;

/// Platform delivery classes for the motion source.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SampleRate {
    Fastest,
    Game,
    #[default]
    Ui,
    Normal,
}

impl SampleRate {
    pub const fn nominal_interval_us(self) -> u32 {
        match self {
            Self::Fastest => 0,
            Self::Game => 20_000,
            Self::Ui => 60_000,
            Self::Normal => 200_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClassifierAction {
    ShakeDetected,
    CounterReset { reason: RejectReason },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ActionBuffer {
    len: usize,
    slots: [Option<ClassifierAction>; Self::MAX],
}

impl ActionBuffer {
    pub const MAX: usize = 2;

    pub const fn new() -> Self {
        Self {
            len: 0,
            slots: [None; Self::MAX],
        }
    }

    pub fn push(&mut self, action: ClassifierAction) {
        if self.len >= Self::MAX {
            return;
        }
        self.slots[self.len] = Some(action);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifierAction> {
        self.slots[..self.len].iter().filter_map(Option::as_ref)
    }

    pub fn contains_shake(&self) -> bool {
        self.iter()
            .any(|action| matches!(action, ClassifierAction::ShakeDetected))
    }
}

impl Default for ActionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum RejectReason {
    #[default]
    None = 0,
    Inactive = 1,
    Throttled = 2,
    InvalidSample = 3,
    BelowThreshold = 4,
    WindowExpired = 5,
}

impl RejectReason {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum ClassifierStateId {
    #[default]
    Stopped = 0,
    Idle = 1,
    SpikeSeq = 2,
}

impl ClassifierStateId {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}
