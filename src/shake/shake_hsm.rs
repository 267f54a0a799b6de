use core::cmp::min;

use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use super::{
    config::{active_config, ShakeDetectorConfig},
    features::{assess_sample, spike_window_expired, SampleAssessment},
    trace::ClassifierTrace,
    types::{
        AccelerationSample, ActionBuffer, ClassifierAction, ClassifierStateId, RejectReason,
    },
};

#[derive(Clone, Copy, Debug)]
enum ShakeHsmEvent {
    Start,
    Stop,
    Sample(AccelerationSample),
}

#[derive(Default)]
struct DispatchContext {
    actions: ActionBuffer,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ClassifierOutput {
    pub actions: ActionBuffer,
    pub trace: ClassifierTrace,
}

impl ClassifierOutput {
    pub fn shake_detected(&self) -> bool {
        self.actions.contains_shake()
    }
}

/// Threshold-and-debounce shake classifier.
///
/// Samples only count while listening. Two spikes above the threshold with no
/// more than the reset window between them make one shake; the spike counter
/// is cleared after every shake and lazily when a spike arrives too late.
pub struct ShakeClassifier {
    machine: statig::blocking::StateMachine<ShakeHsm>,
}

impl Default for ShakeClassifier {
    fn default() -> Self {
        Self::new(active_config())
    }
}

impl ShakeClassifier {
    pub fn new(config: &'static ShakeDetectorConfig) -> Self {
        Self {
            machine: ShakeHsm::new(config).state_machine(),
        }
    }

    pub fn start(&mut self) -> ClassifierOutput {
        self.dispatch(ShakeHsmEvent::Start)
    }

    pub fn stop(&mut self) -> ClassifierOutput {
        self.dispatch(ShakeHsmEvent::Stop)
    }

    pub fn on_sample(&mut self, sample: AccelerationSample) -> ClassifierOutput {
        self.dispatch(ShakeHsmEvent::Sample(sample))
    }

    pub fn is_listening(&self) -> bool {
        self.machine.inner().listening
    }

    pub fn spike_count(&self) -> u8 {
        self.machine.inner().spike_count
    }

    pub fn last_spike_at_ms(&self) -> Option<u64> {
        self.machine.inner().last_spike_at_ms
    }

    pub fn last_sample_at_ms(&self) -> Option<u64> {
        self.machine.inner().last_sample_at_ms
    }

    pub fn last_trace(&self) -> ClassifierTrace {
        self.machine.inner().last_trace
    }

    pub fn config(&self) -> &'static ShakeDetectorConfig {
        self.machine.inner().config
    }

    fn dispatch(&mut self, event: ShakeHsmEvent) -> ClassifierOutput {
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        ClassifierOutput {
            actions: context.actions,
            trace: self.machine.inner().last_trace,
        }
    }
}

struct ShakeHsm {
    config: &'static ShakeDetectorConfig,
    listening: bool,
    last_sample_at_ms: Option<u64>,
    spike_count: u8,
    last_spike_at_ms: Option<u64>,
    last_trace: ClassifierTrace,
}

impl ShakeHsm {
    fn new(config: &'static ShakeDetectorConfig) -> Self {
        Self {
            config,
            listening: false,
            last_sample_at_ms: None,
            spike_count: 0,
            last_spike_at_ms: None,
            last_trace: ClassifierTrace::default(),
        }
    }

    fn window_ms(&self, now_ms: u64) -> u16 {
        let dt = self
            .last_spike_at_ms
            .map_or(0, |last| now_ms.saturating_sub(last));
        min(dt, u16::MAX as u64) as u16
    }

    fn clear_sequence(&mut self) {
        self.last_sample_at_ms = None;
        self.spike_count = 0;
        self.last_spike_at_ms = None;
    }

    fn update_lifecycle_trace(&mut self, state_id: ClassifierStateId) {
        self.last_trace = ClassifierTrace {
            now_ms: self.last_trace.now_ms,
            state_id,
            ..ClassifierTrace::default()
        };
    }

    fn update_inactive_trace(&mut self, now_ms: u64) {
        self.last_trace = ClassifierTrace {
            now_ms,
            state_id: ClassifierStateId::Stopped,
            reject_reason: RejectReason::Inactive,
            ..ClassifierTrace::default()
        };
    }

    fn evaluate_sample(
        &mut self,
        state_id: ClassifierStateId,
        sample: AccelerationSample,
    ) -> SampleAssessment {
        let assessment = assess_sample(&sample, self.last_sample_at_ms, self.config);
        if assessment.accepted {
            self.last_sample_at_ms = Some(sample.now_ms);
        }

        self.last_trace = ClassifierTrace {
            now_ms: sample.now_ms,
            state_id,
            reject_reason: assessment.reason,
            spike_count: self.spike_count,
            spike: if assessment.spike { 1 } else { 0 },
            g_force: assessment.g_force,
            window_ms: self.window_ms(sample.now_ms),
        };

        assessment
    }

    /// Returns true when this spike completed a shake.
    fn record_spike(&mut self, context: &mut DispatchContext, now_ms: u64) -> bool {
        if spike_window_expired(
            self.last_spike_at_ms,
            now_ms,
            self.config.spike.reset_window_ms,
        ) && self.spike_count > 0
        {
            self.spike_count = 0;
            self.last_trace.reject_reason = RejectReason::WindowExpired;
            context.actions.push(ClassifierAction::CounterReset {
                reason: RejectReason::WindowExpired,
            });
        }

        self.last_spike_at_ms = Some(now_ms);
        self.spike_count = self.spike_count.saturating_add(1);

        let completed = self.spike_count >= self.config.spike.required_spikes;
        if completed {
            self.spike_count = 0;
            context.actions.push(ClassifierAction::ShakeDetected);
        }
        self.last_trace.spike_count = self.spike_count;
        completed
    }
}

#[state_machine(initial = "State::stopped()")]
impl ShakeHsm {
    #[state]
    fn stopped(&mut self, context: &mut DispatchContext, event: &ShakeHsmEvent) -> Outcome<State> {
        let _ = context;
        match event {
            ShakeHsmEvent::Start => {
                self.listening = true;
                self.update_lifecycle_trace(ClassifierStateId::Idle);
                Transition(State::idle())
            }
            ShakeHsmEvent::Stop => Handled,
            ShakeHsmEvent::Sample(sample) => {
                self.update_inactive_trace(sample.now_ms);
                Handled
            }
        }
    }

    #[state(superstate = "listening")]
    fn idle(&mut self, context: &mut DispatchContext, event: &ShakeHsmEvent) -> Outcome<State> {
        match event {
            ShakeHsmEvent::Sample(sample) => {
                let assessment = self.evaluate_sample(ClassifierStateId::Idle, *sample);
                if !assessment.spike {
                    return Handled;
                }
                if self.record_spike(context, sample.now_ms) {
                    return Handled;
                }
                Transition(State::spike_seq())
            }
            _ => Super,
        }
    }

    #[state(superstate = "listening")]
    fn spike_seq(
        &mut self,
        context: &mut DispatchContext,
        event: &ShakeHsmEvent,
    ) -> Outcome<State> {
        match event {
            ShakeHsmEvent::Sample(sample) => {
                let assessment = self.evaluate_sample(ClassifierStateId::SpikeSeq, *sample);
                if !assessment.spike {
                    return Handled;
                }
                if self.record_spike(context, sample.now_ms) {
                    return Transition(State::idle());
                }
                Handled
            }
            _ => Super,
        }
    }

    #[superstate]
    fn listening(&mut self, context: &mut DispatchContext, event: &ShakeHsmEvent) -> Outcome<State> {
        let _ = context;
        match event {
            ShakeHsmEvent::Stop => {
                self.listening = false;
                self.clear_sequence();
                self.update_lifecycle_trace(ClassifierStateId::Stopped);
                Transition(State::stopped())
            }
            _ => Handled,
        }
    }
}
