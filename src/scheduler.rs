use std::time::{Duration, Instant};

/// Scheduler phase: holding a slide or sweeping to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning,
}

/// Edge event emitted exactly once per completed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advanced;

/// Timed state machine driving the idle → transition → idle loop.
///
/// All timing flows through [`TransitionScheduler::tick`], called from the
/// single frame clock; there is no auxiliary interval timer. Idle holds
/// progress at 0 for `cycle − transition`, then the transition sweeps raw
/// linear progress monotonically from 0 to 1. Reaching 1 emits [`Advanced`]
/// and resets to Idle. The machine has no terminal state; it loops until
/// dropped.
pub struct TransitionScheduler {
    phase: Phase,
    entered_at: Instant,
    cycle: Duration,
    transition: Duration,
    progress: f32,
}

impl TransitionScheduler {
    /// Creates a scheduler entering Idle at `now`.
    ///
    /// Durations are clamped so that `transition` is at least one
    /// millisecond and never exceeds `cycle`; the configuration layer
    /// rejects such inputs up front, this only keeps the math total.
    pub fn new(cycle: Duration, transition: Duration, now: Instant) -> Self {
        let transition = transition.max(Duration::from_millis(1));
        let cycle = cycle.max(transition);
        Self {
            phase: Phase::Idle,
            entered_at: now,
            cycle,
            transition,
            progress: 0.0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Raw linear progress in [0, 1]. Always 0 while Idle.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    fn idle_hold(&self) -> Duration {
        self.cycle - self.transition
    }

    /// Advances the machine to `now`. Returns [`Advanced`] on the single
    /// tick where progress reaches 1.0.
    ///
    /// States are never skipped: a tick landing past the idle hold enters
    /// Transitioning with progress 0 and sweeps on subsequent ticks, so
    /// every cycle gets a full hold and a full monotonic sweep.
    pub fn tick(&mut self, now: Instant) -> Option<Advanced> {
        match self.phase {
            Phase::Idle => {
                if now.duration_since(self.entered_at) >= self.idle_hold() {
                    self.phase = Phase::Transitioning;
                    self.entered_at = now;
                    self.progress = 0.0;
                }
                None
            }
            Phase::Transitioning => {
                let elapsed = now.duration_since(self.entered_at).as_secs_f32();
                let p = (elapsed / self.transition.as_secs_f32()).min(1.0);
                // Monotonic within the phase even if the clock misbehaves.
                self.progress = p.max(self.progress);
                if self.progress >= 1.0 {
                    self.phase = Phase::Idle;
                    self.entered_at = now;
                    self.progress = 0.0;
                    Some(Advanced)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn simulate(
        sched: &mut TransitionScheduler,
        start: Instant,
        total: Duration,
    ) -> (Vec<(Duration, Phase, f32)>, usize) {
        let mut trace = Vec::new();
        let mut advances = 0;
        let mut elapsed = Duration::ZERO;
        while elapsed <= total {
            if sched.tick(start + elapsed).is_some() {
                advances += 1;
            }
            trace.push((elapsed, sched.phase(), sched.progress()));
            elapsed += FRAME;
        }
        (trace, advances)
    }

    #[test]
    fn holds_idle_then_sweeps_then_resets() {
        let start = Instant::now();
        let mut sched = TransitionScheduler::new(
            Duration::from_millis(4000),
            Duration::from_millis(1000),
            start,
        );

        let (trace, advances) = simulate(&mut sched, start, Duration::from_millis(4100));
        assert_eq!(advances, 1);

        for (at, phase, progress) in &trace {
            if *at + FRAME < Duration::from_millis(3000) {
                assert_eq!(*phase, Phase::Idle, "expected idle at {at:?}");
                assert_eq!(*progress, 0.0, "progress leaked during hold at {at:?}");
            }
        }

        // Progress is monotonic across the sweep and resets afterwards.
        let sweep: Vec<f32> = trace
            .iter()
            .filter(|(at, phase, _)| {
                *phase == Phase::Transitioning && *at >= Duration::from_millis(3000)
            })
            .map(|(_, _, p)| *p)
            .collect();
        assert!(!sweep.is_empty());
        for pair in sweep.windows(2) {
            assert!(pair[1] >= pair[0], "progress went backwards");
        }
        assert_eq!(sched.phase(), Phase::Idle);
        assert_eq!(sched.progress(), 0.0);
    }

    #[test]
    fn advance_fires_exactly_once_per_cycle() {
        let start = Instant::now();
        let mut sched = TransitionScheduler::new(
            Duration::from_millis(400),
            Duration::from_millis(100),
            start,
        );
        // Each cycle takes ~400ms plus up to two frames of quantization.
        let (_, advances) = simulate(&mut sched, start, Duration::from_millis(2200));
        assert_eq!(advances, 5);
    }

    #[test]
    fn transition_longer_than_cycle_is_clamped() {
        let start = Instant::now();
        let mut sched = TransitionScheduler::new(
            Duration::from_millis(100),
            Duration::from_millis(500),
            start,
        );
        // Hold collapses to zero; the first tick enters the sweep.
        sched.tick(start);
        assert_eq!(sched.phase(), Phase::Transitioning);
        assert!(sched.tick(start + Duration::from_millis(500)).is_some());
    }

    #[test]
    fn zero_transition_still_terminates() {
        let start = Instant::now();
        let mut sched =
            TransitionScheduler::new(Duration::from_millis(100), Duration::ZERO, start);
        let (_, advances) = simulate(&mut sched, start, Duration::from_millis(500));
        assert!(advances >= 1);
    }

    #[test]
    fn large_tick_does_not_skip_the_sweep() {
        let start = Instant::now();
        let mut sched = TransitionScheduler::new(
            Duration::from_millis(4000),
            Duration::from_millis(1000),
            start,
        );
        // A single huge gap lands us in Transitioning with progress 0.
        assert!(sched.tick(start + Duration::from_secs(10)).is_none());
        assert_eq!(sched.phase(), Phase::Transitioning);
        assert_eq!(sched.progress(), 0.0);
    }
}
