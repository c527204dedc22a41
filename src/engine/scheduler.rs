use crate::engine::classifier::{classify, ClassificationResult};
use crate::ui::UiCollaborator;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const MIN_ANALYSIS_CHARS: usize = 3;
pub const ANALYZING_THRESHOLD: f32 = 0.6;

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: std::sync::Arc<parking_lot::Mutex<Duration>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveAnalysisToken(u64);

#[derive(Debug)]
struct Pending {
    token: LiveAnalysisToken,
    text: String,
    due_at: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub text: String,
    pub result: ClassificationResult,
}

/// Debounces live classification while the user types. Every accepted
/// keystroke bumps the generation, so only the newest token can fire.
pub struct LiveAnalysisScheduler<C> {
    clock: C,
    delay: Duration,
    generation: u64,
    pending: Option<Pending>,
}

impl<C: Clock> LiveAnalysisScheduler<C> {
    pub fn new(clock: C, delay: Duration) -> Self {
        Self {
            clock,
            delay,
            generation: 0,
            pending: None,
        }
    }

    /// Schedules an evaluation of `text`, replacing any pending one. Inputs
    /// shorter than three characters leave the schedule untouched.
    pub fn on_input(&mut self, text: &str) -> Option<LiveAnalysisToken> {
        if text.chars().count() < MIN_ANALYSIS_CHARS {
            return None;
        }

        self.generation += 1;
        let token = LiveAnalysisToken(self.generation);
        let due_at = self.clock.now() + self.delay;
        if let Some(previous) = self.pending.replace(Pending {
            token,
            text: text.to_string(),
            due_at,
        }) {
            debug!(stale = previous.token.0, fresh = token.0, "rescheduled live analysis");
        }
        Some(token)
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub fn due_in(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.pending
            .as_ref()
            .map(|pending| pending.due_at.saturating_sub(now))
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Runs the evaluation for `token` if it is still current and due.
    pub fn fire(
        &mut self,
        token: LiveAnalysisToken,
        ui: &dyn UiCollaborator,
    ) -> Option<Evaluation> {
        let pending = self.pending.as_ref()?;
        if pending.token != token || self.clock.now() < pending.due_at {
            return None;
        }

        let pending = self.pending.take()?;
        let result = classify(&pending.text);
        if result
            .confidence()
            .is_some_and(|confidence| confidence > ANALYZING_THRESHOLD)
        {
            ui.show_analyzing_indicator();
        }

        Some(Evaluation {
            text: pending.text,
            result,
        })
    }

    /// Fires the pending evaluation once its window has elapsed.
    pub fn poll(&mut self, ui: &dyn UiCollaborator) -> Option<Evaluation> {
        let token = self.pending.as_ref()?.token;
        self.fire(token, ui)
    }
}
