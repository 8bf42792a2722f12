use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::data::model::Floater;

use super::sequencer::{advance, Frame};

// ---------------------------------------------------------------------------
// Playback state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Playback {
    Idle,
    Animating {
        floater_id: String,
        /// Next step to emit.
        step: usize,
        next_due: Duration,
    },
    Finished {
        floater_id: String,
    },
}

/// Steps one floater's frames out at a fixed cadence.
///
/// Time is whatever the caller says it is: egui's frame clock in the UI, a
/// [`Clock`] in headless runs, plain numbers in tests.
#[derive(Debug, Clone)]
pub struct Animator {
    delay: Duration,
    state: Playback,
}

impl Animator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: Playback::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> &Playback {
        &self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, Playback::Animating { .. })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, Playback::Finished { .. })
    }

    /// Begin at step 0; the first frame is due immediately.
    pub fn start(&mut self, floater_id: &str, now: Duration) {
        log::debug!("animating {floater_id}");
        self.state = Playback::Animating {
            floater_id: floater_id.to_string(),
            step: 0,
            next_due: now,
        };
    }

    /// Abandon any animation and go back to Idle.
    pub fn stop(&mut self) {
        if let Playback::Animating { floater_id, step, .. } = &self.state {
            log::debug!("stopped {floater_id} before step {step}");
        }
        self.state = Playback::Idle;
    }

    /// When the next frame is due, if animating.
    pub fn next_due(&self) -> Option<Duration> {
        match self.state {
            Playback::Animating { next_due, .. } => Some(next_due),
            _ => None,
        }
    }

    /// Emit at most one frame if one is due at `now`.
    ///
    /// Steps are emitted strictly in order, one per call. Once the step
    /// counter reaches the track length the terminal frame is returned and
    /// the state becomes Finished.
    pub fn tick(&mut self, floater: &Floater, now: Duration) -> Option<Frame> {
        let Playback::Animating {
            floater_id,
            step,
            next_due,
        } = &mut self.state
        else {
            return None;
        };
        if *floater_id != floater.id {
            log::warn!("tick for {} while animating {floater_id}", floater.id);
            return None;
        }
        if now < *next_due {
            return None;
        }

        let frame = advance(floater, *step);
        if frame.is_complete() {
            log::debug!("finished {floater_id} after {step} steps");
            self.state = Playback::Finished {
                floater_id: floater.id.clone(),
            };
        } else {
            *step += 1;
            *next_due = now + self.delay;
        }
        Some(frame)
    }
}

// ---------------------------------------------------------------------------
// Blocking driver
// ---------------------------------------------------------------------------

/// A time source that can also wait.
pub trait Clock {
    /// Time since the clock's origin.
    fn now(&self) -> Duration;
    fn sleep_until(&self, deadline: Duration);
}

/// Wall clock backed by `Instant` and `thread::sleep`.
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

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_until(&self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Shared stop request, checked between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Completed { frames: usize },
    Cancelled { frames: usize },
}

/// Play a floater to completion, sleeping on `clock` between steps.
///
/// `on_frame` sees every frame including the terminal one.
pub fn play<C: Clock>(
    floater: &Floater,
    delay: Duration,
    clock: &C,
    cancel: &CancelFlag,
    mut on_frame: impl FnMut(&Frame),
) -> PlayOutcome {
    let mut animator = Animator::new(delay);
    animator.start(&floater.id, clock.now());
    let mut frames = 0;

    while let Some(due) = animator.next_due() {
        clock.sleep_until(due);
        if cancel.is_cancelled() {
            animator.stop();
            return PlayOutcome::Cancelled { frames };
        }
        if let Some(frame) = animator.tick(floater, clock.now()) {
            frames += 1;
            on_frame(&frame);
        }
    }
    PlayOutcome::Completed { frames }
}
