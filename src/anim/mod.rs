/// Animation: the pure step sequencer and the cadence that drives it.
///
/// ```text
///   Idle ──start──► Animating{step} ──tick: step == len──► Finished
///     ▲                   │
///     └──────stop─────────┘
/// ```

pub mod scheduler;
pub mod sequencer;
