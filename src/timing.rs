//! Lightweight per-level timing, gated behind `log::trace!` the same way
//! the rest of the crate logs phase boundaries -- a direct replacement
//! for the original's `HYMLS_PROF`/`HYMLS_LPROF` scoped-timer macros,
//! without the global registry they reported into.

use std::time::{Duration, Instant};

use log::trace;

/// Measures one named phase at one preconditioner level and logs its
/// duration at `trace` level when dropped. Cheap enough to wrap every
/// `initialize`/`compute`/`apply_inverse` call without measurable
/// overhead when tracing is disabled.
pub struct LevelTimer {
    label: String,
    level: usize,
    start: Instant,
}

impl LevelTimer {
    pub fn start(label: &str, level: usize) -> Self {
        LevelTimer {
            label: label.to_string(),
            level,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for LevelTimer {
    fn drop(&mut self) {
        trace!(
            "level {} :: {} took {:.3}ms",
            self.level,
            self.label,
            self.elapsed().as_secs_f64() * 1000.0
        );
    }
}
