/*!
 * Lifecycle Cell
 * Atomic forward-only state shared by the owner and the worker
 */

use crate::signals::types::Lifecycle;
use std::sync::atomic::{AtomicU8, Ordering};

pub(crate) struct LifecycleCell(AtomicU8);

impl LifecycleCell {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(Lifecycle::Idle as u8))
    }

    #[inline]
    pub(crate) fn load(&self) -> Lifecycle {
        Lifecycle::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move `from` -> `to`, or report the state that prevented it
    pub(crate) fn transition(&self, from: Lifecycle, to: Lifecycle) -> Result<(), Lifecycle> {
        debug_assert!(from < to, "lifecycle only moves forward");
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(Lifecycle::from_u8)
    }

    /// Advance to `to` unless already at or past it
    pub(crate) fn advance(&self, to: Lifecycle) {
        self.0.fetch_max(to as u8, Ordering::AcqRel);
    }

    #[inline]
    pub(crate) fn stop_requested(&self) -> bool {
        self.load() >= Lifecycle::StopRequested
    }
}
