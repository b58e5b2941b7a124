/*!
 * Lock-Free Dispatch Statistics
 * Atomic counters updated by the signal worker
 */

use crate::signals::types::DispatchStats;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic dispatch statistics
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - Relaxed ordering; snapshots are for monitoring only
#[repr(C, align(64))]
pub struct AtomicDispatchStats {
    signals_received: AtomicU64,
    callbacks_invoked: AtomicU64,
    wakes_filtered: AtomicU64,
    unmapped_discarded: AtomicU64,
    wait_errors: AtomicU64,
}

impl AtomicDispatchStats {
    #[inline]
    pub const fn new() -> Self {
        Self {
            signals_received: AtomicU64::new(0),
            callbacks_invoked: AtomicU64::new(0),
            wakes_filtered: AtomicU64::new(0),
            unmapped_discarded: AtomicU64::new(0),
            wait_errors: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn inc_received(&self) {
        self.signals_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_invoked(&self) {
        self.callbacks_invoked.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_wakes(&self) {
        self.wakes_filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_unmapped(&self) {
        self.unmapped_discarded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_wait_errors(&self) {
        self.wait_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats (no locks required)
    ///
    /// # Note
    /// Counters are read independently and may be mutually inconsistent
    /// while the worker is dispatching.
    #[inline]
    pub fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            signals_received: self.signals_received.load(Ordering::Relaxed),
            callbacks_invoked: self.callbacks_invoked.load(Ordering::Relaxed),
            wakes_filtered: self.wakes_filtered.load(Ordering::Relaxed),
            unmapped_discarded: self.unmapped_discarded.load(Ordering::Relaxed),
            wait_errors: self.wait_errors.load(Ordering::Relaxed),
        }
    }
}

impl Default for AtomicDispatchStats {
    fn default() -> Self {
        Self::new()
    }
}
