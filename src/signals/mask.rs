/*!
 * Signal Masking
 * Blocks the registry signals so only the dispatcher receives them
 */

use super::registry;
use super::types::MaskReport;
use crate::core::errors::{DispatcherError, Result};
use nix::sys::signal::SigSet;
use tracing::{info, warn};

/// Block every registry signal on the calling thread
///
/// Threads spawned afterwards inherit the mask, so call this from `main`
/// before any other thread exists; a thread created earlier keeps the
/// default disposition and may be killed by a terminating signal.
///
/// The mask is read back after blocking: a report that is not
/// [`complete`](MaskReport::is_complete) lists the signals that remain
/// deliverable, and the caller decides whether to abort startup.
pub fn mask_process_signals() -> Result<MaskReport> {
    let set = registry::signal_set();
    set.thread_block()
        .map_err(|e| DispatcherError::setup("pthread_sigmask(SIG_BLOCK)", e))?;

    let mask = SigSet::thread_get_mask()
        .map_err(|e| DispatcherError::setup("pthread_sigmask(query)", e))?;

    let (blocked, unblocked): (Vec<_>, Vec<_>) =
        registry::all_ids().partition(|signal| mask.contains(*signal));
    let report = MaskReport { blocked, unblocked };

    if report.is_complete() {
        info!(count = report.blocked.len(), "Blocked dispatcher signals");
    } else {
        warn!(missing = ?report.unblocked, "Some dispatcher signals remain unblocked");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_mask_is_complete_and_inherited() {
        // Run on a fresh thread so the test harness thread keeps its mask
        let inherited = thread::spawn(|| {
            let report = mask_process_signals().unwrap();
            assert!(report.is_complete());
            assert_eq!(report.blocked.len(), registry::REGISTRY.len());

            thread::spawn(|| {
                let mask = SigSet::thread_get_mask().unwrap();
                registry::all_ids().all(|s| mask.contains(s))
            })
            .join()
            .unwrap()
        })
        .join()
        .unwrap();

        assert!(inherited);
    }
}
