/*!
 * Signal Worker
 * Wait loop run by the dedicated dispatcher thread
 */

use super::config::DispatcherConfig;
use super::lifecycle::LifecycleCell;
use crate::core::guard::{Guard, TerminalGuard};
use crate::signals::atomic_stats::AtomicDispatchStats;
use crate::signals::registry::{self, SignalSpec, WAKE_SIGNAL};
use crate::signals::traits::SignalWait;
use arc_swap::ArcSwapOption;
use nix::sys::signal::{self, SigHandler, SigSet, Signal};
use parking_lot::Mutex;
use std::sync::OnceLock;
use std::thread::{self, ThreadId};
use tracing::{debug, error, info, warn};

/// User callback behind an atomically swappable pointer
pub(crate) struct CallbackSlot(pub(crate) Box<dyn Fn(Signal, bool) + Send + Sync>);

/// State shared by the dispatcher and its worker thread
pub(crate) struct Shared {
    pub(crate) lifecycle: LifecycleCell,
    pub(crate) callback: ArcSwapOption<CallbackSlot>,
    pub(crate) terminal: Mutex<Option<TerminalGuard>>,
    pub(crate) stats: AtomicDispatchStats,
    /// Set by the worker itself before it first waits
    pub(crate) worker_thread: OnceLock<ThreadId>,
}

impl Shared {
    pub(crate) fn new(callback: Option<CallbackSlot>) -> Self {
        Self {
            lifecycle: LifecycleCell::new(),
            callback: ArcSwapOption::from_pointee(callback),
            terminal: Mutex::new(None),
            stats: AtomicDispatchStats::new(),
            worker_thread: OnceLock::new(),
        }
    }

    /// Whether the calling thread is the signal worker
    pub(crate) fn on_worker(&self) -> bool {
        self.worker_thread.get() == Some(&thread::current().id())
    }

    /// Restore the terminal if a snapshot is held
    pub(crate) fn restore_terminal(&self) {
        let guard = self.terminal.lock().take();
        if let Some(mut guard) = guard {
            if let Err(e) = guard.release() {
                warn!(error = %e, "Failed to restore terminal settings");
            }
        }
    }
}

/// Classification of a signal returned by the wait primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Stop was requested; the woken signal is dropped
    Terminate,
    /// Internal wake signal, never dispatched
    DiscardWake,
    /// Not in the registry
    DiscardUnmapped,
    Dispatch(&'static SignalSpec),
}

/// Decide what the worker does with `signal`
pub fn classify(signal: Signal, stop_requested: bool) -> Step {
    if stop_requested {
        return Step::Terminate;
    }
    if signal == WAKE_SIGNAL {
        return Step::DiscardWake;
    }
    match registry::lookup(signal as i32) {
        Some(spec) => Step::Dispatch(spec),
        None => Step::DiscardUnmapped,
    }
}

/// Why the wait loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    StopRequested,
    WaitFailed,
}

/// Run the wait loop until stop is requested or waiting keeps failing
pub(crate) fn run<W: SignalWait>(
    shared: &Shared,
    waiter: &mut W,
    config: &DispatcherConfig,
) -> LoopExit {
    info!("Signal worker waiting for signals");
    let mut failures = 0u32;

    loop {
        if shared.lifecycle.stop_requested() {
            return LoopExit::StopRequested;
        }

        let signal = match waiter.wait() {
            Ok(signal) => {
                failures = 0;
                signal
            }
            Err(errno) => {
                shared.stats.inc_wait_errors();
                failures += 1;
                if failures > config.wait_retries {
                    error!(errno = %errno, failures, "Signal wait failed, worker exiting");
                    return LoopExit::WaitFailed;
                }
                warn!(errno = %errno, "Signal wait failed, retrying");
                continue;
            }
        };
        shared.stats.inc_received();

        match classify(signal, shared.lifecycle.stop_requested()) {
            Step::Terminate => {
                debug!(signal = %signal, "Stop requested, leaving wait loop");
                return LoopExit::StopRequested;
            }
            Step::DiscardWake => {
                shared.stats.inc_wakes();
                debug!("Discarded wake signal");
            }
            Step::DiscardUnmapped => {
                shared.stats.inc_unmapped();
                debug!(signal = %signal, "Discarded unmapped signal");
            }
            Step::Dispatch(spec) => dispatch(shared, spec, config),
        }
    }
}

fn dispatch(shared: &Shared, spec: &SignalSpec, config: &DispatcherConfig) {
    // Clone the pointer out so the callback may replace itself
    match shared.callback.load_full() {
        Some(slot) => {
            debug!(signal = spec.name, critical = spec.critical, "Invoking signal callback");
            shared.stats.inc_invoked();
            (slot.0)(spec.signal, spec.critical);
        }
        None if spec.critical && config.fail_fast => terminate(shared, spec),
        None if spec.critical => {
            error!(signal = spec.name, "Unhandled critical signal, fail-fast disabled");
        }
        None => debug!(signal = spec.name, "No callback registered, ignoring"),
    }
}

/// Terminate the process with the status of `spec`'s signal
///
/// Restores the terminal first; nothing else gets to clean up.
fn terminate(shared: &Shared, spec: &SignalSpec) -> ! {
    error!(signal = spec.name, "Unhandled critical signal, terminating process");
    shared.restore_terminal();

    // SAFETY: resetting to SIG_DFL installs no handler code.
    if let Err(e) = unsafe { signal::signal(spec.signal, SigHandler::SigDfl) } {
        warn!(errno = %e, "Failed to reset signal disposition");
    }

    let mut own = SigSet::empty();
    own.add(spec.signal);
    if let Err(e) = own.thread_unblock() {
        warn!(errno = %e, "Failed to unblock signal on worker");
    }
    if let Err(e) = signal::raise(spec.signal) {
        warn!(errno = %e, "Failed to re-raise signal");
    }

    std::process::exit(128 + spec.number())
}
