/*!
 * Signal Dispatcher
 * Dedicated worker thread turning blocked signals into callback invocations
 */

mod config;
mod lifecycle;
mod priority;
mod worker;

pub use config::{DispatcherBuilder, DispatcherConfig, TerminalSource};
pub use priority::priority_range;
pub use worker::{classify, LoopExit, Step};

use crate::core::errors::{DispatcherError, Result};
use crate::core::guard::TerminalGuard;
use crate::signals::registry::{self, WAKE_SIGNAL};
use crate::signals::types::{DispatchStats, Lifecycle, SchedPolicy, StopOutcome};
use nix::errno::Errno;
use nix::sys::pthread::{pthread_kill, Pthread};
use nix::sys::signal::Signal;
use parking_lot::Mutex;
use std::any::Any;
use std::os::unix::thread::JoinHandleExt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};
use worker::{CallbackSlot, Shared};

/// Handle to the running worker thread
struct Worker {
    handle: JoinHandle<LoopExit>,
}

impl Worker {
    fn pthread(&self) -> Pthread {
        self.handle.as_pthread_t() as Pthread
    }

    fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Synchronous signal-to-callback dispatcher
///
/// Call [`mask_process_signals`](crate::signals::mask_process_signals) in
/// `main` before spawning threads, then [`start`](Self::start) the
/// dispatcher. One worker thread waits on the registry signals and invokes
/// the callback with `(signal, critical)`; it is the only thread that ever
/// runs the callback.
///
/// A dispatcher is single-use: once stopped it cannot be restarted.
///
/// # Callback contract
///
/// - Runs on the worker; a slow callback delays later signals, which the
///   kernel keeps pending (coalescing repeats of the same signal).
/// - Must not panic. A panic ends the worker and surfaces from `stop()` as
///   [`DispatcherError::CallbackFailed`].
/// - May call `stop()` on its own dispatcher; the join is then deferred to
///   the next `stop()` or drop from another thread.
/// - With no callback registered, a critical signal terminates the process.
pub struct Dispatcher {
    shared: Arc<Shared>,
    config: DispatcherConfig,
    terminal_source: Mutex<Option<TerminalSource>>,
    worker: Mutex<Option<Worker>>,
    /// Held by whichever `stop()` is joining the worker
    join_lock: Mutex<()>,
}

impl Dispatcher {
    /// Idle dispatcher with default configuration and no callback
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Idle dispatcher with default configuration and `callback`
    pub fn with_callback<F>(callback: F) -> Self
    where
        F: Fn(Signal, bool) + Send + Sync + 'static,
    {
        Self::builder().callback(callback).build()
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub(crate) fn from_parts(
        config: DispatcherConfig,
        terminal: TerminalSource,
        callback: Option<Box<dyn Fn(Signal, bool) + Send + Sync>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared::new(callback.map(CallbackSlot))),
            config,
            terminal_source: Mutex::new(Some(terminal)),
            worker: Mutex::new(None),
            join_lock: Mutex::new(()),
        }
    }

    /// Replace the callback
    ///
    /// Takes effect atomically: each dispatch sees either the previous or the
    /// new callback in full. Legal in every lifecycle state and cannot fail,
    /// so there is no status to return.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(Signal, bool) + Send + Sync + 'static,
    {
        self.shared
            .callback
            .store(Some(Arc::new(CallbackSlot(Box::new(callback)))));
        debug!("Signal callback replaced");
    }

    /// Remove the callback; critical signals then take the fail-fast path
    pub fn clear_callback(&self) {
        self.shared.callback.store(None);
        debug!("Signal callback cleared");
    }

    pub fn has_callback(&self) -> bool {
        self.shared.callback.load().is_some()
    }

    /// Start the worker thread
    ///
    /// Snapshots the terminal (best effort), blocks the registry signals on
    /// the calling thread so the worker inherits them, and spawns the worker.
    pub fn start(&self) -> Result<()> {
        self.shared
            .lifecycle
            .transition(Lifecycle::Idle, Lifecycle::Running)
            .map_err(|current| match current {
                Lifecycle::Stopped => DispatcherError::AlreadyStopped,
                _ => DispatcherError::AlreadyStarted,
            })?;

        self.capture_terminal();

        let set = registry::signal_set();
        if let Err(e) = set.thread_block() {
            warn!(errno = %e, "Failed to block signals on starting thread");
        }

        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        // Held until the handle is stored; a callback may already be running
        let mut slot = self.worker.lock();
        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || {
                let _ = shared.worker_thread.set(thread::current().id());
                let mut waiter = set;
                if let Err(e) = waiter.thread_block() {
                    error!(errno = %e, "Failed to block signals on worker");
                }
                worker::run(&shared, &mut waiter, &config)
            });

        match spawned {
            Ok(handle) => {
                *slot = Some(Worker { handle });
                drop(slot);
                info!(thread = %self.config.thread_name, "Signal dispatcher started");
                Ok(())
            }
            Err(e) => {
                drop(slot);
                self.shared.restore_terminal();
                self.shared.lifecycle.advance(Lifecycle::Stopped);
                Err(DispatcherError::SetupFailure(format!(
                    "spawn signal worker: {}",
                    e
                )))
            }
        }
    }

    /// Stop the worker, join it and restore the terminal
    ///
    /// Blocks until the worker exits. Returns `AlreadyStopped` on every call
    /// after the first, and `NotStarted` without blocking when the dispatcher
    /// never ran. Concurrent callers all return only once the worker has been
    /// joined.
    pub fn stop(&self) -> Result<StopOutcome> {
        match self
            .shared
            .lifecycle
            .transition(Lifecycle::Running, Lifecycle::StopRequested)
        {
            Ok(()) => {}
            Err(Lifecycle::Idle) => return Err(DispatcherError::NotStarted),
            Err(_) => {
                self.reap()?;
                return Ok(StopOutcome::AlreadyStopped);
            }
        }

        info!("Stopping signal dispatcher");
        if self.shared.on_worker() {
            // Cannot join ourselves; the loop exits once the callback returns
            debug!("stop() called from signal worker, join deferred");
            self.shared.restore_terminal();
            return Ok(StopOutcome::Stopped);
        }

        let _joining = self.join_lock.lock();
        let worker = self.worker.lock().take();

        let joined = worker.map_or(Ok(()), |w| self.shutdown_worker(w));
        self.shared.restore_terminal();
        if !matches!(joined, Err(DispatcherError::WakeFailed(_))) {
            self.shared.lifecycle.advance(Lifecycle::Stopped);
        }

        joined.map(|()| {
            info!("Signal dispatcher stopped");
            StopOutcome::Stopped
        })
    }

    /// Set the worker's scheduling policy and priority
    pub fn set_priority(&self, policy: SchedPolicy, level: i32) -> Result<()> {
        let slot = self.worker.lock();
        let worker = slot
            .as_ref()
            .filter(|w| w.is_alive())
            .ok_or(DispatcherError::NotStarted)?;
        priority::apply(worker.pthread(), policy, level)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lifecycle.load()
    }

    /// Whether the worker thread is still running
    pub fn is_worker_alive(&self) -> bool {
        self.worker.lock().as_ref().is_some_and(Worker::is_alive)
    }

    pub fn stats(&self) -> DispatchStats {
        self.shared.stats.snapshot()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Registry name of `signum`, `"UNKNOWN"` if unmapped
    pub fn signal_name(signum: i32) -> &'static str {
        registry::name_of(signum)
    }

    fn capture_terminal(&self) {
        let source = self.terminal_source.lock().take();
        if !self.config.manage_terminal {
            return;
        }

        let captured = match source {
            Some(TerminalSource::Stdin) => TerminalGuard::stdin(),
            Some(TerminalSource::Fd(fd)) => TerminalGuard::capture(fd),
            Some(TerminalSource::Disabled) | None => return,
        };

        match captured {
            Ok(guard) => {
                if let Err(e) = guard.suppress_control_echo() {
                    warn!(error = %e, "Failed to suppress control character echo");
                }
                *self.shared.terminal.lock() = Some(guard);
            }
            Err(e) => debug!(error = %e, "Terminal snapshot unavailable, restore disabled"),
        }
    }

    /// Wake the worker out of `sigwait` and join it
    fn shutdown_worker(&self, worker: Worker) -> Result<()> {
        if worker.is_alive() {
            match pthread_kill(worker.pthread(), WAKE_SIGNAL) {
                // Exited between the check and the kill
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => {
                    error!(errno = %e, "Failed to wake signal worker, detaching it");
                    return Err(DispatcherError::WakeFailed(e.desc().to_string()));
                }
            }
        }

        match worker.handle.join() {
            Ok(exit) => {
                debug!(exit = ?exit, "Signal worker joined");
                Ok(())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "Signal callback panicked");
                Err(DispatcherError::CallbackFailed(message))
            }
        }
    }

    /// Join a worker whose stop was already requested
    ///
    /// Waits for a concurrent `stop()` that is still joining.
    fn reap(&self) -> Result<()> {
        if self.shared.on_worker() {
            return Ok(());
        }

        let _joining = self.join_lock.lock();
        let worker = self.worker.lock().take();

        if let Some(worker) = worker {
            let joined = self.shutdown_worker(worker);
            self.shared.restore_terminal();
            self.shared.lifecycle.advance(Lifecycle::Stopped);
            joined?;
        }
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        let result = match self.lifecycle() {
            Lifecycle::Idle => return,
            Lifecycle::Running => self.stop().map(|_| ()),
            Lifecycle::StopRequested | Lifecycle::Stopped => self.reap(),
        };
        match result {
            Err(e) if !e.is_lifecycle() => {
                warn!(error = %e, "Signal dispatcher shutdown on drop failed")
            }
            _ => {}
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
