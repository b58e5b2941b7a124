/*!
 * Signal Dispatcher Library
 * Synchronous signal-to-callback dispatch for multi-threaded processes
 */

#[cfg(not(unix))]
compile_error!("sigdispatch relies on POSIX signal masks and is unix-only");

pub mod core;
pub mod monitoring;
pub mod signals;

// Re-exports
pub use crate::core::errors::{DispatcherError, Result};
pub use crate::core::sync::ShutdownToken;
pub use monitoring::init_tracing;
pub use signals::{
    mask_process_signals, Dispatcher, DispatcherConfig, Lifecycle, MaskReport, SchedPolicy,
    StopOutcome, TerminalSource,
};

// The signal type callbacks receive
pub use nix::sys::signal::Signal;
