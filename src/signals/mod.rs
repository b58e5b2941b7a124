/*!
 * Signals Module
 * POSIX signal dispatch through a dedicated waiting thread
 */

pub mod atomic_stats;
pub mod dispatcher;
mod mask;
pub mod registry;
pub mod traits;
pub mod types;

// Re-export public API
pub use atomic_stats::AtomicDispatchStats;
pub use dispatcher::{
    classify, priority_range, Dispatcher, DispatcherBuilder, DispatcherConfig, LoopExit, Step,
    TerminalSource,
};
pub use mask::mask_process_signals;
pub use registry::{SignalSpec, REGISTRY, UNKNOWN, WAKE_SIGNAL};
pub use traits::SignalWait;
pub use types::{DispatchStats, Lifecycle, MaskReport, SchedPolicy, StopOutcome};
