/*!
 * RAII Resource Guards
 *
 * Scoped process resources that are released on every exit path.
 *
 * ## Guard Types
 *
 * - **TerminalGuard**: Terminal settings snapshot, restored on release or drop
 *
 * ## Example
 *
 * ```rust,no_run
 * use sigdispatch::core::guard::{Guard, TerminalGuard};
 *
 * let mut guard = TerminalGuard::stdin()?;
 * guard.suppress_control_echo()?;
 * // ... terminal no longer echoes ^C ...
 * guard.release()?; // Or restored automatically on drop
 * # Ok::<(), sigdispatch::DispatcherError>(())
 * ```
 */

mod terminal;
mod traits;

pub use terminal::TerminalGuard;
pub use traits::Guard;

use serde::{Deserialize, Serialize};

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum GuardError {
    #[error("Resource already released")]
    AlreadyReleased,

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}
