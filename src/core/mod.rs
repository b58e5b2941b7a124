/*!
 * Core Module
 * Error handling, resource guards and synchronization shared by the dispatcher
 */

pub mod errors;
pub mod guard;
pub mod sync;

// Re-export for convenience
pub use errors::*;
pub use guard::{Guard, GuardError, GuardResult, TerminalGuard};
pub use sync::ShutdownToken;
