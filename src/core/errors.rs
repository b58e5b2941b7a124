/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::guard::GuardError;
use miette::Diagnostic;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dispatcher errors with serialization support
///
/// `AlreadyStarted` and `AlreadyStopped` are lifecycle answers rather than
/// failures; callers usually log and move on.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum DispatcherError {
    #[error("Setup failed: {0}")]
    #[diagnostic(
        code(dispatcher::setup_failure),
        help("Signal masking or worker creation failed. Call mask_process_signals() before spawning threads.")
    )]
    SetupFailure(String),

    #[error("Dispatcher already started")]
    #[diagnostic(
        code(dispatcher::already_started),
        help("A dispatcher can only be started once.")
    )]
    AlreadyStarted,

    #[error("Dispatcher already stopped")]
    #[diagnostic(
        code(dispatcher::already_stopped),
        help("Dispatchers are single-use. Construct a new one to resume signal handling.")
    )]
    AlreadyStopped,

    #[error("Dispatcher not started")]
    #[diagnostic(
        code(dispatcher::not_started),
        help("Call start() before stopping the dispatcher or changing its priority.")
    )]
    NotStarted,

    #[error("Failed to wake signal worker: {0}")]
    #[diagnostic(
        code(dispatcher::wake_failed),
        help("The worker thread could not be signalled; it was left detached.")
    )]
    WakeFailed(String),

    #[error("Signal callback failed: {0}")]
    #[diagnostic(
        code(dispatcher::callback_failed),
        help("Callbacks must not panic; a panic unwinds and ends the signal worker.")
    )]
    CallbackFailed(String),

    #[error("Permission denied: {0}")]
    #[diagnostic(
        code(dispatcher::permission_denied),
        help("Real-time scheduling policies require CAP_SYS_NICE or root.")
    )]
    PermissionDenied(String),

    #[error("Scheduling change failed: {0}")]
    #[diagnostic(
        code(dispatcher::scheduling_failed),
        help("Check that the priority is valid for the chosen policy.")
    )]
    SchedulingFailed(String),

    #[error("Terminal error: {0}")]
    #[diagnostic(
        code(dispatcher::terminal),
        help("Terminal settings are best-effort; stdin may not be a TTY.")
    )]
    Terminal(String),

    #[error("Guard error: {0}")]
    #[diagnostic(code(dispatcher::guard))]
    Guard(#[from] GuardError),
}

impl DispatcherError {
    /// Setup failure caused by a failed system call
    pub fn setup(context: &str, errno: Errno) -> Self {
        DispatcherError::SetupFailure(format!("{}: {}", context, errno.desc()))
    }

    /// Terminal failure caused by a failed termios call
    pub fn terminal(context: &str, errno: Errno) -> Self {
        DispatcherError::Terminal(format!("{}: {}", context, errno.desc()))
    }

    /// Whether this error only reports lifecycle state
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            DispatcherError::AlreadyStarted
                | DispatcherError::AlreadyStopped
                | DispatcherError::NotStarted
        )
    }
}

/// Result type for dispatcher operations
pub type Result<T> = std::result::Result<T, DispatcherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatcher_error_serialization() {
        let error = DispatcherError::SetupFailure("pthread_sigmask".into());
        let json = serde_json::to_string(&error).unwrap();
        let deserialized: DispatcherError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn test_unit_variant_serialization() {
        let json = serde_json::to_string(&DispatcherError::AlreadyStopped).unwrap();
        assert_eq!(json, r#"{"error_type":"already_stopped"}"#);
    }

    #[test]
    fn test_setup_error_display() {
        let error = DispatcherError::setup("sigwait", Errno::EINVAL);
        assert_eq!(
            error.to_string(),
            format!("Setup failed: sigwait: {}", Errno::EINVAL.desc())
        );
    }

    #[test]
    fn test_lifecycle_classification() {
        assert!(DispatcherError::AlreadyStarted.is_lifecycle());
        assert!(DispatcherError::NotStarted.is_lifecycle());
        assert!(!DispatcherError::WakeFailed("ESRCH".into()).is_lifecycle());
    }

    #[test]
    fn test_guard_error_conversion() {
        let error: DispatcherError = GuardError::AlreadyReleased.into();
        assert!(matches!(error, DispatcherError::Guard(GuardError::AlreadyReleased)));
    }
}
