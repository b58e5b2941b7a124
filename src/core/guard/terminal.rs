/*!
 * Terminal Guards
 *
 * RAII guard for terminal settings with automatic restore
 */

use super::traits::Guard;
use super::{GuardError, GuardResult};
use crate::core::errors::{DispatcherError, Result};
use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg, Termios};
use std::os::fd::{AsFd, OwnedFd};
use tracing::{debug, error};

/// Terminal settings guard
///
/// Snapshots the termios state of a terminal on capture and writes it back
/// on release. The guard owns a duplicate of the descriptor, so the original
/// may be closed independently.
pub struct TerminalGuard {
    fd: OwnedFd,
    saved: Termios,
    active: bool,
}

impl TerminalGuard {
    /// Capture the current settings of the terminal behind `fd`
    pub fn capture(fd: OwnedFd) -> Result<Self> {
        let saved = tcgetattr(&fd).map_err(|e| DispatcherError::terminal("tcgetattr", e))?;
        debug!("Captured terminal settings");
        Ok(Self {
            fd,
            saved,
            active: true,
        })
    }

    /// Capture the settings of standard input
    pub fn stdin() -> Result<Self> {
        let fd = std::io::stdin()
            .as_fd()
            .try_clone_to_owned()
            .map_err(|e| DispatcherError::Terminal(format!("dup stdin: {}", e)))?;
        Self::capture(fd)
    }

    /// Stop the terminal from echoing control characters such as `^C`
    pub fn suppress_control_echo(&self) -> Result<()> {
        let mut quiet = self.saved.clone();
        #[cfg(not(target_os = "redox"))]
        quiet.local_flags.remove(LocalFlags::ECHOCTL);
        tcsetattr(&self.fd, SetArg::TCSANOW, &quiet)
            .map_err(|e| DispatcherError::terminal("tcsetattr", e))
    }

    /// Settings captured when the guard was created
    pub fn saved(&self) -> &Termios {
        &self.saved
    }
}

impl Guard for TerminalGuard {
    fn resource_type(&self) -> &'static str {
        "terminal"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn release(&mut self) -> GuardResult<()> {
        if !self.active {
            return Err(GuardError::AlreadyReleased);
        }

        self.active = false;
        tcsetattr(&self.fd, SetArg::TCSANOW, &self.saved)
            .map_err(|e| GuardError::OperationFailed(format!("tcsetattr: {}", e.desc())))?;

        debug!("Restored terminal settings");
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.release() {
                error!(error = %e, "Terminal guard drop failed");
            }
        }
    }
}
