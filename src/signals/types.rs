/*!
 * Signal Types
 * Lifecycle, status and statistics types for the dispatcher
 */

use nix::sys::signal::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatcher lifecycle, strictly forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Lifecycle {
    Idle = 0,
    Running = 1,
    StopRequested = 2,
    Stopped = 3,
}

impl Lifecycle {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Lifecycle::Idle,
            1 => Lifecycle::Running,
            2 => Lifecycle::StopRequested,
            _ => Lifecycle::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Idle => "idle",
            Lifecycle::Running => "running",
            Lifecycle::StopRequested => "stop_requested",
            Lifecycle::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful result of `stop()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    /// This call performed the stop
    Stopped,
    /// A previous call already did
    AlreadyStopped,
}

/// Outcome of blocking the registry signals on the calling thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskReport {
    pub blocked: Vec<Signal>,
    pub unblocked: Vec<Signal>,
}

impl MaskReport {
    /// Every registry signal is blocked
    pub fn is_complete(&self) -> bool {
        self.unblocked.is_empty()
    }
}

/// Scheduling policy for the worker thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedPolicy {
    /// Default time-sharing policy; level must be 0
    Other,
    /// Real-time first-in first-out
    Fifo,
    /// Real-time round robin
    RoundRobin,
}

impl SchedPolicy {
    pub fn as_raw(&self) -> libc::c_int {
        match self {
            SchedPolicy::Other => libc::SCHED_OTHER,
            SchedPolicy::Fifo => libc::SCHED_FIFO,
            SchedPolicy::RoundRobin => libc::SCHED_RR,
        }
    }

    pub fn is_realtime(&self) -> bool {
        !matches!(self, SchedPolicy::Other)
    }
}

/// Dispatch statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Signals returned by the wait primitive
    pub signals_received: u64,
    /// Callback invocations
    pub callbacks_invoked: u64,
    /// Wake signals dropped before dispatch
    pub wakes_filtered: u64,
    /// Signals outside the registry
    pub unmapped_discarded: u64,
    /// Failed waits
    pub wait_errors: u64,
}
