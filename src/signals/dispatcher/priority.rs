/*!
 * Worker Scheduling
 * Scheduling policy and priority for the signal worker thread
 */

use crate::core::errors::{DispatcherError, Result};
use crate::signals::types::SchedPolicy;
use nix::errno::Errno;
use nix::sys::pthread::Pthread;
use tracing::{info, warn};

/// Apply `policy` at `level` to `thread`
///
/// Real-time policies need `CAP_SYS_NICE` (or root); without it the kernel
/// answers `EPERM`, reported as [`DispatcherError::PermissionDenied`].
pub(crate) fn apply(thread: Pthread, policy: SchedPolicy, level: i32) -> Result<()> {
    // SAFETY: sched_param is plain data; zeroing covers platform-specific padding fields.
    let mut param: libc::sched_param = unsafe { std::mem::zeroed() };
    param.sched_priority = level;

    // SAFETY: `thread` belongs to a worker that has not been joined yet.
    let ret = unsafe { libc::pthread_setschedparam(thread, policy.as_raw(), &param) };
    if ret == 0 {
        info!(policy = ?policy, level, "Updated signal worker scheduling");
        return Ok(());
    }

    let errno = Errno::from_raw(ret);
    warn!(policy = ?policy, level, errno = %errno, "Failed to update signal worker scheduling");
    Err(match errno {
        Errno::EPERM => DispatcherError::PermissionDenied(format!(
            "{:?} priority {} requires CAP_SYS_NICE",
            policy, level
        )),
        other => DispatcherError::SchedulingFailed(format!(
            "{:?} priority {}: {}",
            policy,
            level,
            other.desc()
        )),
    })
}

/// Valid priority range for `policy`
pub fn priority_range(policy: SchedPolicy) -> Option<(i32, i32)> {
    // SAFETY: pure queries on a policy constant.
    let (min, max) = unsafe {
        (
            libc::sched_get_priority_min(policy.as_raw()),
            libc::sched_get_priority_max(policy.as_raw()),
        )
    };
    (min >= 0 && max >= 0).then_some((min, max))
}
