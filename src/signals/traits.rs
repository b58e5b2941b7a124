/*!
 * Signal Traits
 * Seam between the worker loop and the wait primitive
 */

use nix::sys::signal::{SigSet, Signal};

/// Synchronous signal source for the worker loop
pub trait SignalWait: Send {
    /// Block until a signal is available and return it
    fn wait(&mut self) -> nix::Result<Signal>;
}

/// `sigwait(3)` over the set; the set must be blocked on the calling thread
impl SignalWait for SigSet {
    fn wait(&mut self) -> nix::Result<Signal> {
        SigSet::wait(&*self)
    }
}
