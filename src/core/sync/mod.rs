/*!
 * Synchronization Primitives
 *
 * Coordination between the signal worker and the threads it serves.
 */

mod shutdown;

pub use shutdown::ShutdownToken;
