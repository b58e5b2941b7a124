/*!
 * Monitoring
 * Structured logging setup for binaries embedding the dispatcher
 */

mod tracer;

pub use tracer::init_tracing;
