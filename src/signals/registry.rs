/*!
 * Signal Registry
 * Fixed table of the signals the dispatcher waits on
 */

use nix::sys::signal::{SigSet, Signal};

/// Name reported for identifiers outside the registry
pub const UNKNOWN: &str = "UNKNOWN";

/// Signal used to wake a worker parked in `sigwait`
///
/// Registered so that it is part of the wait set, non-critical, and always
/// filtered before reaching a user callback.
pub const WAKE_SIGNAL: Signal = Signal::SIGUSR1;

/// Registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSpec {
    pub signal: Signal,
    pub name: &'static str,
    /// Unsafe to continue after this signal
    pub critical: bool,
}

impl SignalSpec {
    const fn new(signal: Signal, name: &'static str, critical: bool) -> Self {
        Self {
            signal,
            name,
            critical,
        }
    }

    /// Raw signal number
    pub fn number(&self) -> i32 {
        self.signal as i32
    }

    pub fn is_wake(&self) -> bool {
        self.signal == WAKE_SIGNAL
    }
}

/// Every signal the dispatcher handles
///
/// SEGV, BUS, FPE and ILL are only waitable when sent with `kill`/`raise`.
/// A genuine fault raised by an instruction on a thread that blocks them is
/// fatal per POSIX, so reporting them here is diagnostic only; the faulting
/// code is never resumed.
pub static REGISTRY: [SignalSpec; 10] = [
    SignalSpec::new(Signal::SIGINT, "SIGINT", false),
    SignalSpec::new(Signal::SIGTERM, "SIGTERM", false),
    SignalSpec::new(Signal::SIGQUIT, "SIGQUIT", false),
    SignalSpec::new(Signal::SIGHUP, "SIGHUP", false),
    SignalSpec::new(WAKE_SIGNAL, "SIGUSR1", false),
    SignalSpec::new(Signal::SIGSEGV, "SIGSEGV", true),
    SignalSpec::new(Signal::SIGBUS, "SIGBUS", true),
    SignalSpec::new(Signal::SIGFPE, "SIGFPE", true),
    SignalSpec::new(Signal::SIGILL, "SIGILL", true),
    SignalSpec::new(Signal::SIGABRT, "SIGABRT", true),
];

/// Look up a registry entry by raw signal number
#[inline]
pub fn lookup(signum: i32) -> Option<&'static SignalSpec> {
    REGISTRY.iter().find(|spec| spec.number() == signum)
}

/// Display name, or [`UNKNOWN`] for unmapped numbers
#[inline]
pub fn name_of(signum: i32) -> &'static str {
    lookup(signum).map_or(UNKNOWN, |spec| spec.name)
}

/// Criticality flag, `false` for unmapped numbers
#[inline]
pub fn is_critical(signum: i32) -> bool {
    lookup(signum).is_some_and(|spec| spec.critical)
}

/// All registered signals, in registry order
pub fn all_ids() -> impl Iterator<Item = Signal> {
    REGISTRY.iter().map(|spec| spec.signal)
}

/// Wait set built from the registry
pub fn signal_set() -> SigSet {
    let mut set = SigSet::empty();
    for signal in all_ids() {
        set.add(signal);
    }
    set
}

/// Parse `INT`, `SIGINT` or `sigint` into a registered signal
pub fn parse(name: &str) -> Option<Signal> {
    let upper = name.trim().to_ascii_uppercase();
    let full = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{}", upper)
    };
    REGISTRY
        .iter()
        .find(|spec| spec.name == full)
        .map(|spec| spec.signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_ids_unique() {
        for (i, a) in REGISTRY.iter().enumerate() {
            for b in &REGISTRY[i + 1..] {
                assert_ne!(a.signal, b.signal);
            }
        }
    }

    #[test]
    fn test_wake_signal_registered_non_critical() {
        let spec = lookup(WAKE_SIGNAL as i32).unwrap();
        assert!(spec.is_wake());
        assert!(!spec.critical);
    }

    #[test]
    fn test_names_match_nix() {
        for spec in &REGISTRY {
            assert_eq!(spec.name, spec.signal.as_str());
        }
    }

    #[test]
    fn test_criticality() {
        assert!(!is_critical(Signal::SIGINT as i32));
        assert!(is_critical(Signal::SIGSEGV as i32));
        assert!(is_critical(Signal::SIGABRT as i32));
        assert!(!is_critical(Signal::SIGCHLD as i32));
    }

    #[test]
    fn test_signal_set_contents() {
        let set = signal_set();
        assert!(all_ids().all(|s| set.contains(s)));
        assert!(!set.contains(Signal::SIGCHLD));
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse("INT"), Some(Signal::SIGINT));
        assert_eq!(parse("sigterm"), Some(Signal::SIGTERM));
        assert_eq!(parse(" SEGV "), Some(Signal::SIGSEGV));
        assert_eq!(parse("CHLD"), None);
    }
}
