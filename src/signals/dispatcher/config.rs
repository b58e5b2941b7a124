/*!
 * Dispatcher Configuration
 *
 * Runtime configuration and builder for the signal dispatcher
 */

use super::Dispatcher;
use nix::sys::signal::Signal;
use std::os::fd::OwnedFd;
use std::str::FromStr;
use tracing::warn;

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Name of the worker thread
    pub thread_name: String,
    /// Consecutive wait failures tolerated before the worker gives up
    pub wait_retries: u32,
    /// Snapshot the terminal on start and restore it on stop
    pub manage_terminal: bool,
    /// Terminate the process on a critical signal when no callback is set
    pub fail_fast: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            thread_name: "signal-dispatcher".to_string(),
            wait_retries: 1,
            manage_terminal: true,
            fail_fast: true,
        }
    }
}

impl DispatcherConfig {
    /// Configuration from the environment
    ///
    /// Environment variables:
    /// - SIGDISPATCH_WAIT_RETRIES: Wait failures tolerated (default: 1)
    /// - SIGDISPATCH_MANAGE_TERMINAL: Touch terminal settings (default: true)
    /// - SIGDISPATCH_FAIL_FAST: Terminate on unhandled critical signals (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            wait_retries: parse_or(&lookup, "SIGDISPATCH_WAIT_RETRIES", defaults.wait_retries),
            manage_terminal: parse_flag_or(
                &lookup,
                "SIGDISPATCH_MANAGE_TERMINAL",
                defaults.manage_terminal,
            ),
            fail_fast: parse_flag_or(&lookup, "SIGDISPATCH_FAIL_FAST", defaults.fail_fast),
            ..defaults
        }
    }
}

fn parse_or<T: FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }),
        None => default,
    }
}

fn parse_flag_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).as_deref().map(str::trim) {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        Some(raw) => {
            warn!(key, value = raw, "Invalid configuration flag, using default");
            default
        }
        None => default,
    }
}

/// Terminal whose settings the dispatcher manages
#[derive(Debug)]
pub enum TerminalSource {
    Stdin,
    Fd(OwnedFd),
    Disabled,
}

/// Builder for [`Dispatcher`]
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    terminal: TerminalSource,
    callback: Option<Box<dyn Fn(Signal, bool) + Send + Sync>>,
}

impl DispatcherBuilder {
    pub(super) fn new() -> Self {
        Self {
            config: DispatcherConfig::default(),
            terminal: TerminalSource::Stdin,
            callback: None,
        }
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    pub fn wait_retries(mut self, retries: u32) -> Self {
        self.config.wait_retries = retries;
        self
    }

    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.config.fail_fast = enabled;
        self
    }

    pub fn terminal(mut self, source: TerminalSource) -> Self {
        self.terminal = source;
        self
    }

    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Signal, bool) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher::from_parts(self.config, self.terminal, self.callback)
    }
}
