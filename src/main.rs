/*!
 * Signal Dispatcher Demo
 *
 * Runs a small pool of worker threads and shuts them down gracefully when
 * the dispatcher reports a signal:
 * - Masks the dispatcher signals before any thread exists
 * - Routes every signal through one callback on the dispatcher thread
 * - Stops the dispatcher and joins the pool on request
 */

use clap::{Parser, ValueEnum};
use sigdispatch::signals::registry;
use sigdispatch::{
    init_tracing, mask_process_signals, Dispatcher, DispatcherConfig, SchedPolicy, ShutdownToken,
    Signal,
};
use std::hint::black_box;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Other,
    Fifo,
    Rr,
}

impl From<PolicyArg> for SchedPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Other => SchedPolicy::Other,
            PolicyArg::Fifo => SchedPolicy::Fifo,
            PolicyArg::Rr => SchedPolicy::RoundRobin,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "sigdispatch-demo", about = "Graceful shutdown driven by a signal dispatcher")]
struct Args {
    /// Worker threads emulating application load
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Run without a callback (critical signals then terminate the process)
    #[arg(long)]
    no_callback: bool,

    /// Send this signal to the process once everything is running (e.g. INT, SEGV)
    #[arg(long, value_parser = parse_signal)]
    raise: Option<Signal>,

    /// Scheduling priority for the dispatcher thread
    #[arg(long)]
    priority: Option<i32>,

    /// Scheduling policy used with --priority
    #[arg(long, value_enum, default_value_t = PolicyArg::Other)]
    policy: PolicyArg,

    /// Give up waiting for a signal after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print dispatch statistics as JSON on exit
    #[arg(long)]
    stats_json: bool,
}

fn parse_signal(raw: &str) -> Result<Signal, String> {
    registry::parse(raw).ok_or_else(|| format!("not a dispatcher signal: {}", raw))
}

fn worker_loop(id: usize, shutdown: ShutdownToken) {
    debug!(worker = id, "Worker started");
    while !shutdown.is_requested() {
        // Simulate some work
        let mut acc = 0u64;
        for i in 0..1_000_000u64 {
            acc = black_box(acc.wrapping_add(i));
        }
        shutdown.wait_timeout(Duration::from_millis(100));
    }
    debug!(worker = id, "Worker finished");
}

fn main() -> ExitCode {
    // Must run before any other thread exists
    let mask = match mask_process_signals() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("failed to mask signals: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let args = Args::parse();
    init_tracing();

    if !mask.is_complete() {
        error!(missing = ?mask.unblocked, "Signal mask incomplete, aborting startup");
        return ExitCode::FAILURE;
    }

    let shutdown = ShutdownToken::new();
    let critical_seen = Arc::new(AtomicBool::new(false));
    let dispatcher = Dispatcher::builder()
        .config(DispatcherConfig::from_env())
        .build();

    if !args.no_callback {
        let token = shutdown.clone();
        let critical_flag = Arc::clone(&critical_seen);
        dispatcher.set_callback(move |signal, critical| {
            let name = registry::name_of(signal as i32);
            if critical {
                error!(signal = name, "Caught critical signal, stopping");
                critical_flag.store(true, Ordering::SeqCst);
            } else {
                info!(signal = name, "Caught signal, stopping gracefully");
            }
            token.request();
        });
    }

    if let Err(e) = dispatcher.start() {
        error!(error = %e, "Failed to start signal dispatcher");
        return ExitCode::FAILURE;
    }

    if let Some(level) = args.priority {
        if let Err(e) = dispatcher.set_priority(args.policy.into(), level) {
            warn!(error = %e, "Continuing with default scheduling");
        }
    }

    let workers: Vec<_> = (0..args.workers)
        .map(|id| {
            let token = shutdown.clone();
            thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, token))
        })
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to spawn worker");
            shutdown.request();
            Vec::new()
        });
    info!(workers = workers.len(), "Workers running, press Ctrl+C to stop");

    if let Some(signal) = args.raise {
        info!(signal = %signal, "Sending signal to self");
        if let Err(e) = nix::sys::signal::kill(nix::unistd::getpid(), signal) {
            error!(errno = %e, "Failed to send signal");
            shutdown.request();
        }
    }

    match args.timeout_ms {
        Some(ms) => {
            if !shutdown.wait_timeout(Duration::from_millis(ms)) {
                warn!(timeout_ms = ms, "No signal received before timeout");
                shutdown.request();
            }
        }
        None => shutdown.wait(),
    }

    if let Err(e) = dispatcher.stop() {
        error!(error = %e, "Failed to stop signal dispatcher");
    }

    info!("Waiting for worker threads to finish");
    for worker in workers {
        if worker.join().is_err() {
            error!("Worker thread panicked");
        }
    }

    if args.stats_json {
        match serde_json::to_string(&dispatcher.stats()) {
            Ok(json) => println!("{}", json),
            Err(e) => error!(error = %e, "Failed to serialize stats"),
        }
    }

    info!("All threads stopped, exiting");
    if critical_seen.load(Ordering::SeqCst) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
