/*!
 * Dispatcher Lifecycle Tests
 * Start/stop state machine, idempotence and terminal restore
 *
 * No signals are sent to the process here: the test harness owns threads
 * that do not block them. Delivery is covered by `process_signals`.
 */

use nix::pty::openpty;
use nix::sys::termios::{tcgetattr, LocalFlags};
use pretty_assertions::assert_eq;
use serial_test::serial;
use sigdispatch::{
    Dispatcher, DispatcherConfig, DispatcherError, Lifecycle, SchedPolicy, StopOutcome,
    TerminalSource,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn quiet() -> Dispatcher {
    Dispatcher::builder()
        .terminal(TerminalSource::Disabled)
        .build()
}

#[test]
#[serial]
fn test_stop_is_idempotent() {
    let dispatcher = quiet();
    dispatcher.start().unwrap();
    assert_eq!(dispatcher.lifecycle(), Lifecycle::Running);
    assert!(dispatcher.is_worker_alive());

    assert_eq!(dispatcher.stop(), Ok(StopOutcome::Stopped));
    assert_eq!(dispatcher.stop(), Ok(StopOutcome::AlreadyStopped));
    assert_eq!(dispatcher.lifecycle(), Lifecycle::Stopped);
    assert!(!dispatcher.is_worker_alive());
}

#[test]
#[serial]
fn test_wake_signal_counted_not_dispatched() {
    let dispatcher = quiet();
    dispatcher.set_callback(|signal, _| panic!("callback invoked for {}", signal));
    dispatcher.start().unwrap();
    dispatcher.stop().unwrap();

    let stats = dispatcher.stats();
    assert_eq!(stats.callbacks_invoked, 0);
    assert!(stats.signals_received <= 1);
}

#[test]
fn test_stop_never_started_does_not_block() {
    let dispatcher = quiet();
    let started = Instant::now();
    assert_eq!(dispatcher.stop(), Err(DispatcherError::NotStarted));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(dispatcher.lifecycle(), Lifecycle::Idle);
}

#[test]
#[serial]
fn test_single_use() {
    let dispatcher = quiet();
    dispatcher.start().unwrap();
    assert_eq!(dispatcher.start(), Err(DispatcherError::AlreadyStarted));

    dispatcher.stop().unwrap();
    assert_eq!(dispatcher.start(), Err(DispatcherError::AlreadyStopped));
    assert_eq!(dispatcher.lifecycle(), Lifecycle::Stopped);
}

#[test]
#[serial]
fn test_concurrent_stop_joins_once() {
    let dispatcher = Arc::new(quiet());
    dispatcher.start().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let d = Arc::clone(&dispatcher);
            thread::spawn(move || d.stop())
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let stopped = outcomes
        .iter()
        .filter(|o| **o == Ok(StopOutcome::Stopped))
        .count();
    assert_eq!(stopped, 1);
    assert!(outcomes.iter().all(|o| o.is_ok()));

    // Every caller has returned; the winner joined the worker
    assert_eq!(dispatcher.lifecycle(), Lifecycle::Stopped);
    assert!(!dispatcher.is_worker_alive());
}

#[test]
#[serial]
fn test_concurrent_stop_returns_after_join() {
    for _ in 0..20 {
        let dispatcher = Arc::new(quiet());
        dispatcher.start().unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let d = Arc::clone(&dispatcher);
                thread::spawn(move || {
                    let outcome = d.stop();
                    (outcome, d.lifecycle(), d.is_worker_alive())
                })
            })
            .collect();

        for handle in handles {
            let (outcome, lifecycle, alive) = handle.join().unwrap();
            assert!(outcome.is_ok());
            assert_eq!(lifecycle, Lifecycle::Stopped);
            assert!(!alive);
        }
    }
}

#[test]
#[serial]
fn test_drop_stops_running_dispatcher() {
    let dispatcher = quiet();
    dispatcher.start().unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    thread::spawn(move || {
        drop(dispatcher);
        let _ = tx.send(());
    });
    rx.recv_timeout(Duration::from_secs(5))
        .expect("drop did not finish");
}

#[test]
#[serial]
fn test_callback_replaced_while_running() {
    let dispatcher = quiet();
    dispatcher.start().unwrap();

    for i in 0..100 {
        dispatcher.set_callback(move |_, _| {
            let _ = i;
        });
    }
    assert!(dispatcher.has_callback());
    assert_eq!(dispatcher.stop(), Ok(StopOutcome::Stopped));
}

#[test]
#[serial]
fn test_priority_while_running() {
    let dispatcher = quiet();
    dispatcher.start().unwrap();

    assert_eq!(dispatcher.set_priority(SchedPolicy::Other, 0), Ok(()));
    match dispatcher.set_priority(SchedPolicy::Fifo, 10) {
        Ok(()) | Err(DispatcherError::PermissionDenied(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }

    dispatcher.stop().unwrap();
    assert_eq!(
        dispatcher.set_priority(SchedPolicy::Other, 0),
        Err(DispatcherError::NotStarted)
    );
}

#[test]
#[serial]
fn test_terminal_round_trip() {
    let pty = openpty(None, None).unwrap();
    let before = tcgetattr(&pty.slave).unwrap().local_flags;

    let dispatcher = Dispatcher::builder()
        .terminal(TerminalSource::Fd(pty.slave.try_clone().unwrap()))
        .build();
    dispatcher.start().unwrap();

    let during = tcgetattr(&pty.slave).unwrap().local_flags;
    assert!(!during.contains(LocalFlags::ECHOCTL));

    dispatcher.stop().unwrap();
    let after = tcgetattr(&pty.slave).unwrap().local_flags;
    assert_eq!(after, before);
}

#[test]
#[serial]
fn test_terminal_management_disabled_by_config() {
    let pty = openpty(None, None).unwrap();
    let before = tcgetattr(&pty.slave).unwrap().local_flags;

    let dispatcher = Dispatcher::builder()
        .config(DispatcherConfig {
            manage_terminal: false,
            ..DispatcherConfig::default()
        })
        .terminal(TerminalSource::Fd(pty.slave.try_clone().unwrap()))
        .build();
    dispatcher.start().unwrap();

    assert_eq!(tcgetattr(&pty.slave).unwrap().local_flags, before);
    dispatcher.stop().unwrap();
}
