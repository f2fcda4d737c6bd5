// Author: Dustin Pilgrim
// License: MIT

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use tokio::time::{sleep, Duration};

use super::*;
use crate::core::{
    config::{IdlePolicy, PauseClock},
    error::{ConfigError, ExtendError, StateError},
    state::Phase,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn counter(handle: &TimerHandle, kind: ObserverKind) -> (Arc<AtomicUsize>, Subscription) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let cb = move |_: &TimerSnapshot| {
        c.fetch_add(1, Ordering::SeqCst);
    };
    let sub = match kind {
        ObserverKind::Idle => handle.on_idle(cb),
        ObserverKind::Active => handle.on_active(cb),
    };
    (count, sub)
}

#[tokio::test(start_paused = true)]
async fn goes_idle_at_the_deadline_and_notifies_once() {
    let timer = SessionTimer::spawn(TimerConfig::new(900_000)).unwrap();
    let handle = timer.handle().clone();
    let (idle, _sub) = counter(&handle, ObserverKind::Idle);

    sleep(ms(899_999)).await;
    assert!(!handle.state().is_idle);
    assert_eq!(idle.load(Ordering::SeqCst), 0);

    sleep(ms(2)).await;
    let s = handle.state();
    assert!(s.is_idle);
    assert_eq!(s.remaining_ms, 0);
    assert_eq!(idle.load(Ordering::SeqCst), 1);

    sleep(ms(600_000)).await;
    assert_eq!(idle.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn activity_moves_the_deadline() {
    let timer = SessionTimer::spawn(TimerConfig::new(900_000)).unwrap();
    let handle = timer.handle().clone();

    sleep(ms(890_000)).await;
    handle.record_activity(SignalKind::KeyPress).await.unwrap();

    sleep(ms(20_000)).await;
    let s = handle.state();
    assert_eq!(s.phase, Phase::Active);
    assert_eq!(s.deadline_ms, Some(1_790_000));

    sleep(ms(880_001)).await;
    assert!(handle.state().is_idle);
}

#[tokio::test(start_paused = true)]
async fn activity_revives_an_idle_session() {
    let timer = SessionTimer::spawn(TimerConfig::new(10_000)).unwrap();
    let handle = timer.handle().clone();
    let (active, _sub) = counter(&handle, ObserverKind::Active);

    sleep(ms(10_001)).await;
    assert!(handle.state().is_idle);

    handle.record_activity(SignalKind::PointerMove).await.unwrap();
    sleep(ms(1)).await;

    let s = handle.state();
    assert_eq!(s.phase, Phase::Active);
    assert_eq!(active.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_the_deadline() {
    let timer = SessionTimer::spawn(TimerConfig::new(10_000)).unwrap();
    let handle = timer.handle().clone();
    let (idle, _sub) = counter(&handle, ObserverKind::Idle);

    sleep(ms(5_000)).await;
    let s = handle.stop().await.unwrap();
    assert_eq!(s.phase, Phase::Stopped);
    assert_eq!(s.remaining_ms, 10_000);

    sleep(ms(60_000)).await;
    assert_eq!(handle.state().phase, Phase::Stopped);
    assert_eq!(idle.load(Ordering::SeqCst), 0);

    // Stopping twice is harmless.
    assert!(handle.stop().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn running_pause_keeps_the_original_deadline() {
    let timer = SessionTimer::spawn(TimerConfig::new(900_000)).unwrap();
    let handle = timer.handle().clone();

    sleep(ms(100_000)).await;
    let paused = handle.pause().await.unwrap();
    assert_eq!(paused.phase, Phase::Paused);
    assert_eq!(paused.remaining_ms, 800_000);

    sleep(ms(400_000)).await;
    assert_eq!(handle.state().phase, Phase::Paused);

    let resumed = handle.resume().await.unwrap();
    assert_eq!(resumed.phase, Phase::Active);
    assert_eq!(resumed.deadline_ms, Some(900_000));
}

#[tokio::test(start_paused = true)]
async fn frozen_pause_carries_the_remaining_time() {
    let mut cfg = TimerConfig::new(900_000);
    cfg.pause_clock = PauseClock::Frozen;
    let timer = SessionTimer::spawn(cfg).unwrap();
    let handle = timer.handle().clone();

    sleep(ms(100_000)).await;
    handle.pause().await.unwrap();
    sleep(ms(400_000)).await;

    let resumed = handle.resume().await.unwrap();
    assert_eq!(resumed.deadline_ms, Some(1_300_000));

    sleep(ms(799_999)).await;
    assert!(!handle.state().is_idle);
    sleep(ms(2)).await;
    assert!(handle.state().is_idle);
}

#[tokio::test(start_paused = true)]
async fn invalid_pause_and_resume_are_rejected() {
    let timer = SessionTimer::spawn(TimerConfig::new(60_000)).unwrap();
    let handle = timer.handle();

    assert_eq!(
        handle.resume().await,
        Err(Error::InvalidState(StateError::NotPaused))
    );

    handle.pause().await.unwrap();
    assert_eq!(
        handle.pause().await,
        Err(Error::InvalidState(StateError::AlreadyPaused))
    );
    assert_eq!(handle.state().phase, Phase::Paused);
}

#[tokio::test(start_paused = true)]
async fn extend_success_waits_for_confirmation() {
    let cfg = TimerConfig::new(60_000);
    let timer = SessionTimer::builder(cfg)
        .extender(|| async {
            sleep(Duration::from_secs(5)).await;
            Ok::<(), ExtendError>(())
        })
        .spawn()
        .unwrap();
    let handle = timer.handle().clone();

    sleep(ms(10_000)).await;

    let pending = tokio::spawn({
        let handle = handle.clone();
        async move { handle.extend().await }
    });

    sleep(ms(1_000)).await;
    assert_eq!(handle.state().deadline_ms, Some(60_000));

    let extended = pending.await.unwrap().unwrap();
    assert_eq!(extended.deadline_ms, Some(75_000));
    assert_eq!(extended.last_active_ms, 15_000);
}

#[tokio::test(start_paused = true)]
async fn activity_during_pending_extend_resets_on_its_own() {
    let timer = SessionTimer::builder(TimerConfig::new(60_000))
        .extender(|| async {
            sleep(Duration::from_secs(5)).await;
            Ok::<(), ExtendError>(())
        })
        .spawn()
        .unwrap();
    let handle = timer.handle().clone();

    let pending = tokio::spawn({
        let handle = handle.clone();
        async move { handle.extend().await }
    });

    sleep(ms(1_000)).await;
    handle.record_activity(SignalKind::KeyPress).await.unwrap();
    sleep(ms(1)).await;

    let s = handle.state();
    assert!(!pending.is_finished());
    assert_eq!(s.last_active_ms, 1_000);
    assert_eq!(s.deadline_ms, Some(61_000));

    let extended = pending.await.unwrap().unwrap();
    assert_eq!(extended.last_active_ms, 5_000);
    assert_eq!(extended.deadline_ms, Some(65_000));
}

#[tokio::test(start_paused = true)]
async fn transient_rejection_leaves_everything_alone() {
    let ended = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ended);

    let timer = SessionTimer::builder(TimerConfig::new(60_000))
        .extender(|| async { Err::<(), _>(ExtendError::Transport("offline".to_string())) })
        .ender(move || flag.store(true, Ordering::SeqCst))
        .spawn()
        .unwrap();
    let handle = timer.handle().clone();

    sleep(ms(10_000)).await;
    let before = handle.state();

    let err = handle.extend().await.unwrap_err();
    assert_eq!(
        err,
        Error::ExtensionRejected(ExtendError::Transport("offline".to_string()))
    );

    let after = handle.state();
    assert_eq!(after.deadline_ms, before.deadline_ms);
    assert_eq!(after.last_active_ms, before.last_active_ms);
    assert!(!after.session_ended);
    assert!(!ended.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn dead_session_rejection_ends_the_session() {
    let ended = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&ended);

    let timer = SessionTimer::builder(TimerConfig::new(60_000))
        .extender(|| async { Err::<(), _>(ExtendError::Unauthorized) })
        .ender(move || {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .spawn()
        .unwrap();
    let handle = timer.handle().clone();

    sleep(ms(10_000)).await;

    assert!(handle.extend().await.is_err());
    assert!(handle.extend().await.is_err());

    let s = handle.state();
    assert!(s.session_ended);
    assert_eq!(s.deadline_ms, Some(60_000));
    assert_eq!(ended.load(Ordering::SeqCst), 1);

    // Activity no longer revives a dead session.
    handle.record_activity(SignalKind::KeyPress).await.unwrap();
    sleep(ms(1)).await;
    assert_eq!(handle.state().last_active_ms, 0);
}

#[tokio::test(start_paused = true)]
async fn end_session_policy_fires_on_idle() {
    let ended = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ended);

    let mut cfg = TimerConfig::new(5_000);
    cfg.on_idle = IdlePolicy::EndSession;

    let timer = SessionTimer::builder(cfg)
        .ender(move || flag.store(true, Ordering::SeqCst))
        .spawn()
        .unwrap();

    sleep(ms(5_001)).await;
    assert!(ended.load(Ordering::SeqCst));
    assert!(timer.handle().state().session_ended);
}

#[tokio::test(start_paused = true)]
async fn unsubscribed_callbacks_are_not_called() {
    let timer = SessionTimer::spawn(TimerConfig::new(5_000)).unwrap();
    let handle = timer.handle().clone();

    let (idle, sub) = counter(&handle, ObserverKind::Idle);
    sub.unsubscribe();

    sleep(ms(5_001)).await;
    assert!(handle.state().is_idle);
    assert_eq!(idle.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn unrepresentable_deadline_is_rejected_without_side_effects() {
    let mut cfg = TimerConfig::new(u64::MAX);
    cfg.auto_start = false;

    let timer = SessionTimer::spawn(cfg).unwrap();
    let handle = timer.handle().clone();

    sleep(ms(1)).await;
    assert_eq!(handle.start().await, Err(Error::SchedulingUnavailable));
    assert_eq!(handle.state().phase, Phase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn invalid_config_is_rejected() {
    let err = SessionTimer::spawn(TimerConfig::new(0)).err();
    assert_eq!(err, Some(Error::InvalidConfig(ConfigError::NonPositiveTimeout)));
}

#[test]
fn spawning_outside_a_runtime_is_unavailable() {
    let err = SessionTimer::spawn(TimerConfig::new(1_000)).err();
    assert_eq!(err, Some(Error::SchedulingUnavailable));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_timer_disconnects_handles() {
    let timer = SessionTimer::spawn(TimerConfig::new(60_000)).unwrap();
    let handle = timer.handle().clone();

    drop(timer);
    sleep(ms(1)).await;

    assert_eq!(handle.start().await, Err(Error::SchedulingUnavailable));
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_loop() {
    let timer = SessionTimer::spawn(TimerConfig::new(60_000)).unwrap();
    let handle = timer.handle().clone();

    timer.shutdown().await;
    assert_eq!(handle.reset().await, Err(Error::SchedulingUnavailable));
}

#[tokio::test(start_paused = true)]
async fn watch_sees_refresh_ticks() {
    let mut cfg = TimerConfig::new(60_000);
    cfg.refresh_ms = 1_000;
    let timer = SessionTimer::spawn(cfg).unwrap();
    let mut rx = timer.handle().watch();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().remaining_ms, 59_000);
}
