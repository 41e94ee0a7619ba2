// Speech-gate semantics: the minimum wait flags early speech, the variable
// phase needs speech-then-silence, and a silent participant holds recall
// open forever.

mod common;

use std::time::Duration;

use common::MemoryReporter;
use vocal_trials::events::Event;
use vocal_trials::recall::{GateTiming, SpeechGate};

fn test_timing() -> GateTiming {
    GateTiming {
        wait: Duration::from_millis(200),
        main: Duration::from_millis(300),
        extra: Duration::from_millis(400),
        tick: Duration::from_millis(50),
    }
}

#[tokio::test(start_paused = true)]
async fn silent_participant_blocks_recall_indefinitely() {
    let timing = test_timing();
    let mut signal = || false;
    let (mut reporter, events) = MemoryReporter::new();

    let mut gate = SpeechGate::new(timing, &mut signal);
    gate.minimum_wait(&mut reporter, 0).await;
    assert!(!gate.too_fast());

    // An hour of virtual time without speech: the gate must still be open.
    let blocked = tokio::time::timeout(Duration::from_secs(3600), gate.await_quiet()).await;
    assert!(blocked.is_err(), "gate closed without any speech");
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn speech_during_the_wait_sets_too_fast() {
    let timing = test_timing();
    // Talking on the second and third tick only, well inside the wait.
    let mut tick = 0u32;
    let mut signal = move || {
        tick += 1;
        tick == 2 || tick == 3
    };
    let (mut reporter, events) = MemoryReporter::new();

    let mut gate = SpeechGate::new(timing, &mut signal);
    gate.minimum_wait(&mut reporter, 7).await;

    assert!(gate.too_fast());
    let events = events.lock().unwrap();
    assert_eq!(events[0], Event::SpokeTooSoon { index: 7 });
    assert_eq!(events.len(), 2, "one event per talking tick");
}

#[tokio::test(start_paused = true)]
async fn speech_only_after_the_wait_is_not_too_fast() {
    let timing = test_timing();
    // Wait covers ticks at 0/50/100/150 ms; talk on ticks 10-12, then quiet.
    let mut tick = 0u32;
    let mut signal = move || {
        tick += 1;
        (10..=12).contains(&tick)
    };
    let (mut reporter, events) = MemoryReporter::new();

    let mut gate = SpeechGate::new(timing, &mut signal);
    gate.minimum_wait(&mut reporter, 0).await;
    assert!(!gate.too_fast());

    gate.await_quiet().await;
    assert!(!gate.too_fast());
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn recall_holds_for_minimum_duration_and_trailing_silence() {
    let timing = test_timing();
    // One early burst on the first tick after the wait.
    let mut tick = 0u32;
    let mut signal = move || {
        tick += 1;
        tick == 6
    };
    let (mut reporter, _events) = MemoryReporter::new();

    let started = tokio::time::Instant::now();
    let mut gate = SpeechGate::new(timing, &mut signal);
    gate.minimum_wait(&mut reporter, 0).await;
    gate.await_quiet().await;
    let elapsed = started.elapsed();

    // Must satisfy both the minimum total duration and the debounce.
    assert!(elapsed >= timing.wait + timing.main);
    assert!(elapsed >= Duration::from_millis(200 + 400));
}

#[tokio::test(start_paused = true)]
async fn continued_speech_postpones_the_cutoff() {
    let timing = test_timing();
    // Talking continuously for 30 ticks (1.5 s), then silence.
    let mut tick = 0u32;
    let mut signal = move || {
        tick += 1;
        tick <= 30
    };
    let (mut reporter, _events) = MemoryReporter::new();

    let started = tokio::time::Instant::now();
    let mut gate = SpeechGate::new(timing, &mut signal);
    gate.minimum_wait(&mut reporter, 0).await;
    gate.await_quiet().await;
    let elapsed = started.elapsed();

    // Speech ran through 1.4 s, so the cutoff cannot land before speech
    // end plus the trailing-silence debounce.
    assert!(elapsed >= Duration::from_millis(1400 + 400));
}
