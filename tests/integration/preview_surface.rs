//! Integration tests for the preview surface
//!
//! Tests the flow: edits -> RefreshScheduler -> PreviewEngine -> MockBoundary
//! -> MessageRelay -> sink, using a paused clock for the debounce.

use std::sync::Arc;
use std::time::Duration;

use livepreview::boundary::mock::{MockBoundary, MockConfig, MockMessageBuilder};
use livepreview::relay::LOAD_FAILED_MESSAGE;
use livepreview::{
    ConsoleLog, EventKind, Generation, PreviewSurface, SourceBundle, SourceChange,
};
use serde_json::Value;

use super::common::{
    drain, is_cleared, message_of, next_signals, signals_until, spawn_surface,
};

const QUIET: Duration = Duration::from_millis(500);

fn clear_then_log(text: &str) -> Vec<Value> {
    MockMessageBuilder::new().clear().log(&[text]).build()
}

/// Test that the initial bundle is loaded and its console output relayed
#[tokio::test(start_paused = true)]
async fn test_initial_load_relays_clear_then_log() {
    let mock = MockBoundary::new().with_messages(clear_then_log("x"));
    let (surface, mut rx) = spawn_surface(&mock, SourceBundle::new("<p>hi</p>", "", ""), QUIET);

    let signals = next_signals(&mut rx, 2).await;
    assert!(is_cleared(&signals[0], 1));

    let event = signals[1].as_event().expect("second signal should be an event");
    assert_eq!(event.kind, EventKind::Log);
    assert_eq!(event.message(), "x");
    assert_eq!(event.generation, Generation::new(1));
    assert_eq!(event.sequence, 0);

    let load = mock.last_load().unwrap();
    assert!(load.document.contains("<p>hi</p>"));

    surface.shutdown().await;
}

/// Test that a burst of edits inside the quiet period causes one reload
#[tokio::test(start_paused = true)]
async fn test_rapid_edits_collapse_into_one_reload() {
    let mock = MockBoundary::new().with_messages(MockMessageBuilder::new().clear().build());
    let (surface, mut rx) = spawn_surface(&mock, SourceBundle::default(), QUIET);
    next_signals(&mut rx, 1).await;

    for text in ["c", "co", "con", "cons", "conso", "console"] {
        surface
            .edit(SourceChange::Script(format!("{text}.log(1)")))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(mock.load_count(), 1, "no reload while still typing");

    let signals = next_signals(&mut rx, 1).await;
    assert!(is_cleared(&signals[0], 2));

    tokio::time::sleep(QUIET * 4).await;
    assert_eq!(mock.load_count(), 2);
    assert!(mock.last_load().unwrap().document.contains("console.log(1)"));

    surface.shutdown().await;
}

/// Test that an explicit refresh loads at once and absorbs the pending edit
#[tokio::test(start_paused = true)]
async fn test_refresh_bypasses_debounce() {
    let mock = MockBoundary::new().with_messages(MockMessageBuilder::new().clear().build());
    let (surface, mut rx) = spawn_surface(&mock, SourceBundle::default(), QUIET);
    next_signals(&mut rx, 1).await;

    let start = tokio::time::Instant::now();
    surface
        .edit(SourceChange::Markup("<h1>now</h1>".into()))
        .await
        .unwrap();
    surface.refresh().await.unwrap();

    let signals = next_signals(&mut rx, 1).await;
    assert!(is_cleared(&signals[0], 2));
    assert!(tokio::time::Instant::now() - start < QUIET);
    assert!(mock.last_load().unwrap().document.contains("<h1>now</h1>"));

    // The debounced reload was cancelled by the refresh
    tokio::time::sleep(QUIET * 4).await;
    assert_eq!(mock.load_count(), 2);

    surface.shutdown().await;
}

/// Test that a hard refresh re-runs the same document with a new generation
#[tokio::test(start_paused = true)]
async fn test_hard_refresh_reuses_document() {
    let mock = MockBoundary::new().with_messages(MockMessageBuilder::new().clear().build());
    let (surface, mut rx) = spawn_surface(
        &mock,
        SourceBundle::new("", "", "console.log('first')"),
        QUIET,
    );
    next_signals(&mut rx, 1).await;

    surface.hard_refresh().await.unwrap();
    let signals = next_signals(&mut rx, 1).await;
    assert!(is_cleared(&signals[0], 2));

    let loads = mock.loads();
    assert_eq!(loads.len(), 2);
    assert_eq!(loads[0].document, loads[1].document);
    assert_eq!(loads[1].generation, Generation::new(2));
    assert_eq!(mock.teardowns(), vec![Generation::new(1)]);

    surface.shutdown().await;
}

/// Test that a hard refresh leaves a pending edit to fire afterwards
#[tokio::test(start_paused = true)]
async fn test_hard_refresh_keeps_pending_edit() {
    let mock = MockBoundary::new().with_messages(MockMessageBuilder::new().clear().build());
    let (surface, mut rx) = spawn_surface(&mock, SourceBundle::default(), QUIET);
    next_signals(&mut rx, 1).await;

    surface
        .edit(SourceChange::Style("body { color: red }".into()))
        .await
        .unwrap();
    surface.hard_refresh().await.unwrap();

    let signals = next_signals(&mut rx, 2).await;
    assert!(is_cleared(&signals[0], 2));
    assert!(is_cleared(&signals[1], 3));

    let loads = mock.loads();
    assert_eq!(loads.len(), 3);
    assert!(!loads[1].document.contains("color: red"));
    assert!(loads[2].document.contains("color: red"));

    surface.shutdown().await;
}

/// Test that output from a replaced boundary never follows the new one's
#[tokio::test(start_paused = true)]
async fn test_superseded_output_is_suppressed() {
    let config = MockConfig::default()
        .with_responder(|_, generation| {
            if generation == Generation::new(1) {
                let mut builder = MockMessageBuilder::new().clear();
                for i in 1..=20 {
                    builder = builder.log(&[&format!("old-{i}")]);
                }
                builder.build()
            } else {
                clear_then_log("new")
            }
        })
        .with_delay(Duration::from_millis(20))
        .held_open();
    let mock = MockBoundary::new().with_config(config);
    let (surface, mut rx) = spawn_surface(&mock, SourceBundle::default(), QUIET);

    signals_until(&mut rx, |s| message_of(s).as_deref() == Some("old-1")).await;
    surface.refresh().await.unwrap();

    let mut seen = signals_until(&mut rx, |s| message_of(s).as_deref() == Some("new")).await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    seen.extend(drain(&mut rx));

    let first_new = seen
        .iter()
        .position(|s| s.generation() == Generation::new(2))
        .expect("generation 2 should have produced output");
    assert!(is_cleared(&seen[first_new], 2));
    assert!(
        seen[first_new..]
            .iter()
            .all(|s| s.generation() == Generation::new(2)),
        "stale output after replacement: {seen:?}"
    );
    assert!(!seen
        .iter()
        .any(|s| message_of(s).as_deref() == Some("old-20")));
    assert_eq!(mock.teardowns(), vec![Generation::new(1)]);

    surface.shutdown().await;
    assert_eq!(mock.teardowns(), vec![Generation::new(1), Generation::new(2)]);
}

/// Test that a failed load surfaces as one generic error event
#[tokio::test(start_paused = true)]
async fn test_load_failure_reports_error_event() {
    let mock = MockBoundary::new().with_config(MockConfig::default().failing());
    let (surface, mut rx) = spawn_surface(&mock, SourceBundle::default(), QUIET);

    let signals = next_signals(&mut rx, 1).await;
    let event = signals[0].as_event().expect("load failure should be an event");
    assert_eq!(event.kind, EventKind::Error);
    assert_eq!(event.message(), LOAD_FAILED_MESSAGE);
    assert_eq!(event.generation, Generation::new(1));

    tokio::time::sleep(QUIET).await;
    assert!(drain(&mut rx).is_empty());

    surface.shutdown().await;
}

/// Test that shutdown hands back the sink with everything relayed
#[tokio::test(start_paused = true)]
async fn test_shutdown_returns_console_log() {
    let messages = MockMessageBuilder::new()
        .clear()
        .log(&["a"])
        .warn(&["careful"])
        .error(&["boom"])
        .build();
    let mock = MockBoundary::new().with_config(
        MockConfig::default()
            .with_messages(messages)
            .with_delay(Duration::from_millis(10)),
    );
    let surface = PreviewSurface::spawn(
        Arc::new(mock.clone()),
        SourceBundle::default(),
        QUIET,
        ConsoleLog::new(),
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    let log = surface.shutdown().await.expect("relay should hand back the sink");

    assert_eq!(log.clears(), 1);
    assert_eq!(log.len(), 3);
    assert_eq!(log.summary(), "1 errors, 1 warnings");
    let sequences: Vec<u64> = log.entries().iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
}
