//! Synthesized documents executed for real
//!
//! Each test runs `synthesize()` output under node through the DOM-free
//! harness in `common::node_runtime` and the real process boundary and
//! relay. Tests return early when node is not installed.

use livepreview::{synthesize, ConsoleSignal, EventKind, ExternalResource, SourceBundle};

use crate::common::node_runtime::run_in_node;
use crate::common::{is_cleared, message_of};

fn events(signals: &[ConsoleSignal]) -> Vec<(EventKind, String)> {
    signals
        .iter()
        .filter_map(|signal| signal.as_event().map(|event| (event.kind, event.message())))
        .collect()
}

fn errors(signals: &[ConsoleSignal]) -> Vec<String> {
    events(signals)
        .into_iter()
        .filter(|(kind, _)| *kind == EventKind::Error)
        .map(|(_, message)| message)
        .collect()
}

fn script(js: &str) -> SourceBundle {
    SourceBundle::new("", "", js)
}

#[tokio::test]
async fn test_each_console_method_becomes_matching_event() {
    let bundle = script("console.log('l'); console.info('i'); console.warn('w'); console.error('e');");
    let Some(signals) = run_in_node(&bundle, &[]).await else {
        return;
    };

    assert!(is_cleared(&signals[0], 1), "got {signals:?}");
    assert_eq!(
        events(&signals),
        vec![
            (EventKind::Log, "l".to_string()),
            (EventKind::Info, "i".to_string()),
            (EventKind::Warn, "w".to_string()),
            (EventKind::Error, "e".to_string()),
        ]
    );
    assert!(signals.iter().all(|signal| signal.generation().value() == 1));
}

#[tokio::test]
async fn test_objects_stringified_and_arguments_joined() {
    let bundle = script("console.log('count', 3, {a: 1}, null, undefined);");
    let Some(signals) = run_in_node(&bundle, &[]).await else {
        return;
    };

    let event = signals[1].as_event().expect("log event");
    assert_eq!(
        event.payload,
        ["count", "3", "{\n  \"a\": 1\n}", "null", "undefined"]
    );
}

#[tokio::test]
async fn test_unserializable_object_falls_back_to_string() {
    let bundle = script("console.log({ toJSON: function () { return undefined; } });");
    let Some(signals) = run_in_node(&bundle, &[]).await else {
        return;
    };

    assert_eq!(message_of(&signals[1]).as_deref(), Some("[object Object]"));
}

#[tokio::test]
async fn test_thrown_error_reported_once_and_logging_continues() {
    let mut bundle = script("console.log('before'); throw new Error('boom');");
    bundle
        .external_resources
        .push(ExternalResource::script("https://cdn.test/after.js"));
    let Some(signals) = run_in_node(&bundle, &[("https://cdn.test/after.js", "console.log('after');")])
        .await
    else {
        return;
    };

    let errors = errors(&signals);
    assert_eq!(errors.len(), 1, "got {signals:?}");
    assert!(errors[0].contains("boom"));
    assert!(errors[0].starts_with("JavaScript Execution Error: boom"));

    let logs: Vec<_> = events(&signals)
        .into_iter()
        .filter(|(kind, _)| *kind == EventKind::Log)
        .map(|(_, message)| message)
        .collect();
    assert_eq!(logs, ["before", "after"]);
}

#[tokio::test]
async fn test_rejection_without_reason_reports_unknown_error() {
    let Some(signals) = run_in_node(&script("Promise.reject();"), &[]).await else {
        return;
    };

    assert_eq!(
        errors(&signals),
        ["Unhandled Promise Rejection: Unknown error"]
    );
}

#[tokio::test]
async fn test_rejection_with_error_reports_its_message() {
    let Some(signals) = run_in_node(&script("Promise.reject(new Error('nope'));"), &[]).await else {
        return;
    };

    assert_eq!(errors(&signals), ["Unhandled Promise Rejection: nope"]);
}

#[tokio::test]
async fn test_library_failing_on_load_is_captured() {
    let mut bundle = script("console.log('user');");
    bundle
        .external_resources
        .push(ExternalResource::script("https://cdn.test/broken.js"));
    let Some(signals) = run_in_node(
        &bundle,
        &[("https://cdn.test/broken.js", "throw new Error('lib failed');")],
    )
    .await
    else {
        return;
    };

    let errors = errors(&signals);
    assert_eq!(errors.len(), 1, "got {signals:?}");
    assert!(errors[0].contains("lib failed"));
    assert!(errors[0].contains("File: https://cdn.test/broken.js"));
}

#[tokio::test]
async fn test_syntax_error_reported_and_libraries_still_run() {
    let mut bundle = script("console.log('never' ;");
    bundle
        .external_resources
        .push(ExternalResource::script("https://cdn.test/ok.js"));
    let Some(signals) =
        run_in_node(&bundle, &[("https://cdn.test/ok.js", "console.log('lib ok');")]).await
    else {
        return;
    };

    let errors = errors(&signals);
    assert_eq!(errors.len(), 1, "got {signals:?}");
    assert!(errors[0].contains("SyntaxError"));
    assert!(events(&signals).contains(&(EventKind::Log, "lib ok".to_string())));
}

#[tokio::test]
async fn test_console_reached_outside_user_script_is_captured() {
    let mut bundle = SourceBundle::new(
        r#"<button onclick="console.log('inline')">Go</button>"#,
        "",
        "window.console.log('via-window');",
    );
    bundle
        .external_resources
        .push(ExternalResource::script("https://cdn.test/lib.js"));
    let Some(signals) = run_in_node(
        &bundle,
        &[("https://cdn.test/lib.js", "console.log('library loaded');")],
    )
    .await
    else {
        return;
    };

    let logs: Vec<_> = events(&signals)
        .into_iter()
        .filter(|(kind, _)| *kind == EventKind::Log)
        .map(|(_, message)| message)
        .collect();
    assert_eq!(logs, ["via-window", "library loaded", "inline"]);
    assert!(errors(&signals).is_empty(), "got {signals:?}");
}

#[tokio::test]
async fn test_user_functions_reachable_from_inline_handlers() {
    let bundle = SourceBundle::new(
        r#"<button onclick="greet('there')">Go</button>"#,
        "",
        "function greet(name) { console.info('hello ' + name); }",
    );
    let Some(signals) = run_in_node(&bundle, &[]).await else {
        return;
    };

    assert_eq!(events(&signals), [(EventKind::Info, "hello there".to_string())]);
}

#[test]
fn test_document_scripts_run_in_emission_order() {
    // The harness relies on this order: setup, guarded user script, libraries
    let mut bundle = script("console.log('user');");
    bundle
        .external_resources
        .push(ExternalResource::script("https://cdn.test/lib.js"));
    let document = synthesize(&bundle).to_string();

    let setup = document.find("window.__preview").unwrap();
    let user = document.find("console.log('user');").unwrap();
    let library = document.find("https://cdn.test/lib.js").unwrap();
    assert!(setup < user && user < library);
}
