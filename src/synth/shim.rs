//! Runtime instrumentation injected into every synthesized document.
//!
//! The shim is two script blocks. The first installs the relay plumbing, the
//! global failure handlers, and an instrumented console composed over the
//! document's native one; the second runs the user script inside a
//! `try/catch` guard. Keeping them separate means a user script that fails to
//! even parse cannot take the handlers down with it: the parse failure is
//! reported through the `error` handler the first block already installed.
//!
//! The instrumented console becomes the document's own `window.console`, so
//! user code, inline markup handlers and library scripts all log through it.
//! The native console object itself is never modified.

use std::sync::OnceLock;

use regex::Regex;

/// Name of the host bridge function a worker runtime may provide.
pub const BRIDGE_FUNCTION: &str = "__previewBridge";

/// Wire `type` tag on every message the shim posts.
pub const MESSAGE_TYPE: &str = "console";

/// First block: message channel, console instrumentation, global failure handlers.
///
/// Emits the clear signal before anything else so a fresh load resets the
/// host view.
const SETUP: &str = r#"(function () {
  'use strict';
  var nativeConsole = window.console;
  var send = typeof window.__previewBridge === 'function'
    ? window.__previewBridge
    : function (message) { window.parent.postMessage(message, '*'); };

  function post(method, args) {
    try {
      send({
        type: 'console',
        method: method,
        args: args,
        timestamp: new Date().toISOString()
      });
    } catch (e) {
      nativeConsole.error('Failed to post message:', e);
    }
  }

  function stringify(value) {
    if (typeof value === 'object' && value !== null) {
      try {
        var json = JSON.stringify(value, null, 2);
        if (typeof json === 'string') {
          return json;
        }
      } catch (e) {}
    }
    try {
      return String(value);
    } catch (e) {
      return Object.prototype.toString.call(value);
    }
  }

  var instrumented = Object.create(nativeConsole);
  ['log', 'error', 'warn', 'info'].forEach(function (method) {
    var original = nativeConsole[method];
    instrumented[method] = function () {
      post(method, Array.prototype.map.call(arguments, stringify));
      if (typeof original === 'function') {
        return original.apply(nativeConsole, arguments);
      }
    };
  });
  try {
    Object.defineProperty(window, 'console', {
      value: instrumented,
      writable: true,
      configurable: true
    });
  } catch (e) {
    try {
      window.console = instrumented;
    } catch (ignored) {}
  }

  post('clear', []);

  window.addEventListener('error', function (event) {
    post('error', [[
      'Error: ' + event.message,
      'File: ' + (event.filename || 'unknown'),
      'Line: ' + (event.lineno || 'unknown'),
      'Column: ' + (event.colno || 'unknown')
    ].join('\n')]);
  });

  window.addEventListener('unhandledrejection', function (event) {
    var reason = 'Unknown error';
    try {
      if (event.reason !== undefined && event.reason !== null) {
        reason = event.reason instanceof Error && event.reason.message
          ? event.reason.message
          : String(event.reason);
      }
    } catch (e) {}
    post('error', ['Unhandled Promise Rejection: ' + reason]);
  });

  function report(error) {
    var message;
    try {
      message = error && error.message ? error.message : String(error);
    } catch (e) {
      message = 'Unknown error';
    }
    var stack = error && error.stack ? error.stack : 'No stack trace available';
    post('error', ['JavaScript Execution Error: ' + message + '\n' + stack]);
  }

  Object.defineProperty(window, '__preview', {
    value: Object.freeze({ report: report })
  });
})();"#;

// Top-level block so the script's functions stay reachable from inline handlers
const GUARD_OPEN: &str = "try {\n";

const GUARD_CLOSE: &str = "\n} catch (error) {\n  window.__preview.report(error);\n}";

fn script_close_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</(script)").expect("valid script close pattern"))
}

/// Keep a literal `</script` inside the user script from terminating the block.
fn escape_script_body(script: &str) -> String {
    script_close_re().replace_all(script, "<\\/$1").into_owned()
}

/// Setup block source
pub fn setup_script() -> &'static str {
    SETUP
}

/// Guarded execution block wrapping the user script.
///
/// Emitted even for an empty script so the instrumentation stays installed
/// for external library code.
pub fn guarded_script(user_script: &str) -> String {
    let body = escape_script_body(user_script);
    let mut out = String::with_capacity(GUARD_OPEN.len() + body.len() + GUARD_CLOSE.len());
    out.push_str(GUARD_OPEN);
    out.push_str(&body);
    out.push_str(GUARD_CLOSE);
    out
}
