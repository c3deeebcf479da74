//! Node.js harness for the process boundary.
//!
//! Reads a synthesized document from stdin, loads it into a jsdom window
//! with script execution enabled, and exposes `window.__previewBridge` so
//! the shim's messages come out as one JSON object per stdout line. The
//! native console of the page goes to a virtual console that is discarded,
//! which keeps stdout reserved for the wire protocol.
//!
//! jsdom does not dispatch `unhandledrejection` on the window, so the
//! harness reports those from the process hook in the same wire shape the
//! shim would use.
//!
//! Every line is stamped with the generation the host passed in
//! `LIVEPREVIEW_GENERATION`, letting the relay reject output that does not
//! belong to the boundary it arrived through.

pub const NODE_HARNESS: &str = r#"
'use strict';
const generation = Number(process.env.LIVEPREVIEW_GENERATION) || undefined;
const emit = (message) => {
  try {
    process.stdout.write(JSON.stringify(Object.assign({}, message, { generation })) + '\n');
  } catch (e) {
    process.stderr.write('harness: unserializable message: ' + e + '\n');
  }
};
const wire = (method, text) => emit({
  type: 'console',
  method: method,
  args: [text],
  timestamp: new Date().toISOString()
});

let jsdom;
try {
  jsdom = require('jsdom');
} catch (e) {
  wire('error', 'Preview runtime unavailable: the jsdom package is not installed');
  process.exit(0);
}

process.on('unhandledRejection', (reason) => {
  let text = 'Unknown error';
  try {
    if (reason !== undefined && reason !== null) {
      text = reason instanceof Error && reason.message ? reason.message : String(reason);
    }
  } catch (e) {}
  wire('error', 'Unhandled Promise Rejection: ' + text);
});

let html = '';
process.stdin.setEncoding('utf8');
process.stdin.on('data', (chunk) => { html += chunk; });
process.stdin.on('end', () => {
  const virtualConsole = new jsdom.VirtualConsole();
  virtualConsole.on('jsdomError', (e) => {
    process.stderr.write('jsdom: ' + (e && e.message ? e.message : String(e)) + '\n');
  });
  new jsdom.JSDOM(html, {
    runScripts: 'dangerously',
    resources: 'usable',
    pretendToBeVisual: true,
    virtualConsole: virtualConsole,
    beforeParse(window) {
      window.__previewBridge = emit;
    }
  });
});
"#;
