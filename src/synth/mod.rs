//! Document synthesis
//!
//! Turns a [`SourceBundle`] into one self-contained HTML document. Synthesis
//! is pure and total: nothing is validated, malformed input is passed
//! through verbatim, and the same bundle always yields the same bytes.

pub mod markup;
pub mod shim;

use std::fmt;

use crate::source::SourceBundle;

pub use markup::{extract_body, strip_doctype};

const HEAD_OPEN: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Preview</title>
"#;

const STYLE_PRELUDE: &str = "    <style>\n* {\n    box-sizing: border-box;\n}\n\n";

/// A synthesized preview document.
///
/// Always derived from a bundle, never edited by hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SynthesizedDocument(String);

impl SynthesizedDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SynthesizedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SynthesizedDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Escape a value for a double-quoted attribute.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the executable document for a bundle.
///
/// Emission order matters: external stylesheets, inline style, body
/// content, the instrumentation shim with the guarded user script, and only
/// then external scripts, so library code never runs before console and
/// error interception is in place.
pub fn synthesize(bundle: &SourceBundle) -> SynthesizedDocument {
    let body = extract_body(&bundle.markup);
    let guarded = shim::guarded_script(&bundle.script);
    let setup = shim::setup_script();

    let mut doc = String::with_capacity(
        HEAD_OPEN.len() + bundle.style.len() + body.len() + setup.len() + guarded.len() + 512,
    );

    doc.push_str(HEAD_OPEN);
    for url in bundle.style_urls() {
        doc.push_str("    <link rel=\"stylesheet\" href=\"");
        doc.push_str(&escape_attr(url));
        doc.push_str("\">\n");
    }
    doc.push_str(STYLE_PRELUDE);
    doc.push_str(&bundle.style);
    doc.push_str("\n    </style>\n</head>\n<body>\n");

    doc.push_str(&body);
    doc.push('\n');

    doc.push_str("<script>\n");
    doc.push_str(setup);
    doc.push_str("\n</script>\n<script>\n");
    doc.push_str(&guarded);
    doc.push_str("\n</script>\n");

    for url in bundle.script_urls() {
        doc.push_str("<script src=\"");
        doc.push_str(&escape_attr(url));
        doc.push_str("\"></script>\n");
    }
    doc.push_str("</body>\n</html>\n");

    SynthesizedDocument(doc)
}
