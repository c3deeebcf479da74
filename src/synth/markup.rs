//! Markup normalization
//!
//! Users may paste a bare fragment or a full document. Both reduce to the
//! content that belongs inside the synthesized `<body>`.

use std::sync::OnceLock;

use regex::Regex;

fn doctype_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<!doctype[^>]*>").expect("valid doctype pattern"))
}

fn body_region_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<body(?:\s[^>]*)?>(.*?)</body\s*>").expect("valid body pattern")
    })
}

// Tag names are matched exactly so that `<header>` or `<bodyguard-x>` survive.
fn wrapper_res() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"(?is)<head(?:\s[^>]*)?>.*?</head\s*>").expect("valid head pattern"),
            Regex::new(r"(?i)</?html(?:\s[^>]*)?>").expect("valid html pattern"),
            Regex::new(r"(?i)</?body(?:\s[^>]*)?>").expect("valid body tag pattern"),
        ]
    })
}

/// Remove every document type declaration.
pub fn strip_doctype(markup: &str) -> String {
    doctype_re().replace_all(markup, "").into_owned()
}

/// Reduce markup to its body content.
///
/// A delimited `<body>...</body>` region wins; otherwise document and head
/// wrappers are stripped and the remainder is used as-is.
pub fn extract_body(markup: &str) -> String {
    let markup = strip_doctype(markup);

    if let Some(caps) = body_region_re().captures(&markup) {
        return caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
    }

    wrapper_res()
        .iter()
        .fold(markup, |acc, re| re.replace_all(&acc, "").into_owned())
}
