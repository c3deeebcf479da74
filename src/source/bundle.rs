use serde::{Deserialize, Serialize};

/// An external library attached to the preview.
///
/// Either URL may be absent: a CSS-only framework has no script, a utility
/// library has no stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalResource {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "css")]
    pub style_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "js")]
    pub script_url: Option<String>,
}

impl ExternalResource {
    pub fn stylesheet(url: impl Into<String>) -> Self {
        Self {
            style_url: Some(url.into()),
            script_url: None,
        }
    }

    pub fn script(url: impl Into<String>) -> Self {
        Self {
            style_url: None,
            script_url: Some(url.into()),
        }
    }

    pub fn with_style(mut self, url: impl Into<String>) -> Self {
        self.style_url = Some(url.into());
        self
    }

    pub fn with_script(mut self, url: impl Into<String>) -> Self {
        self.script_url = Some(url.into());
        self
    }
}

/// Immutable snapshot of the three authored buffers plus attached libraries.
///
/// A new bundle always replaces the previous one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBundle {
    pub markup: String,
    pub style: String,
    pub script: String,
    #[serde(default)]
    pub external_resources: Vec<ExternalResource>,
}

impl SourceBundle {
    pub fn new(
        markup: impl Into<String>,
        style: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            markup: markup.into(),
            style: style.into(),
            script: script.into(),
            external_resources: Vec::new(),
        }
    }

    pub fn with_resources(mut self, resources: Vec<ExternalResource>) -> Self {
        self.external_resources = resources;
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = markup.into();
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    /// Stylesheet URLs in declaration order
    pub fn style_urls(&self) -> impl Iterator<Item = &str> {
        self.external_resources
            .iter()
            .filter_map(|r| r.style_url.as_deref())
    }

    /// Script URLs in declaration order
    pub fn script_urls(&self) -> impl Iterator<Item = &str> {
        self.external_resources
            .iter()
            .filter_map(|r| r.script_url.as_deref())
    }
}
