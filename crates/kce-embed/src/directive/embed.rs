//! Values extracted from a recognized directive.

use std::fmt;

/// Viewer control mode for the `controls` attribute.
///
/// Values outside the recognized set are kept verbatim in [`Controls::Other`]
/// and passed through to the viewer, which decides how to treat them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Controls {
    /// `full`
    Full,
    /// `minimal`
    Minimal,
    /// `none`
    None,
    /// Any other value.
    Other(String),
}

impl Controls {
    /// Parse a controls value. Never fails.
    ///
    /// # Example
    ///
    /// ```
    /// use kce_embed::Controls;
    ///
    /// assert_eq!(Controls::parse("minimal"), Controls::Minimal);
    /// assert_eq!(Controls::parse("custom"), Controls::Other("custom".to_owned()));
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "full" => Self::Full,
            "minimal" => Self::Minimal,
            "none" => Self::None,
            other => {
                tracing::debug!(value = other, "Passing through unrecognized controls value");
                Self::Other(other.to_owned())
            }
        }
    }

    /// The attribute value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Full => "full",
            Self::Minimal => "minimal",
            Self::None => "none",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for Controls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recognized embed directive.
///
/// Empty `style` or `controls` values are treated as absent, so the emitted
/// element never carries an empty attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedDirective {
    /// Referenced schematic name or path, never empty.
    pub filename: String,
    /// Inline CSS declarations.
    pub style: Option<String>,
    /// Viewer control mode.
    pub controls: Option<Controls>,
}

impl EmbedDirective {
    /// Create a directive with no optional arguments.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            style: None,
            controls: None,
        }
    }

    /// Set the style, ignoring empty values.
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        let style = style.into();
        self.style = (!style.is_empty()).then_some(style);
        self
    }

    /// Set the controls mode, ignoring empty values.
    #[must_use]
    pub fn with_controls(mut self, controls: &str) -> Self {
        self.controls = (!controls.is_empty()).then(|| Controls::parse(controls));
        self
    }
}

/// Surface syntax a directive was written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum Syntax {
    /// `{{ kicad_schematic("NAME", ...) }}`
    Inline,
    /// `.. kicad-schematic:: NAME` with option lines.
    Block,
    /// `{% kicad_schematic NAME ... %}`
    Tag,
}

impl Syntax {
    /// Short name used in configuration and reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Block => "block",
            Self::Tag => "tag",
        }
    }

    /// How the directive looks in source, for messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Inline => "{{ kicad_schematic() }}",
            Self::Block => ".. kicad-schematic::",
            Self::Tag => "{% kicad_schematic %}",
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
