//! Recognizer trait and the values it produces.

use std::fmt;
use std::ops::Range;
use std::path::Path;

use regex::Regex;

use super::{EmbedDirective, Syntax};
use crate::resolver::{PathResolver, ResolvedAsset};

/// A directive located in source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occurrence {
    /// Byte range of the directive text that gets replaced.
    pub range: Range<usize>,
    /// Extracted arguments.
    pub directive: EmbedDirective,
}

/// Problem found while matching a directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Byte offset of the directive's opening token.
    pub offset: usize,
    /// What went wrong.
    pub kind: DiagnosticKind,
}

/// Kinds of [`Diagnostic`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Opening token present but the rest could not be parsed.
    Malformed(String),
    /// `style` or `controls` given more than once.
    RepeatedArgument(String),
    /// Argument other than `style`/`controls`; the directive is still expanded.
    UnknownArgument(String),
    /// Starts inside another directive's text.
    Overlapping,
}

impl DiagnosticKind {
    /// Whether the directive was left unexpanded.
    #[must_use]
    pub fn rejects(&self) -> bool {
        !matches!(self, Self::UnknownArgument(_))
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "left unchanged: {reason}"),
            Self::RepeatedArgument(key) => {
                write!(f, "left unchanged: `{key}` given more than once")
            }
            Self::UnknownArgument(key) => write!(f, "ignores unknown argument `{key}`"),
            Self::Overlapping => f.write_str("left unchanged: overlaps another directive"),
        }
    }
}

/// Everything a recognizer found in one piece of text.
#[derive(Debug, Default)]
pub struct Findings {
    /// Accepted directives in document order.
    pub occurrences: Vec<Occurrence>,
    /// Rejected directives and ignored arguments.
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-document context for expansion.
#[derive(Clone, Copy, Debug)]
pub struct EmbedContext<'a> {
    /// Resolver turning filenames into source paths and URLs.
    pub resolver: &'a PathResolver,
    /// Directory of the document being expanded, if known.
    pub document_dir: Option<&'a Path>,
}

/// One expanded directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Embed {
    /// Syntax the directive was written in.
    pub syntax: Syntax,
    /// Extracted arguments.
    pub directive: EmbedDirective,
    /// Where the schematic comes from and where it is served.
    pub asset: ResolvedAsset,
}

/// Result of expanding the directives of one content unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Text with every accepted directive replaced by a `<kicanvas-embed>` element.
    pub text: String,
    /// Expanded directives in document order.
    pub embeds: Vec<Embed>,
    /// Human-readable warnings (`line N: ...`).
    pub warnings: Vec<String>,
    /// Directives left verbatim because they were rejected.
    pub rejected: usize,
}

/// Recognizes one surface syntax of the embed directive.
///
/// Implementations only locate directives and extract their arguments.
/// Resolution and HTML emission are shared, so every syntax produces the same
/// markup for the same arguments.
pub trait Recognizer: Send + Sync {
    /// Syntax handled by this recognizer.
    fn syntax(&self) -> Syntax;

    /// Regex matching the directive's opening token.
    ///
    /// Every accepted occurrence starts with a match of this regex. The content
    /// scanner uses the same token to decide whether a page needs the viewer.
    fn opening(&self) -> &'static Regex;

    /// Locate all directives in `input`.
    fn find(&self, input: &str) -> Findings;

    /// Replace every directive in `input` with canonical HTML.
    fn scan(&self, input: &str, ctx: &EmbedContext<'_>) -> Expansion
    where
        Self: Sized,
    {
        let recognizers: [&dyn Recognizer; 1] = [self];
        super::processor::expand(&recognizers, input, ctx)
    }
}

/// 1-indexed line number of a byte offset.
pub(crate) fn line_of(input: &str, offset: usize) -> usize {
    input.as_bytes()[..offset.min(input.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}
