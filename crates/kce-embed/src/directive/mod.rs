//! Embed directive syntaxes.
//!
//! Three surface forms express the same request:
//!
//! - `{{ kicad_schematic("NAME", style="...", controls="...") }}` ([`InlineRecognizer`])
//! - `.. kicad-schematic:: NAME` with `:style:`/`:controls:` options ([`BlockRecognizer`])
//! - `{% kicad_schematic NAME style="..." controls="..." %}` (`TagRecognizer`, behind
//!   the `tag-syntax` feature)
//!
//! Recognizers only extract arguments; [`EmbedProcessor`] resolves paths and
//! emits the markup for all of them.

mod args;
pub(crate) mod block;
mod embed;
pub(crate) mod inline;
mod processor;
mod recognizer;
pub(crate) mod tag;

pub use block::BlockRecognizer;
pub use embed::{Controls, EmbedDirective, Syntax};
pub use inline::InlineRecognizer;
pub use processor::{EmbedProcessor, tag_syntax_available};
pub(crate) use recognizer::line_of;
pub use recognizer::{
    Diagnostic, DiagnosticKind, Embed, EmbedContext, Expansion, Findings, Occurrence, Recognizer,
};
#[cfg(feature = "tag-syntax")]
pub use tag::TagRecognizer;
