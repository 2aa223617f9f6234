//! `KiCad` schematic embed directives.
//!
//! Recognizes schematic references written in any of the supported directive
//! syntaxes, resolves them to a source file and public URL, and replaces them
//! with `<kicanvas-embed>` elements.
//!
//! # Quick start
//!
//! ```
//! use kce_embed::{EmbedProcessor, PathResolver, ResolverConfig};
//!
//! let resolver = PathResolver::new(ResolverConfig::default());
//! let processor = EmbedProcessor::new(resolver).with_all_syntaxes();
//!
//! let page = ".. kicad-schematic:: amp.kicad_sch\n   :controls: full\n";
//! let result = processor.process(page, None);
//!
//! assert_eq!(
//!     result.text,
//!     "<kicanvas-embed src=\"/static/schematics/amp.kicad_sch\" controls=\"full\"></kicanvas-embed>\n"
//! );
//! assert!(kce_embed::detect(page));
//! ```
//!
//! # Features
//!
//! - `tag-syntax` (default): the `{% kicad_schematic %}` form.
//! - `serde`: `Serialize` for reports ([`ResolvedAsset`], [`AssetOrigin`], [`Syntax`]).

pub mod directive;
mod html;
mod resolver;
pub mod scanner;

#[cfg(feature = "tag-syntax")]
pub use directive::TagRecognizer;
pub use directive::{
    BlockRecognizer, Controls, Embed, EmbedContext, EmbedDirective, EmbedProcessor, Expansion,
    InlineRecognizer, Recognizer, Syntax, tag_syntax_available,
};
pub use html::{escape_attr, render_embed};
pub use resolver::{
    AssetOrigin, DEFAULT_URL_PREFIX, PathResolver, ResolvedAsset, ResolverConfig, resolve,
};
pub use scanner::detect;
