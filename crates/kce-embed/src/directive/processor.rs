//! Directive processor.
//!
//! Runs every registered recognizer over the same input and splices all
//! accepted directives in a single pass, so embeds are emitted in document
//! order whichever syntaxes are mixed on a page.

use std::path::Path;

use super::{
    BlockRecognizer, Diagnostic, DiagnosticKind, Embed, EmbedContext, Expansion, Findings,
    InlineRecognizer, Occurrence, Recognizer, Syntax, line_of,
};
use crate::html::render_embed;
use crate::resolver::PathResolver;

/// Expands embed directives in content.
///
/// # Example
///
/// ```
/// use kce_embed::{EmbedProcessor, PathResolver};
///
/// let processor = EmbedProcessor::new(PathResolver::default()).with_all_syntaxes();
/// let result = processor.process(r#"{{ kicad_schematic("amp.kicad_sch") }}"#, None);
///
/// assert_eq!(
///     result.text,
///     r#"<kicanvas-embed src="/static/schematics/amp.kicad_sch"></kicanvas-embed>"#
/// );
/// ```
pub struct EmbedProcessor {
    resolver: PathResolver,
    recognizers: Vec<Box<dyn Recognizer>>,
}

impl EmbedProcessor {
    /// Create a processor with no syntaxes registered.
    #[must_use]
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            recognizers: Vec::new(),
        }
    }

    /// Register a recognizer.
    #[must_use]
    pub fn with_recognizer<R: Recognizer + 'static>(mut self, recognizer: R) -> Self {
        self.recognizers.push(Box::new(recognizer));
        self
    }

    /// Register the `{{ kicad_schematic(...) }}` form.
    #[must_use]
    pub fn with_inline_syntax(self) -> Self {
        self.with_recognizer(InlineRecognizer)
    }

    /// Register the `.. kicad-schematic::` form.
    #[must_use]
    pub fn with_block_syntax(self) -> Self {
        self.with_recognizer(BlockRecognizer)
    }

    /// Register the `{% kicad_schematic %}` form.
    #[cfg(feature = "tag-syntax")]
    #[must_use]
    pub fn with_tag_syntax(self) -> Self {
        self.with_recognizer(super::TagRecognizer)
    }

    /// Register the `{% kicad_schematic %}` form.
    ///
    /// No-op: built without the `tag-syntax` feature.
    #[cfg(not(feature = "tag-syntax"))]
    #[must_use]
    pub fn with_tag_syntax(self) -> Self {
        tracing::debug!("Tag syntax support not compiled in, skipping registration");
        self
    }

    /// Register every syntax available in this build.
    #[must_use]
    pub fn with_all_syntaxes(self) -> Self {
        self.with_inline_syntax()
            .with_block_syntax()
            .with_tag_syntax()
    }

    /// Registered syntaxes, in registration order.
    #[must_use]
    pub fn syntaxes(&self) -> Vec<Syntax> {
        self.recognizers.iter().map(|r| r.syntax()).collect()
    }

    /// Expand all directives in `input`.
    ///
    /// `document_dir` is the directory of the source document; it enables the
    /// "next to the document" resolution step.
    #[must_use]
    pub fn process(&self, input: &str, document_dir: Option<&Path>) -> Expansion {
        let recognizers: Vec<&dyn Recognizer> =
            self.recognizers.iter().map(|r| &**r).collect();
        let ctx = EmbedContext {
            resolver: &self.resolver,
            document_dir,
        };
        let expansion = expand(&recognizers, input, &ctx);
        if !expansion.embeds.is_empty() || expansion.rejected > 0 {
            tracing::debug!(
                embeds = expansion.embeds.len(),
                rejected = expansion.rejected,
                "Expanded schematic directives"
            );
        }
        expansion
    }
}

/// Whether the `tag-syntax` feature was compiled in.
#[must_use]
pub const fn tag_syntax_available() -> bool {
    cfg!(feature = "tag-syntax")
}

/// Find, resolve and splice directives from all `recognizers` in one pass.
pub(crate) fn expand(
    recognizers: &[&dyn Recognizer],
    input: &str,
    ctx: &EmbedContext<'_>,
) -> Expansion {
    let mut found: Vec<(Syntax, Occurrence)> = Vec::new();
    let mut diagnostics: Vec<(Syntax, Diagnostic)> = Vec::new();

    for recognizer in recognizers {
        let syntax = recognizer.syntax();
        let Findings {
            occurrences,
            diagnostics: reported,
        } = recognizer.find(input);

        // Opening tokens nobody accounted for could not be parsed at all.
        for opening in recognizer.opening().find_iter(input) {
            let start = opening.start();
            let covered = occurrences.iter().any(|o| o.range.contains(&start))
                || reported.iter().any(|d| d.offset == start);
            if !covered {
                diagnostics.push((
                    syntax,
                    Diagnostic {
                        offset: start,
                        kind: DiagnosticKind::Malformed("could not parse arguments".to_owned()),
                    },
                ));
            }
        }

        diagnostics.extend(reported.into_iter().map(|d| (syntax, d)));
        found.extend(occurrences.into_iter().map(|o| (syntax, o)));
    }

    found.sort_by_key(|(_, o)| o.range.start);

    let mut text = String::with_capacity(input.len());
    let mut embeds = Vec::with_capacity(found.len());
    let mut last = 0;

    for (syntax, Occurrence { range, directive }) in found {
        if range.start < last {
            diagnostics.push((
                syntax,
                Diagnostic {
                    offset: range.start,
                    kind: DiagnosticKind::Overlapping,
                },
            ));
            continue;
        }
        let asset = ctx.resolver.resolve(&directive.filename, ctx.document_dir);
        text.push_str(&input[last..range.start]);
        text.push_str(&render_embed(&asset.public_url, &directive));
        last = range.end;
        embeds.push(Embed {
            syntax,
            directive,
            asset,
        });
    }
    text.push_str(&input[last..]);

    diagnostics.sort_by_key(|(_, d)| d.offset);
    let rejected = diagnostics.iter().filter(|(_, d)| d.kind.rejects()).count();
    let warnings = diagnostics
        .iter()
        .map(|(syntax, d)| {
            format!(
                "line {}: {} directive {}",
                line_of(input, d.offset),
                syntax.label(),
                d.kind
            )
        })
        .collect();

    Expansion {
        text,
        embeds,
        warnings,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::resolver::{AssetOrigin, ResolverConfig};
    use pretty_assertions::assert_eq;

    fn processor() -> EmbedProcessor {
        EmbedProcessor::new(PathResolver::default()).with_all_syntaxes()
    }

    #[test]
    fn test_inline_directive_with_default_dir() {
        // Markdown page in docs/ referencing a schematic kept in the default directory.
        let tmp = tempfile::tempdir().unwrap();
        let default_dir = tmp.path().join("schematics");
        let processor = EmbedProcessor::new(PathResolver::new(ResolverConfig {
            default_dir: Some(default_dir.clone()),
            ..ResolverConfig::default()
        }))
        .with_all_syntaxes();

        let result = processor.process(
            r#"# Amp

{{ kicad_schematic("amp.kicad_sch", controls="full") }}
"#,
            Some(&tmp.path().join("docs")),
        );

        assert_eq!(
            result.text,
            r#"# Amp

<kicanvas-embed src="/static/schematics/amp.kicad_sch" controls="full"></kicanvas-embed>
"#
        );
        assert_eq!(result.embeds.len(), 1);
        assert_eq!(result.embeds[0].asset.source_path, default_dir.join("amp.kicad_sch"));
        assert_eq!(result.embeds[0].asset.origin, AssetOrigin::DefaultDir);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_block_directive_replaces_options() {
        let input = "Title\n=====\n\n.. kicad-schematic:: ps.kicad_sch\n   :style: width: 600px;\n   :controls: minimal\n\nAfter.\n";
        let result = processor().process(input, None);
        assert_eq!(
            result.text,
            "Title\n=====\n\n<kicanvas-embed src=\"/static/schematics/ps.kicad_sch\" controls=\"minimal\" style=\"width: 600px;\"></kicanvas-embed>\n\nAfter.\n"
        );
    }

    #[cfg(feature = "tag-syntax")]
    #[test]
    fn test_all_syntaxes_emit_identical_markup() {
        let processor = processor();
        let inputs = [
            r#"{{ kicad_schematic("amp.kicad_sch", style="width: 100%;", controls="full") }}"#,
            ".. kicad-schematic:: amp.kicad_sch\n   :controls: full\n   :style: width: 100%;",
            r#"{% kicad_schematic "amp.kicad_sch" controls="full" style="width: 100%;" %}"#,
        ];
        let outputs: Vec<String> = inputs
            .iter()
            .map(|input| processor.process(input, None).text)
            .collect();
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[1], outputs[2]);
        assert_eq!(
            outputs[0],
            r#"<kicanvas-embed src="/static/schematics/amp.kicad_sch" controls="full" style="width: 100%;"></kicanvas-embed>"#
        );
    }

    #[cfg(feature = "tag-syntax")]
    #[test]
    fn test_quoted_names_with_spaces_resolve_alike() {
        let processor = processor();
        let sources: Vec<PathBuf> = [
            r#"{{ kicad_schematic("Power Supply.kicad_sch") }}"#,
            ".. kicad-schematic:: 'Power Supply.kicad_sch'",
            r#"{% kicad_schematic "Power Supply.kicad_sch" %}"#,
        ]
        .iter()
        .map(|input| processor.process(input, None).embeds[0].asset.source_path.clone())
        .collect();
        assert_eq!(sources[0], sources[1]);
        assert_eq!(sources[1], sources[2]);
    }

    #[cfg(feature = "tag-syntax")]
    #[test]
    fn test_mixed_syntaxes_in_document_order() {
        let input = "{% kicad_schematic \"first.kicad_sch\" %}\n\n.. kicad-schematic:: second.kicad_sch\n\n{{ kicad_schematic(\"third.kicad_sch\") }}\n";
        let result = processor().process(input, None);
        let names: Vec<&str> = result
            .embeds
            .iter()
            .map(|e| e.directive.filename.as_str())
            .collect();
        assert_eq!(names, vec!["first.kicad_sch", "second.kicad_sch", "third.kicad_sch"]);
        assert_eq!(
            result.embeds.iter().map(|e| e.syntax).collect::<Vec<_>>(),
            vec![Syntax::Tag, Syntax::Block, Syntax::Inline]
        );
        let first = result.text.find("first.kicad_sch").unwrap();
        let third = result.text.find("third.kicad_sch").unwrap();
        assert!(first < third);
    }

    #[test]
    fn test_two_directives_same_syntax_in_order() {
        let input = r#"{{ kicad_schematic("a.kicad_sch") }} and {{ kicad_schematic("b.kicad_sch") }}"#;
        let result = processor().process(input, None);
        assert_eq!(
            result.text,
            r#"<kicanvas-embed src="/static/schematics/a.kicad_sch"></kicanvas-embed> and <kicanvas-embed src="/static/schematics/b.kicad_sch"></kicanvas-embed>"#
        );
    }

    #[test]
    fn test_malformed_left_verbatim_with_warning() {
        let input = "Intro\n\n{{ kicad_schematic(\"amp.kicad_sch\" }}\n";
        let result = processor().process(input, None);
        assert_eq!(result.text, input);
        assert!(result.embeds.is_empty());
        assert_eq!(result.rejected, 1);
        assert_eq!(
            result.warnings,
            vec!["line 3: {{ kicad_schematic() }} directive left unchanged: could not parse arguments"]
        );
    }

    #[test]
    fn test_repeated_argument_warns_once() {
        let input = r#"{{ kicad_schematic("a", controls="full", controls="none") }}"#;
        let result = processor().process(input, None);
        assert_eq!(result.text, input);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.rejected, 1);
        assert!(result.warnings[0].contains("`controls` given more than once"));
    }

    #[test]
    fn test_unknown_argument_warns_but_expands() {
        let input = r#"{{ kicad_schematic("a.kicad_sch", height="10px") }}"#;
        let result = processor().process(input, None);
        assert_eq!(
            result.text,
            r#"<kicanvas-embed src="/static/schematics/a.kicad_sch"></kicanvas-embed>"#
        );
        assert_eq!(
            result.warnings,
            vec!["line 1: {{ kicad_schematic() }} directive ignores unknown argument `height`"]
        );
        assert_eq!(result.rejected, 0);
    }

    #[test]
    fn test_processing_output_is_idempotent() {
        let processor = processor();
        let first = processor.process(
            r#"{{ kicad_schematic("a.kicad_sch", style="content: '{{'") }}"#,
            None,
        );
        let second = processor.process(&first.text, None);
        assert_eq!(second.text, first.text);
        assert!(second.embeds.is_empty());
        assert!(second.warnings.is_empty());
    }

    #[test]
    fn test_opening_tokens_in_arguments_do_not_survive_expansion() {
        let processor = processor();
        for token in [
            ".. kicad-schematic::",
            "{{ kicad_schematic(",
            "{% kicad_schematic ",
        ] {
            let inputs = [
                format!(r#"{{{{ kicad_schematic("a.kicad_sch", style="x {token} b") }}}}"#),
                format!(r#"{{{{ kicad_schematic("{token}b.kicad_sch") }}}}"#),
                format!(".. kicad-schematic:: a.kicad_sch\n   :style: {token} b\n"),
            ];
            for input in &inputs {
                let first = processor.process(input, None);
                assert_eq!(first.embeds.len(), 1, "{input}");
                assert!(!crate::detect(&first.text), "{}", first.text);

                let second = processor.process(&first.text, None);
                assert_eq!(second.text, first.text);
                assert!(second.warnings.is_empty(), "{:?}", second.warnings);
            }
        }
    }

    #[test]
    fn test_document_dir_wins_when_file_exists() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("local.kicad_sch"), "(kicad_sch)").unwrap();
        let result = processor().process(
            r#"{{ kicad_schematic("local.kicad_sch") }}"#,
            Some(tmp.path()),
        );
        assert_eq!(result.embeds[0].asset.origin, AssetOrigin::Document);
        assert_eq!(
            result.embeds[0].asset.source_path,
            tmp.path().join("local.kicad_sch")
        );
    }

    #[test]
    fn test_only_registered_syntaxes_expand() {
        let processor = EmbedProcessor::new(PathResolver::default()).with_block_syntax();
        let input = r#"{{ kicad_schematic("a") }}"#;
        let result = processor.process(input, None);
        assert_eq!(result.text, input);
        assert!(result.warnings.is_empty());
        assert_eq!(processor.syntaxes(), vec![Syntax::Block]);
    }

    #[test]
    fn test_recognizer_scan_single_syntax() {
        let resolver = PathResolver::default();
        let ctx = EmbedContext {
            resolver: &resolver,
            document_dir: None,
        };
        let result = BlockRecognizer.scan(".. kicad-schematic:: a.kicad_sch\n", &ctx);
        assert_eq!(
            result.text,
            "<kicanvas-embed src=\"/static/schematics/a.kicad_sch\"></kicanvas-embed>\n"
        );
    }

    #[test]
    fn test_no_directives_passthrough() {
        let input = "Plain text with {{ other_macro() }} and {% other_tag %}.";
        let result = processor().process(input, None);
        assert_eq!(result.text, input);
        assert!(result.embeds.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_tag_syntax_registration_matches_feature() {
        let processor = EmbedProcessor::new(PathResolver::default()).with_tag_syntax();
        assert_eq!(
            processor.syntaxes().contains(&Syntax::Tag),
            tag_syntax_available()
        );
    }
}
