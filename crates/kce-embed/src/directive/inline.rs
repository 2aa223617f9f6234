//! Function-call form used by Markdown macro engines.
//!
//! ```text
//! {{ kicad_schematic("amp.kicad_sch", style="width: 100%;", controls="full") }}
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::args::{ARG_NAME, QUOTED_VALUE, accept, captured_filename, named_args};
use super::{Findings, Recognizer, Syntax};

/// Opening token of the inline form.
pub const OPENING: &str = r"\{\{\s*kicad_schematic\s*\(";

static OPENING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){OPENING}")).expect("invalid inline opening regex"));

static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?i){OPENING}\s*(?:"(?P<dq>[^"]+)"|'(?P<sq>[^']+)'|(?P<bare>[^\s"',()]+))\s*(?P<args>(?:,\s*{ARG_NAME}\s*=\s*{QUOTED_VALUE}\s*)*)\)\s*\}}\}}"#
    ))
    .expect("invalid inline directive regex")
});

/// Recognizer for `{{ kicad_schematic(...) }}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineRecognizer;

impl Recognizer for InlineRecognizer {
    fn syntax(&self) -> Syntax {
        Syntax::Inline
    }

    fn opening(&self) -> &'static Regex {
        &OPENING_RE
    }

    fn find(&self, input: &str) -> Findings {
        let mut findings = Findings::default();
        for caps in PATTERN.captures_iter(input) {
            let (Some(whole), Some(filename)) = (caps.get(0), captured_filename(&caps)) else {
                continue;
            };
            let args = caps.name("args").map_or("", |m| m.as_str());
            accept(&mut findings, whole.range(), filename, named_args(args));
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{Controls, DiagnosticKind, EmbedDirective};
    use pretty_assertions::assert_eq;

    fn directives(input: &str) -> Vec<EmbedDirective> {
        InlineRecognizer
            .find(input)
            .occurrences
            .into_iter()
            .map(|o| o.directive)
            .collect()
    }

    #[test]
    fn test_filename_only() {
        let input = r#"Before {{ kicad_schematic("amp.kicad_sch") }} after"#;
        let findings = InlineRecognizer.find(input);
        assert_eq!(findings.occurrences.len(), 1);
        let occurrence = &findings.occurrences[0];
        assert_eq!(&input[occurrence.range.clone()], r#"{{ kicad_schematic("amp.kicad_sch") }}"#);
        assert_eq!(occurrence.directive, EmbedDirective::new("amp.kicad_sch"));
    }

    #[test]
    fn test_single_quotes_and_bare_name() {
        assert_eq!(
            directives("{{ kicad_schematic('a.kicad_sch') }} {{kicad_schematic(b.kicad_sch)}}"),
            vec![
                EmbedDirective::new("a.kicad_sch"),
                EmbedDirective::new("b.kicad_sch"),
            ]
        );
    }

    #[test]
    fn test_filename_with_spaces() {
        assert_eq!(
            directives(r#"{{ kicad_schematic("My Board.kicad_sch") }}"#),
            vec![EmbedDirective::new("My Board.kicad_sch")]
        );
    }

    #[test]
    fn test_named_arguments_any_order() {
        let a = directives(
            r#"{{ kicad_schematic("x.kicad_sch", style="width: 600px;", controls="full") }}"#,
        );
        let b = directives(
            r#"{{ kicad_schematic("x.kicad_sch", controls='full', style='width: 600px;') }}"#,
        );
        assert_eq!(a, b);
        assert_eq!(a[0].controls, Some(Controls::Full));
        assert_eq!(a[0].style.as_deref(), Some("width: 600px;"));
    }

    #[test]
    fn test_multiline_call() {
        let input = "{{ kicad_schematic(\n    \"x.kicad_sch\",\n    controls=\"none\"\n) }}";
        assert_eq!(
            directives(input),
            vec![EmbedDirective::new("x.kicad_sch").with_controls("none")]
        );
    }

    #[test]
    fn test_keyword_case_insensitive() {
        assert_eq!(directives(r#"{{ KiCad_Schematic("a") }}"#).len(), 1);
    }

    #[test]
    fn test_repeated_argument_rejected() {
        let findings =
            InlineRecognizer.find(r#"{{ kicad_schematic("a", style="x", style="y") }}"#);
        assert!(findings.occurrences.is_empty());
        assert_eq!(
            findings.diagnostics[0].kind,
            DiagnosticKind::RepeatedArgument("style".to_owned())
        );
    }

    #[test]
    fn test_unclosed_call_not_matched() {
        let input = r#"{{ kicad_schematic("amp.kicad_sch" }}"#;
        assert!(InlineRecognizer.find(input).occurrences.is_empty());
        assert!(InlineRecognizer.opening().is_match(input));
    }

    #[test]
    fn test_empty_filename_not_matched() {
        assert!(
            InlineRecognizer
                .find(r#"{{ kicad_schematic("") }}"#)
                .occurrences
                .is_empty()
        );
    }
}
