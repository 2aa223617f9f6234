//! Content scanner.
//!
//! Decides whether a page references a schematic and therefore needs the
//! viewer script. Uses the recognizers' own opening tokens, so anything a
//! recognizer can expand is also detected here.

use std::sync::LazyLock;

use regex::Regex;

use crate::directive::{block, inline, tag};

/// Opening tokens of every directive syntax.
pub const OPENING_PATTERNS: [&str; 3] = [inline::OPENING, block::OPENING, tag::OPENING];

static DETECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?im)(?:{})", OPENING_PATTERNS.join("|")))
        .expect("invalid scanner regex")
});

/// Whether `text` contains the opening token of any embed directive.
///
/// Detection is purely lexical: a malformed directive still counts, and text
/// that was already expanded does not.
///
/// # Example
///
/// ```
/// assert!(kce_embed::detect(".. kicad-schematic:: amp.kicad_sch"));
/// assert!(!kce_embed::detect("# Plain page"));
/// ```
#[must_use]
pub fn detect(text: &str) -> bool {
    DETECT.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{BlockRecognizer, EmbedProcessor, InlineRecognizer, Recognizer};
    use crate::resolver::PathResolver;

    const SAMPLES: &[&str] = &[
        r#"{{ kicad_schematic("amp.kicad_sch") }}"#,
        r#"text {{kicad_schematic('a b.kicad_sch', controls="full")}} text"#,
        ".. kicad-schematic:: amp.kicad_sch\n   :controls: none\n",
        "  .. KICAD-SCHEMATIC:: x\n",
        r#"{% kicad_schematic "amp.kicad_sch" %}"#,
        r#"{%kicad_schematic amp.kicad_sch style="width: 1px;"%}"#,
    ];

    #[test]
    fn test_detects_every_syntax() {
        for sample in SAMPLES {
            assert!(detect(sample), "{sample:?}");
        }
    }

    #[test]
    fn test_ignores_plain_content() {
        assert!(!detect("# Title\n\nNo schematics here. kicad_schematic is a word."));
        assert!(!detect("{{ other_macro() }} {% include 'x' %} .. note::"));
    }

    #[test]
    fn test_detects_malformed_directive() {
        assert!(detect(r#"{{ kicad_schematic("unterminated" }}"#));
    }

    #[test]
    fn test_detects_on_later_line() {
        assert!(detect("first line\nsecond\n.. kicad-schematic:: a\n"));
    }

    #[test]
    fn test_every_occurrence_is_detected_at_its_start() {
        #[cfg_attr(not(feature = "tag-syntax"), allow(unused_mut))]
        let mut recognizers: Vec<Box<dyn Recognizer>> =
            vec![Box::new(InlineRecognizer), Box::new(BlockRecognizer)];
        #[cfg(feature = "tag-syntax")]
        recognizers.push(Box::new(crate::directive::TagRecognizer));

        for sample in SAMPLES {
            for recognizer in &recognizers {
                for occurrence in recognizer.find(sample).occurrences {
                    let found = DETECT
                        .find_at(sample, occurrence.range.start)
                        .map(|m| m.start());
                    assert_eq!(found, Some(occurrence.range.start), "{sample:?}");
                }
            }
        }
    }

    #[test]
    fn test_expanded_output_not_detected() {
        let processor = EmbedProcessor::new(PathResolver::default()).with_all_syntaxes();
        for sample in SAMPLES {
            let expansion = processor.process(sample, None);
            if expansion.warnings.is_empty() {
                assert!(!detect(&expansion.text), "{sample:?}");
            }
        }
    }
}
