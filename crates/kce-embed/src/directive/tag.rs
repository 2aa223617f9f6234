//! Template-tag form.
//!
//! ```text
//! {% kicad_schematic "amp.kicad_sch" style="width: 100%;" controls="full" %}
//! ```
//!
//! The recognizer is only compiled with the `tag-syntax` feature. The opening
//! token is always available so the content scanner keeps detecting the form.

/// Opening token of the tag form.
pub const OPENING: &str = r"\{%\s*kicad_schematic\s+";

#[cfg(feature = "tag-syntax")]
pub use recognizer::TagRecognizer;

#[cfg(feature = "tag-syntax")]
mod recognizer {
    use std::sync::LazyLock;

    use regex::Regex;

    use super::OPENING;
    use crate::directive::args::{ARG_NAME, QUOTED_VALUE, accept, captured_filename, named_args};
    use crate::directive::{Findings, Recognizer, Syntax};

    static OPENING_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(&format!("(?i){OPENING}")).expect("invalid tag opening regex")
    });

    static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(&format!(
            r#"(?i){OPENING}(?:"(?P<dq>[^"]+)"|'(?P<sq>[^']+)'|(?P<bare>[^\s"'%=]+))(?P<args>(?:\s+{ARG_NAME}\s*=\s*{QUOTED_VALUE})*)\s*%\}}"#
        ))
        .expect("invalid tag directive regex")
    });

    /// Recognizer for `{% kicad_schematic ... %}`.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct TagRecognizer;

    impl Recognizer for TagRecognizer {
        fn syntax(&self) -> Syntax {
            Syntax::Tag
        }

        fn opening(&self) -> &'static Regex {
            &OPENING_RE
        }

        fn find(&self, input: &str) -> Findings {
            let mut findings = Findings::default();
            for caps in PATTERN.captures_iter(input) {
                let (Some(whole), Some(filename)) = (caps.get(0), captured_filename(&caps))
                else {
                    continue;
                };
                let args = caps.name("args").map_or("", |m| m.as_str());
                accept(&mut findings, whole.range(), filename, named_args(args));
            }
            findings
        }
    }
}
