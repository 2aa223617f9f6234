//! Block directive form used by reStructuredText sources.
//!
//! ```text
//! .. kicad-schematic:: amp.kicad_sch
//!    :style: width: 100%;
//!    :controls: full
//! ```
//!
//! Option lines must be indented deeper than the directive line. A line
//! indented deeper than an option line continues that option's value. The
//! block ends at the first blank line or any other line.

use std::sync::LazyLock;

use regex::Regex;

use super::args::accept;
use super::{Diagnostic, DiagnosticKind, Findings, Recognizer, Syntax};

/// Opening token of the block form.
pub const OPENING: &str = r"\.\.\s+kicad-schematic::";

static OPENING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){OPENING}")).expect("invalid block opening regex")
});

static DIRECTIVE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<indent>[ \t]*)\.\.[ \t]+kicad-schematic::(?:[ \t]+(?P<arg>.*?))?[ \t]*$")
        .expect("invalid block directive regex")
});

static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>[ \t]+):(?P<key>[A-Za-z_][A-Za-z0-9_-]*):(?:[ \t]+(?P<value>.*))?$")
        .expect("invalid block option regex")
});

/// Recognizer for `.. kicad-schematic::` blocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockRecognizer;

impl Recognizer for BlockRecognizer {
    fn syntax(&self) -> Syntax {
        Syntax::Block
    }

    fn opening(&self) -> &'static Regex {
        &OPENING_RE
    }

    fn find(&self, input: &str) -> Findings {
        let lines = line_spans(input);
        let mut findings = Findings::default();
        let mut i = 0;

        while i < lines.len() {
            let (line_start, line) = lines[i];
            i += 1;
            let Some(caps) = DIRECTIVE_LINE.captures(line) else {
                continue;
            };
            let indent = caps.name("indent").map_or(0, |m| m.len());
            let opening = line_start + indent;
            let mut end = line_start + line.len();

            let mut options: Vec<(String, String)> = Vec::new();
            let mut option_indent = 0;
            while let Some(&(next_start, next)) = lines.get(i) {
                if next.trim().is_empty() {
                    break;
                }
                if let Some(opt) = OPTION_LINE.captures(next)
                    && opt["indent"].len() > indent
                {
                    option_indent = opt["indent"].len();
                    let value = opt.name("value").map_or("", |m| m.as_str());
                    options.push((opt["key"].to_owned(), value.trim().to_owned()));
                } else if let Some((_, value)) = options.last_mut()
                    && leading_whitespace(next) > option_indent
                {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(next.trim());
                } else {
                    break;
                }
                end = next_start + next.len();
                i += 1;
            }

            match parse_argument(caps.name("arg").map_or("", |m| m.as_str())) {
                Ok(filename) => accept(
                    &mut findings,
                    opening..end,
                    filename,
                    options.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                ),
                Err(reason) => findings.diagnostics.push(Diagnostic {
                    offset: opening,
                    kind: DiagnosticKind::Malformed(reason.to_owned()),
                }),
            }
        }

        findings
    }
}

/// Start offset and content (without line ending) of every line.
fn line_spans(input: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    input
        .split_inclusive('\n')
        .map(|raw| {
            let start = offset;
            offset += raw.len();
            (start, raw.trim_end_matches(['\n', '\r']))
        })
        .collect()
}

fn leading_whitespace(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// The directive argument: one quoted name, or one bare token.
fn parse_argument(arg: &str) -> Result<String, &'static str> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err("missing filename");
    }
    for quote in ['"', '\''] {
        if let Some(rest) = arg.strip_prefix(quote) {
            return match rest.strip_suffix(quote) {
                Some("") => Err("missing filename"),
                Some(inner) if !inner.contains(quote) => Ok(inner.to_owned()),
                _ => Err("unbalanced quotes in filename"),
            };
        }
    }
    if arg.contains(['"', '\'']) {
        return Err("unbalanced quotes in filename");
    }
    if arg.contains(char::is_whitespace) {
        return Err("filename contains spaces; quote it");
    }
    Ok(arg.to_owned())
}
