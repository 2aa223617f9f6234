//! Argument extraction shared by the recognizers.
//!
//! Handles the quoted/bare filename capture groups and `key="value"` pairs.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Diagnostic, DiagnosticKind, EmbedDirective, Findings, Occurrence};

/// Regex fragment for a named argument key.
pub(crate) const ARG_NAME: &str = r"[a-z_][a-z0-9_-]*";

/// Regex fragment for a single- or double-quoted value.
pub(crate) const QUOTED_VALUE: &str = r#"(?:"[^"]*"|'[^']*')"#;

static NAMED_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"(?i)({ARG_NAME})\s*=\s*(?:"([^"]*)"|'([^']*)')"#))
        .expect("invalid named argument regex")
});

/// Filename from the `dq`, `sq` or `bare` capture group, whichever matched.
pub(crate) fn captured_filename(caps: &Captures<'_>) -> Option<String> {
    ["dq", "sq", "bare"]
        .iter()
        .find_map(|name| caps.name(name))
        .map(|m| m.as_str().to_owned())
}

/// Iterate `key="value"` / `key='value'` pairs in an argument list.
pub(crate) fn named_args(s: &str) -> impl Iterator<Item = (&str, &str)> {
    NAMED_ARG.captures_iter(s).filter_map(|caps| {
        let key = caps.get(1)?.as_str();
        let value = caps.get(2).or_else(|| caps.get(3))?.as_str();
        Some((key, value))
    })
}

/// Record a directive found at `range`, or the reason it was rejected.
///
/// Keys are matched case-insensitively. A repeated `style` or `controls`
/// rejects the whole directive; unknown keys are reported and skipped.
pub(crate) fn accept<'a>(
    findings: &mut Findings,
    range: Range<usize>,
    filename: String,
    args: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    let offset = range.start;
    let mut style: Option<&str> = None;
    let mut controls: Option<&str> = None;
    let mut unknown = Vec::new();

    for (key, value) in args {
        let slot = if key.eq_ignore_ascii_case("style") {
            &mut style
        } else if key.eq_ignore_ascii_case("controls") {
            &mut controls
        } else {
            unknown.push(key.to_owned());
            continue;
        };
        if slot.replace(value.trim()).is_some() {
            findings.diagnostics.push(Diagnostic {
                offset,
                kind: DiagnosticKind::RepeatedArgument(key.to_ascii_lowercase()),
            });
            return;
        }
    }

    findings
        .diagnostics
        .extend(unknown.into_iter().map(|key| Diagnostic {
            offset,
            kind: DiagnosticKind::UnknownArgument(key),
        }));

    let directive = EmbedDirective::new(filename)
        .with_style(style.unwrap_or_default())
        .with_controls(controls.unwrap_or_default());
    findings.occurrences.push(Occurrence { range, directive });
}
