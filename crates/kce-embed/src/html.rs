//! Canonical `<kicanvas-embed>` markup.

use crate::directive::EmbedDirective;

/// Render the viewer element for a directive whose schematic is served at `src`.
///
/// Attributes appear in a fixed order (`src`, `controls`, `style`); absent
/// optional values produce no attribute at all.
///
/// # Example
///
/// ```
/// use kce_embed::{EmbedDirective, render_embed};
///
/// let directive = EmbedDirective::new("amp.kicad_sch").with_controls("full");
/// assert_eq!(
///     render_embed("/static/schematics/amp.kicad_sch", &directive),
///     r#"<kicanvas-embed src="/static/schematics/amp.kicad_sch" controls="full"></kicanvas-embed>"#
/// );
/// ```
#[must_use]
pub fn render_embed(src: &str, directive: &EmbedDirective) -> String {
    let mut html = String::with_capacity(64 + src.len());
    html.push_str("<kicanvas-embed");
    push_attr(&mut html, "src", src);
    if let Some(controls) = &directive.controls {
        push_attr(&mut html, "controls", controls.as_str());
    }
    if let Some(style) = &directive.style {
        push_attr(&mut html, "style", style);
    }
    html.push_str("></kicanvas-embed>");
    html
}

fn push_attr(html: &mut String, name: &str, value: &str) {
    html.push(' ');
    html.push_str(name);
    html.push_str("=\"");
    html.push_str(&escape_attr(value));
    html.push('"');
}

/// Escape a string for use inside a double-quoted HTML attribute.
///
/// Braces and the second colon of `::` are encoded as well, so an emitted
/// attribute never re-forms the opening of any directive syntax.
#[must_use]
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev = None;
    for c in s.chars() {
        match c {
            ':' if prev == Some(':') => result.push_str("&#58;"),
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            '{' => result.push_str("&#123;"),
            '}' => result.push_str("&#125;"),
            _ => result.push(c),
        }
        prev = Some(c);
    }
    result
}
