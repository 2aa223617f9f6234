//! Viewer script injection.

use std::sync::LazyLock;

use kce_config::ViewerConfig;
use kce_embed::escape_attr;
use regex::Regex;

static HEAD_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("invalid head regex"));

static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body\b[^>]*>").expect("invalid body regex"));

/// The `<script>` reference that loads the schematic viewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerScript {
    url: String,
}

impl ViewerScript {
    /// Script loaded from `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Script URL chosen by the viewer configuration (CDN or bundled copy).
    #[must_use]
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.script_url())
    }

    /// Script URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The `<script>` element, newline-terminated.
    #[must_use]
    pub fn tag(&self) -> String {
        format!(
            "<script type=\"module\" src=\"{}\"></script>\n",
            escape_attr(&self.url)
        )
    }

    /// Insert the script into an HTML document.
    ///
    /// Placed before `</head>`, else right after the opening `<body>` tag,
    /// else at the very start. Documents already referencing the URL are
    /// returned unchanged.
    #[must_use]
    pub fn inject(&self, html: &str) -> String {
        if html.contains(&self.url) {
            return html.to_owned();
        }
        let at = HEAD_CLOSE
            .find(html)
            .map(|m| m.start())
            .or_else(|| BODY_OPEN.find(html).map(|m| m.end()))
            .unwrap_or(0);

        let tag = self.tag();
        let mut out = String::with_capacity(html.len() + tag.len());
        out.push_str(&html[..at]);
        out.push_str(&tag);
        out.push_str(&html[at..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn script() -> ViewerScript {
        ViewerScript::new("/static/js/kicanvas.js")
    }

    #[test]
    fn test_injects_before_head_close() {
        let html = "<html><head><title>x</title></head><body></body></html>";
        assert_eq!(
            script().inject(html),
            "<html><head><title>x</title><script type=\"module\" src=\"/static/js/kicanvas.js\"></script>\n</head><body></body></html>"
        );
    }

    #[test]
    fn test_head_close_case_insensitive() {
        let html = "<HEAD></HEAD>";
        assert!(script().inject(html).ends_with("</script>\n</HEAD>"));
    }

    #[test]
    fn test_injects_after_body_open_without_head() {
        let html = "<body class=\"doc\"><p>hi</p></body>";
        assert_eq!(
            script().inject(html),
            "<body class=\"doc\"><script type=\"module\" src=\"/static/js/kicanvas.js\"></script>\n<p>hi</p></body>"
        );
    }

    #[test]
    fn test_prepends_to_fragment() {
        let html = "<p>fragment</p>";
        assert_eq!(
            script().inject(html),
            "<script type=\"module\" src=\"/static/js/kicanvas.js\"></script>\n<p>fragment</p>"
        );
    }

    #[test]
    fn test_skips_when_already_present() {
        let html = script().inject("<head></head>");
        assert_eq!(script().inject(&html), html);
    }

    #[test]
    fn test_from_config_picks_cdn_or_local() {
        let mut config = ViewerConfig::default();
        assert_eq!(
            ViewerScript::from_config(&config).url(),
            kce_config::DEFAULT_LOCAL_URL
        );
        config.use_cdn = true;
        assert_eq!(
            ViewerScript::from_config(&config).url(),
            kce_config::DEFAULT_CDN_URL
        );
    }
}
