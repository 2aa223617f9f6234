//! Schematic path resolution.
//!
//! Maps the filename written in a directive to the file expected on disk and
//! the public URL the generated page references.

use std::path::{Component, Path, PathBuf};

/// Default public URL prefix for copied schematics.
pub const DEFAULT_URL_PREFIX: &str = "/static/schematics";

/// Which resolution step produced a [`ResolvedAsset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "snake_case")
)]
pub enum AssetOrigin {
    /// The directive named an absolute path.
    Absolute,
    /// Found next to the referencing document.
    Document,
    /// Under the configured default schematics directory.
    DefaultDir,
    /// Bare filename, read relative to the output root.
    OutputRoot,
}

/// Result of resolving a directive's filename.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResolvedAsset {
    /// Where the schematic file is expected to exist.
    ///
    /// Relative only for [`AssetOrigin::OutputRoot`] (relative to the output
    /// directory) or when the configured directories are themselves relative.
    pub source_path: PathBuf,
    /// URL the generated page references, always under the URL prefix.
    pub public_url: String,
    /// Resolution step that produced this asset.
    pub origin: AssetOrigin,
}

impl ResolvedAsset {
    /// Public URL without its leading slash, usable as a path below the output root.
    #[must_use]
    pub fn output_relative_path(&self) -> PathBuf {
        self.public_url
            .split('/')
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Settings for [`PathResolver`].
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Content root. URLs of schematics found below it keep their path
    /// relative to it.
    pub content_dir: Option<PathBuf>,
    /// Configured default schematics directory.
    pub default_dir: Option<PathBuf>,
    /// Public URL prefix (leading slash, no trailing slash).
    pub url_prefix: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            content_dir: None,
            default_dir: None,
            url_prefix: DEFAULT_URL_PREFIX.to_owned(),
        }
    }
}

/// Resolves directive filenames to source paths and public URLs.
///
/// Resolution never fails and never requires the file to exist. The only
/// filesystem access is the existence check used to pick the document directory.
///
/// # Example
///
/// ```
/// use kce_embed::{AssetOrigin, PathResolver, ResolverConfig};
///
/// let resolver = PathResolver::new(ResolverConfig::default());
/// let asset = resolver.resolve("amp.kicad_sch", None);
///
/// assert_eq!(asset.public_url, "/static/schematics/amp.kicad_sch");
/// assert_eq!(asset.origin, AssetOrigin::OutputRoot);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PathResolver {
    config: ResolverConfig,
}

impl PathResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(mut config: ResolverConfig) -> Self {
        let trimmed = config.url_prefix.trim_end_matches('/');
        config.url_prefix = if trimmed.starts_with('/') {
            trimmed.to_owned()
        } else {
            format!("/{trimmed}")
        };
        Self { config }
    }

    /// Public URL prefix.
    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.config.url_prefix
    }

    /// Resolve `filename` as referenced from a document in `document_dir`.
    ///
    /// Order: absolute path as given; next to the document if the file exists
    /// there; under the default directory if one is configured; otherwise the
    /// bare filename relative to the output root.
    #[must_use]
    pub fn resolve(&self, filename: &str, document_dir: Option<&Path>) -> ResolvedAsset {
        let asset = if is_absolute(filename) {
            ResolvedAsset {
                source_path: PathBuf::from(filename),
                public_url: self.public_url(self.strip_absolute(filename)),
                origin: AssetOrigin::Absolute,
            }
        } else if let Some(candidate) = document_dir
            .map(|dir| dir.join(filename))
            .filter(|p| p.is_file())
        {
            ResolvedAsset {
                public_url: self.public_url(&self.content_relative(&candidate, filename)),
                source_path: candidate,
                origin: AssetOrigin::Document,
            }
        } else if let Some(default_dir) = &self.config.default_dir {
            ResolvedAsset {
                source_path: default_dir.join(filename),
                public_url: self.public_url(filename),
                origin: AssetOrigin::DefaultDir,
            }
        } else {
            ResolvedAsset {
                source_path: PathBuf::from(filename),
                public_url: self.public_url(filename),
                origin: AssetOrigin::OutputRoot,
            }
        };

        tracing::debug!(
            filename,
            origin = ?asset.origin,
            source = %asset.source_path.display(),
            url = %asset.public_url,
            "Resolved schematic"
        );
        asset
    }

    /// Relative part of the URL for an absolute filename.
    fn strip_absolute<'a>(&self, filename: &'a str) -> &'a str {
        if let Some(rest) = filename
            .strip_prefix(self.config.url_prefix.as_str())
            .and_then(|r| r.strip_prefix('/'))
        {
            return rest;
        }
        if let Some(content_dir) = &self.config.content_dir
            && let Ok(rest) = Path::new(filename).strip_prefix(content_dir)
            && let Some(rest) = rest.to_str()
        {
            return rest;
        }
        filename.trim_start_matches(['/', '\\'])
    }

    /// Path of `candidate` below the content root, keeping the document's
    /// directory in the URL. Falls back to `filename` outside the content root.
    fn content_relative(&self, candidate: &Path, filename: &str) -> String {
        self.config
            .content_dir
            .as_deref()
            .and_then(|root| candidate.strip_prefix(root).ok())
            .and_then(Path::to_str)
            .map_or_else(|| filename.to_owned(), |rel| rel.replace('\\', "/"))
    }

    fn public_url(&self, relative: &str) -> String {
        format!("{}/{}", self.config.url_prefix, normalize_url_path(relative))
    }
}

/// Resolve with the default URL prefix.
///
/// Convenience form of [`PathResolver::resolve`] for callers holding only the
/// document directory and the configured default directory.
#[must_use]
pub fn resolve(
    filename: &str,
    document_dir: Option<&Path>,
    default_dir: Option<&Path>,
) -> ResolvedAsset {
    PathResolver::new(ResolverConfig {
        default_dir: default_dir.map(Path::to_path_buf),
        ..ResolverConfig::default()
    })
    .resolve(filename, document_dir)
}

fn is_absolute(filename: &str) -> bool {
    filename.starts_with('/') || Path::new(filename).is_absolute()
}

/// Lexically normalize a relative URL path.
///
/// `.` segments are dropped and `..` pops the previous segment; a `..` with
/// nothing left to pop is discarded so the result never climbs above its root.
fn normalize_url_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(seg) => {
                if let Some(seg) = seg.to_str() {
                    segments.push(seg);
                }
            }
            Component::ParentDir => {
                segments.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    segments.join("/")
}
