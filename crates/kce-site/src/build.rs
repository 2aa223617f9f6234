//! Site build pass.
//!
//! Walks the content directory, expands schematic directives in every content
//! unit, writes the result to the output directory and copies the referenced
//! schematics next to it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use kce_config::Config;
use kce_embed::{EmbedProcessor, PathResolver, ResolvedAsset, ResolverConfig, Syntax};
use serde::Serialize;

use crate::materialize::{AssetMaterializer, Materialized};
use crate::script::ViewerScript;

/// File extensions treated as content units.
pub const CONTENT_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "html", "htm"];

/// Error returned by [`SiteBuilder`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Content directory not found: {}", .0.display())]
    ContentDirNotFound(PathBuf),

    #[error("Output directory is the content directory: {}", .0.display())]
    OutputIsContentDir(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Directories and mode for a build.
#[derive(Clone, Debug)]
pub struct BuildConfig {
    /// Directory holding the content units.
    pub content_dir: PathBuf,
    /// Directory the processed units and schematics are written to.
    pub output_dir: PathBuf,
    /// Process everything but write nothing.
    pub dry_run: bool,
}

impl BuildConfig {
    /// Build directories from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            content_dir: config.site_resolved.content_dir.clone(),
            output_dir: config.site_resolved.output_dir.clone(),
            dry_run: false,
        }
    }
}

/// One expanded directive in a report.
#[derive(Clone, Debug, Serialize)]
pub struct EmbedReport {
    pub syntax: Syntax,
    pub filename: String,
    pub asset: ResolvedAsset,
}

/// What happened to one content unit.
#[derive(Clone, Debug, Serialize)]
pub struct PageReport {
    /// Path relative to the content directory.
    pub path: PathBuf,
    /// Whether the unit references a schematic and needs the viewer script.
    pub needs_viewer: bool,
    /// Whether the script element was inserted into the output.
    pub script_injected: bool,
    /// Expanded directives in document order.
    pub embeds: Vec<EmbedReport>,
    /// Directive warnings for this unit.
    pub warnings: Vec<String>,
}

/// Summary of a build.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BuildReport {
    pub pages: Vec<PageReport>,
    pub assets_copied: usize,
    pub assets_unchanged: usize,
    pub assets_missing: usize,
    /// All warnings, prefixed with the unit they belong to.
    pub warnings: Vec<String>,
}

impl BuildReport {
    /// Total number of expanded directives.
    #[must_use]
    pub fn embed_count(&self) -> usize {
        self.pages.iter().map(|p| p.embeds.len()).sum()
    }

    /// Number of units that need the viewer script.
    #[must_use]
    pub fn viewer_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.needs_viewer).count()
    }

    /// Pretty-printed JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Processor wired from configuration: resolver settings and enabled syntaxes.
#[must_use]
pub fn processor_from_config(config: &Config) -> EmbedProcessor {
    let resolver = PathResolver::new(ResolverConfig {
        content_dir: Some(config.site_resolved.content_dir.clone()),
        default_dir: config.schematics_resolved.default_dir.clone(),
        url_prefix: config.schematics_resolved.url_prefix.clone(),
    });

    let mut processor = EmbedProcessor::new(resolver);
    if config.syntaxes.inline {
        processor = processor.with_inline_syntax();
    }
    if config.syntaxes.block {
        processor = processor.with_block_syntax();
    }
    if config.syntaxes.tag {
        processor = processor.with_tag_syntax();
    }
    processor
}

/// Runs the build pass over a content directory.
pub struct SiteBuilder {
    config: BuildConfig,
    processor: EmbedProcessor,
    script: ViewerScript,
}

impl SiteBuilder {
    /// Create a builder.
    #[must_use]
    pub fn new(config: BuildConfig, processor: EmbedProcessor, script: ViewerScript) -> Self {
        Self {
            config,
            processor,
            script,
        }
    }

    /// Create a builder from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            BuildConfig::from_config(config),
            processor_from_config(config),
            ViewerScript::from_config(&config.viewer),
        )
    }

    /// Process everything but write nothing.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Build configuration in use.
    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the site.
    ///
    /// Missing schematics, rejected directives and unreadable units are
    /// reported as warnings and never stop the build.
    ///
    /// # Errors
    ///
    /// Returns an error if the content directory cannot be read, an output
    /// file cannot be written, or a writing build targets the content
    /// directory itself.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let content_dir = &self.config.content_dir;
        if !content_dir.is_dir() {
            return Err(BuildError::ContentDirNotFound(content_dir.clone()));
        }
        let output_dir = normalized(&self.config.output_dir);
        if !self.config.dry_run && output_dir == normalized(content_dir) {
            return Err(BuildError::OutputIsContentDir(self.config.output_dir.clone()));
        }

        let mut units = Vec::new();
        let entries = fs::read_dir(content_dir).map_err(|source| BuildError::Read {
            path: content_dir.clone(),
            source,
        })?;
        collect_units(entries, &output_dir, &mut units);
        units.sort();

        let materializer =
            AssetMaterializer::new(&self.config.output_dir).dry_run(self.config.dry_run);
        // Destination of every handled schematic and the file it came from.
        let mut copied_to: HashMap<PathBuf, PathBuf> = HashMap::new();
        let mut report = BuildReport::default();

        for path in units {
            let relative = path.strip_prefix(content_dir).unwrap_or(&path).to_path_buf();
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read content unit");
                    report
                        .warnings
                        .push(format!("{}: unreadable: {e}", relative.display()));
                    continue;
                }
            };

            let (page, text) = self.process_page(&relative, &source, path.parent());

            if !self.config.dry_run {
                let out_path = self.config.output_dir.join(&relative);
                write_file(&out_path, &text)?;
            }

            report.warnings.extend(
                page.warnings
                    .iter()
                    .map(|w| format!("{}: {w}", relative.display())),
            );

            for embed in &page.embeds {
                let schematic = materializer.source_path(&embed.asset);
                match copied_to.entry(materializer.destination(&embed.asset)) {
                    Entry::Occupied(first) => {
                        if *first.get() != schematic {
                            tracing::warn!(
                                url = %embed.asset.public_url,
                                kept = %first.get().display(),
                                skipped = %schematic.display(),
                                "Schematics collide at one URL"
                            );
                            report.warnings.push(format!(
                                "{}: schematic {} conflicts with {} at {}",
                                relative.display(),
                                schematic.display(),
                                first.get().display(),
                                embed.asset.public_url
                            ));
                        }
                        continue;
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(schematic);
                    }
                }
                match materializer.materialize(&embed.asset) {
                    Ok(Materialized::Copied(_)) => report.assets_copied += 1,
                    Ok(Materialized::Unchanged(_)) => report.assets_unchanged += 1,
                    Ok(Materialized::Missing(source)) => {
                        report.assets_missing += 1;
                        report.warnings.push(format!(
                            "{}: schematic not found: {}",
                            relative.display(),
                            source.display()
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to copy schematic");
                        report
                            .warnings
                            .push(format!("{}: {e}", relative.display()));
                    }
                }
            }

            report.pages.push(page);
        }

        tracing::info!(
            pages = report.pages.len(),
            embeds = report.embed_count(),
            copied = report.assets_copied,
            missing = report.assets_missing,
            dry_run = self.config.dry_run,
            "Site build finished"
        );
        Ok(report)
    }

    /// Expand one content unit.
    ///
    /// Returns the report and the output text. HTML units that reference a
    /// schematic also get the viewer script.
    #[must_use]
    pub fn process_page(
        &self,
        relative: &Path,
        source: &str,
        document_dir: Option<&Path>,
    ) -> (PageReport, String) {
        let needs_viewer = kce_embed::detect(source);
        let expansion = self.processor.process(source, document_dir);

        for warning in &expansion.warnings {
            tracing::warn!(path = %relative.display(), "{warning}");
        }

        let inject = needs_viewer && is_html(relative);
        let text = if inject {
            self.script.inject(&expansion.text)
        } else {
            expansion.text
        };

        let page = PageReport {
            path: relative.to_path_buf(),
            needs_viewer,
            script_injected: inject,
            embeds: expansion
                .embeds
                .into_iter()
                .map(|e| EmbedReport {
                    syntax: e.syntax,
                    filename: e.directive.filename,
                    asset: e.asset,
                })
                .collect(),
            warnings: expansion.warnings,
        };
        (page, text)
    }

    /// Read and expand a single file without writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn scan_file(&self, path: &Path) -> Result<PageReport, BuildError> {
        let source = fs::read_to_string(path).map_err(|source| BuildError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let relative = path.strip_prefix(&self.config.content_dir).unwrap_or(path);
        let (page, _) = self.process_page(relative, &source, path.parent());
        Ok(page)
    }

}

/// Recursively gather content units, skipping hidden entries and `output_dir`.
fn collect_units(entries: fs::ReadDir, output_dir: &Path, units: &mut Vec<PathBuf>) {
    for entry in entries.filter_map(Result::ok) {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            // Output nested inside the content tree must not be re-read.
            if normalized(&path) == output_dir {
                continue;
            }
            match fs::read_dir(&path) {
                Ok(children) => collect_units(children, output_dir, units),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable directory");
                }
            }
        } else if is_content_unit(&path) {
            units.push(path);
        }
    }
}

/// Canonical form of `path` when it exists, otherwise its lexically cleaned
/// absolute form.
fn normalized(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// Whether `path` has one of the [`CONTENT_EXTENSIONS`].
#[must_use]
pub fn is_content_unit(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            CONTENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}
