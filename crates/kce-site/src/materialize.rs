//! Schematic asset copying.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use kce_embed::{AssetOrigin, ResolvedAsset};

/// Error returned when a schematic exists but cannot be copied.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome of [`AssetMaterializer::materialize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Materialized {
    /// Copied to the contained destination (or would be, in dry-run mode).
    Copied(PathBuf),
    /// Destination already holds identical bytes.
    Unchanged(PathBuf),
    /// Source file does not exist; nothing was copied.
    Missing(PathBuf),
}

/// Copies resolved schematics into the output tree.
///
/// The destination mirrors the public URL: an asset served at
/// `/static/schematics/amp.kicad_sch` lands in
/// `<output_dir>/static/schematics/amp.kicad_sch`.
#[derive(Clone, Debug)]
pub struct AssetMaterializer {
    output_dir: PathBuf,
    dry_run: bool,
}

impl AssetMaterializer {
    /// Create a materializer writing below `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            dry_run: false,
        }
    }

    /// Check sources without touching the output tree.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// File the schematic is read from.
    ///
    /// Bare names that fell through every lookup step are read relative to
    /// the output directory.
    #[must_use]
    pub fn source_path(&self, asset: &ResolvedAsset) -> PathBuf {
        if asset.origin == AssetOrigin::OutputRoot && asset.source_path.is_relative() {
            self.output_dir.join(&asset.source_path)
        } else {
            asset.source_path.clone()
        }
    }

    /// File the schematic is copied to.
    #[must_use]
    pub fn destination(&self, asset: &ResolvedAsset) -> PathBuf {
        self.output_dir.join(asset.output_relative_path())
    }

    /// Copy the schematic behind `asset` to its public location.
    ///
    /// # Errors
    ///
    /// Returns an error if the source exists but the copy fails. A missing
    /// source is not an error; it is logged and reported as
    /// [`Materialized::Missing`].
    pub fn materialize(&self, asset: &ResolvedAsset) -> Result<Materialized, AssetError> {
        let source = self.source_path(asset);
        let destination = self.destination(asset);

        if !source.is_file() {
            tracing::warn!(
                source = %source.display(),
                url = %asset.public_url,
                "Schematic not found, skipping copy"
            );
            return Ok(Materialized::Missing(source));
        }

        if source == destination || same_contents(&source, &destination) {
            return Ok(Materialized::Unchanged(destination));
        }

        if self.dry_run {
            return Ok(Materialized::Copied(destination));
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source| AssetError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::copy(&source, &destination).map_err(|e| AssetError::Copy {
            from: source.clone(),
            to: destination.clone(),
            source: e,
        })?;

        tracing::debug!(
            from = %source.display(),
            to = %destination.display(),
            "Copied schematic"
        );
        Ok(Materialized::Copied(destination))
    }
}

fn same_contents(a: &Path, b: &Path) -> bool {
    let (Ok(meta_a), Ok(meta_b)) = (fs::metadata(a), fs::metadata(b)) else {
        return false;
    };
    if meta_a.len() != meta_b.len() {
        return false;
    }
    matches!((fs::read(a), fs::read(b)), (Ok(x), Ok(y)) if x == y)
}
