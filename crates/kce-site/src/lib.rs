//! Site build pass for `KiCad` schematic embeds.
//!
//! Ties the directive processor to a content tree on disk:
//!
//! - [`SiteBuilder`] walks the content directory and writes expanded units
//! - [`AssetMaterializer`] copies referenced schematics to their public location
//! - [`ViewerScript`] adds the viewer `<script>` to HTML units that need it
//!
//! # Example
//!
//! ```no_run
//! use kce_config::Config;
//! use kce_site::SiteBuilder;
//!
//! let config = Config::load(None, None)?;
//! let report = SiteBuilder::from_config(&config).build()?;
//! println!("{} schematics copied", report.assets_copied);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod build;
mod materialize;
mod script;

pub use build::{
    BuildConfig, BuildError, BuildReport, CONTENT_EXTENSIONS, EmbedReport, PageReport,
    SiteBuilder, is_content_unit, processor_from_config,
};
pub use materialize::{AssetError, AssetMaterializer, Materialized};
pub use script::ViewerScript;
