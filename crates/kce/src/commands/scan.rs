//! `kce scan` command implementation.

use std::path::PathBuf;

use clap::Args;
use kce_config::{CliSettings, Config};
use kce_site::{BuildReport, PageReport, SiteBuilder};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the scan command.
#[derive(Args)]
pub(crate) struct ScanArgs {
    /// Files to scan (default: every content unit in the content directory).
    files: Vec<PathBuf>,

    /// Path to configuration file (default: auto-discover kicanvas.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ScanArgs {
    /// Execute the scan command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or a file cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            content_dir: self.source_dir.clone(),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let builder = SiteBuilder::from_config(&config).dry_run(true);

        let report = if self.files.is_empty() {
            builder.build()?
        } else {
            let pages = self
                .files
                .iter()
                .map(|path| builder.scan_file(path))
                .collect::<Result<Vec<_>, _>>()?;
            let warnings = pages
                .iter()
                .flat_map(|page| {
                    page.warnings
                        .iter()
                        .map(|w| format!("{}: {w}", page.path.display()))
                })
                .collect();
            BuildReport {
                pages,
                warnings,
                ..BuildReport::default()
            }
        };

        if self.json {
            output.result(&serde_json::to_string_pretty(&report.pages)?);
        } else {
            for page in &report.pages {
                print_page(&output, page);
            }
        }

        for warning in &report.warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        output.info(&format!(
            "{} of {} pages need the viewer script",
            report.viewer_pages(),
            report.pages.len()
        ));
        Ok(())
    }
}

fn print_page(output: &Output, page: &PageReport) {
    let marker = if page.needs_viewer {
        "viewer"
    } else {
        "no viewer"
    };
    output.highlight(&format!("{} ({marker})", page.path.display()));
    for embed in &page.embeds {
        output.result(&format!(
            "  {:<6} {} -> {}",
            embed.syntax.to_string(),
            embed.filename,
            embed.asset.public_url
        ));
    }
}
