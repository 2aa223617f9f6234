//! `kce build` command implementation.

use std::path::PathBuf;

use clap::Args;
use kce_config::{CliSettings, Config};
use kce_site::{BuildReport, SiteBuilder};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover kicanvas.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory for the generated site (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Load the viewer script from the CDN (default: bundled copy).
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    cdn: Option<bool>,

    /// Load the bundled viewer script.
    #[arg(long, conflicts_with = "cdn")]
    no_cdn: bool,

    /// Process content without writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON build report to this file.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose output (log every copied schematic).
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the content directory cannot be
    /// read, or output cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            content_dir: self.source_dir.clone(),
            output_dir: self.output_dir.clone(),
            use_cdn: self.resolve_use_cdn(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(config = ?config.config_path, "Loaded configuration");

        let builder = SiteBuilder::from_config(&config).dry_run(self.dry_run);
        let build_config = builder.config();

        output.info(&format!("Source: {}", build_config.content_dir.display()));
        output.info(&format!("Output: {}", build_config.output_dir.display()));
        output.info(&format!("Viewer script: {}", config.viewer.script_url()));

        let report = builder.build()?;

        print_warnings(&output, &report);

        if let Some(path) = &self.report {
            std::fs::write(path, report.to_json()?)?;
            output.info(&format!("Report written to {}", path.display()));
        }

        let summary = format!(
            "{} pages processed ({} need the viewer), {} schematics embedded, {} copied, {} missing",
            report.pages.len(),
            report.viewer_pages(),
            report.embed_count(),
            report.assets_copied,
            report.assets_missing,
        );
        if self.dry_run {
            output.success(&format!("Dry run: {summary}"));
        } else {
            output.success(&format!(
                "Site built to {} ({summary})",
                builder.config().output_dir.display()
            ));
        }
        Ok(())
    }

    /// Resolve `use_cdn` from --cdn/--no-cdn flags.
    fn resolve_use_cdn(&self) -> Option<bool> {
        self.no_cdn.then_some(false).or(self.cdn)
    }
}

fn print_warnings(output: &Output, report: &BuildReport) {
    if report.warnings.is_empty() {
        return;
    }
    output.separator();
    for warning in &report.warnings {
        output.warning(&format!("Warning: {warning}"));
    }
    output.separator();
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: BuildArgs,
    }

    fn parse(args: &[&str]) -> Result<BuildArgs, clap::Error> {
        TestCli::try_parse_from(std::iter::once("kce-build").chain(args.iter().copied()))
            .map(|cli| cli.args)
    }

    #[test]
    fn test_cdn_flags() {
        assert_eq!(parse(&[]).unwrap().resolve_use_cdn(), None);
        assert_eq!(parse(&["--cdn"]).unwrap().resolve_use_cdn(), Some(true));
        assert_eq!(parse(&["--cdn", "false"]).unwrap().resolve_use_cdn(), Some(false));
        assert_eq!(parse(&["--no-cdn"]).unwrap().resolve_use_cdn(), Some(false));
        assert!(parse(&["--cdn", "--no-cdn"]).is_err());
    }

    #[test]
    fn test_execute_writes_site_and_report() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("kicanvas.toml"),
            "[schematics]\ndefault_dir = \"schematics\"\n",
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("content/schematics")).unwrap();
        fs::write(tmp.path().join("content/schematics/amp.kicad_sch"), "amp").unwrap();
        fs::write(
            tmp.path().join("content/index.html"),
            "<html><head></head><body>{{ kicad_schematic(\"amp.kicad_sch\") }}</body></html>",
        )
        .unwrap();

        let config = tmp.path().join("kicanvas.toml");
        let report = tmp.path().join("report.json");
        let args = parse(&[
            "--config",
            config.to_str().unwrap(),
            "--cdn",
            "--report",
            report.to_str().unwrap(),
        ])
        .unwrap();
        args.execute().unwrap();

        let html = fs::read_to_string(tmp.path().join("output/index.html")).unwrap();
        assert_eq!(
            html,
            "<html><head><script type=\"module\" src=\"https://kicanvas.org/kicanvas/kicanvas.js\"></script>\n</head><body><kicanvas-embed src=\"/static/schematics/amp.kicad_sch\"></kicanvas-embed></body></html>"
        );
        assert!(tmp.path().join("output/static/schematics/amp.kicad_sch").is_file());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report).unwrap()).unwrap();
        assert_eq!(json["assets_copied"], 1);
    }

    #[test]
    fn test_execute_refuses_to_overwrite_content() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("kicanvas.toml"), "").unwrap();
        fs::create_dir_all(tmp.path().join("content")).unwrap();
        let page = tmp.path().join("content/a.md");
        fs::write(&page, "{{ kicad_schematic(\"a.kicad_sch\") }}").unwrap();

        let config = tmp.path().join("kicanvas.toml");
        let content = tmp.path().join("content");
        let args = parse(&[
            "--config",
            config.to_str().unwrap(),
            "--output-dir",
            content.to_str().unwrap(),
        ])
        .unwrap();

        assert!(matches!(
            args.execute(),
            Err(CliError::Build(kce_site::BuildError::OutputIsContentDir(_)))
        ));
        assert_eq!(
            fs::read_to_string(page).unwrap(),
            "{{ kicad_schematic(\"a.kicad_sch\") }}"
        );
    }

    #[test]
    fn test_execute_missing_config_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        let args = parse(&["--config", missing.to_str().unwrap()]).unwrap();
        assert!(matches!(args.execute(), Err(CliError::Config(_))));
    }
}
