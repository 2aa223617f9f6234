//! Configuration management for kicanvas-embed.
//!
//! Parses `kicanvas.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.content_dir`
//! - `site.output_dir`
//! - `schematics.default_dir`
//! - `viewer.local_url`
//! - `viewer.cdn_url`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override content source directory.
    pub content_dir: Option<PathBuf>,
    /// Override build output directory.
    pub output_dir: Option<PathBuf>,
    /// Override whether the viewer script is loaded from the CDN.
    pub use_cdn: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "kicanvas.toml";

/// Default public URL prefix for copied schematics.
pub const DEFAULT_URL_PREFIX: &str = "/static/schematics";

/// Default location of the bundled viewer script.
pub const DEFAULT_LOCAL_URL: &str = "/static/js/kicanvas.js";

/// Default remote location of the viewer script.
pub const DEFAULT_CDN_URL: &str = "https://kicanvas.org/kicanvas/kicanvas.js";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site directories (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Schematic lookup settings (paths are relative strings from TOML).
    schematics: SchematicsConfigRaw,
    /// Viewer script configuration.
    pub viewer: ViewerConfig,
    /// Which directive syntaxes are recognized.
    pub syntaxes: SyntaxesConfig,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Resolved schematics configuration (set after loading).
    #[serde(skip)]
    pub schematics_resolved: SchematicsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_base_dir(Path::new("."))
    }
}

/// Raw site configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    content_dir: Option<String>,
    output_dir: Option<String>,
}

/// Resolved site directories.
#[derive(Debug, Default, Clone)]
pub struct SiteConfig {
    /// Directory holding the content units (articles, pages).
    pub content_dir: PathBuf,
    /// Directory the generated site is written to.
    pub output_dir: PathBuf,
}

/// Raw schematics configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SchematicsConfigRaw {
    default_dir: Option<String>,
    url_prefix: Option<String>,
}

/// Resolved schematic lookup settings.
#[derive(Debug, Clone)]
pub struct SchematicsConfig {
    /// Fallback directory searched for schematics, relative paths in the file
    /// are resolved against the content directory.
    pub default_dir: Option<PathBuf>,
    /// Public URL prefix under which schematics are published (no trailing slash).
    pub url_prefix: String,
}

impl Default for SchematicsConfig {
    fn default() -> Self {
        Self {
            default_dir: None,
            url_prefix: DEFAULT_URL_PREFIX.to_owned(),
        }
    }
}

/// Viewer script configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ViewerConfig {
    /// Reference the remote viewer script instead of the bundled copy.
    pub use_cdn: bool,
    /// URL of the bundled viewer script.
    pub local_url: String,
    /// URL of the remote viewer script.
    pub cdn_url: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            use_cdn: false,
            local_url: DEFAULT_LOCAL_URL.to_owned(),
            cdn_url: DEFAULT_CDN_URL.to_owned(),
        }
    }
}

impl ViewerConfig {
    /// URL the generated pages should load the viewer from.
    #[must_use]
    pub fn script_url(&self) -> &str {
        if self.use_cdn {
            &self.cdn_url
        } else {
            &self.local_url
        }
    }
}

/// Directive syntax toggles.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SyntaxesConfig {
    /// `{{ kicad_schematic(...) }}`
    pub inline: bool,
    /// `.. kicad-schematic::`
    pub block: bool,
    /// `{% kicad_schematic ... %}`
    pub tag: bool,
}

impl Default for SyntaxesConfig {
    fn default() -> Self {
        Self {
            inline: true,
            block: true,
            tag: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`viewer.cdn_url`").
        field: String,
        /// Error message (e.g., "${`KICANVAS_CDN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `kicanvas.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Create default config with paths relative to the given base directory.
    #[must_use]
    pub fn with_base_dir(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            schematics: SchematicsConfigRaw::default(),
            viewer: ViewerConfig::default(),
            syntaxes: SyntaxesConfig::default(),
            site_resolved: SiteConfig {
                content_dir: base.join("content"),
                output_dir: base.join("output"),
            },
            schematics_resolved: SchematicsConfig::default(),
            config_path: None,
        }
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(content_dir) = &settings.content_dir {
            self.site_resolved.content_dir.clone_from(content_dir);
            // default_dir follows the content directory it was relative to
            if let Some(dir) = self.schematics.default_dir.as_deref().filter(|d| !d.is_empty()) {
                self.schematics_resolved.default_dir = Some(content_dir.join(dir));
            }
        }
        if let Some(output_dir) = &settings.output_dir {
            self.site_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(use_cdn) = settings.use_cdn {
            self.viewer.use_cdn = use_cdn;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::with_base_dir(&cwd)
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_schematics()?;
        self.validate_viewer()?;
        Ok(())
    }

    fn validate_schematics(&self) -> Result<(), ConfigError> {
        let prefix = &self.schematics_resolved.url_prefix;
        require_non_empty(prefix, "schematics.url_prefix")?;
        if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(
                "schematics.url_prefix must start with /".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_viewer(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.viewer.local_url, "viewer.local_url")?;
        require_non_empty(&self.viewer.cdn_url, "viewer.cdn_url")?;
        require_http_url(&self.viewer.cdn_url, "viewer.cdn_url")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_opt(&mut self.site.content_dir, "site.content_dir")?;
        expand::expand_opt(&mut self.site.output_dir, "site.output_dir")?;
        expand::expand_opt(&mut self.schematics.default_dir, "schematics.default_dir")?;

        self.viewer.local_url = expand::expand_env(&self.viewer.local_url, "viewer.local_url")?;
        self.viewer.cdn_url = expand::expand_env(&self.viewer.cdn_url, "viewer.cdn_url")?;

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    ///
    /// `schematics.default_dir` is resolved against the content directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        let content_dir = resolve(self.site.content_dir.as_deref(), "content");
        let output_dir = resolve(self.site.output_dir.as_deref(), "output");

        let default_dir = self
            .schematics
            .default_dir
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| content_dir.join(d));
        let url_prefix = self
            .schematics
            .url_prefix
            .as_deref()
            .map_or(DEFAULT_URL_PREFIX, |p| p.trim_end_matches('/'))
            .to_owned();

        self.site_resolved = SiteConfig {
            content_dir,
            output_dir,
        };
        self.schematics_resolved = SchematicsConfig {
            default_dir,
            url_prefix,
        };
    }
}
