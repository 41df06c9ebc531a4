//! Configuration management for the sitemap generator.
//!
//! Parses `sitemaps.toml` configuration files with serde and provides
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
//! - `server.host`
//! - `site.prefix`
//! - `site.host`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override site namespace prefix.
    pub site_prefix: Option<String>,
    /// Override public site host.
    pub site_host: Option<String>,
    /// Override store dump path.
    pub dump: Option<PathBuf>,
    /// Override component templates directory.
    pub templates_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "sitemaps.toml";

/// Template engines the generator ships with.
pub const KNOWN_ENGINES: &[&str] = &["jinja", "xml"];

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Site the sitemap is generated for.
    pub site: SiteConfig,
    /// Store configuration (paths are relative strings from TOML).
    store: StoreConfigRaw,
    /// Sitemap configuration (paths are relative strings from TOML).
    sitemap: SitemapConfigRaw,

    /// Resolved store configuration (set after loading).
    #[serde(skip)]
    pub store_resolved: StoreConfig,
    /// Resolved sitemap configuration (set after loading).
    #[serde(skip)]
    pub sitemap_resolved: SitemapConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7980,
        }
    }
}

/// Site configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Namespace prefix of the site's store keys (e.g. `example.com`).
    pub prefix: String,
    /// Public host name, exposed to templates as `locals.site.host`.
    pub host: String,
}

/// Raw store configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StoreConfigRaw {
    dump: Option<String>,
}

/// Resolved store configuration with absolute paths.
#[derive(Debug, Default)]
pub struct StoreConfig {
    /// JSON dump loaded into the in-memory store.
    pub dump: PathBuf,
}

/// Where page metadata comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    /// URL from the page record, published state from its reference.
    #[default]
    Record,
    /// Separate `<page>/meta` entries in the store.
    Stored,
}

/// Raw sitemap configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SitemapConfigRaw {
    prelude: Option<String>,
    postlude: Option<String>,
    limit: Option<usize>,
    templates_dir: Option<String>,
    engines: Option<Vec<String>>,
    metadata: Option<MetadataSource>,
}

/// Resolved sitemap configuration.
#[derive(Debug)]
pub struct SitemapConfig {
    /// XML prelude; `None` uses the built-in `<urlset>` opening, `""` disables it.
    pub prelude: Option<String>,
    /// XML postlude; `None` uses the built-in `</urlset>`, `""` disables it.
    pub postlude: Option<String>,
    /// Maximum number of stored pages scanned per sitemap.
    pub limit: usize,
    /// Component templates directory.
    pub templates_dir: PathBuf,
    /// Enabled template engines.
    pub engines: Vec<String>,
    /// Metadata source for the publicity check.
    pub metadata: MetadataSource,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            prelude: None,
            postlude: None,
            limit: 50_000,
            templates_dir: PathBuf::from("components"),
            engines: KNOWN_ENGINES.iter().map(|&e| e.to_owned()).collect(),
            metadata: MetadataSource::Record,
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
        /// Config field path (e.g., "`site.prefix`").
        field: String,
        /// Error message (e.g., "${`SITE_PREFIX`} not set").
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

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `sitemaps.toml` in current directory and parents.
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

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(prefix) = &settings.site_prefix {
            self.site.prefix.clone_from(prefix);
        }
        if let Some(host) = &settings.site_host {
            self.site.host.clone_from(host);
        }
        if let Some(dump) = &settings.dump {
            self.store_resolved.dump.clone_from(dump);
        }
        if let Some(templates_dir) = &settings.templates_dir {
            self.sitemap_resolved.templates_dir.clone_from(templates_dir);
        }
    }

    /// Get the validated site configuration.
    ///
    /// Use this instead of accessing the `site` field directly when a
    /// command needs to know which site to generate for.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `site.prefix` is empty.
    pub fn require_site(&self) -> Result<&SiteConfig, ConfigError> {
        require_non_empty(&self.site.prefix, "site.prefix")?;
        Ok(&self.site)
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
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            site: SiteConfig::default(),
            store: StoreConfigRaw::default(),
            sitemap: SitemapConfigRaw::default(),
            store_resolved: StoreConfig {
                dump: base.join("pages.json"),
            },
            sitemap_resolved: SitemapConfig {
                templates_dir: base.join("components"),
                ..SitemapConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir);
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
        self.validate_server()?;
        self.validate_sitemap()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate sitemap configuration.
    fn validate_sitemap(&self) -> Result<(), ConfigError> {
        let sitemap = &self.sitemap_resolved;

        if sitemap.limit == 0 {
            return Err(ConfigError::Validation(
                "sitemap.limit must be greater than 0".to_owned(),
            ));
        }

        if sitemap.engines.is_empty() {
            return Err(ConfigError::Validation(
                "sitemap.engines cannot be empty".to_owned(),
            ));
        }
        if let Some(unknown) = sitemap
            .engines
            .iter()
            .find(|engine| !KNOWN_ENGINES.contains(&engine.as_str()))
        {
            return Err(ConfigError::Validation(format!(
                "sitemap.engines: unknown engine {unknown:?} (known: {})",
                KNOWN_ENGINES.join(", ")
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.site.prefix = expand::expand_env(&self.site.prefix, "site.prefix")?;
        self.site.host = expand::expand_env(&self.site.host, "site.host")?;
        Ok(())
    }

    /// Resolve raw sections, making relative paths absolute against the config directory.
    fn resolve(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        let defaults = SitemapConfig::default();

        self.store_resolved = StoreConfig {
            dump: resolve(self.store.dump.as_deref(), "pages.json"),
        };

        self.sitemap_resolved = SitemapConfig {
            prelude: self.sitemap.prelude.clone(),
            postlude: self.sitemap.postlude.clone(),
            limit: self.sitemap.limit.unwrap_or(defaults.limit),
            templates_dir: resolve(self.sitemap.templates_dir.as_deref(), "components"),
            engines: self.sitemap.engines.clone().unwrap_or(defaults.engines),
            metadata: self.sitemap.metadata.unwrap_or(defaults.metadata),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7980);
        assert_eq!(config.store_resolved.dump, PathBuf::from("/test/pages.json"));
        assert_eq!(
            config.sitemap_resolved.templates_dir,
            PathBuf::from("/test/components")
        );
        assert_eq!(config.sitemap_resolved.limit, 50_000);
        assert_eq!(config.sitemap_resolved.engines, vec!["jinja", "xml"]);
        assert_eq!(config.sitemap_resolved.metadata, MetadataSource::Record);
        assert!(config.sitemap_resolved.prelude.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.server.port, 7980);
        assert_eq!(config.site.prefix, "");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000

[site]
prefix = "example.com"
host = "www.example.com"

[store]
dump = "data/pages.json"

[sitemap]
prelude = "<urlset>"
postlude = ""
limit = 100
templates_dir = "templates"
engines = ["xml"]
metadata = "stored"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve(Path::new("/project"));

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.site.prefix, "example.com");
        assert_eq!(config.site.host, "www.example.com");
        assert_eq!(
            config.store_resolved.dump,
            PathBuf::from("/project/data/pages.json")
        );

        let sitemap = &config.sitemap_resolved;
        assert_eq!(sitemap.prelude.as_deref(), Some("<urlset>"));
        assert_eq!(sitemap.postlude.as_deref(), Some(""));
        assert_eq!(sitemap.limit, 100);
        assert_eq!(sitemap.templates_dir, PathBuf::from("/project/templates"));
        assert_eq!(sitemap.engines, vec!["xml"]);
        assert_eq!(sitemap.metadata, MetadataSource::Stored);
    }

    #[test]
    fn test_parse_unknown_metadata_source() {
        let result: Result<Config, _> = toml::from_str("[sitemap]\nmetadata = \"ldap\"\n");

        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[site]\nprefix = \"example.com\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.require_site().unwrap().prefix, "example.com");
        assert_eq!(config.store_resolved.dump, dir.path().join("pages.json"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[sitemap]\nlimit = 0\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Configuration error: sitemap.limit must be greater than 0"
        );
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            port: Some(9000),
            site_prefix: Some("example.com".to_owned()),
            dump: Some(PathBuf::from("/data/dump.json")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.site.prefix, "example.com");
        assert_eq!(config.store_resolved.dump, PathBuf::from("/data/dump.json"));
        assert_eq!(
            config.sitemap_resolved.templates_dir,
            PathBuf::from("/test/components")
        );
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server.port, 7980);
        assert_eq!(config.site.prefix, "");
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("SMAP_TEST_PREFIX", "example.com");
        }

        let toml = r#"
[site]
prefix = "${SMAP_TEST_PREFIX}"
host = "${SMAP_TEST_UNSET_HOST:-www.example.com}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.site.prefix, "example.com");
        assert_eq!(config.site.host, "www.example.com");

        unsafe {
            std::env::remove_var("SMAP_TEST_PREFIX");
        }
    }

    #[test]
    fn test_require_site_without_prefix() {
        let config = Config::default_with_base(Path::new("/test"));

        let err = config.require_site().unwrap_err();

        assert_eq!(err.to_string(), "Configuration error: site.prefix cannot be empty");
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_engine() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.sitemap_resolved.engines = vec!["xml".to_owned(), "pug".to_owned()];

        let err = config.validate().unwrap_err();

        assert_eq!(
            err.to_string(),
            "Configuration error: sitemap.engines: unknown engine \"pug\" (known: jinja, xml)"
        );
    }

    #[test]
    fn test_validate_empty_engines() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.sitemap_resolved.engines.clear();

        assert!(config.validate().is_err());
    }
}
