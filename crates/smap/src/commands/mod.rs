//! CLI command implementations.

pub(crate) mod generate;
pub(crate) mod serve;

use std::path::PathBuf;

use clap::Args;
use smap_config::CliSettings;

pub(crate) use generate::GenerateArgs;
pub(crate) use serve::ServeArgs;

/// Site selection arguments shared by all commands.
#[derive(Args)]
pub(crate) struct SiteArgs {
    /// Path to configuration file (default: auto-discover sitemaps.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Namespace prefix of the site's store keys (overrides config).
    #[arg(short, long, env = "SMAP_SITE")]
    site: Option<String>,

    /// Public host name of the site (overrides config).
    #[arg(long)]
    site_host: Option<String>,

    /// JSON store dump to load (overrides config).
    #[arg(short, long)]
    dump: Option<PathBuf>,

    /// Component templates directory (overrides config).
    #[arg(short, long)]
    templates_dir: Option<PathBuf>,

    /// Enable verbose output (log dropped pages and timing).
    #[arg(short, long)]
    pub verbose: bool,
}

impl SiteArgs {
    /// Build CLI settings from the site arguments plus server overrides.
    fn into_settings(self, host: Option<String>, port: Option<u16>) -> (Option<PathBuf>, CliSettings) {
        let settings = CliSettings {
            host,
            port,
            site_prefix: self.site,
            site_host: self.site_host,
            dump: self.dump,
            templates_dir: self.templates_dir,
        };
        (self.config, settings)
    }
}
