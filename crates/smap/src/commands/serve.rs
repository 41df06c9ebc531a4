//! `smap serve` command implementation.

use clap::Args;
use smap_config::Config;
use smap_server::{run_server, server_config_from_config};

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let (config_path, cli_settings) = self.site.into_settings(self.host, self.port);
        let config = Config::load(config_path.as_deref(), Some(&cli_settings))?;
        let site = config.require_site()?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!("Site: {}", site.prefix));
        output.info(&format!(
            "Store dump: {}",
            config.store_resolved.dump.display()
        ));
        output.info(&format!(
            "Templates: {}",
            config.sitemap_resolved.templates_dir.display()
        ));

        run_server(server_config_from_config(&config)).await?;

        Ok(())
    }
}
