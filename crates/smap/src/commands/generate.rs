//! `smap generate` command implementation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Args;
use futures::TryStreamExt;
use smap_config::Config;
use smap_pipeline::{Format, FragmentStream, Locals};
use smap_server::{build_pipeline, server_config_from_config};

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the generate command.
#[derive(Args)]
pub(crate) struct GenerateArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Sitemap format: txt or xml.
    #[arg(short, long, default_value = "xml")]
    format: Format,

    /// File to write the sitemap to (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl GenerateArgs {
    /// Execute the generate command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or loading fails, or the sitemap
    /// stream aborts. Fragments written before an abort stay written.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let (config_path, cli_settings) = self.site.into_settings(None, None);
        let config = Config::load(config_path.as_deref(), Some(&cli_settings))?;
        let site = config.require_site()?;

        let pipeline = build_pipeline(&server_config_from_config(&config))?;
        let locals = Locals::for_site(site.prefix.clone(), site.host.clone());
        let fragments = pipeline.stream(self.format, &site.prefix, locals);

        let mut writer: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(std::io::stdout().lock())),
        };
        let result = write_fragments(fragments, &mut writer).await;
        writer.flush()?;
        let count = result?;

        if let Some(path) = &self.output {
            output.success(&format!(
                "Wrote {} sitemap ({count} fragments) to {}",
                self.format,
                path.display()
            ));
        }

        Ok(())
    }
}

/// Write every fragment of `fragments` to `writer`, returning how many were written.
async fn write_fragments(
    mut fragments: FragmentStream,
    writer: &mut dyn Write,
) -> Result<usize, CliError> {
    let mut count = 0;
    while let Some(fragment) = fragments.try_next().await? {
        writer.write_all(fragment.as_bytes())?;
        count += 1;
    }
    Ok(count)
}
