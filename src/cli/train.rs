//! CLI entry-point for building model bundles.

use anyhow::{bail, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{config::Settings, nlp::train};

#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Optimiser iterations per label.
    #[arg(long, default_value_t = 150)]
    pub max_iterations: u64,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let written = train::train_all(&settings, args.max_iterations)?;
    if written == 0 {
        bail!(
            "no datasets found under {}; expected symptoms.csv, risks.csv or remedies.csv",
            settings.data_dir.display()
        );
    }
    info!(
        written,
        dir = %settings.ayurvedic_model_dir().display(),
        "model bundles written"
    );
    Ok(())
}
