//! Command-line interface wiring for janani-assistant.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod assess;
pub mod classify;
pub mod remedy;
pub mod serve;
pub mod status;
pub mod train;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Prenatal symptom and risk assistant", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Serve(args) => serve::run(args, settings).await,
            Commands::Train(args) => train::run(args, settings).await,
            Commands::Classify(args) => classify::run(args, settings).await,
            Commands::Assess(args) => assess::run(args, settings).await,
            Commands::Remedy(args) => remedy::run(args, settings).await,
            Commands::Status(args) => status::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the JSON API.
    Serve(serve::Args),
    /// Build model bundles from CSV datasets.
    Train(train::Args),
    /// Classify free-text symptoms into categories.
    Classify(classify::Args),
    /// Map symptom categories and vitals to risks.
    Assess(assess::Args),
    /// Rank remedies for symptoms and a constitution type.
    Remedy(remedy::Args),
    /// Predict maternal or fetal health status from one reading.
    Status(status::Args),
}
