//! CLI entry-point for maternal and fetal status prediction.

use anyhow::Result;
use clap::{Args as ClapArgs, ValueEnum};
use tracing::instrument;

use crate::{config::Settings, nlp::ModelRegistry};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Reading {
    /// Age, systolic/diastolic pressure, glucose, temperature, heart rate.
    Maternal,
    /// The fifteen CTG measurements.
    Fetal,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    #[arg(value_enum)]
    pub reading: Reading,
    /// Feature values in column order.
    #[arg(required = true, allow_negative_numbers = true)]
    pub values: Vec<f64>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let models = ModelRegistry::load(&settings);
    let model = match args.reading {
        Reading::Maternal => models.maternal.get()?,
        Reading::Fetal => models.fetal.get()?,
    };
    let prediction = model.predict(&args.values)?;
    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}
