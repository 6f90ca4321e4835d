//! CLI entry-point for one-off symptom classification.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    config::Settings,
    nlp::{fallback_rng, ModelRegistry, SymptomText},
};

#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Symptom fragments; several are joined with spaces.
    #[arg(required = true)]
    pub symptoms: Vec<String>,
    /// Seed for the fallback sampling; overrides `CLASSIFIER_SEED`.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let models = ModelRegistry::load(&settings);
    let classifier = models.classifier.get()?;
    let mut rng = fallback_rng(args.seed.or(settings.classifier_seed));
    let result = classifier.classify(&SymptomText::Many(args.symptoms), &mut rng)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
