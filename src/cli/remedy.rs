//! CLI entry-point for remedy ranking.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    config::Settings,
    nlp::{ModelRegistry, RemedyQuery},
};

#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Reported symptom; repeat for several.
    #[arg(long = "symptom")]
    pub symptoms: Vec<String>,
    /// Constitution type (prakriti); `balanced` when omitted.
    #[arg(long)]
    pub prakriti: Option<String>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let models = ModelRegistry::load(&settings);
    let ranker = models.remedy.get()?;
    let query = RemedyQuery {
        symptoms: args.symptoms,
        prakriti: args.prakriti,
    };
    let scored = ranker.predict_with_confidence(&query);
    println!("{}", serde_json::to_string_pretty(&scored)?);
    Ok(())
}
