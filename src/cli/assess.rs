//! CLI entry-point for risk assessment from categories and vitals.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    config::Settings,
    nlp::{assess_risks, encode_features, ModelRegistry, Vitals},
};

#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Standardized symptom category; repeat for several.
    #[arg(long = "symptom")]
    pub symptoms: Vec<String>,
    #[arg(long)]
    pub systolic_bp: Option<f64>,
    #[arg(long)]
    pub diastolic_bp: Option<f64>,
    #[arg(long)]
    pub blood_glucose: Option<f64>,
    #[arg(long)]
    pub body_temp: Option<f64>,
    #[arg(long)]
    pub heart_rate: Option<f64>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let models = ModelRegistry::load(&settings);
    let mapper = models.risk.get()?;
    let vitals = Vitals {
        systolic_bp: args.systolic_bp,
        diastolic_bp: args.diastolic_bp,
        blood_glucose: args.blood_glucose,
        body_temp: args.body_temp,
        heart_rate: args.heart_rate,
    };
    let findings = assess_risks(mapper, &encode_features(&args.symptoms, &vitals))?;
    println!("{}", serde_json::to_string_pretty(&findings)?);
    Ok(())
}
