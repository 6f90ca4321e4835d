//! Symptom classification, risk mapping, remedy ranking and vitals status.

pub mod artifacts;
pub mod binarizer;
pub mod capability;
pub mod classifier;
pub mod dict;
pub mod linear;
pub mod remedy;
pub mod risk;
pub mod status;
pub mod tfidf;
pub mod train;

use rand::{rngs::StdRng, SeedableRng};

pub use artifacts::{ModelHandle, ModelRegistry};
pub use classifier::{CategoryClassifier, Classification, SymptomText};
pub use remedy::{RemedyQuery, RemedyRanker, RemedyScore};
pub use risk::{assess_risks, encode_features, RiskFinding, RiskMapper, Severity, Vitals};
pub use status::{HealthStatus, StatusModel, StatusPrediction};

/// Random source for one classification call.
///
/// A configured seed makes every call draw the same fallback subset.
pub fn fallback_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
