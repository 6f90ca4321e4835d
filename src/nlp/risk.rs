//! Risk mapping from symptom categories and vitals.

use std::{collections::HashSet, fmt};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, Result},
    nlp::{
        capability::{LabelDecoder, MultiLabelModel, Vectorizer},
        dict::{FeatureMap, FeatureValue},
    },
};

/// Vital sign features every risk model is trained with.
pub const VITAL_FIELDS: [&str; 5] = [
    "systolic_bp",
    "diastolic_bp",
    "blood_glucose",
    "body_temp",
    "heart_rate",
];

/// Prefix of the sparse per-category presence flags.
pub const SYMPTOM_PREFIX: &str = "symptom__";

/// Latest vitals for a caller; absent readings fall back to typical values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub systolic_bp: Option<f64>,
    pub diastolic_bp: Option<f64>,
    pub blood_glucose: Option<f64>,
    pub body_temp: Option<f64>,
    pub heart_rate: Option<f64>,
}

impl Vitals {
    fn resolved(&self) -> [(&'static str, f64); 5] {
        [
            ("systolic_bp", self.systolic_bp.unwrap_or(120.0)),
            ("diastolic_bp", self.diastolic_bp.unwrap_or(80.0)),
            ("blood_glucose", self.blood_glucose.unwrap_or(90.0)),
            ("body_temp", self.body_temp.unwrap_or(36.8)),
            ("heart_rate", self.heart_rate.unwrap_or(78.0)),
        ]
    }
}

/// Drop repeated categories, keeping the first occurrence of each.
pub fn dedupe_categories<S: AsRef<str>>(categories: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    categories
        .iter()
        .map(|c| c.as_ref().to_string())
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

/// Build the risk model's feature map from categories and vitals.
pub fn encode_features<S: AsRef<str>>(categories: &[S], vitals: &Vitals) -> FeatureMap {
    let mut features: FeatureMap = vitals
        .resolved()
        .into_iter()
        .map(|(name, value)| (name.to_string(), FeatureValue::Number(value)))
        .collect();
    for category in dedupe_categories(categories) {
        features.insert(
            format!("{SYMPTOM_PREFIX}{category}"),
            FeatureValue::Number(1.0),
        );
    }
    features
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Strict step function: above 0.7 is high, above 0.4 is medium.
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.7 {
            Self::High
        } else if probability > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub risk_type: String,
    pub probability: f64,
    pub severity: Severity,
}

pub struct RiskMapper {
    vectorizer: Box<dyn Vectorizer<Input = FeatureMap>>,
    model: Box<dyn MultiLabelModel>,
    labels: Box<dyn LabelDecoder>,
}

impl fmt::Debug for RiskMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskMapper")
            .field("features", &self.vectorizer.n_features())
            .field("labels", &self.labels.classes())
            .finish()
    }
}

impl RiskMapper {
    pub fn new(
        vectorizer: Box<dyn Vectorizer<Input = FeatureMap>>,
        model: Box<dyn MultiLabelModel>,
        labels: Box<dyn LabelDecoder>,
    ) -> Result<Self> {
        if vectorizer.n_features() != model.n_features() {
            return Err(ModelError::ShapeMismatch {
                expected: model.n_features(),
                found: vectorizer.n_features(),
            });
        }
        if labels.classes().len() != model.n_labels() {
            return Err(ModelError::Artifact(format!(
                "model predicts {} risks but vocabulary has {}",
                model.n_labels(),
                labels.classes().len()
            )));
        }
        Ok(Self {
            vectorizer,
            model,
            labels,
        })
    }

    /// Full risk vocabulary; column order of [`Self::predict_proba`].
    pub fn labels(&self) -> &[String] {
        self.labels.classes()
    }

    /// Predicted risk labels per input row.
    pub fn predict(&self, features: &[FeatureMap]) -> Result<Vec<Vec<String>>> {
        let x = self.vectorizer.transform(features)?;
        let predictions = self.model.predict(&x)?;
        Ok(predictions
            .rows()
            .into_iter()
            .map(|row| self.labels.inverse_transform(row))
            .collect())
    }

    /// Independent per-label probabilities over the full vocabulary.
    pub fn predict_proba(&self, features: &[FeatureMap]) -> Result<Array2<f64>> {
        let x = self.vectorizer.transform(features)?;
        self.model.predict_proba(&x)
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Predicted risks for one feature map, with probability and severity.
///
/// Probabilities are indexed by the full vocabulary, predictions are a
/// subset of it, so the two are joined on the label itself.
pub fn assess_risks(mapper: &RiskMapper, features: &FeatureMap) -> Result<Vec<RiskFinding>> {
    let batch = std::slice::from_ref(features);
    let predicted: HashSet<String> = mapper
        .predict(batch)?
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .collect();
    let probabilities = mapper.predict_proba(batch)?;
    let row = probabilities.row(0);

    Ok(mapper
        .labels()
        .iter()
        .enumerate()
        .filter(|(_, label)| predicted.contains(*label))
        .map(|(idx, label)| {
            let probability = row[idx];
            RiskFinding {
                risk_type: label.clone(),
                probability: round4(probability),
                severity: Severity::from_probability(probability),
            }
        })
        .collect())
}
