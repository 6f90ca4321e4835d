//! Three-level health status from a fixed numeric feature vector.
//!
//! Used for maternal vitals and fetal cardiotocography (CTG) readings. Both
//! map to the same Normal / Suspect / Pathological scale.

use std::{fmt, str::FromStr};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, Result},
    nlp::{capability::MultiLabelModel, linear::OneVsRestLogistic},
};

/// Column order of a maternal vitals reading.
pub const MATERNAL_FEATURES: [&str; 6] = [
    "age",
    "systolic_bp",
    "diastolic_bp",
    "blood_glucose",
    "body_temp",
    "heart_rate",
];

/// Column order of a CTG reading.
pub const CTG_FEATURES: [&str; 15] = [
    "baseline_value",
    "accelerations",
    "fetal_movement",
    "uterine_contractions",
    "light_decelerations",
    "severe_decelerations",
    "prolonged_decelerations",
    "abnormal_short_term_variability",
    "mean_value_of_short_term_variability",
    "percentage_of_time_with_abnormal_long_term_variability",
    "mean_value_of_long_term_variability",
    "histogram_width",
    "histogram_min",
    "histogram_max",
    "histogram_number_of_peaks",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Normal,
    Suspect,
    Pathological,
}

impl HealthStatus {
    /// Every status in code order; model columns follow it.
    pub const ALL: [HealthStatus; 3] = [Self::Normal, Self::Suspect, Self::Pathological];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Suspect => 1,
            Self::Pathological => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Suspect => "Suspect",
            Self::Pathological => "Pathological",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts a numeric code (`0`..`2`) or a status name in any case.
impl FromStr for HealthStatus {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Ok(code) = raw.parse::<u8>() {
            return Self::from_code(code)
                .ok_or_else(|| ModelError::MalformedInput(format!("unknown status code {code}")));
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| ModelError::MalformedInput(format!("unknown status {raw:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPrediction {
    pub status: HealthStatus,
    /// One probability per status, code order.
    pub probabilities: Vec<f64>,
}

/// Named feature columns plus a per-status logistic model.
#[derive(Debug)]
pub struct StatusModel {
    features: Vec<String>,
    model: OneVsRestLogistic,
}

impl StatusModel {
    pub fn new(features: Vec<String>, model: OneVsRestLogistic) -> Result<Self> {
        if model.n_features() != features.len() {
            return Err(ModelError::ShapeMismatch {
                expected: model.n_features(),
                found: features.len(),
            });
        }
        if model.n_labels() != HealthStatus::ALL.len() {
            return Err(ModelError::Artifact(format!(
                "status model has {} outputs, expected {}",
                model.n_labels(),
                HealthStatus::ALL.len()
            )));
        }
        Ok(Self { features, model })
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Most probable status for one reading; ties go to the milder status.
    pub fn predict(&self, values: &[f64]) -> Result<StatusPrediction> {
        if values.len() != self.features.len() {
            return Err(ModelError::MalformedInput(format!(
                "Invalid feature length, expected {}",
                self.features.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::MalformedInput(format!(
                "{} must be a finite number",
                self.features[pos]
            )));
        }
        let x = Array2::from_shape_vec((1, values.len()), values.to_vec())
            .map_err(|e| ModelError::MalformedInput(e.to_string()))?;
        let probabilities = self.model.predict_proba(&x)?.row(0).to_vec();
        let best = probabilities
            .iter()
            .enumerate()
            .fold(0, |best, (idx, p)| if *p > probabilities[best] { idx } else { best });
        Ok(StatusPrediction {
            status: HealthStatus::ALL[best],
            probabilities,
        })
    }
}
