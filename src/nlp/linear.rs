//! One-vs-rest logistic model for multi-label prediction.

use linfa::{
    dataset::DatasetBase,
    prelude::{Fit, Predict},
};
use linfa_logistic::LogisticRegression;
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{ModelError, Result},
    nlp::capability::MultiLabelModel,
};

/// Rate clamp for labels that never (or always) occur in training data.
const CONSTANT_RATE_EPS: f64 = 1e-3;

/// Independent logistic regression per label.
///
/// `coefficients` has one row per label and one column per feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "LogisticState", try_from = "LogisticState")]
pub struct OneVsRestLogistic {
    coefficients: Array2<f64>,
    intercepts: Array1<f64>,
}

/// On-disk form of a fitted [`OneVsRestLogistic`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticState {
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

/// Per-column mean and standard deviation; constant columns scale by one.
fn column_scaling(x: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let means = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
    let scales = x
        .std_axis(Axis(0), 0.0)
        .mapv(|sd| if sd > f64::EPSILON { sd } else { 1.0 });
    (means, scales)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl OneVsRestLogistic {
    pub fn new(coefficients: Array2<f64>, intercepts: Array1<f64>) -> Result<Self> {
        if coefficients.nrows() != intercepts.len() {
            return Err(ModelError::Artifact(format!(
                "{} coefficient rows but {} intercepts",
                coefficients.nrows(),
                intercepts.len()
            )));
        }
        Ok(Self {
            coefficients,
            intercepts,
        })
    }

    /// Fit one binary logistic regression per column of `y`.
    ///
    /// Columns with a single observed class get a constant model whose
    /// probability is the clamped observed rate.
    pub fn fit(x: &Array2<f64>, y: &Array2<u8>, max_iterations: u64) -> Result<Self> {
        if x.nrows() != y.nrows() {
            return Err(ModelError::Training(format!(
                "{} samples but {} label rows",
                x.nrows(),
                y.nrows()
            )));
        }
        if x.nrows() == 0 {
            return Err(ModelError::Training("no training samples".into()));
        }
        let n_features = x.ncols();
        let (means, scales) = column_scaling(x);
        let scaled = (x - &means) / &scales;
        let mut coefficients = Array2::zeros((y.ncols(), n_features));
        let mut intercepts = Array1::zeros(y.ncols());

        for (label_idx, column) in y.axis_iter(Axis(1)).enumerate() {
            let targets: Array1<bool> = column.mapv(|v| v != 0);
            let positives = targets.iter().filter(|t| **t).count();
            if positives == 0 || positives == targets.len() {
                let rate = (positives as f64 / targets.len() as f64)
                    .clamp(CONSTANT_RATE_EPS, 1.0 - CONSTANT_RATE_EPS);
                intercepts[label_idx] = (rate / (1.0 - rate)).ln();
                debug!(label_idx, positives, "constant model for single-class label");
                continue;
            }

            let dataset = DatasetBase::new(scaled.clone(), targets);
            let fitted = LogisticRegression::default()
                .max_iterations(max_iterations)
                .fit(&dataset)
                .map_err(|e| ModelError::Training(format!("label {label_idx}: {e}")))?;

            // The fitted model scores whichever class it picked as positive;
            // one sample is enough to tell whether that class is `true`.
            let first = scaled.slice(s![0..1, ..]).to_owned();
            let probability = fitted.predict_probabilities(&first)[0];
            let predicted: Array1<bool> = fitted.predict(&first);
            let sign = if predicted[0] == (probability >= 0.5) {
                1.0
            } else {
                -1.0
            };

            // Fold the standardisation back so raw features can be scored.
            let weights = fitted.params().mapv(|w| sign * w) / &scales;
            intercepts[label_idx] = sign * fitted.intercept() - weights.dot(&means);
            coefficients.row_mut(label_idx).assign(&weights);
        }

        info!(labels = y.ncols(), features = n_features, "fitted one-vs-rest logistic");
        Self::new(coefficients, intercepts)
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.coefficients.ncols() {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.ncols(),
                found: x.ncols(),
            });
        }
        Ok(())
    }
}

impl MultiLabelModel for OneVsRestLogistic {
    fn predict(&self, x: &Array2<f64>) -> Result<Array2<u8>> {
        Ok(self.predict_proba(x)?.mapv(|p| u8::from(p > 0.5)))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x)?;
        let logits = x.dot(&self.coefficients.t()) + &self.intercepts;
        Ok(logits.mapv(sigmoid))
    }

    fn n_features(&self) -> usize {
        self.coefficients.ncols()
    }

    fn n_labels(&self) -> usize {
        self.coefficients.nrows()
    }
}

impl From<OneVsRestLogistic> for LogisticState {
    fn from(value: OneVsRestLogistic) -> Self {
        LogisticState {
            coefficients: value
                .coefficients
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect(),
            intercepts: value.intercepts.to_vec(),
        }
    }
}

impl TryFrom<LogisticState> for OneVsRestLogistic {
    type Error = ModelError;

    fn try_from(state: LogisticState) -> Result<Self> {
        let rows = state.coefficients.len();
        let cols = state.coefficients.first().map_or(0, Vec::len);
        if state.coefficients.iter().any(|row| row.len() != cols) {
            return Err(ModelError::Artifact("ragged coefficient matrix".into()));
        }
        let flat: Vec<f64> = state.coefficients.into_iter().flatten().collect();
        let coefficients = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| ModelError::Artifact(e.to_string()))?;
        Self::new(coefficients, Array1::from(state.intercepts))
    }
}
