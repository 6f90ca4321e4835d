//! Capability interface shared by every fitted model component.
//!
//! A loaded bundle is a vectorizer, a multi-label model and a label decoder.
//! The wrappers in this crate only talk to those pieces through these traits,
//! so any concrete implementation that satisfies them can be swapped in.

use ndarray::{Array2, ArrayView1};

use crate::error::Result;

/// Turns raw inputs into a dense design matrix with a fixed column layout.
pub trait Vectorizer: Send + Sync {
    type Input;

    fn transform(&self, inputs: &[Self::Input]) -> Result<Array2<f64>>;

    /// Number of columns produced by [`Vectorizer::transform`].
    fn n_features(&self) -> usize;
}

/// Multi-label model: every label is an independent binary decision.
pub trait MultiLabelModel: Send + Sync {
    /// Binary indicator matrix, one row per input and one column per label.
    fn predict(&self, x: &Array2<f64>) -> Result<Array2<u8>>;

    /// Per-label probabilities in `[0, 1]`; rows do not sum to one.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    fn n_features(&self) -> usize;

    fn n_labels(&self) -> usize;
}

/// Maps indicator rows back to label strings over a closed vocabulary.
pub trait LabelDecoder: Send + Sync {
    /// The full vocabulary in canonical column order.
    fn classes(&self) -> &[String];

    fn inverse_transform(&self, row: ArrayView1<'_, u8>) -> Vec<String>;
}
