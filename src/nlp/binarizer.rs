//! Closed label vocabulary and multi-label indicator encoding.

use std::collections::BTreeSet;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, Result},
    nlp::capability::LabelDecoder,
};

/// Sorted, de-duplicated label vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelBinarizer {
    classes: Vec<String>,
}

impl LabelBinarizer {
    /// Build the vocabulary from every label that appears in `label_sets`.
    pub fn fit<S: AsRef<str>>(label_sets: &[Vec<S>]) -> Self {
        let classes: BTreeSet<String> = label_sets
            .iter()
            .flatten()
            .map(|label| label.as_ref().to_string())
            .collect();
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    /// Indicator matrix with one column per class. Unknown labels are ignored.
    pub fn transform<S: AsRef<str>>(&self, label_sets: &[Vec<S>]) -> Array2<u8> {
        let mut y = Array2::zeros((label_sets.len(), self.classes.len()));
        for (row, labels) in label_sets.iter().enumerate() {
            for label in labels {
                if let Ok(col) = self.classes.binary_search_by(|c| c.as_str().cmp(label.as_ref())) {
                    y[[row, col]] = 1;
                }
            }
        }
        y
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl LabelDecoder for LabelBinarizer {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn inverse_transform(&self, row: ArrayView1<'_, u8>) -> Vec<String> {
        row.iter()
            .zip(&self.classes)
            .filter(|(flag, _)| **flag != 0)
            .map(|(_, label)| label.clone())
            .collect()
    }
}

impl TryFrom<Vec<String>> for LabelBinarizer {
    type Error = ModelError;

    fn try_from(classes: Vec<String>) -> Result<Self> {
        if classes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ModelError::Artifact(
                "label classes must be sorted and unique".into(),
            ));
        }
        Ok(Self { classes })
    }
}

impl From<LabelBinarizer> for Vec<String> {
    fn from(value: LabelBinarizer) -> Self {
        value.classes
    }
}
