//! Free-text symptom classification into standardized categories.

use std::fmt;

use ndarray::Array2;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{ModelError, Result},
    nlp::capability::{LabelDecoder, MultiLabelModel, Vectorizer},
};

/// Fallback never subsamples labels carrying this marker.
const IMBALANCE_MARKER: &str = "imbalance";
/// Upper bound on how many plain fallback matches are kept.
const FALLBACK_SAMPLE: usize = 2;

/// Symptom description as a single string or a list of fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymptomText {
    Single(String),
    Many(Vec<String>),
}

impl SymptomText {
    /// Accept a JSON string or an array of strings, nothing else.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|_| ModelError::MalformedInput("symptoms must be text or list".into()))
    }

    /// The text the model sees; list fragments are joined with spaces in order.
    pub fn joined(&self) -> String {
        match self {
            Self::Single(text) => text.clone(),
            Self::Many(parts) => parts.join(" "),
        }
    }
}

impl fmt::Display for SymptomText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl From<&str> for SymptomText {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for SymptomText {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

/// Labels plus the top per-label probability for the same text.
///
/// When the labels come from the substring fallback the confidence still
/// reflects the model's probabilities, so the two can disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub categories: Vec<String>,
    pub confidence: f64,
}

pub struct CategoryClassifier {
    vectorizer: Box<dyn Vectorizer<Input = String>>,
    model: Box<dyn MultiLabelModel>,
    labels: Box<dyn LabelDecoder>,
}

impl fmt::Debug for CategoryClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryClassifier")
            .field("features", &self.vectorizer.n_features())
            .field("labels", &self.labels.classes())
            .finish()
    }
}

impl CategoryClassifier {
    /// Assemble a classifier, checking that the three parts agree on shape.
    pub fn new(
        vectorizer: Box<dyn Vectorizer<Input = String>>,
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
                "model predicts {} labels but vocabulary has {}",
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

    pub fn labels(&self) -> &[String] {
        self.labels.classes()
    }

    /// Classify one symptom description.
    ///
    /// `rng` drives the fallback subsampling; pass a seeded generator to pin it.
    pub fn classify<R: Rng + ?Sized>(
        &self,
        input: &SymptomText,
        rng: &mut R,
    ) -> Result<Classification> {
        let text = input.joined();
        let texts = [text];
        let x = self.vectorizer.transform(&texts)?;
        let categories = self.labels_for_row(&texts[0], &x, rng)?;
        let confidence = self
            .model
            .predict_proba(&x)?
            .row(0)
            .iter()
            .copied()
            .fold(0.0, f64::max);
        Ok(Classification {
            categories,
            confidence,
        })
    }

    /// Batch label prediction with the same fallback as [`Self::classify`].
    pub fn predict<R: Rng + ?Sized>(&self, texts: &[String], rng: &mut R) -> Result<Vec<Vec<String>>> {
        let x = self.vectorizer.transform(texts)?;
        let predictions = self.model.predict(&x)?;
        texts
            .iter()
            .zip(predictions.rows())
            .map(|(text, row)| {
                let labels = self.labels.inverse_transform(row);
                Ok(if labels.is_empty() {
                    self.fallback(text, rng)
                } else {
                    labels
                })
            })
            .collect()
    }

    /// Per-label probabilities, one row per text, vocabulary order.
    pub fn predict_proba(&self, texts: &[String]) -> Result<Array2<f64>> {
        let x = self.vectorizer.transform(texts)?;
        self.model.predict_proba(&x)
    }

    fn labels_for_row<R: Rng + ?Sized>(
        &self,
        text: &str,
        x: &Array2<f64>,
        rng: &mut R,
    ) -> Result<Vec<String>> {
        let predictions = self.model.predict(x)?;
        let labels = self.labels.inverse_transform(predictions.row(0));
        if labels.is_empty() {
            return Ok(self.fallback(text, rng));
        }
        Ok(labels)
    }

    /// Match vocabulary labels as substrings of the input text.
    ///
    /// Imbalance labels are always kept; otherwise at most two plain matches
    /// are drawn from `rng`. The result is sorted.
    fn fallback<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Vec<String> {
        let input = text.to_lowercase();
        let matched: Vec<String> = self
            .labels
            .classes()
            .iter()
            .filter(|label| {
                let raw = label.to_lowercase();
                let spaced = raw.replace('_', " ");
                input.contains(&spaced) || input.contains(&raw)
            })
            .cloned()
            .collect();

        let mut picked = if matched.iter().any(|label| label.contains(IMBALANCE_MARKER)) {
            matched
        } else if matched.len() > 1 {
            matched
                .choose_multiple(rng, FALLBACK_SAMPLE.min(matched.len()))
                .cloned()
                .collect()
        } else {
            matched
        };
        picked.sort();
        debug!(?picked, "fallback label match");
        picked
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use ndarray::{Array1, ArrayView1};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::nlp::{binarizer::LabelBinarizer, tfidf::TfidfVectorizer};

    /// Model that predicts nothing, forcing the fallback path.
    pub(crate) struct SilentModel {
        pub features: usize,
        pub probabilities: Vec<f64>,
    }

    impl MultiLabelModel for SilentModel {
        fn predict(&self, x: &Array2<f64>) -> Result<Array2<u8>> {
            Ok(Array2::zeros((x.nrows(), self.probabilities.len())))
        }

        fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
            let row = Array1::from(self.probabilities.clone());
            Ok(Array2::from_shape_fn((x.nrows(), row.len()), |(_, j)| row[j]))
        }

        fn n_features(&self) -> usize {
            self.features
        }

        fn n_labels(&self) -> usize {
            self.probabilities.len()
        }
    }

    /// Model that always predicts a fixed indicator row.
    struct FixedModel {
        features: usize,
        row: Vec<u8>,
    }

    impl MultiLabelModel for FixedModel {
        fn predict(&self, x: &Array2<f64>) -> Result<Array2<u8>> {
            let row: ArrayView1<'_, u8> = ArrayView1::from(&self.row[..]);
            Ok(Array2::from_shape_fn((x.nrows(), row.len()), |(_, j)| row[j]))
        }

        fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
            Ok(self.predict(x)?.mapv(|v| if v == 1 { 0.8 } else { 0.1 }))
        }

        fn n_features(&self) -> usize {
            self.features
        }

        fn n_labels(&self) -> usize {
            self.row.len()
        }
    }

    pub(crate) fn vocabulary() -> Vec<Vec<&'static str>> {
        vec![vec![
            "back_pain",
            "digestive",
            "fatigue",
            "hormonal_imbalance",
            "nausea",
        ]]
    }

    pub(crate) fn silent_classifier() -> CategoryClassifier {
        let vectorizer = TfidfVectorizer::fit(&["back pain digestive fatigue nausea"]).unwrap();
        let features = vectorizer.vocabulary().count();
        CategoryClassifier::new(
            Box::new(vectorizer),
            Box::new(SilentModel {
                features,
                probabilities: vec![0.1, 0.3, 0.2, 0.05, 0.15],
            }),
            Box::new(LabelBinarizer::fit(&vocabulary())),
        )
        .unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn primary_labels_win_over_fallback() {
        let vectorizer = TfidfVectorizer::fit(&["fatigue nausea"]).unwrap();
        let classifier = CategoryClassifier::new(
            Box::new(vectorizer),
            Box::new(FixedModel {
                features: 2,
                row: vec![0, 1, 0, 0, 1],
            }),
            Box::new(LabelBinarizer::fit(&vocabulary())),
        )
        .unwrap();
        let result = classifier
            .classify(&"fatigue and hormonal imbalance".into(), &mut rng())
            .unwrap();
        assert_eq!(result.categories, vec!["digestive", "nausea"]);
        assert!((result.confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn no_substring_match_abstains() {
        let result = silent_classifier()
            .classify(&"feeling great today".into(), &mut rng())
            .unwrap();
        assert!(result.categories.is_empty());
    }

    #[test]
    fn single_match_is_returned_as_is() {
        let result = silent_classifier()
            .classify(&"constant fatigue".into(), &mut rng())
            .unwrap();
        assert_eq!(result.categories, vec!["fatigue"]);
    }

    #[test]
    fn underscored_labels_match_as_phrases() {
        let result = silent_classifier()
            .classify(&"Terrible BACK PAIN".into(), &mut rng())
            .unwrap();
        assert_eq!(result.categories, vec!["back_pain"]);
    }

    #[test]
    fn list_input_is_joined_in_order() {
        let input = SymptomText::from(vec!["back".to_string(), "pain".to_string()]);
        assert_eq!(input.joined(), "back pain");
        let result = silent_classifier().classify(&input, &mut rng()).unwrap();
        assert_eq!(result.categories, vec!["back_pain"]);
    }

    #[test]
    fn imbalance_labels_keep_every_match() {
        let classifier = silent_classifier();
        for seed in 0..20 {
            let result = classifier
                .classify(
                    &"hormonal imbalance with fatigue and nausea".into(),
                    &mut StdRng::seed_from_u64(seed),
                )
                .unwrap();
            assert_eq!(
                result.categories,
                vec!["fatigue", "hormonal_imbalance", "nausea"]
            );
        }
    }

    #[test]
    fn plain_matches_are_narrowed_to_two() {
        let text = "nausea, fatigue and digestive trouble";
        let result = silent_classifier()
            .classify(&text.into(), &mut rng())
            .unwrap();
        assert_eq!(result.categories.len(), 2);
        let mut sorted = result.categories.clone();
        sorted.sort();
        assert_eq!(sorted, result.categories);
        for label in &result.categories {
            assert!(["digestive", "fatigue", "nausea"].contains(&label.as_str()));
        }
    }

    #[test]
    fn same_seed_pins_the_fallback() {
        let classifier = silent_classifier();
        let text: SymptomText = "nausea, fatigue and digestive trouble".into();
        let first = classifier.classify(&text, &mut rng()).unwrap();
        let second = classifier.classify(&text, &mut rng()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn confidence_ignores_which_path_produced_labels() {
        let result = silent_classifier()
            .classify(&"feeling great today".into(), &mut rng())
            .unwrap();
        assert!((result.confidence - 0.3).abs() < 1e-12);
    }

    #[test]
    fn mismatched_parts_are_rejected() {
        let vectorizer = TfidfVectorizer::fit(&["fatigue nausea"]).unwrap();
        let err = CategoryClassifier::new(
            Box::new(vectorizer),
            Box::new(SilentModel {
                features: 7,
                probabilities: vec![0.1; 5],
            }),
            Box::new(LabelBinarizer::fit(&vocabulary())),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn non_text_json_is_malformed() {
        let err = SymptomText::from_json(&serde_json::json!({"a": 1})).unwrap_err();
        assert!(matches!(err, ModelError::MalformedInput(_)));
        assert_eq!(
            SymptomText::from_json(&serde_json::json!(["a", "b"])).unwrap(),
            SymptomText::Many(vec!["a".into(), "b".into()])
        );
    }
}
