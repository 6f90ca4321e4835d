//! Name-addressed vectorization of feature maps.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, Result},
    nlp::capability::Vectorizer,
};

/// Single feature value as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Flag(bool),
    Number(f64),
    Category(String),
}

/// Ordered feature name to value mapping.
pub type FeatureMap = BTreeMap<String, FeatureValue>;

impl FeatureValue {
    /// Accept only JSON scalars; arrays, objects and null are rejected.
    pub fn from_json(name: &str, value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(flag) => Ok(Self::Flag(*flag)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number).ok_or_else(|| {
                ModelError::MalformedInput(format!("feature `{name}` is not representable as f64"))
            }),
            serde_json::Value::String(s) => Ok(Self::Category(s.clone())),
            other => Err(ModelError::MalformedInput(format!(
                "feature `{name}` must be a number, bool or string, got {other}"
            ))),
        }
    }
}

/// Column name a `(feature, value)` pair maps to, plus its cell value.
fn column_for(name: &str, value: &FeatureValue) -> Result<(String, f64)> {
    match value {
        FeatureValue::Number(n) if n.is_finite() => Ok((name.to_string(), *n)),
        FeatureValue::Number(n) => Err(ModelError::MalformedInput(format!(
            "feature `{name}` is not finite ({n})"
        ))),
        FeatureValue::Flag(flag) => Ok((name.to_string(), if *flag { 1.0 } else { 0.0 })),
        FeatureValue::Category(category) => Ok((format!("{name}={category}"), 1.0)),
    }
}

/// Fitted feature-map vectorizer.
///
/// Numbers and flags land in a column named after the feature, categorical
/// strings are one-hot encoded as `name=value`. Columns are looked up by name,
/// so an unseen key never shifts the position of a known one; it is simply
/// dropped. Names listed in `required` must be present in every input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "DictState", try_from = "DictState")]
pub struct DictVectorizer {
    feature_names: IndexSet<String>,
    required: Vec<String>,
}

/// On-disk form of a fitted [`DictVectorizer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictState {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl DictVectorizer {
    /// Collect the sorted set of columns seen across `samples`.
    pub fn fit(samples: &[FeatureMap], required: &[&str]) -> Result<Self> {
        let mut names = std::collections::BTreeSet::new();
        for sample in samples {
            for (name, value) in sample {
                names.insert(column_for(name, value)?.0);
            }
        }
        Ok(Self {
            feature_names: names.into_iter().collect(),
            required: required.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.feature_names.iter().map(String::as_str)
    }
}

impl Vectorizer for DictVectorizer {
    type Input = FeatureMap;

    fn transform(&self, inputs: &[FeatureMap]) -> Result<Array2<f64>> {
        let mut matrix = Array2::zeros((inputs.len(), self.feature_names.len()));
        for (row, sample) in inputs.iter().enumerate() {
            if let Some(missing) = self.required.iter().find(|name| !sample.contains_key(*name)) {
                return Err(ModelError::MalformedInput(format!(
                    "required feature `{missing}` is missing"
                )));
            }
            for (name, value) in sample {
                let (column, cell) = column_for(name, value)?;
                if let Some(col) = self.feature_names.get_index_of(&column) {
                    matrix[[row, col]] = cell;
                }
            }
        }
        Ok(matrix)
    }

    fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

impl From<DictVectorizer> for DictState {
    fn from(value: DictVectorizer) -> Self {
        DictState {
            feature_names: value.feature_names.into_iter().collect(),
            required: value.required,
        }
    }
}

impl TryFrom<DictState> for DictVectorizer {
    type Error = ModelError;

    fn try_from(state: DictState) -> Result<Self> {
        let expected = state.feature_names.len();
        let feature_names: IndexSet<String> = state.feature_names.into_iter().collect();
        if feature_names.len() != expected {
            return Err(ModelError::Artifact("feature names are not unique".into()));
        }
        if let Some(unknown) = state
            .required
            .iter()
            .find(|name| !feature_names.contains(*name))
        {
            return Err(ModelError::Artifact(format!(
                "required feature `{unknown}` has no column"
            )));
        }
        Ok(Self {
            feature_names,
            required: state.required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pairs: &[(&str, FeatureValue)]) -> FeatureMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn columns_follow_names_not_insertion_order() {
        let training = vec![sample(&[
            ("heart_rate", FeatureValue::Number(70.0)),
            ("symptom__fatigue", FeatureValue::Number(1.0)),
            ("body_temp", FeatureValue::Number(36.5)),
        ])];
        let vectorizer = DictVectorizer::fit(&training, &[]).unwrap();
        let names: Vec<&str> = vectorizer.feature_names().collect();
        assert_eq!(names, vec!["body_temp", "heart_rate", "symptom__fatigue"]);

        let input = sample(&[
            ("symptom__unseen", FeatureValue::Number(1.0)),
            ("heart_rate", FeatureValue::Number(90.0)),
            ("body_temp", FeatureValue::Number(37.0)),
        ]);
        let x = vectorizer.transform(&[input]).unwrap();
        assert_eq!(x.row(0).to_vec(), vec![37.0, 90.0, 0.0]);
    }

    #[test]
    fn categorical_values_are_one_hot() {
        let training = vec![
            sample(&[("prakriti", FeatureValue::Category("vata".into()))]),
            sample(&[("prakriti", FeatureValue::Category("kapha".into()))]),
        ];
        let vectorizer = DictVectorizer::fit(&training, &[]).unwrap();
        let x = vectorizer
            .transform(&[sample(&[("prakriti", FeatureValue::Category("vata".into()))])])
            .unwrap();
        assert_eq!(x.row(0).to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn missing_required_feature_is_an_error() {
        let training = vec![sample(&[("systolic_bp", FeatureValue::Number(120.0))])];
        let vectorizer = DictVectorizer::fit(&training, &["systolic_bp"]).unwrap();
        let err = vectorizer.transform(&[FeatureMap::new()]).unwrap_err();
        assert!(matches!(err, ModelError::MalformedInput(_)));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let training = vec![sample(&[("body_temp", FeatureValue::Number(36.8))])];
        let vectorizer = DictVectorizer::fit(&training, &[]).unwrap();
        let err = vectorizer
            .transform(&[sample(&[("body_temp", FeatureValue::Number(f64::NAN))])])
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedInput(_)));
    }

    #[test]
    fn json_containers_are_not_features() {
        let err = FeatureValue::from_json("symptoms", &serde_json::json!(["a"])).unwrap_err();
        assert!(matches!(err, ModelError::MalformedInput(_)));
        assert_eq!(
            FeatureValue::from_json("heart_rate", &serde_json::json!(78)).unwrap(),
            FeatureValue::Number(78.0)
        );
    }
}
