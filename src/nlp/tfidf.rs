//! TF-IDF text vectorizer with a vocabulary fixed at fit time.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexSet;
use ndarray::Array2;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, Result},
    nlp::capability::Vectorizer,
};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

/// Lowercase and split text into word tokens of two or more characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Fitted TF-IDF vectorizer.
///
/// Term frequencies are raw counts, idf is smoothed
/// (`ln((1 + n) / (1 + df)) + 1`) and every row is L2-normalised, so the dot
/// product of two rows is their cosine similarity. Terms outside the fitted
/// vocabulary are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "TfidfState", try_from = "TfidfState")]
pub struct TfidfVectorizer {
    vocabulary: IndexSet<String>,
    idf: Vec<f64>,
}

/// On-disk form of a fitted [`TfidfVectorizer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfState {
    pub terms: Vec<String>,
    pub idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and document frequencies of `documents`.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Result<Self> {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let unique: HashSet<String> = tokenize(doc.as_ref()).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }
        if document_frequency.is_empty() {
            return Err(ModelError::EmptyVocabulary);
        }

        let n_docs = documents.len() as f64;
        let mut vocabulary = IndexSet::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (term, df) in document_frequency {
            idf.push(((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term);
        }
        Ok(Self { vocabulary, idf })
    }

    /// Fit on `documents` and return their matrix in one pass.
    pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> Result<(Self, Array2<f64>)> {
        let vectorizer = Self::fit(documents)?;
        let matrix = vectorizer.transform_texts(documents);
        Ok((vectorizer, matrix))
    }

    /// Vectorize any string-like slice without going through the trait.
    pub fn transform_texts<S: AsRef<str>>(&self, documents: &[S]) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((documents.len(), self.vocabulary.len()));
        for (row, doc) in documents.iter().enumerate() {
            for token in tokenize(doc.as_ref()) {
                if let Some(col) = self.vocabulary.get_index_of(&token) {
                    matrix[[row, col]] += 1.0;
                }
            }
            let mut row_view = matrix.row_mut(row);
            for (col, value) in row_view.iter_mut().enumerate() {
                *value *= self.idf[col];
            }
            let norm = row_view.dot(&row_view).sqrt();
            if norm > 0.0 {
                row_view /= norm;
            }
        }
        matrix
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.iter().map(String::as_str)
    }
}

impl Vectorizer for TfidfVectorizer {
    type Input = String;

    fn transform(&self, inputs: &[String]) -> Result<Array2<f64>> {
        Ok(self.transform_texts(inputs))
    }

    fn n_features(&self) -> usize {
        self.vocabulary.len()
    }
}

impl From<TfidfVectorizer> for TfidfState {
    fn from(value: TfidfVectorizer) -> Self {
        TfidfState {
            terms: value.vocabulary.into_iter().collect(),
            idf: value.idf,
        }
    }
}

impl TryFrom<TfidfState> for TfidfVectorizer {
    type Error = ModelError;

    fn try_from(state: TfidfState) -> Result<Self> {
        if state.terms.len() != state.idf.len() {
            return Err(ModelError::Artifact(format!(
                "tfidf has {} terms but {} idf weights",
                state.terms.len(),
                state.idf.len()
            )));
        }
        let vocabulary: IndexSet<String> = state.terms.into_iter().collect();
        if vocabulary.len() != state.idf.len() {
            return Err(ModelError::Artifact("tfidf terms are not unique".into()));
        }
        Ok(Self {
            vocabulary,
            idf: state.idf,
        })
    }
}
