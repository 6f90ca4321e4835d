//! Remedy suggestions by TF-IDF similarity over a fixed corpus.

use std::{cmp::Ordering, collections::HashSet};

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::Result, nlp::tfidf::TfidfVectorizer};

/// Documents considered per query.
const TOP_K: usize = 3;
/// Documents at or below this similarity contribute nothing.
const MIN_SIMILARITY: f64 = 0.1;
/// Remedies returned per query.
const MAX_REMEDIES: usize = 3;
/// Rank-based confidence; not derived from the similarity scores.
const RANK_CONFIDENCE: [f64; 3] = [0.9, 0.8, 0.7];
const TAIL_CONFIDENCE: f64 = 0.6;
const DEFAULT_PRAKRITI: &str = "balanced";

/// One corpus document and the remedies it stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemedyEntry {
    pub features: String,
    pub remedies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemedyQuery {
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub prakriti: Option<String>,
}

impl RemedyQuery {
    fn text(&self) -> String {
        let prakriti = self.prakriti.as_deref().unwrap_or(DEFAULT_PRAKRITI);
        format!("{} {}", self.symptoms.join(" "), prakriti)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemedyScore {
    pub remedy: String,
    pub confidence: f64,
}

#[derive(Debug)]
pub struct RemedyRanker {
    corpus: Vec<RemedyEntry>,
    vectorizer: TfidfVectorizer,
    documents: Array2<f64>,
}

fn cosine(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let dot = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

impl RemedyRanker {
    /// Fit the vectorizer over the corpus; the only mutating step.
    pub fn new(corpus: Vec<RemedyEntry>) -> Result<Self> {
        let texts: Vec<&str> = corpus.iter().map(|e| e.features.as_str()).collect();
        let (vectorizer, documents) = TfidfVectorizer::fit_transform(&texts)?;
        Ok(Self {
            corpus,
            vectorizer,
            documents,
        })
    }

    /// Number of documents in the fitted corpus.
    pub fn corpus_size(&self) -> usize {
        self.corpus.len()
    }

    /// Cosine similarity of the query against every corpus document.
    fn similarities(&self, query: &RemedyQuery) -> Vec<f64> {
        let q = self.vectorizer.transform_texts(&[query.text()]);
        self.documents
            .rows()
            .into_iter()
            .map(|doc| cosine(q.row(0), doc))
            .collect()
    }

    /// Up to three distinct remedies from the best matching documents.
    pub fn predict(&self, query: &RemedyQuery) -> Vec<String> {
        let scores = self.similarities(query);
        let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
        // stable: equal scores keep corpus order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut seen = HashSet::new();
        let remedies: Vec<String> = ranked
            .into_iter()
            .take(TOP_K)
            .filter(|(_, score)| *score > MIN_SIMILARITY)
            .flat_map(|(idx, _)| self.corpus[idx].remedies.iter())
            .filter(|remedy| seen.insert(remedy.as_str()))
            .take(MAX_REMEDIES)
            .cloned()
            .collect();
        debug!(count = remedies.len(), "ranked remedies");
        remedies
    }

    /// [`Self::predict`] paired with a fixed confidence per rank.
    pub fn predict_with_confidence(&self, query: &RemedyQuery) -> Vec<RemedyScore> {
        self.predict(query)
            .into_iter()
            .enumerate()
            .map(|(rank, remedy)| RemedyScore {
                remedy,
                confidence: RANK_CONFIDENCE.get(rank).copied().unwrap_or(TAIL_CONFIDENCE),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(features: &str, remedies: &[&str]) -> RemedyEntry {
        RemedyEntry {
            features: features.to_string(),
            remedies: remedies.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn query(symptoms: &[&str], prakriti: Option<&str>) -> RemedyQuery {
        RemedyQuery {
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            prakriti: prakriti.map(str::to_string),
        }
    }

    #[test]
    fn query_defaults_to_balanced_constitution() {
        assert_eq!(query(&["nausea", "fatigue"], None).text(), "nausea fatigue balanced");
        assert_eq!(query(&[], Some("Vata")).text(), " Vata");
    }

    #[test]
    fn duplicates_keep_their_first_position() {
        let ranker = RemedyRanker::new(vec![
            entry("nausea morning sickness vata", &["A", "B"]),
            entry("nausea vata", &["B", "C"]),
            entry("back pain kapha", &["D"]),
        ])
        .unwrap();
        let remedies = ranker.predict(&query(&["morning", "sickness", "nausea"], Some("vata")));
        assert_eq!(remedies, vec!["A", "B", "C"]);
    }

    #[test]
    fn documents_below_floor_contribute_nothing() {
        let ranker = RemedyRanker::new(vec![
            entry("heartburn pitta", &["Cool milk"]),
            entry("insomnia vata", &["Warm oil massage"]),
        ])
        .unwrap();
        assert!(ranker.predict(&query(&["swelling"], Some("kapha"))).is_empty());
    }

    #[test]
    fn result_is_capped_at_three() {
        let ranker = RemedyRanker::new(vec![
            entry("fatigue", &["A", "B"]),
            entry("fatigue rest", &["C", "D"]),
        ])
        .unwrap();
        let remedies = ranker.predict(&query(&["fatigue"], None));
        assert_eq!(remedies.len(), 3);
        assert_eq!(remedies, vec!["A", "B", "C"]);
    }

    #[test]
    fn only_the_top_three_documents_are_used() {
        let ranker = RemedyRanker::new(vec![
            entry("cramps", &["A"]),
            entry("cramps", &["B"]),
            entry("cramps", &[]),
            entry("cramps", &["D"]),
        ])
        .unwrap();
        // all four tie; corpus order decides and the fourth is cut
        assert_eq!(ranker.predict(&query(&["cramps"], None)), vec!["A", "B"]);
    }

    #[test]
    fn prediction_is_idempotent() {
        let ranker = RemedyRanker::new(vec![
            entry("nausea pitta", &["Ginger tea", "Mint"]),
            entry("fatigue vata", &["Dates", "Rest"]),
        ])
        .unwrap();
        let q = query(&["nausea", "fatigue"], Some("pitta"));
        let first = ranker.predict(&q);
        for _ in 0..5 {
            assert_eq!(ranker.predict(&q), first);
        }
    }

    #[test]
    fn confidences_follow_rank_not_similarity() {
        let ranker = RemedyRanker::new(vec![
            entry("fatigue", &["A", "B"]),
            entry("fatigue rest", &["C"]),
        ])
        .unwrap();
        let scored = ranker.predict_with_confidence(&query(&["fatigue"], None));
        let confidences: Vec<f64> = scored.iter().map(|s| s.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.8, 0.7]);
        assert_eq!(scored[0].remedy, "A");
    }

    #[test]
    fn empty_corpus_cannot_be_ranked() {
        assert!(RemedyRanker::new(Vec::new()).is_err());
    }
}
