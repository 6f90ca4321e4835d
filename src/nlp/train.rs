//! Build model bundles from CSV training datasets.

use std::path::Path;

use ndarray::Array2;

use serde::{de::DeserializeOwned, Deserialize};
use tracing::{info, warn};

use crate::{
    config::Settings,
    error::{ModelError, Result},
    nlp::{
        artifacts::{
            write_bundle, ClassifierBundle, RemedyBundle, RiskBundle, StatusBundle,
            CLASSIFIER_FILE, FETAL_FILE, MATERNAL_FILE, REMEDY_FILE, RISK_FILE,
        },
        binarizer::LabelBinarizer,
        capability::Vectorizer,
        dict::DictVectorizer,
        linear::OneVsRestLogistic,
        remedy::RemedyEntry,
        risk::{encode_features, Vitals, VITAL_FIELDS},
        status::{HealthStatus, CTG_FEATURES, MATERNAL_FEATURES},
        tfidf::TfidfVectorizer,
    },
};

/// Labelled symptom text, `categories` is `;`-separated.
#[derive(Debug, Clone, Deserialize)]
pub struct SymptomRow {
    pub text: String,
    pub categories: String,
}

/// Vitals, reported categories and the observed risks.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskRow {
    pub systolic_bp: f64,
    pub diastolic_bp: f64,
    pub blood_glucose: f64,
    pub body_temp: f64,
    pub heart_rate: f64,
    pub symptoms: String,
    pub risks: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemedyRow {
    pub features: String,
    pub remedies: String,
}

/// Split a `;`-separated cell into trimmed, non-empty items.
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

pub fn train_classifier(rows: &[SymptomRow], max_iterations: u64) -> Result<ClassifierBundle> {
    let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
    let label_sets: Vec<Vec<String>> = rows.iter().map(|r| split_list(&r.categories)).collect();
    let labels = LabelBinarizer::fit(&label_sets);
    if labels.is_empty() {
        return Err(ModelError::Training("symptom dataset has no categories".into()));
    }
    let (vectorizer, x) = TfidfVectorizer::fit_transform(&texts)?;
    let y = labels.transform(&label_sets);
    let model = OneVsRestLogistic::fit(&x, &y, max_iterations)?;
    Ok(ClassifierBundle {
        vectorizer,
        model,
        labels,
    })
}

pub fn train_risk(rows: &[RiskRow], max_iterations: u64) -> Result<RiskBundle> {
    let samples: Vec<_> = rows
        .iter()
        .map(|row| {
            let vitals = Vitals {
                systolic_bp: Some(row.systolic_bp),
                diastolic_bp: Some(row.diastolic_bp),
                blood_glucose: Some(row.blood_glucose),
                body_temp: Some(row.body_temp),
                heart_rate: Some(row.heart_rate),
            };
            encode_features(&split_list(&row.symptoms), &vitals)
        })
        .collect();
    let label_sets: Vec<Vec<String>> = rows.iter().map(|r| split_list(&r.risks)).collect();
    let labels = LabelBinarizer::fit(&label_sets);
    if labels.is_empty() {
        return Err(ModelError::Training("risk dataset has no risk labels".into()));
    }
    let vectorizer = DictVectorizer::fit(&samples, &VITAL_FIELDS)?;
    let x = vectorizer.transform(&samples)?;
    let y = labels.transform(&label_sets);
    let model = OneVsRestLogistic::fit(&x, &y, max_iterations)?;
    Ok(RiskBundle {
        vectorizer,
        model,
        labels,
    })
}

/// Read the named numeric columns and the `status` column of a CSV file.
///
/// Columns are located by header, so extra columns and any column order are
/// accepted.
pub fn read_status_table(path: &Path, features: &[&str]) -> Result<(Array2<f64>, Vec<HealthStatus>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            ModelError::Training(format!("{} has no `{name}` column", path.display()))
        })
    };
    let feature_columns = features
        .iter()
        .map(|&name| column(name))
        .collect::<Result<Vec<_>>>()?;
    let status_column = column("status")?;

    let mut values = Vec::new();
    let mut statuses = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        for (&idx, name) in feature_columns.iter().zip(features) {
            let cell = record.get(idx).unwrap_or_default();
            let value: f64 = cell.parse().map_err(|_| {
                ModelError::Training(format!("row {}: `{name}` is not a number", line + 1))
            })?;
            values.push(value);
        }
        statuses.push(record.get(status_column).unwrap_or_default().parse()?);
    }
    if statuses.is_empty() {
        return Err(ModelError::Training(format!("{} has no rows", path.display())));
    }
    let x = Array2::from_shape_vec((statuses.len(), features.len()), values)
        .map_err(|e| ModelError::Training(e.to_string()))?;
    Ok((x, statuses))
}

/// One logistic column per status, in code order.
pub fn train_status(
    x: &Array2<f64>,
    statuses: &[HealthStatus],
    features: &[&str],
    max_iterations: u64,
) -> Result<StatusBundle> {
    let y = Array2::from_shape_fn((statuses.len(), HealthStatus::ALL.len()), |(row, col)| {
        u8::from(usize::from(statuses[row].code()) == col)
    });
    let model = OneVsRestLogistic::fit(x, &y, max_iterations)?;
    Ok(StatusBundle {
        features: features.iter().map(|f| f.to_string()).collect(),
        model,
    })
}

pub fn remedy_bundle(rows: &[RemedyRow]) -> RemedyBundle {
    RemedyBundle {
        entries: rows
            .iter()
            .map(|row| RemedyEntry {
                features: row.features.clone(),
                remedies: split_list(&row.remedies),
            })
            .collect(),
    }
}

/// Train every model whose dataset exists under `DATA_DIR` and write the
/// bundles into the model directory. Returns how many bundles were written.
pub fn train_all(settings: &Settings, max_iterations: u64) -> Result<usize> {
    let out = settings.ayurvedic_model_dir();
    let mut written = 0;

    let symptoms = settings.join_data("symptoms.csv");
    if symptoms.exists() {
        let rows: Vec<SymptomRow> = read_rows(&symptoms)?;
        let bundle = train_classifier(&rows, max_iterations)?;
        info!(rows = rows.len(), labels = bundle.labels.len(), "trained symptom classifier");
        write_bundle(&out.join(CLASSIFIER_FILE), &bundle)?;
        written += 1;
    } else {
        warn!(path = %symptoms.display(), "symptom dataset missing; skipping");
    }

    let risks = settings.join_data("risks.csv");
    if risks.exists() {
        let rows: Vec<RiskRow> = read_rows(&risks)?;
        let bundle = train_risk(&rows, max_iterations)?;
        info!(rows = rows.len(), labels = bundle.labels.len(), "trained risk model");
        write_bundle(&out.join(RISK_FILE), &bundle)?;
        written += 1;
    } else {
        warn!(path = %risks.display(), "risk dataset missing; skipping");
    }

    let remedies = settings.join_data("remedies.csv");
    if remedies.exists() {
        let rows: Vec<RemedyRow> = read_rows(&remedies)?;
        info!(rows = rows.len(), "collected remedy corpus");
        write_bundle(&out.join(REMEDY_FILE), &remedy_bundle(&rows))?;
        written += 1;
    } else {
        warn!(path = %remedies.display(), "remedy dataset missing; skipping");
    }

    let status_sets: [(&str, &[&str], &str); 2] = [
        ("maternal.csv", &MATERNAL_FEATURES[..], MATERNAL_FILE),
        ("fetal.csv", &CTG_FEATURES[..], FETAL_FILE),
    ];
    for (dataset, features, file) in status_sets {
        let path = settings.join_data(dataset);
        if !path.exists() {
            warn!(path = %path.display(), "status dataset missing; skipping");
            continue;
        }
        let (x, statuses) = read_status_table(&path, features)?;
        let bundle = train_status(&x, &statuses, features, max_iterations)?;
        info!(rows = statuses.len(), dataset, "trained status model");
        write_bundle(&settings.model_dir.join(file), &bundle)?;
        written += 1;
    }

    Ok(written)
}
