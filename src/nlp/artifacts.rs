//! Serialized model bundles and the startup model registry.

use std::{
    fmt,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
    sync::Arc,
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::Settings,
    error::{ModelError, Result},
    nlp::{
        binarizer::LabelBinarizer,
        classifier::CategoryClassifier,
        dict::DictVectorizer,
        linear::OneVsRestLogistic,
        remedy::{RemedyEntry, RemedyRanker},
        risk::RiskMapper,
        status::StatusModel,
        tfidf::TfidfVectorizer,
    },
};

pub const AYURVEDIC_DIR: &str = "ayurvedic";
pub const CLASSIFIER_FILE: &str = "symptom_classifier.json";
pub const RISK_FILE: &str = "symptom_risk.json";
pub const REMEDY_FILE: &str = "remedy_corpus.json";
pub const MATERNAL_FILE: &str = "maternal_status.json";
pub const FETAL_FILE: &str = "fetal_status.json";

/// Vectorizer, multi-label model and label vocabulary for symptom text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierBundle {
    pub vectorizer: TfidfVectorizer,
    pub model: OneVsRestLogistic,
    pub labels: LabelBinarizer,
}

/// Vectorizer, multi-label model and label vocabulary for risk mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskBundle {
    pub vectorizer: DictVectorizer,
    pub model: OneVsRestLogistic,
    pub labels: LabelBinarizer,
}

/// Remedy corpus; the ranker fits its vectorizer when built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemedyBundle {
    pub entries: Vec<RemedyEntry>,
}

/// Feature column names and the per-status model for vitals or CTG readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBundle {
    pub features: Vec<String>,
    pub model: OneVsRestLogistic,
}

impl TryFrom<ClassifierBundle> for CategoryClassifier {
    type Error = ModelError;

    fn try_from(bundle: ClassifierBundle) -> Result<Self> {
        CategoryClassifier::new(
            Box::new(bundle.vectorizer),
            Box::new(bundle.model),
            Box::new(bundle.labels),
        )
    }
}

impl TryFrom<RiskBundle> for RiskMapper {
    type Error = ModelError;

    fn try_from(bundle: RiskBundle) -> Result<Self> {
        RiskMapper::new(
            Box::new(bundle.vectorizer),
            Box::new(bundle.model),
            Box::new(bundle.labels),
        )
    }
}

impl TryFrom<StatusBundle> for StatusModel {
    type Error = ModelError;

    fn try_from(bundle: StatusBundle) -> Result<Self> {
        StatusModel::new(bundle.features, bundle.model)
    }
}

impl TryFrom<RemedyBundle> for RemedyRanker {
    type Error = ModelError;

    fn try_from(bundle: RemedyBundle) -> Result<Self> {
        RemedyRanker::new(bundle.entries)
    }
}

pub fn read_bundle<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn write_bundle<T: Serialize>(path: &Path, bundle: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, bundle)?;
    Ok(())
}

/// A model that either loaded at startup or is known to be missing.
pub enum ModelHandle<T> {
    Ready(Arc<T>),
    Unavailable(String),
}

impl<T> Clone for ModelHandle<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready(model) => Self::Ready(Arc::clone(model)),
            Self::Unavailable(reason) => Self::Unavailable(reason.clone()),
        }
    }
}

impl<T> fmt::Debug for ModelHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready"),
            Self::Unavailable(reason) => write!(f, "Unavailable({reason})"),
        }
    }
}

impl<T> ModelHandle<T> {
    pub fn ready(model: T) -> Self {
        Self::Ready(Arc::new(model))
    }

    /// Load a bundle from `path` and build the model; failures are recorded,
    /// never raised.
    pub fn load<B>(name: &str, path: &Path) -> Self
    where
        B: DeserializeOwned,
        T: TryFrom<B, Error = ModelError>,
    {
        if !path.exists() {
            warn!(model = name, path = %path.display(), "model artifact missing");
            return Self::Unavailable(format!("{name} artifact not found at {}", path.display()));
        }
        match read_bundle::<B>(path).and_then(T::try_from) {
            Ok(model) => {
                info!(model = name, path = %path.display(), "loaded model");
                Self::ready(model)
            }
            Err(err) => {
                warn!(model = name, path = %path.display(), error = %err, "failed to load model");
                Self::Unavailable(format!("{name}: {err}"))
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn get(&self) -> Result<&T> {
        match self {
            Self::Ready(model) => Ok(model.as_ref()),
            Self::Unavailable(reason) => Err(ModelError::Unavailable(reason.clone())),
        }
    }
}

/// Every model the service needs, loaded once per process.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    pub classifier: ModelHandle<CategoryClassifier>,
    pub risk: ModelHandle<RiskMapper>,
    pub remedy: ModelHandle<RemedyRanker>,
    pub maternal: ModelHandle<StatusModel>,
    pub fetal: ModelHandle<StatusModel>,
}

impl ModelRegistry {
    pub fn load(settings: &Settings) -> Self {
        Self::load_from(&settings.model_dir)
    }

    /// Status models sit at the root of `model_dir`, the symptom models in
    /// its `ayurvedic/` folder.
    pub fn load_from(model_dir: &Path) -> Self {
        let dir = model_dir.join(AYURVEDIC_DIR);
        Self {
            maternal: ModelHandle::load::<StatusBundle>(
                "maternal status",
                &model_dir.join(MATERNAL_FILE),
            ),
            fetal: ModelHandle::load::<StatusBundle>("fetal status", &model_dir.join(FETAL_FILE)),
            classifier: ModelHandle::load::<ClassifierBundle>(
                "symptom classifier",
                &dir.join(CLASSIFIER_FILE),
            ),
            risk: ModelHandle::load::<RiskBundle>("symptom risk", &dir.join(RISK_FILE)),
            remedy: ModelHandle::load::<RemedyBundle>("remedy", &dir.join(REMEDY_FILE)),
        }
    }
}
