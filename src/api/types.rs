//! Shared DTOs for JSON requests and responses.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::nlp::{HealthStatus, RemedyScore, RiskFinding};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Display) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationDto {
    pub categories: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskDto {
    pub risks: Vec<RiskFinding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemedyRequest {
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub prakriti: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemedyDto {
    pub prakriti: Option<String>,
    pub remedies: Vec<RemedyScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub classifier: bool,
    pub risk: bool,
    pub remedy: bool,
    /// Size of the loaded remedy corpus, 0 when unavailable.
    pub remedy_documents: usize,
    pub maternal: bool,
    pub fetal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaternalDto {
    pub prediction: HealthStatus,
}

/// Fetal status as both the numeric code and its name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetalDto {
    pub prediction: u8,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DietRequest {
    pub trimester: String,
    pub weight: f64,
    pub health_conditions: String,
    pub dietary_preference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietDto {
    pub diet_plan: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReplyDto {
    pub response: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LifestyleParams {
    #[serde(default)]
    pub delivery_done: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifestyleDto {
    pub self_care: String,
    pub music: String,
    pub exercise: String,
    pub ayurveda_tip: String,
}
