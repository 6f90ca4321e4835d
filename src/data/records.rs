//! Rows persisted after each prediction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    llm::ChatMessage,
    nlp::{RemedyScore, RiskFinding},
};

pub const SYMPTOMS_TABLE: &str = "symptoms";
pub const RISK_TABLE: &str = "risk_assessments";
pub const REMEDY_TABLE: &str = "remedy_recommendations";
pub const VITALS_TABLE: &str = "vitals";
pub const CTG_TABLE: &str = "ctg";
pub const CHATS_TABLE: &str = "chats";

/// Vitals reading; the latest row feeds risk mapping and lifestyle prompts.
#[derive(Debug, Clone, Serialize)]
pub struct VitalsRecord {
    #[serde(rename = "UID")]
    pub uid: String,
    pub systolic_bp: f64,
    pub diastolic_bp: f64,
    pub blood_glucose: f64,
    pub body_temp: f64,
    pub heart_rate: f64,
    /// Status code, 0 normal to 2 pathological.
    pub prediction: u8,
}

/// CTG reading stored one column per feature.
#[derive(Debug, Clone, Serialize)]
pub struct CtgRecord {
    #[serde(rename = "UID")]
    pub uid: String,
    #[serde(flatten)]
    pub features: BTreeMap<String, f64>,
    pub prediction: u8,
}

/// Whole conversation, upserted per user.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRecord {
    #[serde(rename = "UID")]
    pub uid: String,
    pub chat_history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymptomRecord {
    #[serde(rename = "UID")]
    pub uid: String,
    pub reported_symptoms: String,
    pub classified_categories: Vec<String>,
    pub confidence: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessmentRecord {
    #[serde(rename = "UID")]
    pub uid: String,
    pub symptoms: Vec<String>,
    pub risks: Vec<RiskFinding>,
    pub assessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemedyRecord {
    #[serde(rename = "UID")]
    pub uid: String,
    pub symptoms: Vec<String>,
    pub prakriti: Option<String>,
    pub recommended_remedies: Vec<RemedyScore>,
    pub recorded_at: DateTime<Utc>,
}
