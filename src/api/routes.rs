//! HTTP route handlers for Axum: index, health and the symptom routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    api::{
        auth::Caller,
        types::{ClassificationDto, ErrorBody, HealthDto, RemedyDto, RemedyRequest, RiskDto},
    },
    data::{
        records::{
            RemedyRecord, RiskAssessmentRecord, SymptomRecord, REMEDY_TABLE, RISK_TABLE,
            SYMPTOMS_TABLE,
        },
        store::persist,
    },
    error::ModelError,
    nlp::{
        assess_risks, encode_features, fallback_rng, risk::dedupe_categories, RemedyQuery,
        SymptomText, Vitals,
    },
};

use super::AppState;

pub(super) type ApiError = (StatusCode, Json<ErrorBody>);
pub(super) type ApiResult<T> = Result<Json<T>, ApiError>;

pub(super) fn bad_request(message: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message)))
}

/// Unreadable bodies get the same `{"error": ...}` shape as every other failure.
pub(super) fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        let message = rejection.body_text();
        warn!(error = %message, "rejected request body");
        (rejection.status(), Json(ErrorBody::new(message)))
    })
}

/// Map a model failure to a response; `context` names the failing step.
pub(super) fn model_failure(context: &str, err: ModelError) -> ApiError {
    let status = match &err {
        ModelError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(error = %err, context, "model call failed");
    (status, Json(ErrorBody::new(format!("{context}: {err}"))))
}

pub(super) fn unavailable(service: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new(format!("{service} service unavailable"))),
    )
}

pub async fn index() -> &'static str {
    "Hello governor"
}

pub async fn health(State(state): State<AppState>) -> Json<HealthDto> {
    Json(HealthDto {
        classifier: state.models.classifier.is_available(),
        risk: state.models.risk.is_available(),
        remedy: state.models.remedy.is_available(),
        remedy_documents: state
            .models
            .remedy
            .get()
            .map_or(0, |ranker| ranker.corpus_size()),
        maternal: state.models.maternal.is_available(),
        fetal: state.models.fetal.is_available(),
    })
}

#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn classify_symptoms(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ClassificationDto> {
    let body = json_body(payload)?;
    let raw = body
        .get("symptoms")
        .ok_or_else(|| bad_request("Missing symptoms data"))?;
    let symptoms =
        SymptomText::from_json(raw).map_err(|_| bad_request("Symptoms must be text or list"))?;
    let classifier = state
        .models
        .classifier
        .get()
        .map_err(|_| unavailable("Symptom classification"))?;

    let text = symptoms.joined();
    info!(%text, "classifying symptoms");
    let mut rng = fallback_rng(state.settings.classifier_seed);
    let result = classifier
        .classify(&symptoms, &mut rng)
        .map_err(|e| model_failure("Classification failed", e))?;
    info!(categories = ?result.categories, confidence = result.confidence, "classified");

    let record = SymptomRecord {
        uid: caller.user_id,
        reported_symptoms: text,
        classified_categories: result.categories.clone(),
        confidence: result.confidence,
        recorded_at: Utc::now(),
    };
    persist(state.store.as_ref(), SYMPTOMS_TABLE, &record).await;

    Ok(Json(ClassificationDto {
        categories: result.categories,
        confidence: result.confidence,
    }))
}

#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn map_symptom_risk(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<RiskDto> {
    let body = json_body(payload)?;
    let raw = body
        .get("symptom_categories")
        .ok_or_else(|| bad_request("Missing symptom categories"))?;
    let categories: Vec<String> = serde_json::from_value(raw.clone())
        .map_err(|_| bad_request("Symptom categories must be a list of strings"))?;
    let mapper = state
        .models
        .risk
        .get()
        .map_err(|_| unavailable("Risk mapping"))?;

    let symptoms = dedupe_categories(&categories);
    let vitals = match state.store.latest_vitals(&caller.user_id).await {
        Ok(vitals) => vitals.unwrap_or_default(),
        Err(err) => {
            warn!(error = %err, "could not fetch vitals; using defaults");
            Vitals::default()
        }
    };
    let features = encode_features(&symptoms, &vitals);
    let risks =
        assess_risks(mapper, &features).map_err(|e| model_failure("Risk prediction failed", e))?;
    for risk in &risks {
        info!(risk = %risk.risk_type, severity = risk.severity.as_str(), "risk identified");
    }

    let record = RiskAssessmentRecord {
        uid: caller.user_id,
        symptoms,
        risks: risks.clone(),
        assessed_at: Utc::now(),
    };
    persist(state.store.as_ref(), RISK_TABLE, &record).await;

    Ok(Json(RiskDto { risks }))
}

#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn remedy_recommendation(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<RemedyDto> {
    let body = json_body(payload)?;
    if body.get("symptoms").is_none() {
        return Err(bad_request("Missing required field: symptoms"));
    }
    let request: RemedyRequest = serde_json::from_value(body)
        .map_err(|_| bad_request("Symptoms must be a list and prakriti a string"))?;
    let ranker = state
        .models
        .remedy
        .get()
        .map_err(|_| unavailable("Remedy recommendation"))?;

    let query = RemedyQuery {
        symptoms: request.symptoms,
        prakriti: request.prakriti,
    };
    let remedies = ranker.predict_with_confidence(&query);
    info!(count = remedies.len(), "recommended remedies");

    let record = RemedyRecord {
        uid: caller.user_id,
        symptoms: query.symptoms,
        prakriti: query.prakriti.clone(),
        recommended_remedies: remedies.clone(),
        recorded_at: Utc::now(),
    };
    persist(state.store.as_ref(), REMEDY_TABLE, &record).await;

    Ok(Json(RemedyDto {
        prakriti: query.prakriti,
        remedies,
    }))
}
