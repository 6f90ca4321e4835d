//! Maternal vitals and fetal CTG status routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    api::{
        auth::Caller,
        routes::{bad_request, json_body, model_failure, unavailable, ApiError, ApiResult},
        types::{FetalDto, MaternalDto},
    },
    data::{
        records::{CtgRecord, VitalsRecord, CTG_TABLE, VITALS_TABLE},
        store::persist,
    },
    nlp::status::{CTG_FEATURES, MATERNAL_FEATURES},
};

use super::AppState;

/// A reading given as a JSON number or a numeric string.
fn number_field(body: &Value, name: &str) -> Result<f64, ApiError> {
    let value = body
        .get(name)
        .ok_or_else(|| bad_request(format!("Invalid input data: missing {name}")))?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .ok_or_else(|| bad_request(format!("Invalid input data: {name} must be a number")))
}

#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn maternal_predict(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<MaternalDto> {
    let body = json_body(payload)?;
    let values = MATERNAL_FEATURES
        .iter()
        .map(|name| number_field(&body, name))
        .collect::<Result<Vec<_>, _>>()?;
    let model = state
        .models
        .maternal
        .get()
        .map_err(|_| unavailable("Maternal prediction"))?;
    let prediction = model
        .predict(&values)
        .map_err(|e| model_failure("Prediction failed", e))?;
    info!(status = %prediction.status, "maternal status predicted");

    let [_age, systolic_bp, diastolic_bp, blood_glucose, body_temp, heart_rate] = values[..] else {
        return Err(bad_request("Invalid input data"));
    };
    let record = VitalsRecord {
        uid: caller.user_id,
        systolic_bp,
        diastolic_bp,
        blood_glucose,
        body_temp,
        heart_rate,
        prediction: prediction.status.code(),
    };
    persist(state.store.as_ref(), VITALS_TABLE, &record).await;

    Ok(Json(MaternalDto {
        prediction: prediction.status,
    }))
}

#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn fetal_predict(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<FetalDto> {
    let body = json_body(payload)?;
    let raw = body
        .get("features")
        .ok_or_else(|| bad_request("Missing required feature data"))?;
    let values: Vec<f64> = serde_json::from_value(raw.clone())
        .map_err(|_| bad_request("Features must be a list of numbers"))?;
    if values.len() != CTG_FEATURES.len() {
        return Err(bad_request(format!(
            "Invalid feature length, expected {}",
            CTG_FEATURES.len()
        )));
    }
    let model = state
        .models
        .fetal
        .get()
        .map_err(|_| unavailable("Fetal prediction"))?;
    let prediction = model
        .predict(&values)
        .map_err(|e| model_failure("Prediction failed", e))?;
    info!(status = %prediction.status, "fetal status predicted");

    let record = CtgRecord {
        uid: caller.user_id,
        features: model.features().iter().cloned().zip(values).collect(),
        prediction: prediction.status.code(),
    };
    persist(state.store.as_ref(), CTG_TABLE, &record).await;

    Ok(Json(FetalDto {
        prediction: prediction.status.code(),
        status: prediction.status,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::api::testing::{post, registry, test_app, MemoryStore};

    fn vitals(systolic: Value) -> Value {
        json!({
            "age": 31,
            "systolic_bp": systolic,
            "diastolic_bp": 95,
            "blood_glucose": 7.5,
            "body_temp": "37.1",
            "heart_rate": 88
        })
    }

    #[tokio::test]
    async fn maternal_reading_is_classified_and_stored_as_vitals() {
        let store = Arc::new(MemoryStore::default());
        let (status, body) = post(
            test_app(registry(), Arc::clone(&store)),
            "/maternal/predict",
            Some("good"),
            vitals(json!(165)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"prediction": "Pathological"}));

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "vitals");
        assert_eq!(rows[0].1["UID"], "user-1");
        assert_eq!(rows[0].1["systolic_bp"], 165.0);
        assert_eq!(rows[0].1["body_temp"], 37.1);
        assert_eq!(rows[0].1["prediction"], 2);
        assert!(rows[0].1.get("age").is_none());
    }

    #[tokio::test]
    async fn non_numeric_vital_is_a_bad_request() {
        let store = Arc::new(MemoryStore::default());
        let (status, body) = post(
            test_app(registry(), Arc::clone(&store)),
            "/maternal/predict",
            Some("good"),
            vitals(json!("high")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid input data: systolic_bp must be a number");
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ctg_reading_returns_code_and_status() {
        let store = Arc::new(MemoryStore::default());
        let mut features = vec![0.0; 15];
        features[6] = 1.0;
        let (status, body) = post(
            test_app(registry(), Arc::clone(&store)),
            "/fetal/predict",
            Some("good"),
            json!({ "features": features }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"prediction": 2, "status": "Pathological"}));

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows[0].0, "ctg");
        assert_eq!(rows[0].1["prolonged_decelerations"], 1.0);
        assert_eq!(rows[0].1["prediction"], 2);
    }

    #[tokio::test]
    async fn ctg_reading_must_have_fifteen_values() {
        let store = Arc::new(MemoryStore::default());
        let (status, body) = post(
            test_app(registry(), store),
            "/fetal/predict",
            Some("good"),
            json!({"features": [1.0, 2.0]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid feature length, expected 15");
    }

    #[tokio::test]
    async fn missing_fetal_model_is_reported() {
        let store = Arc::new(MemoryStore::default());
        let mut models = registry();
        models.fetal = crate::nlp::ModelHandle::Unavailable("missing".into());
        let (status, body) = post(
            test_app(models, store),
            "/fetal/predict",
            Some("good"),
            json!({"features": vec![0.0; 15]}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Fetal prediction service unavailable");
    }
}
