//! Routes answered by the chat model: diet plans, the assistant chat and
//! lifestyle recommendations.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    api::{
        auth::Caller,
        routes::{bad_request, json_body, ApiError, ApiResult},
        types::{ChatReplyDto, DietDto, DietRequest, ErrorBody, LifestyleDto, LifestyleParams},
    },
    data::{
        records::{ChatRecord, CHATS_TABLE},
        store::persist_replacing,
    },
    llm::{
        prompts,
        sections::{extract_section, NOT_FOUND},
        ChatError, ChatMessage, Role,
    },
};

use super::AppState;

fn server_error(message: impl std::fmt::Display) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(message)))
}

fn chat_failure(err: ChatError) -> ApiError {
    warn!(error = %err, "chat model call failed");
    server_error(err)
}

#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn diet_plan(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<DietDto> {
    let body = json_body(payload)?;
    let request: DietRequest =
        serde_json::from_value(body).map_err(|_| bad_request("Missing input data"))?;
    info!(trimester = %request.trimester, "planning diet");
    let prompt = prompts::diet_plan(
        &request.trimester,
        request.weight,
        &request.health_conditions,
        &request.dietary_preference,
    );
    let diet_plan = state
        .chat
        .complete(&[ChatMessage::user(prompt)])
        .await
        .map_err(chat_failure)?;
    Ok(Json(DietDto { diet_plan }))
}

/// The caller's stored conversation; empty when there is none.
#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn chat_history(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Vec<ChatMessage>> {
    let history = state
        .store
        .latest_chat(&caller.user_id)
        .await
        .map_err(|err| {
            warn!(error = %err, "could not read chat history");
            server_error(err)
        })?;
    Ok(Json(history.unwrap_or_default()))
}

#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn send_message(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ChatReplyDto> {
    let body = json_body(payload)?;
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("Missing message"))?;

    // a failed read must not replace the stored conversation with a new one
    let mut history = match state.store.latest_chat(&caller.user_id).await {
        Ok(Some(history)) if !history.is_empty() => history,
        Ok(_) => vec![prompts::persona()],
        Err(err) => {
            warn!(error = %err, "could not read chat history");
            return Err(server_error(err));
        }
    };
    history.push(ChatMessage::user(message));
    let response = state.chat.complete(&history).await.map_err(chat_failure)?;
    info!(turns = history.len(), "assistant replied");
    history.push(ChatMessage::new(Role::Assistant, response.clone()));

    let record = ChatRecord {
        uid: caller.user_id,
        chat_history: history,
    };
    persist_replacing(state.store.as_ref(), CHATS_TABLE, &record).await;

    Ok(Json(ChatReplyDto { response }))
}

fn section(reply: &str, name: &str) -> String {
    extract_section(reply, name).unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Lifestyle suggestions from recent symptoms and the latest vitals.
///
/// Either lookup failing only thins the prompt.
#[instrument(skip_all, fields(user = %caller.user_id))]
pub async fn recommendations(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<LifestyleParams>,
) -> ApiResult<LifestyleDto> {
    let postpartum = params
        .delivery_done
        .is_some_and(|flag| flag.eq_ignore_ascii_case("true"));
    let symptoms: Vec<String> = match state.store.recent_symptom_categories(&caller.user_id, 3).await {
        Ok(batches) => batches.into_iter().flatten().collect(),
        Err(err) => {
            warn!(error = %err, "could not fetch recent symptoms");
            Vec::new()
        }
    };
    let vitals = match state.store.latest_vitals(&caller.user_id).await {
        Ok(vitals) => vitals,
        Err(err) => {
            warn!(error = %err, "could not fetch vitals");
            None
        }
    };

    let prompt = prompts::lifestyle(&symptoms, vitals.as_ref(), postpartum);
    let reply = state
        .chat
        .complete(&[ChatMessage::user(prompt)])
        .await
        .map_err(chat_failure)?;
    Ok(Json(LifestyleDto {
        self_care: section(&reply, "self-care"),
        music: section(&reply, "music"),
        exercise: section(&reply, "exercise"),
        ayurveda_tip: section(&reply, "ayurveda"),
    }))
}
