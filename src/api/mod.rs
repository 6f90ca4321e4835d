//! HTTP layer exposing classification, risk mapping, remedy ranking, vitals
//! status and the chat-backed assistant routes.

pub mod assistant;
pub mod auth;
pub mod routes;
pub mod types;
pub mod vitals;

#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    config::Settings,
    data::store::{RecordStore, SupabaseStore},
    llm::{ChatClient, CompletionClient},
    nlp::ModelRegistry,
};

use auth::{SupabaseAuth, TokenVerifier};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub models: ModelRegistry,
    pub store: Arc<dyn RecordStore>,
    pub auth: Arc<dyn TokenVerifier>,
    pub chat: Arc<dyn ChatClient>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/ayurveda/classify_symptoms", post(routes::classify_symptoms))
        .route("/ayurveda/map_symptom_risk", post(routes::map_symptom_risk))
        .route(
            "/ayurveda/remedy_recommendation",
            post(routes::remedy_recommendation),
        )
        .route("/maternal/predict", post(vitals::maternal_predict))
        .route("/fetal/predict", post(vitals::fetal_predict))
        .route("/diet/plan", post(assistant::diet_plan))
        .route(
            "/chat/history",
            get(assistant::chat_history).post(assistant::send_message),
        )
        .route("/recommendations", get(assistant::recommendations))
        .route("/recommendations/", get(assistant::recommendations))
        .route("/generate_recommendations", get(assistant::recommendations))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: Settings, host: String, port: u16) -> Result<()> {
    let models = ModelRegistry::load(&settings);
    let state = AppState {
        store: Arc::new(SupabaseStore::from_settings(&settings)?),
        auth: Arc::new(SupabaseAuth::from_settings(&settings)?),
        chat: Arc::new(CompletionClient::from_settings(&settings)?),
        models,
        settings,
    };

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "serving janani-assistant API");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
