//! In-memory collaborators and request helpers for route tests.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use anyhow::anyhow;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use futures::future::BoxFuture;
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    api::{
        auth::{AuthError, TokenVerifier},
        router, AppState,
    },
    config::Settings,
    data::store::RecordStore,
    llm::{ChatClient, ChatError, ChatMessage},
    nlp::{
        classifier::tests::silent_classifier,
        remedy::{RemedyEntry, RemedyRanker},
        risk::tests::mapper,
        status::tests::{fetal_model, maternal_model},
        ModelHandle, ModelRegistry, Vitals,
    },
};

/// `good` belongs to `user-1`, `nosub` has no subject, anything else is refused.
pub(crate) struct FixedTokens;

impl TokenVerifier for FixedTokens {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<String, AuthError>> {
        Box::pin(async move {
            match token {
                "good" => Ok("user-1".to_string()),
                "nosub" => Err(AuthError::MissingSubject),
                _ => Err(AuthError::Rejected),
            }
        })
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    /// Every written row as `(table, row)`, upserts included.
    pub rows: Mutex<Vec<(String, Value)>>,
    pub vitals: Option<Vitals>,
    pub categories: Vec<Vec<String>>,
    pub chat: Option<Vec<ChatMessage>>,
    pub fail_inserts: bool,
    pub fail_reads: bool,
}

impl MemoryStore {
    fn record(&self, table: &str, row: Value) -> anyhow::Result<()> {
        if self.fail_inserts {
            return Err(anyhow!("database offline"));
        }
        self.rows.lock().unwrap().push((table.to_string(), row));
        Ok(())
    }

    fn read<T: Clone>(&self, value: &T) -> anyhow::Result<T> {
        if self.fail_reads {
            return Err(anyhow!("database offline"));
        }
        Ok(value.clone())
    }
}

impl RecordStore for MemoryStore {
    fn insert<'a>(&'a self, table: &'a str, row: Value) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move { self.record(table, row) })
    }

    fn upsert<'a>(&'a self, table: &'a str, row: Value) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move { self.record(table, row) })
    }

    fn latest_vitals<'a>(&'a self, _user_id: &'a str) -> BoxFuture<'a, anyhow::Result<Option<Vitals>>> {
        Box::pin(async move { self.read(&self.vitals) })
    }

    fn recent_symptom_categories<'a>(
        &'a self,
        _user_id: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, anyhow::Result<Vec<Vec<String>>>> {
        Box::pin(async move {
            let mut categories = self.read(&self.categories)?;
            categories.truncate(limit);
            Ok(categories)
        })
    }

    fn latest_chat<'a>(
        &'a self,
        _user_id: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<Option<Vec<ChatMessage>>>> {
        Box::pin(async move { self.read(&self.chat) })
    }
}

/// Replies with a fixed text, or fails when there is none, and keeps every
/// conversation it was sent.
#[derive(Default)]
pub(crate) struct ScriptedChat {
    pub reply: Option<String>,
    pub seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Self::default()
        }
    }
}

impl ChatClient for ScriptedChat {
    fn complete<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String, ChatError>> {
        Box::pin(async move {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.reply
                .clone()
                .ok_or_else(|| ChatError::Request("model offline".into()))
        })
    }
}

pub(crate) fn registry() -> ModelRegistry {
    ModelRegistry {
        classifier: ModelHandle::ready(silent_classifier()),
        risk: ModelHandle::ready(mapper()),
        remedy: ModelHandle::ready(
            RemedyRanker::new(vec![RemedyEntry {
                features: "nausea morning sickness pitta".into(),
                remedies: vec!["Ginger tea".into(), "Fennel water".into()],
            }])
            .unwrap(),
        ),
        maternal: ModelHandle::ready(maternal_model()),
        fetal: ModelHandle::ready(fetal_model()),
    }
}

pub(crate) fn test_app_with_chat(
    models: ModelRegistry,
    store: Arc<MemoryStore>,
    chat: Arc<ScriptedChat>,
) -> Router {
    let mut settings = Settings::for_dirs(Path::new("data"), Path::new("models"));
    settings.classifier_seed = Some(3);
    router(AppState {
        settings,
        models,
        store,
        auth: Arc::new(FixedTokens),
        chat,
    })
}

/// App whose chat model is offline.
pub(crate) fn test_app(models: ModelRegistry, store: Arc<MemoryStore>) -> Router {
    test_app_with_chat(models, store, Arc::new(ScriptedChat::default()))
}

pub(crate) async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// POST a raw body as `application/json`.
pub(crate) async fn post_raw(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: impl Into<Body>,
) -> (StatusCode, Value) {
    let mut request = Request::post(uri).header("content-type", "application/json");
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    send(app, request.body(body.into()).unwrap()).await
}

pub(crate) async fn post(app: Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, token, body.to_string()).await
}

pub(crate) async fn get(app: Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::get(uri);
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    send(app, request.body(Body::empty()).unwrap()).await
}
