//! Record persistence against the managed database's REST interface.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, warn};

use crate::{config::Settings, llm::ChatMessage, nlp::Vitals};

use super::records::{CHATS_TABLE, SYMPTOMS_TABLE, VITALS_TABLE};

const VITAL_COLUMNS: &str = "systolic_bp,diastolic_bp,blood_glucose,body_temp,heart_rate";

/// Durable store for request records and the per-user history read back
/// by later requests.
pub trait RecordStore: Send + Sync {
    fn insert<'a>(&'a self, table: &'a str, row: serde_json::Value) -> BoxFuture<'a, Result<()>>;

    /// Insert, or replace the row with the same primary key.
    fn upsert<'a>(&'a self, table: &'a str, row: serde_json::Value) -> BoxFuture<'a, Result<()>>;

    fn latest_vitals<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<Vitals>>>;

    /// Category lists of the caller's most recent classifications, newest first.
    fn recent_symptom_categories<'a>(
        &'a self,
        user_id: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<Vec<String>>>>;

    fn latest_chat<'a>(&'a self, user_id: &'a str)
        -> BoxFuture<'a, Result<Option<Vec<ChatMessage>>>>;
}

#[derive(Debug, Deserialize)]
struct CategoriesRow {
    #[serde(default)]
    classified_categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatRow {
    #[serde(default)]
    chat_history: Vec<ChatMessage>,
}

/// Insert `record` into `table`, logging instead of failing the request.
pub async fn persist<T: Serialize>(store: &dyn RecordStore, table: &str, record: &T) {
    write_record(store, table, record, false).await
}

/// Like [`persist`], replacing any existing row with the same key.
pub async fn persist_replacing<T: Serialize>(store: &dyn RecordStore, table: &str, record: &T) {
    write_record(store, table, record, true).await
}

async fn write_record<T: Serialize>(store: &dyn RecordStore, table: &str, record: &T, replace: bool) {
    let row = match serde_json::to_value(record) {
        Ok(row) => row,
        Err(err) => {
            warn!(table, error = %err, "failed to encode record");
            return;
        }
    };
    let result = if replace {
        store.upsert(table, row).await
    } else {
        store.insert(table, row).await
    };
    if let Err(err) = result {
        warn!(table, error = %err, "failed to store record");
    }
}

/// PostgREST-backed store.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("janani-assistant/0.1")
            .build()
            .context("building database client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let (url, key) = settings.supabase()?;
        info!(%url, "using managed database");
        Self::new(url, key)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    async fn write(&self, table: &str, row: &serde_json::Value, prefer: &str) -> Result<()> {
        self.client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", prefer)
            .json(row)
            .send()
            .await
            .with_context(|| format!("write to {table}"))?
            .error_for_status()
            .with_context(|| format!("write to {table} rejected"))?;
        Ok(())
    }

    /// The caller's rows from `table`, newest first by `order_by`.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        user_id: &str,
        order_by: &str,
        limit: usize,
    ) -> Result<Vec<T>> {
        let uid_filter = format!("eq.{user_id}");
        let order = format!("{order_by}.desc");
        let limit = limit.to_string();
        self.client
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                ("select", columns),
                ("UID", uid_filter.as_str()),
                ("order", order.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("query {table}"))?
            .error_for_status()
            .with_context(|| format!("query {table} rejected"))?
            .json()
            .await
            .with_context(|| format!("decode {table} rows"))
    }
}

impl RecordStore for SupabaseStore {
    fn insert<'a>(&'a self, table: &'a str, row: serde_json::Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { self.write(table, &row, "return=minimal").await })
    }

    fn upsert<'a>(&'a self, table: &'a str, row: serde_json::Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.write(table, &row, "resolution=merge-duplicates,return=minimal")
                .await
        })
    }

    fn latest_vitals<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<Vitals>>> {
        Box::pin(async move {
            let rows: Vec<Vitals> = self
                .select(VITALS_TABLE, VITAL_COLUMNS, user_id, "created_at", 1)
                .await?;
            Ok(rows.into_iter().next())
        })
    }

    fn recent_symptom_categories<'a>(
        &'a self,
        user_id: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<Vec<String>>>> {
        Box::pin(async move {
            let rows: Vec<CategoriesRow> = self
                .select(SYMPTOMS_TABLE, "classified_categories", user_id, "recorded_at", limit)
                .await?;
            Ok(rows.into_iter().map(|row| row.classified_categories).collect())
        })
    }

    fn latest_chat<'a>(
        &'a self,
        user_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Vec<ChatMessage>>>> {
        Box::pin(async move {
            let rows: Vec<ChatRow> = self
                .select(CHATS_TABLE, "chat_history", user_id, "created_at", 1)
                .await?;
            Ok(rows.into_iter().next().map(|row| row.chat_history))
        })
    }
}
