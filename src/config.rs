//! Runtime configuration utilities for janani-assistant.

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root folder holding serialized model bundles.
    pub model_dir: PathBuf,
    /// Root folder for training datasets.
    pub data_dir: PathBuf,
    /// Managed database base URL, e.g. `https://xyz.supabase.co`.
    pub supabase_url: Option<String>,
    /// API key sent with every database and auth request.
    pub supabase_key: Option<String>,
    /// Pins the classifier's fallback sampling when set.
    pub classifier_seed: Option<u64>,
    /// OpenAI-compatible chat-completions endpoint.
    pub chat_api_url: String,
    pub chat_api_key: Option<String>,
    pub chat_model: String,
    /// Bind address used by `serve` unless overridden on the command line.
    pub host: String,
    pub port: u16,
}

pub const DEFAULT_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let model_dir = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./models"));
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let supabase_url = env::var("SUPABASE_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let supabase_key = env::var("SUPABASE_KEY").ok().filter(|key| !key.is_empty());
        let classifier_seed = match env::var("CLASSIFIER_SEED") {
            Ok(raw) => Some(raw.parse().context("CLASSIFIER_SEED must be an unsigned integer")?),
            Err(_) => None,
        };
        let chat_api_url = env::var("CHAT_API_URL").unwrap_or_else(|_| DEFAULT_CHAT_URL.to_string());
        let chat_api_key = env::var("GROQ_API_KEY").ok().filter(|key| !key.is_empty());
        let chat_model = env::var("CHAT_MODEL")
            .or_else(|_| env::var("OLLAMA_MODEL_ID"))
            .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        Ok(Self {
            model_dir,
            data_dir,
            supabase_url,
            supabase_key,
            classifier_seed,
            chat_api_url,
            chat_api_key,
            chat_model,
            host,
            port,
        })
    }

    /// Settings rooted at explicit directories, with no remote services.
    pub fn for_dirs(data_dir: &Path, model_dir: &Path) -> Self {
        Self {
            model_dir: model_dir.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
            supabase_url: None,
            supabase_key: None,
            classifier_seed: None,
            chat_api_url: DEFAULT_CHAT_URL.to_string(),
            chat_api_key: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }

    /// Directory holding the classifier, risk and remedy bundles.
    pub fn ayurvedic_model_dir(&self) -> PathBuf {
        self.model_dir.join(crate::nlp::artifacts::AYURVEDIC_DIR)
    }

    /// Convenience helper for derived dataset paths.
    pub fn join_data<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.data_dir.join(path)
    }

    /// Database URL and key, required by anything that talks to the provider.
    pub fn supabase(&self) -> anyhow::Result<(&str, &str)> {
        let url = self
            .supabase_url
            .as_deref()
            .context("SUPABASE_URL is not set")?;
        let key = self
            .supabase_key
            .as_deref()
            .context("SUPABASE_KEY is not set")?;
        Ok((url, key))
    }
}
