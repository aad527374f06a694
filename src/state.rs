//! Application state shared by every connection.
//!
//! This module owns:
//!   - the optional OpenAI client (the content source)
//!   - the process-wide score board and its persistence port
//!
//! Per-connection practice state lives in the WebSocket handler, not here.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use crate::config::{load_agent_config_from_env, resolve_score_dir};
use crate::openai::OpenAI;
use crate::scoring::{FileStore, KeyValueStore, MemoryStore, ScoreBoard};

pub struct AppState {
    pub content: Option<OpenAI>,
    pub score: Arc<Mutex<ScoreBoard>>,
}

impl AppState {
    /// Build state from env: load config, open the score store, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_agent_config_from_env().unwrap_or_default();

        let score_dir = resolve_score_dir(&cfg);
        let store: Box<dyn KeyValueStore> = match FileStore::new(score_dir.clone()) {
            Ok(fs) => {
                info!(target: "subjuntivo_backend", dir = %score_dir.display(), "Score store ready");
                Box::new(fs)
            }
            Err(e) => {
                error!(target: "subjuntivo_backend", dir = %score_dir.display(), error = %e, "Score store unavailable; score will not survive a restart");
                Box::new(MemoryStore::default())
            }
        };

        let content = OpenAI::from_env(cfg.prompts);
        if let Some(oa) = &content {
            info!(target: "subjuntivo_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
        } else {
            error!(target: "subjuntivo_backend", "OpenAI disabled (no OPENAI_API_KEY). Every round will fail to load.");
        }

        Self::with_parts(content, store)
    }

    pub fn with_parts(content: Option<OpenAI>, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            content,
            score: Arc::new(Mutex::new(ScoreBoard::open(store))),
        }
    }
}
