//! Shared application state.

use crate::config::Config;
use crate::telegram::TelegramTransport;
use artrash_core::{ArchiveBuilder, DialogueEngine, HttpClassifier, SqlitePredictionStore};
use std::sync::Arc;

/// Everything a running bot needs, wired once at startup.
pub struct AppState {
    pub transport: Arc<TelegramTransport>,
    pub engine: DialogueEngine<TelegramTransport, HttpClassifier, SqlitePredictionStore>,
    pub exporter: ArchiveBuilder<TelegramTransport, SqlitePredictionStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> artrash_core::Result<Self> {
        let transport = Arc::new(TelegramTransport::new(
            config.bot_token.clone(),
            config.api_base.clone(),
        ));
        let classifier = Arc::new(HttpClassifier::new(config.predictor_url.clone()));
        let store = Arc::new(SqlitePredictionStore::open(&config.db_path)?);

        let engine = DialogueEngine::new(
            Arc::clone(&transport),
            classifier,
            Arc::clone(&store),
        );
        let exporter = ArchiveBuilder::new(
            Arc::clone(&transport),
            store,
            config.max_export_downloads,
        );

        Ok(Self {
            transport,
            engine,
            exporter,
            config,
        })
    }
}
