//! Shared application state handed to every request handler.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::engine::DocumentRenderer;
use crate::generators::GeneratorContext;
use crate::store::{SequenceStore, UsageMetrics};

#[derive(Clone)]
pub struct AppState {
    pub generators: Arc<GeneratorContext>,
    pub metrics: Arc<UsageMetrics>,
}

impl AppState {
    /// Build the state and make sure the output directory exists.
    pub fn from_config(config: &AppConfig) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.output_dir)?;

        let generators = GeneratorContext {
            renderer: DocumentRenderer::new(config.render.clone()),
            templates: config.templates.clone(),
            sequences: SequenceStore::new(&config.counters_file),
            output_dir: config.output_dir.clone(),
            caption_limit: config.caption_limit,
            utc_offset: config.utc_offset,
        };

        Ok(Self {
            generators: Arc::new(generators),
            metrics: Arc::new(UsageMetrics::new(&config.metrics_file)),
        })
    }

    /// Today's date at the configured UTC offset.
    pub fn today(&self) -> NaiveDate {
        self.generators.now().date_naive()
    }
}
