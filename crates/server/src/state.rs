use std::sync::Arc;

use segmenta_core::{
    transcoder::EncoderCapabilities, CatalogReader, Config, ConversionPipeline, JobTracker,
};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: Arc<ConversionPipeline>,
    catalog: CatalogReader,
    capabilities: EncoderCapabilities,
}

impl AppState {
    pub fn new(
        config: Config,
        pipeline: Arc<ConversionPipeline>,
        capabilities: EncoderCapabilities,
    ) -> Self {
        let catalog = pipeline.catalog();
        Self {
            config,
            pipeline,
            catalog,
            capabilities,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &ConversionPipeline {
        &self.pipeline
    }

    pub fn catalog(&self) -> &CatalogReader {
        &self.catalog
    }

    pub fn tracker(&self) -> &JobTracker {
        self.pipeline.tracker()
    }

    pub fn capabilities(&self) -> &EncoderCapabilities {
        &self.capabilities
    }
}
