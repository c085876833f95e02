pub mod config;
pub mod identifier;
pub mod library;
pub mod metrics;
pub mod pipeline;
pub mod testing;
pub mod transcoder;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, ServerConfig, StorageConfig,
};
pub use identifier::{JobId, JobIdGenerator};
pub use library::{CatalogError, CatalogReader, MetadataStore, StoredVideo, VideoRecord};
pub use pipeline::{
    ActiveJob, ConversionPipeline, JobTracker, PipelineError, PipelineStage, ProgressCallback,
    Upload,
};
pub use transcoder::{
    select_default_strategy, select_strategy, EncoderCapabilities, FfprobeProber, MediaProber,
    TranscodeError, TranscoderConfig, TranscoderMode, TranscoderStrategy,
};
