//! Startup-time strategy selection.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::accelerated::AcceleratedTranscoder;
use super::capabilities::{AcceleratorInfo, EncoderCapabilities};
use super::config::{TranscoderConfig, TranscoderMode};
use super::probe::FfprobeProber;
use super::software::SoftwareTranscoder;
use super::traits::{MediaProber, TranscoderStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Software,
    Accelerated,
}

/// Decides the strategy from the configured mode and detected encoders.
pub fn choose_strategy(mode: TranscoderMode, capabilities: &EncoderCapabilities) -> StrategyKind {
    match mode {
        TranscoderMode::Software => StrategyKind::Software,
        TranscoderMode::Accelerated => StrategyKind::Accelerated,
        TranscoderMode::Auto if capabilities.has_nvenc() => StrategyKind::Accelerated,
        TranscoderMode::Auto => StrategyKind::Software,
    }
}

/// Builds the strategy for this host. Called once at startup.
pub async fn select_strategy(
    config: &TranscoderConfig,
    capabilities: &EncoderCapabilities,
    prober: Arc<dyn MediaProber>,
) -> Arc<dyn TranscoderStrategy> {
    match choose_strategy(config.mode, capabilities) {
        StrategyKind::Software => {
            info!(mode = ?config.mode, "Using software transcoder");
            Arc::new(SoftwareTranscoder::new(config.clone()))
        }
        StrategyKind::Accelerated => {
            if !capabilities.has_nvenc() {
                warn!("Accelerated mode forced but no NVENC encoder was detected");
            }
            let accelerator = AcceleratorInfo::query(config).await;
            info!(
                mode = ?config.mode,
                accelerator = accelerator.as_ref().map(|a| a.description.as_str()),
                "Using accelerated transcoder"
            );
            Arc::new(AcceleratedTranscoder::new(config.clone(), prober, accelerator))
        }
    }
}

/// Same as [`select_strategy`] with an ffprobe-backed prober.
pub async fn select_default_strategy(
    config: &TranscoderConfig,
    capabilities: &EncoderCapabilities,
) -> Arc<dyn TranscoderStrategy> {
    let prober = Arc::new(FfprobeProber::from_config(config));
    select_strategy(config, capabilities, prober).await
}
