//! Mock media prober for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transcoder::{MediaProber, ProbeError, SourceCodecs};

/// Mock implementation of [`MediaProber`].
///
/// Defaults to a 10 second H.264/AAC source. `None` for either answer makes
/// that probe fail.
#[derive(Debug, Clone)]
pub struct MockProber {
    duration: Arc<RwLock<Option<f64>>>,
    codecs: Arc<RwLock<Option<SourceCodecs>>>,
    probed: Arc<RwLock<Vec<PathBuf>>>,
}

impl Default for MockProber {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProber {
    pub fn new() -> Self {
        Self {
            duration: Arc::new(RwLock::new(Some(10.0))),
            codecs: Arc::new(RwLock::new(Some(SourceCodecs {
                video: vec!["h264".to_string()],
                audio: vec!["aac".to_string()],
            }))),
            probed: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_duration(self, duration_secs: f64) -> Self {
        Self {
            duration: Arc::new(RwLock::new(Some(duration_secs))),
            ..self
        }
    }

    pub fn failing_duration(self) -> Self {
        Self {
            duration: Arc::new(RwLock::new(None)),
            ..self
        }
    }

    pub fn with_codecs(self, codecs: SourceCodecs) -> Self {
        Self {
            codecs: Arc::new(RwLock::new(Some(codecs))),
            ..self
        }
    }

    pub fn failing_codecs(self) -> Self {
        Self {
            codecs: Arc::new(RwLock::new(None)),
            ..self
        }
    }

    pub async fn set_duration(&self, duration_secs: Option<f64>) {
        *self.duration.write().await = duration_secs;
    }

    /// Paths passed to either probe, in call order.
    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.read().await.clone()
    }
}

fn mock_failure() -> ProbeError {
    ProbeError::Failed {
        stderr: "mock probe failure".to_string(),
    }
}

#[async_trait]
impl MediaProber for MockProber {
    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        self.probed.write().await.push(path.to_path_buf());
        (*self.duration.read().await).ok_or_else(mock_failure)
    }

    async fn probe_codecs(&self, path: &Path) -> Result<SourceCodecs, ProbeError> {
        self.probed.write().await.push(path.to_path_buf());
        self.codecs.read().await.clone().ok_or_else(mock_failure)
    }
}
