//! Filesystem-backed metadata store and catalog reader.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::types::{CatalogError, StoredVideo, VideoRecord};
use super::{is_safe_component, METADATA_FILENAME};
use crate::config::StorageConfig;

/// Writes the metadata file of a completed job, exactly once.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    output_root: PathBuf,
}

impl MetadataStore {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.output_root.clone())
    }

    /// Output directory of a job.
    pub fn video_dir(&self, video_id: &str) -> PathBuf {
        self.output_root.join(video_id)
    }

    /// Writes `video` into its output directory and returns the file path.
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// readers never observe a partial record.
    pub async fn write(&self, video: &StoredVideo) -> Result<PathBuf, CatalogError> {
        let dir = self.video_dir(&video.id);
        let path = dir.join(METADATA_FILENAME);
        if tokio::fs::try_exists(&path).await? {
            return Err(CatalogError::AlreadyExists { path });
        }

        let body = serde_json::to_vec_pretty(video)?;
        let tmp = dir.join(format!(".{}.tmp", METADATA_FILENAME));

        let written = async {
            tokio::fs::write(&tmp, &body).await?;
            tokio::fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(video_id = %video.id, path = %path.display(), "Wrote video metadata");
        Ok(path)
    }
}

/// Reads completed videos back from the output root.
#[derive(Debug, Clone)]
pub struct CatalogReader {
    output_root: PathBuf,
    playlist_filename: String,
}

impl CatalogReader {
    pub fn new(output_root: impl Into<PathBuf>, playlist_filename: impl Into<String>) -> Self {
        Self {
            output_root: output_root.into(),
            playlist_filename: playlist_filename.into(),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.output_root.clone(), storage.playlist_filename.clone())
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// All completed videos, most recent first.
    ///
    /// Videos sharing an `uploadedAt` have no defined relative order.
    /// Unreadable metadata files are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<VideoRecord>, CatalogError> {
        let mut entries = match tokio::fs::read_dir(&self.output_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(dir_name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };

            match self.read_record(&dir_name).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!(dir = %dir_name, error = %e, "Skipping unreadable video metadata"),
            }
        }

        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }

    /// A single completed video.
    pub async fn get(&self, video_id: &str) -> Result<VideoRecord, CatalogError> {
        if !is_safe_component(video_id) {
            return Err(CatalogError::NotFound(video_id.to_string()));
        }
        self.read_record(video_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(video_id.to_string()))
    }

    async fn read_record(&self, dir_name: &str) -> Result<Option<VideoRecord>, CatalogError> {
        let path = self.output_root.join(dir_name).join(METADATA_FILENAME);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredVideo = serde_json::from_slice(&bytes)
            .map_err(|source| CatalogError::Malformed { path, source })?;
        Ok(Some(VideoRecord::from_stored(
            stored,
            dir_name,
            &self.playlist_filename,
        )))
    }
}
