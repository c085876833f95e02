use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload body in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> u64 {
    4 * 1024 * 1024 * 1024
}

/// Where raw uploads are staged and HLS output is written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// One subdirectory per job, holding playlist, segments and metadata.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    /// Raw uploads live here only while their job runs.
    #[serde(default = "default_staging_root")]
    pub staging_root: PathBuf,
    /// Playlist filename inside every output directory.
    #[serde(default = "default_playlist_filename")]
    pub playlist_filename: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            staging_root: default_staging_root(),
            playlist_filename: default_playlist_filename(),
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("upload/videos")
}

fn default_staging_root() -> PathBuf {
    PathBuf::from("upload/raw")
}

fn default_playlist_filename() -> String {
    "index.m3u8".to_string()
}

impl StorageConfig {
    /// Creates a storage config rooted at `base` (`base/videos`, `base/raw`).
    pub fn under(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            output_root: base.join("videos"),
            staging_root: base.join("raw"),
            playlist_filename: default_playlist_filename(),
        }
    }

    /// Creates the output and staging roots if they don't exist yet.
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.output_root).await?;
        tokio::fs::create_dir_all(&self.staging_root).await?;
        Ok(())
    }
}
