use super::{types::Config, ConfigError};
use crate::library::is_safe_component;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Playlist filename is a bare, non-hidden `.m3u8` filename that the
///   stream route will serve
/// - Segment duration and height cap are positive
/// - Output and staging roots differ
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let playlist = &config.storage.playlist_filename;
    if !is_safe_component(playlist) || !playlist.ends_with(".m3u8") {
        return Err(ConfigError::ValidationError(format!(
            "storage.playlist_filename must be a bare .m3u8 filename, got {:?}",
            playlist
        )));
    }

    if config.storage.output_root == config.storage.staging_root {
        return Err(ConfigError::ValidationError(
            "storage.output_root and storage.staging_root must differ".to_string(),
        ));
    }

    if config.transcoder.segment_duration_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.segment_duration_secs must be positive".to_string(),
        ));
    }

    if config.transcoder.max_height == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.max_height must be positive".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;
    use std::path::PathBuf;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_playlist_filename() {
        for bad in [
            "",
            "index.ts",
            "../index.m3u8",
            "a/index.m3u8",
            "/index.m3u8",
            "a\\index.m3u8",
        ] {
            let mut config = Config::default();
            config.storage.playlist_filename = bad.to_string();
            assert!(validate_config(&config).is_err(), "accepted {:?}", bad);
        }

        let mut config = Config::default();
        config.storage.playlist_filename = "master.m3u8".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_hidden_playlist_filename_fails() {
        // The stream route never serves dot-files, so these would always 404
        for hidden in [".m3u8", ".index.m3u8"] {
            let mut config = Config::default();
            config.storage.playlist_filename = hidden.to_string();
            let result = validate_config(&config);
            assert!(
                matches!(result, Err(ConfigError::ValidationError(_))),
                "accepted {:?}",
                hidden
            );
        }
    }

    #[test]
    fn test_valid_playlist_filename_is_servable() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert!(is_safe_component(&config.storage.playlist_filename));
    }

    #[test]
    fn test_validate_same_roots_fails() {
        let mut config = Config::default();
        config.storage.staging_root = PathBuf::from("shared");
        config.storage.output_root = PathBuf::from("shared");
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_segment_duration_fails() {
        let mut config = Config::default();
        config.transcoder.segment_duration_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
