use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::capture::CaptureSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// External engine executables
    pub engines: EngineConfig,

    /// Capture behavior
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the ffmpeg executable
    pub ffmpeg_path: String,

    /// Path to the yt-dlp executable
    pub yt_dlp_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Staging directory for in-progress captures (platform download dir if unset)
    pub capture_dir: Option<PathBuf>,

    /// Seconds between elapsed-progress notifications
    pub progress_cooldown_secs: u64,

    /// Audio bitrate for the re-encode fallback
    pub fallback_bitrate: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engines: EngineConfig {
                ffmpeg_path: "ffmpeg".to_string(),
                yt_dlp_path: "yt-dlp".to_string(),
            },
            capture: CaptureConfig {
                capture_dir: None,
                progress_cooldown_secs: 30,
                fallback_bitrate: "128k".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("universal-capturer").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.engines.ffmpeg_path.is_empty() {
            anyhow::bail!("ffmpeg path must not be empty");
        }
        if self.engines.yt_dlp_path.is_empty() {
            anyhow::bail!("yt-dlp path must not be empty");
        }
        if self.capture.progress_cooldown_secs == 0 {
            anyhow::bail!("progress cooldown must be at least one second");
        }

        Ok(())
    }

    /// Staging directory for capture output, created on demand
    pub fn capture_dir(&self) -> Result<PathBuf> {
        let dir = match &self.capture.capture_dir {
            Some(dir) => dir.clone(),
            None => dirs::download_dir()
                .context("Could not determine download directory")?
                .join("captures"),
        };

        fs_err::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Capture-core settings derived from this configuration
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            ffmpeg_path: self.engines.ffmpeg_path.clone(),
            progress_cooldown: Duration::from_secs(self.capture.progress_cooldown_secs),
            fallback_bitrate: self.capture.fallback_bitrate.clone(),
        }
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  ffmpeg: {}", self.engines.ffmpeg_path);
        println!("  yt-dlp: {}", self.engines.yt_dlp_path);
        match &self.capture.capture_dir {
            Some(dir) => println!("  Capture Dir: {}", dir.display()),
            None => println!("  Capture Dir: (platform download directory)"),
        }
        println!("  Progress Cooldown: {}s", self.capture.progress_cooldown_secs);
        println!("  Fallback Bitrate: {}", self.capture.fallback_bitrate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capture.progress_cooldown_secs, 30);
        assert_eq!(config.capture.fallback_bitrate, "128k");
    }

    #[test]
    fn test_config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed.engines.ffmpeg_path, "ffmpeg");
        assert_eq!(parsed.capture.progress_cooldown_secs, 30);
    }

    #[test]
    fn test_zero_cooldown_rejected() {
        let mut config = Config::default();
        config.capture.progress_cooldown_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capture_settings_mirror_config() {
        let mut config = Config::default();
        config.capture.progress_cooldown_secs = 5;
        let settings = config.capture_settings();
        assert_eq!(settings.progress_cooldown, Duration::from_secs(5));
        assert_eq!(settings.ffmpeg_path, "ffmpeg");
    }
}
