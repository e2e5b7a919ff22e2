use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

use super::{StreamInfo, StreamResolver};
use crate::Result;

/// Twitter/X Spaces resolver using yt-dlp
pub struct TwitterSpaceResolver {
    yt_dlp_path: String,
}

impl TwitterSpaceResolver {
    pub fn new(yt_dlp_path: &str) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.to_string(),
        }
    }

    /// yt-dlp handles twitter.com Spaces more reliably than the x.com alias
    fn normalize(url: &str) -> String {
        url.replace("x.com", "twitter.com")
    }

    /// Get Space metadata using yt-dlp
    async fn get_space_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Extracting Space info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed to extract Space metadata: {}", error);
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(&json_str)?;

        Ok(info)
    }

    /// Extract the best playable audio URL
    async fn get_stream_url(&self, url: &str) -> Result<String> {
        tracing::debug!("Getting stream URL for Space: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["-g", "-f", "bestaudio", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to get stream URL from Space: {}", error);
        }

        // yt-dlp may print warnings ahead of the address; take the first URL line
        let stdout = String::from_utf8(output.stdout)?;
        stdout
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("http"))
            .map(|line| line.to_string())
            .ok_or_else(|| anyhow::anyhow!("yt-dlp returned no playable URL for {}", url))
    }
}

#[async_trait]
impl StreamResolver for TwitterSpaceResolver {
    async fn resolve(&self, url: &str) -> Result<StreamInfo> {
        let normalized = Self::normalize(url);

        // Metadata is best effort; a Space without a fetchable title is still playable
        let title = match self.get_space_info(&normalized).await {
            Ok(info) => info["title"]
                .as_str()
                .or_else(|| info["description"].as_str())
                .map(|s| {
                    let cleaned = s.replace('\n', " ").trim().to_string();
                    if cleaned.len() > 100 {
                        format!("{}...", &cleaned[..97])
                    } else {
                        cleaned
                    }
                }),
            Err(err) => {
                tracing::debug!("Space metadata unavailable: {}", err);
                None
            }
        };

        let playable_url = self.get_stream_url(&normalized).await?;

        Ok(StreamInfo {
            playable_url,
            title,
            original_url: url.to_string(),
        })
    }

    fn supports_url(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();

        url_lower.contains("twitter.com/i/spaces") || url_lower.contains("x.com/i/spaces")
    }

    fn platform_name(&self) -> &'static str {
        "Twitter/X Spaces"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_space_urls_only() {
        let resolver = TwitterSpaceResolver::new("yt-dlp");
        assert!(resolver.supports_url("https://twitter.com/i/spaces/1vOxwdPjqoRKB"));
        assert!(resolver.supports_url("https://x.com/i/spaces/1vOxwdPjqoRKB"));
        assert!(!resolver.supports_url("https://twitter.com/user/status/123"));
        assert!(!resolver.supports_url("https://example.com/i/spaces/123"));
    }

    #[test]
    fn test_normalize_rewrites_x_domain() {
        assert_eq!(
            TwitterSpaceResolver::normalize("https://x.com/i/spaces/abc"),
            "https://twitter.com/i/spaces/abc"
        );
        assert_eq!(
            TwitterSpaceResolver::normalize("https://twitter.com/i/spaces/abc"),
            "https://twitter.com/i/spaces/abc"
        );
    }
}
