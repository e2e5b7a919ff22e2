use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{StreamInfo, StreamResolver};
use crate::Result;

/// Resolver for URLs that are already playable media addresses
pub struct DirectResolver {
    client: Client,
}

impl DirectResolver {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Check if URL points to a playable stream or audio file
    fn is_media_url(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();

        let media_extensions = [
            ".m3u8", ".mp3", ".m4a", ".aac", ".wav", ".flac", ".ogg", ".opus", ".webm", ".ts",
        ];

        media_extensions.iter().any(|ext| url_lower.contains(ext))
    }

    /// Confirm the address answers before handing it to the engine
    async fn probe(&self, url: &str) -> Result<Option<String>> {
        let response = self.client.head(url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to access URL: HTTP {}", response.status());
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|ct| ct.to_str().ok())
            .map(|s| s.to_string());

        Ok(content_type)
    }
}

#[async_trait]
impl StreamResolver for DirectResolver {
    async fn resolve(&self, url: &str) -> Result<StreamInfo> {
        let parsed_url = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", url))?;

        let content_type = self.probe(url).await?;
        tracing::debug!("Direct URL content type: {:?}", content_type);

        // Use the filename as a best-effort title
        let title = parsed_url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|filename| !filename.is_empty())
            .map(|filename| {
                let name = match filename.rfind('.') {
                    Some(dot_pos) => &filename[..dot_pos],
                    None => filename,
                };
                urlencoding::decode(name)
                    .unwrap_or_else(|_| name.into())
                    .replace(['_', '-'], " ")
            });

        Ok(StreamInfo {
            playable_url: url.to_string(),
            title,
            original_url: url.to_string(),
        })
    }

    fn supports_url(&self, url: &str) -> bool {
        if Url::parse(url).is_err() {
            return false;
        }

        self.is_media_url(url)
    }

    fn platform_name(&self) -> &'static str {
        "Direct URL"
    }
}

impl Default for DirectResolver {
    fn default() -> Self {
        Self::new()
    }
}
