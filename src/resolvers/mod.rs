use async_trait::async_trait;
use url::Url;

pub mod direct;
pub mod twitter;

pub use direct::DirectResolver;
pub use twitter::TwitterSpaceResolver;

use crate::Result;

/// A directly playable media address resolved from a source URL.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// URL ffmpeg can read from (HLS playlist or direct media file)
    pub playable_url: String,

    /// Title or description of the stream, when the platform exposes one
    pub title: Option<String>,

    /// Original URL that was resolved
    pub original_url: String,
}

/// Trait for resolving playable streams from different platforms
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Resolve a source URL to a directly playable media address
    async fn resolve(&self, url: &str) -> Result<StreamInfo>;

    /// Check if this resolver supports the given URL
    fn supports_url(&self, url: &str) -> bool;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}

/// Registry for managing multiple resolvers
pub struct ResolverRegistry {
    resolvers: Vec<Box<dyn StreamResolver>>,
}

impl ResolverRegistry {
    /// Create a new registry with default resolvers
    pub fn new(yt_dlp_path: &str) -> Self {
        let mut registry = Self {
            resolvers: Vec::new(),
        };

        registry.register(Box::new(TwitterSpaceResolver::new(yt_dlp_path)));
        registry.register(Box::new(DirectResolver::new()));

        registry
    }

    /// Register a new resolver
    pub fn register(&mut self, resolver: Box<dyn StreamResolver>) {
        self.resolvers.push(resolver);
    }

    /// Find a resolver that supports the given URL
    pub fn find_resolver(&self, url: &str) -> Option<&dyn StreamResolver> {
        self.resolvers
            .iter()
            .find(|resolver| resolver.supports_url(url))
            .map(|boxed| boxed.as_ref())
    }

    /// List all supported platforms
    pub fn list_platforms(&self) -> Vec<&'static str> {
        self.resolvers
            .iter()
            .map(|resolver| resolver.platform_name())
            .collect()
    }

    /// Resolve a source URL using the appropriate resolver
    pub async fn resolve(&self, url: &str) -> Result<StreamInfo> {
        validate_url(url)?;

        let resolver = self
            .find_resolver(url)
            .ok_or_else(|| anyhow::anyhow!("No resolver found for URL: {}", url))?;

        tracing::info!("Resolving via {}: {}", resolver.platform_name(), url);
        resolver.resolve(url).await
    }
}

/// Validate and normalize URLs
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_routes_space_urls_to_twitter() {
        let registry = ResolverRegistry::new("yt-dlp");
        let resolver = registry
            .find_resolver("https://x.com/i/spaces/1vOxwdPjqoRKB")
            .unwrap();
        assert_eq!(resolver.platform_name(), "Twitter/X Spaces");
    }

    #[test]
    fn test_registry_routes_media_urls_to_direct() {
        let registry = ResolverRegistry::new("yt-dlp");
        let resolver = registry
            .find_resolver("https://cdn.example.com/stream/playlist.m3u8")
            .unwrap();
        assert_eq!(resolver.platform_name(), "Direct URL");
    }

    #[test]
    fn test_registry_rejects_unsupported_urls() {
        let registry = ResolverRegistry::new("yt-dlp");
        assert!(registry.find_resolver("https://example.com/article").is_none());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not-a-url").is_err());
    }
}
