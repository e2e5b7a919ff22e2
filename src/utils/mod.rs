use url::Url;

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Sanitize a URL into a filename-safe prefix
fn sanitize_url_prefix(url: &str) -> String {
    let sanitized: String = url
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();

    sanitized.chars().take(50).collect()
}

/// Generate a unique output filename for a capture of the given URL
pub fn capture_filename_from_url(url: &str, extension: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let random_suffix = uuid::Uuid::new_v4().to_string()[..8].to_string();

    format!(
        "{}_{}_{}.{}",
        sanitize_url_prefix(url),
        timestamp,
        random_suffix,
        extension
    )
}

/// Extract domain from URL for display purposes
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(|host| {
        if let Some(stripped) = host.strip_prefix("www.") {
            stripped.to_string()
        } else {
            host.to_string()
        }
    })
}

/// Check if the current environment has required tools
pub async fn check_dependencies(ffmpeg_path: &str, yt_dlp_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path, "--version").await {
        missing.push(format!("{} - required for stream resolution", yt_dlp_path));
    }

    if !check_command_available(ffmpeg_path, "-version").await {
        missing.push(format!("{} - required for audio capture", ffmpeg_path));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str, version_flag: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(version_flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_sanitize_url_prefix() {
        let prefix = sanitize_url_prefix("https://x.com/i/spaces/1vOxwdPjqoRKB");
        assert_eq!(prefix, "https___x_com_i_spaces_1vOxwdPjqoRKB");
        assert!(prefix.chars().all(|c| c.is_alphanumeric() || c == '_'));
    }

    #[test]
    fn test_sanitize_url_prefix_truncates() {
        let long_url = format!("https://example.com/{}", "a".repeat(200));
        assert_eq!(sanitize_url_prefix(&long_url).chars().count(), 50);
    }

    #[test]
    fn test_capture_filename_shape() {
        let name = capture_filename_from_url("https://x.com/i/spaces/abc", "m4a");
        assert!(name.ends_with(".m4a"));
        assert!(name.starts_with("https___x_com_i_spaces_abc_"));
        // prefix + timestamp + random suffix + extension
        assert!(name.len() > "https___x_com_i_spaces_abc_".len() + 8 + 4);
    }

    #[test]
    fn test_capture_filenames_are_unique() {
        let a = capture_filename_from_url("https://x.com/i/spaces/abc", "m4a");
        let b = capture_filename_from_url("https://x.com/i/spaces/abc", "m4a");
        assert_ne!(a, b);
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://www.twitter.com/i/spaces/abc"),
            Some("twitter.com".to_string())
        );
        assert_eq!(
            extract_domain("https://x.com/i/spaces/abc"),
            Some("x.com".to_string())
        );
        assert_eq!(extract_domain("invalid-url"), None);
    }
}
