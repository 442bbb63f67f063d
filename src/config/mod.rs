use crate::utils::validation::AcceptedTypes;
use std::env;
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding uploaded files (default: "images", relative to the
    /// working directory until resolved at startup)
    pub storage_dir: PathBuf,

    /// Accept PDF documents alongside images (default: true)
    pub enable_pdf: bool,

    /// Maximum size of the uploaded file in bytes (default: 50 MB). The request
    /// body as a whole may exceed it by the multipart headroom in `create_app`.
    pub max_file_size: usize,

    /// Prefix for generated URLs, e.g. "https://cdn.example.com". When unset
    /// the scheme and host of the incoming request are used.
    pub public_base_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("images"),
            enable_pdf: true,
            max_file_size: 50 * 1024 * 1024, // 50 MB
            public_base_url: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            storage_dir: env::var("STORAGE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.storage_dir),

            enable_pdf: env::var("ENABLE_PDF")
                .map(|v| parse_flag(&v))
                .unwrap_or(default.enable_pdf),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            public_base_url: env::var("PUBLIC_BASE_URL")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
        }
    }

    /// Config for local development and tests, storing under `storage_dir`
    pub fn development(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            ..Self::default()
        }
    }

    /// Image-only variant of [`ServiceConfig::development`]
    pub fn images_only(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            enable_pdf: false,
            ..Self::development(storage_dir)
        }
    }

    pub fn accepted_types(&self) -> AcceptedTypes {
        AcceptedTypes::new(self.enable_pdf)
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value != "false" && value != "0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.storage_dir, PathBuf::from("images"));
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert!(config.enable_pdf);
        assert!(config.public_base_url.is_none());
    }

    #[test]
    fn test_development_config() {
        let config = ServiceConfig::development("/tmp/uploads");
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/uploads"));
        assert!(config.accepted_types().allows_pdf());
    }

    #[test]
    fn test_images_only_config() {
        let config = ServiceConfig::images_only("/tmp/uploads");
        assert!(!config.enable_pdf);
        assert!(!config.accepted_types().allows_pdf());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("FALSE"));
        assert!(!parse_flag(" 0 "));
    }
}
