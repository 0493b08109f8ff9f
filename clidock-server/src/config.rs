//! Server configuration
//!
//! Loads server settings from environment variables with sensible defaults.

use clidock_schema::compiler::DEFAULT_DATA_DIR;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// Local images ingested at startup
    pub load_images: Vec<String>,

    /// Container directory outputs are written under
    pub data_dir: String,
}

impl ServerConfig {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - CLIDOCK_BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - CLIDOCK_LOAD_IMAGES (optional, comma-separated image names)
    /// - CLIDOCK_DATA_DIR (optional, default: /mnt/clidock/data)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            bind_addr: std::env::var("CLIDOCK_BIND_ADDR").unwrap_or(defaults.bind_addr),
            load_images: std::env::var("CLIDOCK_LOAD_IMAGES")
                .map(|list| parse_image_list(&list))
                .unwrap_or(defaults.load_images),
            data_dir: std::env::var("CLIDOCK_DATA_DIR").unwrap_or(defaults.data_dir),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if !self.data_dir.starts_with('/') {
            anyhow::bail!("data_dir must be an absolute container path");
        }

        if let Some(image) = self.load_images.iter().find(|i| i.contains(char::is_whitespace)) {
            anyhow::bail!("invalid image name in load list: '{}'", image);
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            load_images: Vec::new(),
            data_dir: DEFAULT_DATA_DIR.to_string(),
        }
    }
}

/// Splits a comma-separated image list, dropping blanks
fn parse_image_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|image| !image.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.load_images.is_empty());
        assert_eq!(config.data_dir, "/mnt/clidock/data");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServerConfig::default();
        assert!(config.validate().is_ok());

        config.data_dir = "relative/data".to_string();
        assert!(config.validate().is_err());

        config = ServerConfig::default();
        config.bind_addr = " ".to_string();
        assert!(config.validate().is_err());

        config = ServerConfig::default();
        config.load_images = vec!["bad image:1".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_image_list() {
        assert_eq!(
            parse_image_list(" toolimg:1, ,other/img:2 ,"),
            vec!["toolimg:1", "other/img:2"]
        );
        assert!(parse_image_list("").is_empty());
    }
}
