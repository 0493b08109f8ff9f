//! Runner configuration
//!
//! Which container engine to drive and which flags the CLI images answer to.

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Container engine binary (`podman` or `docker`)
    pub engine: String,

    /// Flag that makes an image print its CLI list as JSON
    pub list_flag: String,

    /// Flag that makes a CLI print its XML schema
    pub xml_flag: String,
}

impl RunnerConfig {
    /// Creates a configuration for the given engine with default flags
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            list_flag: "--list_cli".to_string(),
            xml_flag: "--xml".to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - CLIDOCK_ENGINE (optional, default: podman)
    /// - CLIDOCK_LIST_FLAG (optional, default: --list_cli)
    /// - CLIDOCK_XML_FLAG (optional, default: --xml)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            engine: std::env::var("CLIDOCK_ENGINE").unwrap_or(defaults.engine),
            list_flag: std::env::var("CLIDOCK_LIST_FLAG").unwrap_or(defaults.list_flag),
            xml_flag: std::env::var("CLIDOCK_XML_FLAG").unwrap_or(defaults.xml_flag),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine.trim().is_empty() {
            anyhow::bail!("engine cannot be empty");
        }

        if !self.list_flag.starts_with('-') {
            anyhow::bail!("list_flag must start with '-'");
        }

        if !self.xml_flag.starts_with('-') {
            anyhow::bail!("xml_flag must start with '-'");
        }

        if self.list_flag == self.xml_flag {
            anyhow::bail!("list_flag and xml_flag must differ");
        }

        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new("podman")
    }
}
