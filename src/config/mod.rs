use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::OutputFormat;

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Captioning tool settings
    pub tool: ToolConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Executable name or path of yt-dlp
    pub binary: String,

    /// Value passed to `--sub-langs`
    pub sub_langs: String,

    /// Kill the tool after this many seconds (`null` waits forever)
    pub timeout_secs: Option<u64>,

    /// Extra arguments inserted before the video URL
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root for per-request scratch directories (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,

    /// Default output format
    pub default_output_format: String,

    /// Listen address for `serve`
    pub bind: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            sub_langs: "en.*".to_string(),
            timeout_secs: Some(120),
            extra_args: Vec::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            default_output_format: "text".to_string(),
            bind: "127.0.0.1:8082".to_string(),
        }
    }
}

impl ToolConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from `path`, the usual locations, or fall back to defaults
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file does not exist: {}", path.display());
                }
                path.to_path_buf()
            }
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        let config = Self::from_yaml(&content)?;
        tracing::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration to `path` (or the user config location)
    pub async fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::user_config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Ok(local_config);
        }

        Self::user_config_path()
    }

    fn user_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("yt-transcript").join(CONFIG_FILE))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.tool.binary.trim().is_empty() {
            anyhow::bail!("tool.binary must not be empty");
        }

        if self.tool.sub_langs.trim().is_empty() {
            anyhow::bail!("tool.sub_langs must not be empty");
        }

        if self.tool.timeout_secs == Some(0) {
            anyhow::bail!("tool.timeout_secs must be positive (use null to disable the timeout)");
        }

        self.bind_addr()?;
        self.output_format()?;

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.app
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.app.bind))
    }

    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(&self.app.default_output_format, true)
            .map_err(|_| anyhow::anyhow!("Unknown output format: {}", self.app.default_output_format))
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Tool: {}", self.tool.binary);
        println!("  Subtitle Languages: {}", self.tool.sub_langs);
        match self.tool.timeout_secs {
            Some(secs) => println!("  Timeout: {}s", secs),
            None => println!("  Timeout: none"),
        }
        if !self.tool.extra_args.is_empty() {
            println!("  Extra Args: {}", self.tool.extra_args.join(" "));
        }
        if let Some(temp_dir) = &self.app.temp_dir {
            println!("  Scratch Root: {}", temp_dir.display());
        }
        println!("  Default Format: {}", self.app.default_output_format);
        println!("  Bind: {}", self.app.bind);
    }
}
