// Grader configuration
// Loaded from config/grader.json, then overridden from the environment
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/grader.json";

pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 64 * 1024;
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MEMORY_LIMIT_MB: u32 = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraderConfig {
    /// Node.js executable used to run submissions
    pub node_binary: String,
    /// Per-test budget when the caller does not supply one
    pub default_timeout_ms: u64,
    pub max_source_bytes: usize,
    pub max_input_bytes: usize,
    /// Heap limit handed to the runtime (`--max-old-space-size`)
    pub memory_limit_mb: u32,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            node_binary: "node".to_string(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            memory_limit_mb: DEFAULT_MEMORY_LIMIT_MB,
        }
    }
}

impl GraderConfig {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Grader config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: GraderConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load config/grader.json if present, otherwise defaults; then apply
    /// environment overrides.
    pub fn load_default() -> Result<Self> {
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        let config = if default_path.exists() {
            Self::load(default_path)?
        } else {
            Self::default()
        };
        config.with_env_overrides()
    }

    /// Apply `GRADER_NODE_BINARY`, `GRADER_TIMEOUT_MS` and
    /// `GRADER_MEMORY_LIMIT_MB` from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(binary) = lookup("GRADER_NODE_BINARY") {
            self.node_binary = binary;
        }
        if let Some(raw) = lookup("GRADER_TIMEOUT_MS") {
            self.default_timeout_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid GRADER_TIMEOUT_MS: {:?}", raw))?;
        }
        if let Some(raw) = lookup("GRADER_MEMORY_LIMIT_MB") {
            self.memory_limit_mb = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid GRADER_MEMORY_LIMIT_MB: {:?}", raw))?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_binary.trim().is_empty() {
            bail!("node_binary cannot be empty");
        }
        if self.default_timeout_ms == 0 {
            bail!("default_timeout_ms must be greater than zero");
        }
        if self.max_source_bytes == 0 || self.max_input_bytes == 0 {
            bail!("size limits must be greater than zero");
        }
        if self.memory_limit_mb == 0 {
            bail!("memory_limit_mb must be greater than zero");
        }
        Ok(())
    }

    /// Write the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize grader config")?;

        fs::write(config_path, content)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        Ok(())
    }
}
