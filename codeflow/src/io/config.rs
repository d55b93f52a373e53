//! Client configuration stored under `.codeflow/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::Stage;

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".codeflow/config.toml";

/// Client configuration (TOML).
///
/// Intended to be edited by humans. Missing fields default to values that
/// match a review service running locally on port 5000.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CodeflowConfig {
    /// Language tag selected when a session starts.
    pub default_language: String,

    /// What to do with a response that arrives after a newer one was applied.
    pub stale_responses: StalePolicy,

    pub service: ServiceConfig,
}

/// Handling of out-of-order responses for the same stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Reconcile every response in arrival order; the last to arrive wins.
    #[default]
    Apply,
    /// Drop a response when a newer request of the same stage has already
    /// been applied, or when the session was cleared after it was issued.
    Discard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Scheme, host and port of the review service, without a trailing path.
    pub base_url: String,

    /// Total per-request budget in seconds.
    pub request_timeout_secs: u64,

    pub connect_timeout_secs: u64,

    pub paths: EndpointPaths,
}

/// Endpoint paths relative to `base_url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointPaths {
    pub analyze: String,
    pub fix: String,
    pub generate_tests: String,
    pub verify: String,
}

impl EndpointPaths {
    pub fn for_stage(&self, stage: Stage) -> &str {
        match stage {
            Stage::Analyze => &self.analyze,
            Stage::Fix => &self.fix,
            Stage::Test => &self.generate_tests,
            Stage::Verify => &self.verify,
        }
    }
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            analyze: "/api/analyze".to_string(),
            fix: "/api/fix".to_string(),
            generate_tests: "/api/generate-tests".to_string(),
            verify: "/api/verify".to_string(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 5 * 60,
            connect_timeout_secs: 30,
            paths: EndpointPaths::default(),
        }
    }
}

impl Default for CodeflowConfig {
    fn default() -> Self {
        Self {
            default_language: "python".to_string(),
            stale_responses: StalePolicy::default(),
            service: ServiceConfig::default(),
        }
    }
}

impl CodeflowConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_language.trim().is_empty() {
            return Err(anyhow!("default_language must be non-empty"));
        }
        if self.service.base_url.trim().is_empty() {
            return Err(anyhow!("service.base_url must be non-empty"));
        }
        if self.service.request_timeout_secs == 0 {
            return Err(anyhow!("service.request_timeout_secs must be > 0"));
        }
        if self.service.connect_timeout_secs == 0 {
            return Err(anyhow!("service.connect_timeout_secs must be > 0"));
        }
        for stage in Stage::ALL {
            let path = self.service.paths.for_stage(stage);
            if !path.starts_with('/') {
                return Err(anyhow!(
                    "service.paths for {stage} must start with '/' (got '{path}')"
                ));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CodeflowConfig::default()`.
pub fn load_config(path: &Path) -> Result<CodeflowConfig> {
    if !path.exists() {
        let cfg = CodeflowConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CodeflowConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &CodeflowConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
