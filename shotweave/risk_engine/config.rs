use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use shared_event_bus::FileEventPublisher;

use crate::{
    breakdown::padding::{NoPadding, PaddingSource, RandomPadding},
    model::{ridge::DEFAULT_ALPHA, store::default_model_path},
    telemetry::RiskTelemetry,
};

/// Which entity recogniser the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// Rule-based screenplay recogniser.
    #[default]
    Screenplay,
    /// No recogniser; every breakdown is degraded.
    Disabled,
}

/// Count padding settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaddingConfig {
    /// Whether to pad counts at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fixed seed for reproducible padding.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: None,
        }
    }
}

impl PaddingConfig {
    /// Builds the padding source these settings describe.
    #[must_use]
    pub fn source(&self) -> Arc<dyn PaddingSource> {
        match (self.enabled, self.seed) {
            (false, _) => Arc::new(NoPadding),
            (true, Some(seed)) => Arc::new(RandomPadding::seeded(seed)),
            (true, None) => Arc::new(RandomPadding::new()),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Persisted model artifact.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// JSON-lines log file; no logging when absent.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// JSON-lines event file; no events when absent.
    #[serde(default)]
    pub event_log: Option<PathBuf>,
    /// Ridge penalty used when training.
    #[serde(default = "default_alpha")]
    pub ridge_alpha: f64,
    /// Entity recogniser.
    #[serde(default)]
    pub classifier: ClassifierKind,
    /// Count padding.
    #[serde(default)]
    pub padding: PaddingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            log_path: None,
            event_log: None,
            ridge_alpha: DEFAULT_ALPHA,
            classifier: ClassifierKind::default(),
            padding: PaddingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file. Relative paths resolve against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        let mut config = Self::from_toml(&raw).with_context(|| format!("parsing {}", path.display()))?;
        let base = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        config.model_path = resolve(&base, &config.model_path);
        config.log_path = config.log_path.map(|log| resolve(&base, &log));
        config.event_log = config.event_log.map(|events| resolve(&base, &events));
        Ok(config)
    }

    /// Parses and validates TOML text without resolving paths.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), |path| Self::load(path))
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.ridge_alpha.is_finite() || self.ridge_alpha <= 0.0 {
            bail!("ridge_alpha must be a positive finite number, got {}", self.ridge_alpha);
        }
        if self.model_path.as_os_str().is_empty() {
            bail!("model_path must not be empty");
        }
        Ok(())
    }

    /// Telemetry wired to the configured log and event files.
    pub fn telemetry(&self) -> Result<RiskTelemetry> {
        let mut builder = RiskTelemetry::builder("risk");
        if let Some(path) = &self.log_path {
            builder = builder.log_path(path);
        }
        if let Some(path) = &self.event_log {
            builder = builder.event_publisher(Arc::new(FileEventPublisher::new(path)?));
        }
        builder.build()
    }
}

fn resolve(base: &Path, candidate: &Path) -> PathBuf {
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

const fn default_true() -> bool {
    true
}

const fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.model_path.ends_with("ai_models/budget_risk_model.json"));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        fs::write(
            &path,
            r#"
model_path = "models/risk.json"
log_path = "/var/log/risk.jsonl"
ridge_alpha = 0.5
classifier = "disabled"

[padding]
enabled = true
seed = 42
"#,
        )
        .unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.model_path, dir.path().join("models/risk.json"));
        assert_eq!(config.log_path, Some(PathBuf::from("/var/log/risk.jsonl")));
        assert_eq!(config.ridge_alpha, 0.5);
        assert_eq!(config.classifier, ClassifierKind::Disabled);
        assert_eq!(config.padding.seed, Some(42));
    }

    #[test]
    fn rejects_non_positive_alpha() {
        assert!(EngineConfig::from_toml("ridge_alpha = 0.0").is_err());
        assert!(EngineConfig::from_toml("ridge_alpha = -2.0").is_err());
        assert!(EngineConfig::from_toml("classifier = \"spacy\"").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(EngineConfig::load(dir.path().join("absent.toml")).is_err());
        assert!(EngineConfig::load_or_default(None).is_ok());
    }
}
