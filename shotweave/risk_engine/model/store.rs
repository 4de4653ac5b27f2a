use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use super::{
    dataset::TrainingSet,
    features::{FEATURE_COUNT, FEATURE_ORDER},
    ridge::{FittedModel, DEFAULT_ALPHA},
    train, TrainedModel,
};
use crate::{error::ModelError, telemetry::RiskTelemetry};

const ARTIFACT_VERSION: u32 = 1;

/// Location of the persisted model when no configuration overrides it.
#[must_use]
pub fn default_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("ai_models/budget_risk_model.json")
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelArtifact {
    version: u32,
    feature_order: Vec<String>,
    alpha: f64,
    coefficients: Vec<f64>,
    intercept: f64,
    trained_at: DateTime<Utc>,
}

/// Whether a model is available for scoring.
#[derive(Debug, Clone)]
pub enum ModelState {
    /// Loaded or freshly trained; shared read-only.
    Ready(Arc<FittedModel>),
    /// Loading and training both failed; scoring uses the fixed fallback.
    Unavailable(String),
}

impl ModelState {
    /// The model, when ready.
    #[must_use]
    pub fn model(&self) -> Option<&FittedModel> {
        match self {
            Self::Ready(model) => Some(model.as_ref()),
            Self::Unavailable(_) => None,
        }
    }

    /// True when a model is ready.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Reads and writes the fitted model artifact.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
    alpha: f64,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(default_model_path(), DEFAULT_ALPHA)
    }
}

impl ModelStore {
    /// Store backed by `path`, training with penalty `alpha` when needed.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, alpha: f64) -> Self {
        Self {
            path: path.into(),
            alpha,
        }
    }

    /// Artifact location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the artifact. `Ok(None)` when none has been written yet.
    pub fn load(&self) -> Result<Option<FittedModel>, ModelError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ModelError::persistence(&self.path, err)),
        };
        let artifact: ModelArtifact = serde_json::from_slice(&raw)
            .map_err(|err| ModelError::corrupt(&self.path, err.to_string()))?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(ModelError::corrupt(
                &self.path,
                format!("unsupported artifact version {}", artifact.version),
            ));
        }
        if artifact.feature_order.iter().map(String::as_str).ne(FEATURE_ORDER) {
            return Err(ModelError::corrupt(
                &self.path,
                format!("unexpected feature order {:?}", artifact.feature_order),
            ));
        }
        let coefficients: [f64; FEATURE_COUNT] =
            artifact.coefficients.as_slice().try_into().map_err(|_| {
                ModelError::corrupt(
                    &self.path,
                    format!(
                        "expected {FEATURE_COUNT} coefficients, found {}",
                        artifact.coefficients.len()
                    ),
                )
            })?;
        FittedModel::from_parts(coefficients, artifact.intercept, artifact.alpha)
            .map(Some)
            .map_err(|err| ModelError::corrupt(&self.path, err.to_string()))
    }

    /// Writes the artifact through a temporary file and a rename, so concurrent writers
    /// leave one complete artifact behind.
    pub fn save(&self, model: &FittedModel) -> Result<(), ModelError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| ModelError::persistence(parent, err))?;
        }
        let artifact = ModelArtifact {
            version: ARTIFACT_VERSION,
            feature_order: FEATURE_ORDER.iter().map(ToString::to_string).collect(),
            alpha: model.alpha(),
            coefficients: model.coefficients().to_vec(),
            intercept: model.intercept(),
            trained_at: Utc::now(),
        };
        let data = serde_json::to_vec_pretty(&artifact)
            .map_err(|err| ModelError::persistence(&self.path, io::Error::other(err)))?;
        let tmp = self.temporary_path();
        fs::write(&tmp, data).map_err(|err| ModelError::persistence(&tmp, err))?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            let _ = fs::remove_file(&tmp);
            ModelError::persistence(&self.path, err)
        })
    }

    /// Loads the persisted model, or trains and persists one when none exists.
    #[must_use]
    pub fn load_or_train(&self) -> ModelState {
        self.load_or_train_with_telemetry(None)
    }

    /// [`ModelStore::load_or_train`] with optional instrumentation.
    ///
    /// Never fails: a corrupt artifact, a failed fit or a failed write all yield
    /// [`ModelState::Unavailable`].
    #[must_use]
    pub fn load_or_train_with_telemetry(&self, telemetry: Option<&RiskTelemetry>) -> ModelState {
        let outcome = match self.load() {
            Ok(Some(model)) => {
                log(
                    telemetry,
                    LogLevel::Info,
                    "model_loaded",
                    json!({ "path": self.path, "intercept": model.intercept() }),
                );
                Ok(("disk", model))
            }
            Ok(None) => self
                .retrain_with_telemetry(telemetry)
                .map(|trained| ("trained", trained.model)),
            Err(err) => Err(err),
        };
        match outcome {
            Ok((origin, model)) => {
                event(
                    telemetry,
                    "risk.model.ready",
                    json!({ "origin": origin, "path": self.path }),
                );
                ModelState::Ready(Arc::new(model))
            }
            Err(err) => {
                let reason = err.to_string();
                log(
                    telemetry,
                    LogLevel::Warn,
                    "model_unavailable",
                    json!({ "path": self.path, "error": reason }),
                );
                event(
                    telemetry,
                    "risk.model.unavailable",
                    json!({ "error": reason }),
                );
                ModelState::Unavailable(reason)
            }
        }
    }

    /// Trains on the built-in table and overwrites the artifact.
    pub fn retrain(&self) -> Result<TrainedModel, ModelError> {
        self.retrain_with_telemetry(None)
    }

    /// [`ModelStore::retrain`] with optional instrumentation.
    pub fn retrain_with_telemetry(
        &self,
        telemetry: Option<&RiskTelemetry>,
    ) -> Result<TrainedModel, ModelError> {
        let dataset = TrainingSet::builtin();
        log(
            telemetry,
            LogLevel::Debug,
            "model_training_start",
            json!({ "samples": dataset.len(), "alpha": self.alpha }),
        );
        let trained = train(&dataset, self.alpha)?;
        log(
            telemetry,
            LogLevel::Info,
            "model_trained",
            json!({
                "rss": trained.report.rss,
                "baseline_rss": trained.report.baseline_rss,
                "coefficients": trained.report.coefficients,
                "intercept": trained.report.intercept,
            }),
        );
        self.save(&trained.model)?;
        log(
            telemetry,
            LogLevel::Info,
            "model_persisted",
            json!({ "path": self.path }),
        );
        Ok(trained)
    }

    fn temporary_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "model".into(), |name| name.to_string_lossy().into_owned());
        let nonce = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        self.path
            .with_file_name(format!(".{name}.{}.{nonce}.tmp", std::process::id()))
    }
}

fn log(telemetry: Option<&RiskTelemetry>, level: LogLevel, message: &str, metadata: serde_json::Value) {
    if let Some(tel) = telemetry {
        let _ = tel.log(level, message, metadata);
    }
}

fn event(telemetry: Option<&RiskTelemetry>, event_type: &str, payload: serde_json::Value) {
    if let Some(tel) = telemetry {
        let _ = tel.event(event_type, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::features::OperationalVector;
    use tempfile::tempdir;

    #[test]
    fn trains_and_persists_when_absent() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("ai_models/model.json"), 1.0);
        let state = store.load_or_train();
        assert!(state.is_ready());
        assert!(store.path().exists());
        let leftovers = fs::read_dir(store.path().parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn round_trip_is_exact() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("model.json"), 1.0);
        let trained = store.retrain().unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, trained.model);
        let probe = OperationalVector::new(3.5, 11.0, 1.7, 77.0);
        assert_eq!(loaded.predict(&probe).to_bits(), trained.model.predict(&probe).to_bits());
    }

    #[test]
    fn second_start_reuses_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let first = ModelStore::new(&path, 1.0).load_or_train();
        let bytes = fs::read(&path).unwrap();
        // a different alpha would change the fit if training ran again
        let second = ModelStore::new(&path, 50.0).load_or_train();
        assert_eq!(first.model(), second.model());
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn corrupt_artifact_means_no_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"\x80\x04not json").unwrap();
        let store = ModelStore::new(&path, 1.0);
        assert!(matches!(store.load(), Err(ModelError::Corrupt { .. })));
        assert!(!store.load_or_train().is_ready());
    }

    #[test]
    fn wrong_shape_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let artifact = json!({
            "version": 1,
            "feature_order": FEATURE_ORDER,
            "alpha": 1.0,
            "coefficients": [0.1, 0.2],
            "intercept": 0.5,
            "trained_at": "2025-01-01T00:00:00Z",
        });
        fs::write(&path, artifact.to_string()).unwrap();
        assert!(matches!(
            ModelStore::new(&path, 1.0).load(),
            Err(ModelError::Corrupt { .. })
        ));

        let reordered = json!({
            "version": 1,
            "feature_order": ["crew_efficiency", "days_behind", "cost_variance_pct", "star_delay_factor"],
            "alpha": 1.0,
            "coefficients": [0.1, 0.2, 0.3, 0.4],
            "intercept": 0.5,
            "trained_at": "2025-01-01T00:00:00Z",
        });
        fs::write(&path, reordered.to_string()).unwrap();
        assert!(ModelStore::new(&path, 1.0).load().is_err());
    }

    #[test]
    fn failed_training_means_no_model() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("model.json"), f64::NAN);
        let state = store.load_or_train();
        assert!(matches!(state, ModelState::Unavailable(_)));
        assert!(!store.path().exists());
    }

    #[test]
    fn unwritable_location_means_no_model() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").unwrap();
        let store = ModelStore::new(blocker.join("model.json"), 1.0);
        assert!(!store.load_or_train().is_ready());
    }
}
