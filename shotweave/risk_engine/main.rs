//! Engine entry point: one classifier, one summarizer and one shared read-only model serving
//! breakdown and risk requests.

use std::sync::Arc;

use serde_json::{json, Value};
use shared_logging::LogLevel;

use crate::{
    breakdown::{
        breakdown_script,
        classifier::{EntityClassifier, NullClassifier, ScreenplayClassifier},
        summarizer::EntitySummarizer,
    },
    config::{ClassifierKind, EngineConfig},
    error::InputError,
    model::{
        features::OperationalVector,
        ridge::FittedModel,
        store::{ModelState, ModelStore},
    },
    request::{BreakdownRequest, BreakdownResponse, RiskRequest, RiskResponse},
    scorer::{RiskReport, RiskScorer},
    telemetry::RiskTelemetry,
};

/// Request-serving engine. Immutable after construction; share it behind an `Arc`.
pub struct RiskEngine {
    classifier: Arc<dyn EntityClassifier>,
    summarizer: EntitySummarizer,
    model: ModelState,
    scorer: RiskScorer,
    telemetry: Option<RiskTelemetry>,
}

impl std::fmt::Debug for RiskEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskEngine")
            .field("classifier", &self.classifier.name())
            .field("model_ready", &self.model.is_ready())
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

impl RiskEngine {
    /// Assembles an engine from ready-made parts.
    #[must_use]
    pub fn new(
        classifier: Arc<dyn EntityClassifier>,
        summarizer: EntitySummarizer,
        model: ModelState,
    ) -> Self {
        Self {
            classifier,
            summarizer,
            model,
            scorer: RiskScorer,
            telemetry: None,
        }
    }

    /// Bootstraps from configuration: builds telemetry and the classifier, then loads or
    /// trains the model. Only telemetry setup can fail; classifier and model problems
    /// degrade the engine instead.
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        let telemetry = config.telemetry()?;
        let classifier: Arc<dyn EntityClassifier> = match config.classifier {
            ClassifierKind::Disabled => Arc::new(NullClassifier),
            ClassifierKind::Screenplay => match ScreenplayClassifier::new() {
                Ok(classifier) => Arc::new(classifier),
                Err(err) => {
                    let _ = telemetry.log(
                        LogLevel::Warn,
                        "classifier_unavailable",
                        json!({ "error": format!("{err:#}") }),
                    );
                    Arc::new(NullClassifier)
                }
            },
        };
        let store = ModelStore::new(&config.model_path, config.ridge_alpha);
        let model = store.load_or_train_with_telemetry(Some(&telemetry));
        Ok(Self::new(
            classifier,
            EntitySummarizer::new(config.padding.source()),
            model,
        )
        .with_telemetry(telemetry))
    }

    /// Attaches telemetry sinks for structured logging/events.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: RiskTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// The shared model, if one is available.
    #[must_use]
    pub fn model(&self) -> Option<&FittedModel> {
        self.model.model()
    }

    /// Model availability.
    #[must_use]
    pub const fn model_state(&self) -> &ModelState {
        &self.model
    }

    /// Breaks a script down into entity counts and heuristics.
    pub fn breakdown(&self, request: &BreakdownRequest) -> BreakdownResponse {
        let outcome =
            breakdown_script(self.classifier.as_ref(), &self.summarizer, &request.script);
        let level = if outcome.degraded {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        let summary = json!({
            "classifier": self.classifier.name(),
            "script_chars": request.script.chars().count(),
            "location_count": outcome.breakdown.location_count,
            "character_count": outcome.breakdown.character_count,
            "estimated_shoot_days": outcome.breakdown.estimated_shoot_days,
            "degraded": outcome.degraded,
        });
        self.log(level, "breakdown_completed", summary.clone());
        self.event("risk.breakdown.completed", summary);
        BreakdownResponse {
            success: true,
            breakdown: outcome.breakdown,
            degraded: outcome.degraded,
        }
    }

    /// Parses a JSON breakdown request and serves it.
    pub fn breakdown_json(&self, body: &Value) -> Result<BreakdownResponse, InputError> {
        let request =
            BreakdownRequest::from_json(body).map_err(|err| self.rejected("breakdown", err))?;
        Ok(self.breakdown(&request))
    }

    /// Scores an operational snapshot. Always returns a report.
    pub fn assess(&self, vector: &OperationalVector) -> RiskReport {
        let report = self.scorer.assess(self.model.model(), vector);
        let level = if report.degraded {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        let summary = json!({
            "features": vector.to_features(),
            "risk_score": report.risk_score,
            "predicted_overrun_crores": report.predicted_overrun_crores,
            "degraded": report.degraded,
        });
        self.log(level, "risk_report_completed", summary.clone());
        self.event("risk.report.completed", summary);
        report
    }

    /// Scores a parsed risk request.
    pub fn assess_request(&self, request: &RiskRequest) -> RiskResponse {
        RiskResponse {
            success: true,
            report: self.assess(&request.to_vector()),
        }
    }

    /// Parses a JSON risk request and serves it.
    pub fn assess_json(&self, body: &Value) -> Result<RiskResponse, InputError> {
        let request = RiskRequest::from_json(body).map_err(|err| self.rejected("risk", err))?;
        Ok(self.assess_request(&request))
    }

    fn rejected(&self, endpoint: &str, err: InputError) -> InputError {
        self.log(
            LogLevel::Info,
            "request_rejected",
            json!({ "endpoint": endpoint, "error": err.to_string() }),
        );
        err
    }

    fn log(&self, level: LogLevel, message: &str, metadata: Value) {
        if let Some(telemetry) = self.telemetry.as_ref() {
            let _ = telemetry.log(level, message, metadata);
        }
    }

    fn event(&self, event_type: &str, payload: Value) {
        if let Some(telemetry) = self.telemetry.as_ref() {
            let _ = telemetry.event(event_type, payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakdown::{
        padding::{NoPadding, RandomPadding},
        spans::TextSpan,
    };
    use crate::model::{dataset::TrainingSet, ridge::RidgeRegression};
    use serde_json::json;
    use shared_event_bus::MemoryEventBus;
    use shared_logging::MemoryLogSink;
    use std::{fs, thread};
    use tempfile::tempdir;

    struct FixedSpans(Vec<TextSpan>);

    impl EntityClassifier for FixedSpans {
        fn classify(&self, _text: &str) -> Vec<TextSpan> {
            self.0.clone()
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn anu_in_kochi() -> Arc<dyn EntityClassifier> {
        Arc::new(FixedSpans(vec![
            TextSpan::person("Anu"),
            TextSpan::person("Anu"),
            TextSpan::location("Kochi"),
        ]))
    }

    fn config_in(dir: &std::path::Path) -> EngineConfig {
        EngineConfig {
            model_path: dir.join("models/budget_risk_model.json"),
            ..EngineConfig::default()
        }
    }

    fn ready_engine() -> RiskEngine {
        let model = RidgeRegression::default().fit(&TrainingSet::builtin()).unwrap();
        RiskEngine::new(
            Arc::new(ScreenplayClassifier::new().unwrap()),
            EntitySummarizer::new(Arc::new(NoPadding)),
            ModelState::Ready(Arc::new(model)),
        )
    }

    #[test]
    fn default_request_scores_near_baseline() {
        let response = ready_engine().assess_json(&json!({})).unwrap();
        assert!(response.success);
        assert!(!response.report.degraded);
        assert_eq!(response.report.risk_score, 50);
    }

    #[test]
    fn unavailable_model_uses_fallback() {
        let engine = RiskEngine::new(
            Arc::new(NullClassifier),
            EntitySummarizer::default(),
            ModelState::Unavailable("missing".into()),
        );
        let response = engine
            .assess_json(&json!({ "days_behind": 9, "crew_efficiency": "40" }))
            .unwrap();
        assert_eq!(response.report, RiskReport::fallback());
    }

    #[test]
    fn rejections_are_logged() {
        let sink = Arc::new(MemoryLogSink::new());
        let telemetry = RiskTelemetry::builder("risk")
            .log_sink(sink.clone())
            .build()
            .unwrap();
        let engine = ready_engine().with_telemetry(telemetry);
        assert_eq!(
            engine.breakdown_json(&json!({ "script": "" })),
            Err(InputError::EmptyScript)
        );
        assert!(engine
            .assess_json(&json!({ "cost_variance_pct": "n/a" }))
            .is_err());
        let rejected = sink
            .records()
            .into_iter()
            .filter(|record| record.message == "request_rejected")
            .count();
        assert_eq!(rejected, 2);
    }

    #[test]
    fn reports_publish_events() {
        let bus = Arc::new(MemoryEventBus::new(8));
        let telemetry = RiskTelemetry::builder("risk")
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        let engine = ready_engine().with_telemetry(telemetry);
        engine.assess(&OperationalVector::default());
        let _ = engine.breakdown_json(&json!({ "script": "EXT. KOCHI - DAY" })).unwrap();
        assert_eq!(bus.events_of("risk.report.completed").len(), 1);
        assert_eq!(bus.events_of("risk.breakdown.completed").len(), 1);
    }

    #[test]
    fn duplicate_entities_count_once() {
        let engine = RiskEngine::new(
            anu_in_kochi(),
            EntitySummarizer::new(Arc::new(NoPadding)),
            ModelState::Unavailable("unused".into()),
        );
        let script = "x".repeat(10_000);
        let response = engine.breakdown_json(&json!({ "script": script })).unwrap();
        assert!(!response.degraded);
        assert_eq!(response.breakdown.location_count, 1);
        assert_eq!(response.breakdown.character_count, 1);
        assert_eq!(response.breakdown.estimated_shoot_days, 6);
        assert_eq!(response.breakdown.locations, vec!["Kochi"]);
        assert_eq!(response.breakdown.characters, vec!["Anu"]);
    }

    #[test]
    fn padded_shoot_days_have_lower_bound() {
        let engine = RiskEngine::new(
            anu_in_kochi(),
            EntitySummarizer::new(Arc::new(RandomPadding::seeded(7))),
            ModelState::Unavailable("unused".into()),
        );
        let script = "x".repeat(10_000);
        for _ in 0..20 {
            let breakdown = engine.breakdown_json(&json!({ "script": script })).unwrap().breakdown;
            assert!((2..=4).contains(&breakdown.location_count));
            assert!((3..=6).contains(&breakdown.character_count));
            assert!(breakdown.estimated_shoot_days >= 6);
            assert!(breakdown.complexity_score <= 100);
        }
    }

    #[test]
    fn training_point_predicts_near_label() {
        let response = ready_engine()
            .assess_json(&json!({
                "days_behind": 7,
                "cost_variance_pct": 25,
                "star_delay_factor": 3.0,
                "crew_efficiency": 60,
            }))
            .unwrap();
        assert!((response.report.predicted_overrun_crores - 6.8).abs() <= 2.0);
        assert!(response.report.risk_score >= 90);
    }

    #[test]
    fn disabled_classifier_degrades_breakdown() {
        let dir = tempdir().unwrap();
        let config = EngineConfig {
            classifier: ClassifierKind::Disabled,
            ..config_in(dir.path())
        };
        let engine = RiskEngine::from_config(&config).unwrap();
        let response = engine
            .breakdown_json(&json!({ "script": "EXT. KOCHI HARBOUR - NIGHT" }))
            .unwrap();
        assert!(response.degraded);
        assert!(response.breakdown.is_empty());
        assert_eq!(response.breakdown.estimated_shoot_days, 0);
    }

    #[test]
    fn model_survives_restart() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let first = RiskEngine::from_config(&config).unwrap();
        assert!(config.model_path.exists());
        let second = RiskEngine::from_config(&config).unwrap();
        assert_eq!(first.model(), second.model());
        assert!(second.model().is_some());
    }

    #[test]
    fn corrupt_artifact_falls_back() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(config.model_path.parent().unwrap()).unwrap();
        fs::write(&config.model_path, b"not a model").unwrap();
        let engine = RiskEngine::from_config(&config).unwrap();
        assert!(!engine.model_state().is_ready());
        for body in [
            json!({}),
            json!({ "days_behind": 7, "cost_variance_pct": 25, "star_delay_factor": 3, "crew_efficiency": 60 }),
            json!({ "days_behind": -40, "crew_efficiency": "100" }),
        ] {
            let report = engine.assess_json(&body).unwrap().report;
            assert_eq!(report.risk_score, 75);
            assert_eq!(report.predicted_overrun_crores.to_bits(), 3.0_f64.to_bits());
        }
        assert_eq!(fs::read(&config.model_path).unwrap(), b"not a model");
    }

    #[test]
    fn unwritable_model_location_falls_back() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file").unwrap();
        let config = EngineConfig {
            model_path: blocker.join("model.json"),
            ..EngineConfig::default()
        };
        let engine = RiskEngine::from_config(&config).unwrap();
        assert!(engine.model().is_none());
        assert_eq!(
            engine.assess(&OperationalVector::default()),
            RiskReport::fallback()
        );
    }

    #[test]
    fn engine_serves_concurrent_requests() {
        let engine = Arc::new(ready_engine());
        let expected = engine.assess(&OperationalVector::new(3.0, 10.0, 1.5, 85.0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    let report = engine.assess(&OperationalVector::new(3.0, 10.0, 1.5, 85.0));
                    let breakdown = engine
                        .breakdown_json(&json!({ "script": "INT. POLICE STATION - DAY\n\nANU\nHello." }))
                        .unwrap();
                    (report, breakdown.breakdown.location_count)
                })
            })
            .collect();
        for handle in handles {
            let (report, locations) = handle.join().unwrap();
            assert_eq!(report, expected);
            assert_eq!(locations, 1);
        }
    }

    #[test]
    fn extreme_metrics_keep_a_readable_report() {
        let response = ready_engine()
            .assess_json(&json!({ "cost_variance_pct": 1e308 }))
            .unwrap();
        assert_eq!(response.report.risk_score, 100);
        assert!(response.report.predicted_overrun_crores.is_finite());
        let wire = serde_json::to_value(response).unwrap();
        assert!(wire["predicted_overrun_crores"].is_f64());
        let back: RiskResponse = serde_json::from_value(wire).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn engine_built_in_sync_code_drops_inside_runtime() {
        let bus = Arc::new(MemoryEventBus::new(8));
        let telemetry = RiskTelemetry::builder("risk")
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        let engine = ready_engine().with_telemetry(telemetry);
        engine.assess(&OperationalVector::default());
        assert_eq!(bus.events_of("risk.report.completed").len(), 1);
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            engine.assess(&OperationalVector::default());
            drop(engine);
        });
        assert!(!bus.events_of("risk.report.completed").is_empty());
    }
}
