#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Shotweave production risk engine: script complexity estimation from entity spans and
//! ridge-regression overrun scoring from operational metrics.

/// Error taxonomy for requests and the model lifecycle.
#[path = "../error.rs"]
pub mod error;

/// TOML-backed engine configuration.
#[path = "../config.rs"]
pub mod config;

/// Telemetry builder/hook for structured logs and events.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Script breakdown: entity classification boundary and summarization.
#[path = "../breakdown/main.rs"]
pub mod breakdown;

/// Overrun regression: dataset, ridge fit, persistence.
#[path = "../model/main.rs"]
pub mod model;

/// Prediction to bounded risk score.
#[path = "../scorer.rs"]
pub mod scorer;

/// Request parsing and response envelopes.
#[path = "../request.rs"]
pub mod request;

/// Engine entry point wiring classifier, summarizer, model and scorer.
#[path = "../main.rs"]
pub mod runtime;

pub use breakdown::{
    classifier::{EntityClassifier, NullClassifier, ScreenplayClassifier},
    padding::{FixedPadding, NoPadding, PaddingSource, RandomPadding},
    spans::{SpanKind, TextSpan},
    summarizer::{EntitySummarizer, ScriptBreakdown},
};
pub use config::{ClassifierKind, EngineConfig, PaddingConfig};
pub use error::{InputError, ModelError};
pub use model::{
    dataset::TrainingSet,
    features::OperationalVector,
    reporter::TrainingReport,
    ridge::{FittedModel, RidgeRegression},
    store::{ModelState, ModelStore},
    train, TrainedModel,
};
pub use request::{BreakdownRequest, BreakdownResponse, ErrorResponse, RiskRequest, RiskResponse};
pub use runtime::RiskEngine;
pub use scorer::{RiskReport, RiskScorer};
pub use telemetry::{RiskTelemetry, RiskTelemetryBuilder};
