use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    breakdown::summarizer::ScriptBreakdown, error::InputError,
    model::features::OperationalVector, scorer::RiskReport,
};

/// Script breakdown request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownRequest {
    /// Raw script text.
    pub script: String,
}

impl BreakdownRequest {
    /// Validated request. Empty text is rejected.
    pub fn new(script: impl Into<String>) -> Result<Self, InputError> {
        let script = script.into();
        if script.is_empty() {
            return Err(InputError::EmptyScript);
        }
        Ok(Self { script })
    }

    /// Parses `{"script": "..."}`. A missing or null script counts as empty.
    pub fn from_json(body: &Value) -> Result<Self, InputError> {
        let object = as_object(body)?;
        match object.get("script") {
            None | Some(Value::Null) => Err(InputError::EmptyScript),
            Some(Value::String(script)) => Self::new(script.as_str()),
            Some(_) => Err(InputError::MalformedRequest(
                "`script` must be a string".into(),
            )),
        }
    }
}

/// Operational metrics request. Absent fields take [`OperationalVector::default`] values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskRequest {
    /// Days behind schedule.
    pub days_behind: Option<f64>,
    /// Cost variance in percent.
    pub cost_variance_pct: Option<f64>,
    /// Star delay multiplier.
    pub star_delay_factor: Option<f64>,
    /// Crew efficiency in percent.
    pub crew_efficiency: Option<f64>,
}

impl RiskRequest {
    /// Parses a JSON body. Numbers and numeric strings are accepted; anything else supplied
    /// for a field is an [`InputError`].
    pub fn from_json(body: &Value) -> Result<Self, InputError> {
        let object = as_object(body)?;
        Ok(Self {
            days_behind: numeric_field(object, "days_behind")?,
            cost_variance_pct: numeric_field(object, "cost_variance_pct")?,
            star_delay_factor: numeric_field(object, "star_delay_factor")?,
            crew_efficiency: numeric_field(object, "crew_efficiency")?,
        })
    }

    /// Applies defaults for absent fields.
    #[must_use]
    pub fn to_vector(&self) -> OperationalVector {
        let defaults = OperationalVector::default();
        OperationalVector {
            days_behind: self.days_behind.unwrap_or(defaults.days_behind),
            cost_variance_pct: self.cost_variance_pct.unwrap_or(defaults.cost_variance_pct),
            star_delay_factor: self.star_delay_factor.unwrap_or(defaults.star_delay_factor),
            crew_efficiency: self.crew_efficiency.unwrap_or(defaults.crew_efficiency),
        }
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, InputError> {
    body.as_object()
        .ok_or_else(|| InputError::MalformedRequest("body must be a JSON object".into()))
}

fn numeric_field(object: &Map<String, Value>, field: &'static str) -> Result<Option<f64>, InputError> {
    let value = match object.get(field) {
        None => return Ok(None),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match value {
        None => Err(InputError::NonNumeric { field }),
        Some(number) if !number.is_finite() => Err(InputError::NonFinite { field }),
        Some(number) => Ok(Some(number)),
    }
}

/// Successful breakdown envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownResponse {
    /// Always true.
    pub success: bool,
    /// The report.
    pub breakdown: ScriptBreakdown,
    /// True when recognition was unavailable and the breakdown is all zero.
    pub degraded: bool,
}

/// Successful risk envelope; report fields are flattened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskResponse {
    /// Always true.
    pub success: bool,
    /// The report.
    #[serde(flatten)]
    pub report: RiskReport,
}

/// Rejection envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
}

impl From<&InputError> for ErrorResponse {
    fn from(err: &InputError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}
