use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{ApiError, FieldError};
use super::AppState;
use crate::services::analyzer::{self, AdultScreening, PregnancyScreening, ScreeningRequest};
use crate::services::risk_engine::{AnalysisSource, RiskAssessment, RiskLevel};

/// Response body of both analyze endpoints.
#[derive(Debug, Serialize)]
pub struct AnalysisEnvelope {
    pub success: bool,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub ai_model: String,
    pub analysis_source: AnalysisSource,
}

impl From<RiskAssessment> for AnalysisEnvelope {
    fn from(a: RiskAssessment) -> Self {
        Self {
            success: true,
            risk_score: a.risk_score,
            risk_level: a.risk_level,
            risk_factors: a.detected_risks,
            recommendations: a.recommendations,
            ai_model: a.model,
            analysis_source: a.source,
        }
    }
}

pub async fn adult(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AnalysisEnvelope>, ApiError> {
    let Json(body) = payload?;
    let mut fields = Fields::new(&body)?;
    let request = AdultScreening {
        age: fields.number("age", Bound::NonNegative),
        weight: fields.number("weight", Bound::Positive),
        height: fields.number("height", Bound::Positive),
        blood_pressure: fields.number("bloodPressure", Bound::NonNegative),
    };
    fields.finish()?;

    run(&state, ScreeningRequest::Adult(request)).await
}

pub async fn pregnant(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AnalysisEnvelope>, ApiError> {
    let Json(body) = payload?;
    let mut fields = Fields::new(&body)?;
    let request = PregnancyScreening {
        age: fields.number("age", Bound::NonNegative),
        weight: fields.number("weight", Bound::Positive),
        weeks: fields.number("weeks", Bound::NonNegative),
    };
    fields.finish()?;

    run(&state, ScreeningRequest::Pregnancy(request)).await
}

async fn run(state: &AppState, request: ScreeningRequest) -> Result<Json<AnalysisEnvelope>, ApiError> {
    let llm = state.model_client()?;
    let assessment = analyzer::analyze(llm, &request).await;
    log::info!(
        "{} analysis: source={} model={} score={}",
        request.profile().as_str(),
        assessment.source.as_str(),
        assessment.model,
        assessment.risk_score
    );
    Ok(Json(assessment.into()))
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    NonNegative,
    Positive,
}

/// Collects every field violation before failing, so one response lists them all.
struct Fields<'a> {
    body: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Fields<'a> {
    fn new(body: &'a Value) -> Result<Self, ApiError> {
        match body.as_object() {
            Some(body) => Ok(Self {
                body,
                errors: Vec::new(),
            }),
            None => Err(ApiError::Validation(vec![FieldError::new(
                "body",
                "Input should be a valid JSON object",
            )])),
        }
    }

    fn number(&mut self, name: &str, bound: Bound) -> f64 {
        let value = match self.body.get(name) {
            None => {
                self.errors.push(FieldError::new(name, "Field required"));
                return 0.0;
            }
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Some(_) => None,
        };

        let Some(value) = value else {
            self.errors
                .push(FieldError::new(name, "Input should be a valid number"));
            return 0.0;
        };

        let violation = match bound {
            Bound::NonNegative if value < 0.0 => Some("Input should be greater than or equal to 0"),
            Bound::Positive if value <= 0.0 => Some("Input should be greater than 0"),
            _ => None,
        };
        if let Some(message) = violation {
            self.errors.push(FieldError::new(name, message));
        }
        value
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}
