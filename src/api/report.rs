use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, FieldError};
use super::AppState;
use crate::services::patient::PatientInput;
use crate::services::report::generate_report;
use crate::services::risk_engine::{self, AnalysisSource, RiskAssessment, RiskLevel};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub report: String,
    pub risk_score: u8,
    pub risk_score_label: String,
    pub risk_level: RiskLevel,
    pub detected_risks: Vec<String>,
    pub suggestions: Vec<String>,
    pub source: AnalysisSource,
    pub model: String,
}

impl From<RiskAssessment> for ReportResponse {
    fn from(a: RiskAssessment) -> Self {
        Self {
            risk_score_label: a.score_label(),
            report: a.report,
            risk_score: a.risk_score,
            risk_level: a.risk_level,
            detected_risks: a.detected_risks,
            suggestions: a.recommendations,
            source: a.source,
            model: a.model,
        }
    }
}

/// Prevention rules only; never calls a model.
pub async fn assess(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let input = patient_input(payload)?;
    Ok(Json(risk_engine::assess(&input).into()))
}

pub async fn report(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let input = patient_input(payload)?;
    let llm = state.model_client()?;
    let assessment = generate_report(llm, &input).await;
    log::info!(
        "{} report: source={} model={} score={}",
        input.profile().as_str(),
        assessment.source.as_str(),
        assessment.model,
        assessment.risk_score
    );
    Ok(Json(assessment.into()))
}

fn patient_input(payload: Result<Json<Value>, JsonRejection>) -> Result<PatientInput, ApiError> {
    let Json(body) = payload?;
    serde_json::from_value(body).map_err(|e| {
        let message = e.to_string();
        let field = if message.contains("assessmentType") || message.contains("unknown variant") {
            "assessmentType"
        } else {
            "body"
        };
        ApiError::Validation(vec![FieldError::new(field, message)])
    })
}
