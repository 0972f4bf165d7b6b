use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::services::llm::{parse, LlmClient};
use crate::services::patient::{AdultInput, PatientInput, PregnancyInput, Profile};
use crate::services::prompt;
use crate::services::risk_engine::{self, AnalysisSource, RiskAssessment, RiskLevel};

const NO_SPECIFIC_RISKS: &str = "No specific risks detected";
const DEFAULT_ADVICE: &str = "Maintain healthy lifestyle";

/// Short adult payload accepted by `POST /api/analyze/adult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdultScreening {
    pub age: f64,
    pub weight: f64,
    pub height: f64,
    #[serde(rename = "bloodPressure")]
    pub blood_pressure: f64,
}

/// Short pregnancy payload accepted by `POST /api/analyze/pregnant`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PregnancyScreening {
    pub age: f64,
    pub weight: f64,
    pub weeks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScreeningRequest {
    Adult(AdultScreening),
    Pregnancy(PregnancyScreening),
}

impl ScreeningRequest {
    pub fn profile(&self) -> Profile {
        match self {
            Self::Adult(_) => Profile::Adult,
            Self::Pregnancy(_) => Profile::Pregnancy,
        }
    }

    /// Widen the short payload to a full record. The single blood pressure reading
    /// is the systolic value.
    pub fn to_patient_input(&self) -> PatientInput {
        match self {
            Self::Adult(a) => PatientInput::GeneralAdult(AdultInput {
                age: a.age as u32,
                height: a.height,
                weight: a.weight,
                blood_pressure_systolic: a.blood_pressure,
                ..Default::default()
            }),
            Self::Pregnancy(p) => PatientInput::PregnantWoman(PregnancyInput {
                age: p.age as u32,
                weight: p.weight,
                gestational_age_weeks: p.weeks as u32,
                ..Default::default()
            }),
        }
    }
}

/// Screen a short payload: model first, clinic screening rules on any failure.
pub async fn analyze(llm: Option<&LlmClient>, request: &ScreeningRequest) -> RiskAssessment {
    let profile = request.profile();
    let fallback = || risk_engine::screen(&request.to_patient_input());

    let Some(llm) = llm else {
        return fallback();
    };

    let prompt = prompt::screening_prompt(profile, request);
    match llm.complete(&prompt).await {
        Ok(completion) => {
            let parsed = parse::extract_json_object(&completion.text)
                .and_then(|map| merge(&map, &completion.model));
            match parsed {
                Some(assessment) => assessment,
                None => {
                    log::warn!(
                        "{} {} analysis returned no parseable JSON payload, using screening rules",
                        llm.provider_name(),
                        profile.as_str()
                    );
                    fallback()
                }
            }
        }
        Err(failure) => {
            log::warn!(
                "{} {} analysis failed, using screening rules: {}",
                llm.provider_name(),
                profile.as_str(),
                failure.error
            );
            fallback()
        }
    }
}

fn merge(map: &Map<String, Value>, model: &str) -> Option<RiskAssessment> {
    // An absent score counts as 0; an explicit null is as unusable as text.
    let risk_score = match map.get("risk_score") {
        None => 0,
        score => parse::parse_score(score)?,
    };
    let risk_level = map
        .get("risk_level")
        .and_then(Value::as_str)
        .and_then(RiskLevel::parse)
        .unwrap_or_else(|| RiskLevel::from_score(risk_score));

    let mut detected_risks = parse::string_list(map.get("risk_factors"));
    if detected_risks.is_empty() {
        detected_risks.push(NO_SPECIFIC_RISKS.to_string());
    }
    let mut recommendations = parse::string_list(map.get("recommendations"));
    if recommendations.is_empty() {
        recommendations.push(DEFAULT_ADVICE.to_string());
    }

    Some(RiskAssessment {
        risk_score,
        risk_level,
        detected_risks,
        recommendations,
        report: String::new(),
        source: AnalysisSource::Ai,
        model: model.to_string(),
    })
}
