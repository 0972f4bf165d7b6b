use serde_json::{Map, Value};

use crate::services::llm::{parse, LlmClient};
use crate::services::patient::PatientInput;
use crate::services::prompt;
use crate::services::risk_engine::{self, AnalysisSource, RiskAssessment, RiskLevel};

/// Full prevention report for a patient record.
///
/// Asks the configured model first and falls back to the prevention rules. When a
/// provider answered but no usable report came back, the fallback report carries an
/// integration note naming the reason; a missing key or a pure network outage falls
/// back silently.
pub async fn generate_report(llm: Option<&LlmClient>, input: &PatientInput) -> RiskAssessment {
    let fallback = risk_engine::assess(input);

    let Some(llm) = llm else {
        log::debug!("No model client configured, using prevention rules");
        return fallback;
    };

    match llm.complete(&prompt::report_prompt(input)).await {
        Ok(completion) => {
            let merged = parse::extract_json_object(&completion.text)
                .and_then(|map| merge(&map, &fallback, &completion.model));
            match merged {
                Some(assessment) => assessment,
                None => {
                    log::warn!(
                        "{} model {} returned no usable report, falling back",
                        llm.provider_name(),
                        completion.model
                    );
                    with_note(fallback, llm.provider_name(), "the model response could not be parsed")
                }
            }
        }
        Err(failure) if failure.reached_provider => {
            log::warn!("Report generation failed, falling back: {}", failure.error);
            with_note(fallback, llm.provider_name(), &failure.error.to_string())
        }
        Err(failure) => {
            log::warn!("Model provider unreachable, falling back: {}", failure.error);
            fallback
        }
    }
}

/// Combine a parsed model answer with the rule-based assessment. Returns `None`
/// when the answer has no report text.
fn merge(map: &Map<String, Value>, fallback: &RiskAssessment, model: &str) -> Option<RiskAssessment> {
    let report = map
        .get("report")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())?;

    let risk_score = parse::parse_score(parse::field(map, &["risk_score", "riskScore"]))
        .unwrap_or(fallback.risk_score);

    let mut detected_risks = parse::string_list(parse::field(map, &["detected_risks", "detectedRisks"]));
    if detected_risks.is_empty() {
        detected_risks = fallback.detected_risks.clone();
    }

    let mut recommendations = parse::string_list(map.get("suggestions"));
    if recommendations.is_empty() {
        recommendations = fallback.recommendations.clone();
    }

    Some(RiskAssessment {
        risk_score,
        risk_level: RiskLevel::from_score(risk_score),
        detected_risks,
        recommendations,
        report: report.to_string(),
        source: AnalysisSource::Ai,
        model: model.to_string(),
    })
}

fn with_note(mut assessment: RiskAssessment, provider: &str, reason: &str) -> RiskAssessment {
    assessment.report.push_str(&format!(
        "\n\nIntegration Note:\nThe live {} request is currently unavailable ({}). \
         This report uses local prevention logic so you can continue working.",
        provider, reason
    ));
    assessment
}
