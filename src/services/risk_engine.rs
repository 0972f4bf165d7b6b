//! Deterministic risk scoring.
//!
//! Two rule sets live here and are never blended:
//! - prevention rules (`assess`), used for full form records and as the report
//!   client's fallback;
//! - clinic screening rules (`screen`), used by the analyze endpoints for the short
//!   payloads, including the age brackets that only the clinic rules apply.
//!
//! Both are total: every input produces an assessment.

use serde::{Deserialize, Serialize};

use crate::services::bands::{Band, LATE_STAGE_WEEK};
use crate::services::patient::{bmi, PatientInput, StressLevel};

pub const HIGH_THRESHOLD: u8 = 60;
pub const MODERATE_THRESHOLD: u8 = 30;

pub const PREVENTION_MODEL: &str = "rule-based-prevention-v1";
pub const SCREENING_ADULT_MODEL: &str = "rule-based-v2";
pub const SCREENING_PREGNANCY_MODEL: &str = "rule-based-pregnancy-v1";

pub const NO_DOMINANT_RISK: &str = "No dominant high-risk marker detected";
pub const NO_ADULT_PATTERN: &str = "No high-priority risk patterns detected";
pub const NO_MATERNAL_PATTERN: &str = "No high-priority maternal risk patterns detected";

const PREVENTION_BASE: i32 = 15;
const PREVENTION_FLOOR: i32 = 5;
const PREVENTION_CEILING: i32 = 98;

const SCREENING_ADULT_BASE: i32 = 5;
const SCREENING_PREGNANCY_BASE: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MODERATE_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Exact match only; anything else is re-derived from the score by callers.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Low" => Some(Self::Low),
            "Moderate" => Some(Self::Moderate),
            "High" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Moderate => write!(f, "Moderate"),
            Self::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Ai,
    Fallback,
}

impl AnalysisSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    /// Insertion order is rule evaluation order.
    pub detected_risks: Vec<String>,
    pub recommendations: Vec<String>,
    pub report: String,
    pub source: AnalysisSource,
    pub model: String,
}

impl RiskAssessment {
    pub fn score_label(&self) -> String {
        format!("{}%", self.risk_score)
    }
}

/// Running score plus the risk and advice entries each fired rule appends.
struct Tally {
    score: i32,
    risks: Vec<String>,
    advice: Vec<String>,
}

impl Tally {
    fn new(base: i32) -> Self {
        Self {
            score: base,
            risks: Vec::new(),
            advice: Vec::new(),
        }
    }

    fn add(&mut self, points: i32) {
        self.score += points;
    }

    fn flag(&mut self, points: i32, risk: &str) {
        self.score += points;
        push_unique(&mut self.risks, risk);
    }

    fn flag_with_advice(&mut self, points: i32, risk: &str, advice: &str) {
        self.flag(points, risk);
        push_unique(&mut self.advice, advice);
    }

    fn clamped(&self, floor: i32, ceiling: i32) -> u8 {
        self.score.clamp(floor, ceiling) as u8
    }

    fn risks_or(self, sentinel: &str) -> (Vec<String>, Vec<String>) {
        let risks = if self.risks.is_empty() {
            vec![sentinel.to_string()]
        } else {
            self.risks
        };
        (risks, self.advice)
    }
}

fn push_unique(list: &mut Vec<String>, entry: &str) {
    if !list.iter().any(|e| e == entry) {
        list.push(entry.to_string());
    }
}

/// Prevention rules. Rule order: BMI, blood pressure, blood sugar, stress,
/// then pregnancy-specific rules. Score is clamped to [5, 98].
pub fn assess(input: &PatientInput) -> RiskAssessment {
    let vitals = input.vitals();
    let mut tally = Tally::new(PREVENTION_BASE);

    let bmi = vitals.bmi();
    if bmi >= 30.0 {
        tally.flag(20, "Elevated BMI profile");
    } else if bmi >= 25.0 {
        tally.flag(12, "Overweight range");
    }

    if vitals.bp_elevated() {
        tally.flag(25, "High blood pressure trend");
    } else if vitals.bp_borderline() {
        tally.flag(12, "Borderline blood pressure");
    }

    if vitals.sugar_elevated() {
        tally.flag(25, "High blood sugar trend");
    } else if vitals.sugar_borderline() {
        tally.flag(12, "Borderline blood sugar");
    }

    match vitals.stress {
        Some(StressLevel::High) => tally.flag(12, "High stress load"),
        Some(StressLevel::Medium) => tally.add(6),
        _ => {}
    }

    if let PatientInput::PregnantWoman(p) = input {
        if p.history_high_risk_pregnancy {
            tally.flag(14, "History of high-risk pregnancy");
        }
        if p.gestational_age_weeks >= LATE_STAGE_WEEK {
            tally.flag(6, "Late-stage pregnancy monitoring needs");
        }
    }

    let score = tally.clamped(PREVENTION_FLOOR, PREVENTION_CEILING);
    let (detected_risks, _) = tally.risks_or(NO_DOMINANT_RISK);
    let band = Band::select(input);

    RiskAssessment {
        risk_score: score,
        risk_level: RiskLevel::from_score(score),
        detected_risks,
        recommendations: band.suggestions().iter().map(|s| s.to_string()).collect(),
        report: band.report().to_string(),
        source: AnalysisSource::Fallback,
        model: PREVENTION_MODEL.to_string(),
    }
}

/// Clinic screening rules for the short analyze payloads. Score is clamped to
/// [0, 100]; every fired rule contributes one risk and one piece of advice.
pub fn screen(input: &PatientInput) -> RiskAssessment {
    let (mut tally, sentinel, default_advice, model) = match input {
        PatientInput::GeneralAdult(a) => (
            screen_adult(a.age, a.height, a.weight, a.blood_pressure_systolic),
            NO_ADULT_PATTERN,
            "Maintain healthy lifestyle",
            SCREENING_ADULT_MODEL,
        ),
        PatientInput::PregnantWoman(p) => (
            screen_pregnancy(p.age, p.weight, p.gestational_age_weeks),
            NO_MATERNAL_PATTERN,
            "Continue routine prenatal care",
            SCREENING_PREGNANCY_MODEL,
        ),
    };

    let score = tally.clamped(0, 100);
    if tally.advice.is_empty() {
        tally.advice.push(default_advice.to_string());
    }
    let (detected_risks, recommendations) = tally.risks_or(sentinel);

    RiskAssessment {
        risk_score: score,
        risk_level: RiskLevel::from_score(score),
        detected_risks,
        recommendations,
        report: Band::select(input).report().to_string(),
        source: AnalysisSource::Fallback,
        model: model.to_string(),
    }
}

fn screen_adult(age: u32, height: f64, weight: f64, systolic: f64) -> Tally {
    let mut tally = Tally::new(SCREENING_ADULT_BASE);

    let bmi = bmi(height, weight);
    if bmi >= 30.0 {
        tally.flag_with_advice(
            30,
            "BMI in obese range",
            "Aim for gradual weight loss with a balanced calorie deficit",
        );
    } else if bmi >= 25.0 {
        tally.flag_with_advice(
            18,
            "BMI in overweight range",
            "Increase weekly activity and improve meal quality",
        );
    }

    // The short payload carries a single reading, taken as systolic.
    if systolic >= 140.0 {
        tally.flag_with_advice(
            30,
            "Systolic blood pressure is high",
            "Check blood pressure regularly and reduce sodium intake",
        );
    } else if systolic >= 130.0 {
        tally.flag_with_advice(
            18,
            "Systolic blood pressure is elevated",
            "Prioritize daily movement and stress management",
        );
    }

    if age >= 60 {
        tally.flag_with_advice(
            18,
            "Age-related cardiovascular risk",
            "Schedule regular preventive checkups",
        );
    } else if age >= 45 {
        tally.flag_with_advice(
            10,
            "Midlife metabolic risk considerations",
            "Monitor blood sugar and lipids routinely",
        );
    }

    tally
}

fn screen_pregnancy(age: u32, weight: f64, weeks: u32) -> Tally {
    let mut tally = Tally::new(SCREENING_PREGNANCY_BASE);

    if age >= 35 {
        tally.flag_with_advice(
            18,
            "Advanced maternal age",
            "Follow high-risk prenatal screening schedule",
        );
    }

    if weeks < 12 {
        tally.flag_with_advice(
            8,
            "Early pregnancy requires close symptom monitoring",
            "Keep regular first-trimester prenatal visits",
        );
    } else if weeks >= LATE_STAGE_WEEK {
        tally.flag_with_advice(
            10,
            "Third trimester monitoring needed",
            "Track fetal movement and blood pressure regularly",
        );
    }

    if weight >= 95.0 {
        tally.flag_with_advice(
            14,
            "Higher weight may increase pregnancy complications",
            "Work with your clinician on nutrition and activity plan",
        );
    }

    tally
}
