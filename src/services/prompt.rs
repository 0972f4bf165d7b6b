use serde::Serialize;

use crate::services::llm::Prompt;
use crate::services::patient::{Gender, PatientInput, Profile};

pub const REPORT_TEMPERATURE: f32 = 0.3;
pub const REPORT_MAX_TOKENS: u32 = 850;
pub const SCREENING_TEMPERATURE: f32 = 0.2;

const SCREENING_SYSTEM: &str = "You are a clinical risk assistant. Output ONLY valid JSON.";
const SCREENING_KEYS: &str = "Return JSON with keys: risk_score (0-100 number), risk_level (Low|Moderate|High), \
risk_factors (array of short strings), recommendations (array of short actionable strings).";

/// Prevention report prompt for a full patient record. Fields the form did not
/// capture render as `N/A`.
pub fn report_prompt(input: &PatientInput) -> Prompt {
    let vitals = input.vitals();
    let (gender, exercise, water, pregnancy) = match input {
        PatientInput::GeneralAdult(a) => (
            a.gender.map(gender_label).unwrap_or("N/A"),
            a.exercise_days_per_week.to_string(),
            "N/A".to_string(),
            "Week N/A, First Pregnancy: N/A, History of High-Risk: N/A".to_string(),
        ),
        PatientInput::PregnantWoman(p) => (
            "female",
            "0".to_string(),
            value(p.water_intake_liters_per_day, "L"),
            format!(
                "Week {}, First Pregnancy: {}, History of High-Risk: {}",
                whole(p.gestational_age_weeks),
                yes_no(p.first_pregnancy),
                yes_no(p.history_high_risk_pregnancy)
            ),
        ),
    };
    let sleep = match input {
        PatientInput::GeneralAdult(a) => a.sleep_hours,
        PatientInput::PregnantWoman(p) => p.sleep_hours,
    };
    let stress = vitals.stress.map(|s| s.as_str()).unwrap_or("N/A");

    let user = format!(
        "As a Healthcare Prevention Specialist and Data Analyst, perform a comprehensive health audit based on the provided patient data.

### OBJECTIVE
Analyze the physiological metrics provided to determine risk levels and provide a structured clinical report. You must return your response in VALID JSON format only.

### DATA INPUTS
- Assessment Type: {assessment}
- Patient: {name} ({age} years old, {gender})
- Physicals: {height}, {weight}
- Vitals: BP {systolic}/{diastolic}, Blood Sugar: {sugar}
- Lifestyle: {sleep} sleep, {stress} stress, {exercise} days exercise/week, {water} water/day
- Pregnancy Context: {pregnancy}

### OUTPUT REQUIREMENTS
1. **JSON Format**: The entire response must be a single JSON object.
2. **Markdown Content**: The \"report\" field must contain Markdown formatting (bolding, headers, lists) for web rendering.
3. **Word Count**: The report text must be between 220 and 320 words.
4. **Required Headers**: Use exactly these headers in the report:
   - ## Clinical Summary:
   - ## Risk Interpretation:
   - ## Prevention Roadmap:

### SCHEMA
{{
  \"risk_score\": \"0-100%\",
  \"detected_risks\": [\"list\", \"of\", \"risks\"],
  \"report\": \"string (with Markdown)\",
  \"suggestions\": [\"string\", \"string\"]
}}

### RULES
- Calculate a specific Risk Score based on BMI, BP, and Sugar levels.
- Use plain language that remains clinically accurate.
- Provide 3 to 6 actionable suggestions.",
        assessment = input.assessment_type(),
        name = input.full_name().unwrap_or("N/A"),
        age = whole(input.age()),
        gender = gender,
        height = value(vitals.height, "cm"),
        weight = value(vitals.weight, "kg"),
        systolic = value(vitals.systolic, ""),
        diastolic = value(vitals.diastolic, ""),
        sugar = value(vitals.blood_sugar, ""),
        sleep = value(sleep, "h"),
        stress = stress,
        exercise = exercise,
        water = water,
        pregnancy = pregnancy,
    );

    Prompt {
        system: None,
        user,
        temperature: REPORT_TEMPERATURE,
        max_tokens: Some(REPORT_MAX_TOKENS),
    }
}

/// Short screening prompt used by the analyze endpoints. `data` is the request
/// body as received.
pub fn screening_prompt(profile: Profile, data: &impl Serialize) -> Prompt {
    let json = serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string());
    let lead = match profile {
        Profile::Adult => "Assess adult health risk from this data:",
        Profile::Pregnancy => "Assess maternal health risk from this pregnancy data:",
    };

    Prompt {
        system: Some(SCREENING_SYSTEM.to_string()),
        user: format!("{}\n{}\n{}", lead, json, SCREENING_KEYS),
        temperature: SCREENING_TEMPERATURE,
        max_tokens: None,
    }
}

fn value(v: f64, unit: &str) -> String {
    if v > 0.0 {
        format!("{}{}", v, unit)
    } else {
        "N/A".to_string()
    }
}

fn whole(v: u32) -> String {
    if v > 0 {
        v.to_string()
    } else {
        "N/A".to_string()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn gender_label(g: Gender) -> &'static str {
    match g {
        Gender::Male => "male",
        Gender::Female => "female",
        Gender::Other => "other",
    }
}
