use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Patient record submitted from one of the two assessment forms.
///
/// The `assessmentType` tag selects the profile. Every numeric field is decoded
/// leniently: absent, null, non-numeric or non-finite values become 0, so a record
/// always reaches the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "assessmentType", rename_all = "snake_case")]
pub enum PatientInput {
    #[serde(alias = "adult", alias = "general")]
    GeneralAdult(AdultInput),
    #[serde(alias = "pregnant", alias = "pregnancy")]
    PregnantWoman(PregnancyInput),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "AdultWire")]
pub struct AdultInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub age: u32,
    pub gender: Option<Gender>,
    pub height: f64, // cm
    pub weight: f64, // kg
    pub blood_pressure_systolic: f64,
    pub blood_pressure_diastolic: f64,
    pub blood_sugar: f64, // mg/dL
    pub sleep_hours: f64,
    pub exercise_days_per_week: u32,
    pub stress_level: Option<StressLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PregnancyWire")]
pub struct PregnancyInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub age: u32,
    pub height: f64,
    pub weight: f64,
    pub gestational_age_weeks: u32,
    pub first_pregnancy: bool,
    pub history_high_risk_pregnancy: bool,
    pub blood_pressure_systolic: f64,
    pub blood_pressure_diastolic: f64,
    pub blood_sugar: f64,
    pub sleep_hours: f64,
    pub water_intake_liters_per_day: f64,
    pub stress_level: Option<StressLevel>,
}

// Raw form fields under every spelling the forms have sent. Each canonical
// name and its older spellings are separate keys here, so a record carrying
// both decodes instead of tripping serde's duplicate-field check; the
// canonical key wins when both hold a value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AdultWire {
    full_name: Option<Value>,
    age: Option<Value>,
    gender: Option<Value>,
    height: Option<Value>,
    weight: Option<Value>,
    blood_pressure_systolic: Option<Value>,
    blood_pressure: Option<Value>,
    blood_pressure_diastolic: Option<Value>,
    blood_sugar: Option<Value>,
    sleep_hours: Option<Value>,
    sleep: Option<Value>,
    exercise_days_per_week: Option<Value>,
    exercise_days: Option<Value>,
    exercise: Option<Value>,
    stress_level: Option<Value>,
    stress: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PregnancyWire {
    full_name: Option<Value>,
    age: Option<Value>,
    height: Option<Value>,
    weight: Option<Value>,
    gestational_age_weeks: Option<Value>,
    gestational_age: Option<Value>,
    weeks: Option<Value>,
    first_pregnancy: Option<Value>,
    history_high_risk_pregnancy: Option<Value>,
    blood_pressure_systolic: Option<Value>,
    blood_pressure: Option<Value>,
    blood_pressure_diastolic: Option<Value>,
    blood_sugar: Option<Value>,
    sleep_hours: Option<Value>,
    sleep: Option<Value>,
    water_intake_liters_per_day: Option<Value>,
    water_intake: Option<Value>,
    stress_level: Option<Value>,
    stress: Option<Value>,
}

impl From<AdultWire> for AdultInput {
    fn from(w: AdultWire) -> Self {
        Self {
            full_name: lenient::text(w.full_name),
            age: lenient::whole(w.age),
            gender: lenient::gender(w.gender),
            height: lenient::number(w.height),
            weight: lenient::number(w.weight),
            blood_pressure_systolic: lenient::number(w.blood_pressure_systolic.or(w.blood_pressure)),
            blood_pressure_diastolic: lenient::number(w.blood_pressure_diastolic),
            blood_sugar: lenient::number(w.blood_sugar),
            sleep_hours: lenient::number(w.sleep_hours.or(w.sleep)),
            exercise_days_per_week: lenient::whole(
                w.exercise_days_per_week.or(w.exercise_days).or(w.exercise),
            ),
            stress_level: lenient::stress(w.stress_level.or(w.stress)),
        }
    }
}

impl From<PregnancyWire> for PregnancyInput {
    fn from(w: PregnancyWire) -> Self {
        Self {
            full_name: lenient::text(w.full_name),
            age: lenient::whole(w.age),
            height: lenient::number(w.height),
            weight: lenient::number(w.weight),
            gestational_age_weeks: lenient::whole(
                w.gestational_age_weeks.or(w.gestational_age).or(w.weeks),
            ),
            first_pregnancy: lenient::flag(w.first_pregnancy),
            history_high_risk_pregnancy: lenient::flag(w.history_high_risk_pregnancy),
            blood_pressure_systolic: lenient::number(w.blood_pressure_systolic.or(w.blood_pressure)),
            blood_pressure_diastolic: lenient::number(w.blood_pressure_diastolic),
            blood_sugar: lenient::number(w.blood_sugar),
            sleep_hours: lenient::number(w.sleep_hours.or(w.sleep)),
            water_intake_liters_per_day: lenient::number(
                w.water_intake_liters_per_day.or(w.water_intake),
            ),
            stress_level: lenient::stress(w.stress_level.or(w.stress)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

impl StressLevel {
    /// Map the 1-5 slider used by the newer forms onto the three named levels.
    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            1 | 2 => Some(Self::Low),
            3 => Some(Self::Medium),
            4 | 5 => Some(Self::High),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "very low" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Medium),
            "high" | "very high" => Some(Self::High),
            other => other.parse::<i64>().ok().and_then(Self::from_ordinal),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Which form the record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Adult,
    Pregnancy,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adult => "adult",
            Self::Pregnancy => "pregnant",
        }
    }
}

/// Measurements shared by both profiles, with the threshold checks the
/// engine and the report bands agree on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    pub height: f64,
    pub weight: f64,
    pub systolic: f64,
    pub diastolic: f64,
    pub blood_sugar: f64,
    pub stress: Option<StressLevel>,
}

impl Vitals {
    pub fn bmi(&self) -> f64 {
        bmi(self.height, self.weight)
    }

    pub fn bp_elevated(&self) -> bool {
        self.systolic >= 140.0 || self.diastolic >= 90.0
    }

    pub fn bp_borderline(&self) -> bool {
        self.systolic >= 130.0 || self.diastolic >= 85.0
    }

    pub fn sugar_elevated(&self) -> bool {
        self.blood_sugar >= 126.0
    }

    pub fn sugar_borderline(&self) -> bool {
        self.blood_sugar >= 100.0
    }

    pub fn stress_high(&self) -> bool {
        self.stress == Some(StressLevel::High)
    }
}

/// Body-mass index from height in centimetres and weight in kilograms.
/// A non-positive height yields 0 rather than infinity.
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    if height_cm > 0.0 {
        let height_m = height_cm / 100.0;
        weight_kg / (height_m * height_m)
    } else {
        0.0
    }
}

impl PatientInput {
    pub fn profile(&self) -> Profile {
        match self {
            Self::GeneralAdult(_) => Profile::Adult,
            Self::PregnantWoman(_) => Profile::Pregnancy,
        }
    }

    pub fn vitals(&self) -> Vitals {
        match self {
            Self::GeneralAdult(a) => Vitals {
                height: a.height,
                weight: a.weight,
                systolic: a.blood_pressure_systolic,
                diastolic: a.blood_pressure_diastolic,
                blood_sugar: a.blood_sugar,
                stress: a.stress_level,
            },
            Self::PregnantWoman(p) => Vitals {
                height: p.height,
                weight: p.weight,
                systolic: p.blood_pressure_systolic,
                diastolic: p.blood_pressure_diastolic,
                blood_sugar: p.blood_sugar,
                stress: p.stress_level,
            },
        }
    }

    pub fn age(&self) -> u32 {
        match self {
            Self::GeneralAdult(a) => a.age,
            Self::PregnantWoman(p) => p.age,
        }
    }

    pub fn full_name(&self) -> Option<&str> {
        match self {
            Self::GeneralAdult(a) => a.full_name.as_deref(),
            Self::PregnantWoman(p) => p.full_name.as_deref(),
        }
    }

    /// Wire name of the assessment type, as the forms send it.
    pub fn assessment_type(&self) -> &'static str {
        match self {
            Self::GeneralAdult(_) => "general_adult",
            Self::PregnantWoman(_) => "pregnant_woman",
        }
    }
}

/// Field decoders that never reject a value. An absent or null field
/// arrives as `None`.
pub(crate) mod lenient {
    use super::{Gender, StressLevel};
    use serde_json::Value;

    pub fn as_number(value: &Value) -> f64 {
        let n = match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        };
        if n.is_finite() {
            n
        } else {
            0.0
        }
    }

    pub fn number(value: Option<Value>) -> f64 {
        value.as_ref().map(as_number).unwrap_or(0.0)
    }

    // Truncates toward zero so integer thresholds (age 60, week 28) compare
    // the same way they would on the raw float.
    pub fn whole(value: Option<Value>) -> u32 {
        let n = number(value);
        if n <= 0.0 {
            0
        } else {
            n.min(u32::MAX as f64) as u32
        }
    }

    pub fn flag(value: Option<Value>) -> bool {
        match value {
            Some(Value::Bool(b)) => b,
            Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "yes" | "y" | "true" | "1"
            ),
            _ => false,
        }
    }

    pub fn stress(value: Option<Value>) -> Option<StressLevel> {
        match value? {
            Value::String(s) => StressLevel::parse(&s),
            Value::Number(n) => n
                .as_f64()
                .filter(|n| n.fract() == 0.0)
                .and_then(|n| StressLevel::from_ordinal(n as i64)),
            _ => None,
        }
    }

    pub fn gender(value: Option<Value>) -> Option<Gender> {
        match value? {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" => None,
                "male" | "m" => Some(Gender::Male),
                "female" | "f" => Some(Gender::Female),
                _ => Some(Gender::Other),
            },
            _ => None,
        }
    }

    pub fn text(value: Option<Value>) -> Option<String> {
        match value? {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        /// Form fields of any shape decode; bad values only zero the field
        #[test]
        fn any_field_values_decode(
            height in any::<String>(),
            weight in any::<f64>(),
            weeks in any::<i64>(),
            stress in any::<i64>(),
            history in any::<String>()
        ) {
            let result: Result<PatientInput, _> = serde_json::from_value(json!({
                "assessmentType": "pregnant_woman",
                "height": height,
                "weight": weight,
                "weeks": weeks,
                "gestationalAge": weeks,
                "stress": stress,
                "stressLevel": stress,
                "historyHighRiskPregnancy": history
            }));
            prop_assert!(result.is_ok(), "rejected: {:?}", result.err());
            let vitals = result.expect("checked above").vitals();
            prop_assert!(vitals.height.is_finite());
            prop_assert!(vitals.weight.is_finite());
        }
    }
}
