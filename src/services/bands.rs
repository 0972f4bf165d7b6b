use crate::services::patient::PatientInput;

/// Report bands: fixed prose and suggestions per severity tier.
/// Selection is most-severe-first and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    AdultHighPriority,
    AdultModerate,
    AdultStable,
    PregnancyHighPriority,
    PregnancyLateStage,
    PregnancyStable,
}

/// Gestational week from which the third-trimester band applies.
pub const LATE_STAGE_WEEK: u32 = 28;

impl Band {
    pub fn select(input: &PatientInput) -> Self {
        let vitals = input.vitals();
        let acute = vitals.bp_elevated() || vitals.sugar_elevated() || vitals.stress_high();

        match input {
            PatientInput::GeneralAdult(_) => {
                let bmi = vitals.bmi();
                if bmi >= 30.0 || acute {
                    Self::AdultHighPriority
                } else if bmi >= 25.0 {
                    Self::AdultModerate
                } else {
                    Self::AdultStable
                }
            }
            PatientInput::PregnantWoman(p) => {
                if p.history_high_risk_pregnancy || acute {
                    Self::PregnancyHighPriority
                } else if p.gestational_age_weeks >= LATE_STAGE_WEEK {
                    Self::PregnancyLateStage
                } else {
                    Self::PregnancyStable
                }
            }
        }
    }

    pub fn report(&self) -> &'static str {
        match self {
            Self::AdultHighPriority => ADULT_HIGH_PRIORITY,
            Self::AdultModerate => ADULT_MODERATE,
            Self::AdultStable => ADULT_STABLE,
            Self::PregnancyHighPriority => PREGNANCY_HIGH_PRIORITY,
            Self::PregnancyLateStage => PREGNANCY_LATE_STAGE,
            Self::PregnancyStable => PREGNANCY_STABLE,
        }
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            Self::AdultHighPriority => &[
                "Schedule blood pressure and blood sugar reassessment within 2 weeks to confirm trend direction.",
                "Start a supervised weekly activity and nutrition plan with realistic adherence targets.",
                "Use daily sleep and stress logs to identify triggers and improve routine stability.",
                "Set a 30-day prevention review with updated vitals, weight, and lifestyle metrics.",
            ],
            Self::AdultModerate => &[
                "Implement a 4-week moderate-intensity exercise schedule with progressive weekly goals.",
                "Track blood pressure, blood sugar, and weight weekly and document trend changes.",
                "Set clear sleep and hydration targets and review adherence at the end of each week.",
            ],
            Self::AdultStable => &[
                "Continue monthly prevention check-ins with updated vitals and lifestyle metrics.",
                "Maintain current sleep, activity, and hydration routines with weekly self-tracking.",
                "Escalate clinical review promptly if blood pressure, sugar, or stress patterns worsen.",
            ],
            Self::PregnancyHighPriority => &[
                "Arrange high-priority obstetric follow-up and monitor blood pressure and glucose closely.",
                "Use daily symptom tracking with clear escalation rules for warning signs.",
                "Strengthen hydration, sleep, and stress-management routines with caregiver support.",
                "Review prior high-risk history factors and update the maternal care plan this week.",
            ],
            Self::PregnancyLateStage => &[
                "Maintain weekly prenatal checks focused on blood pressure and glucose trends.",
                "Track hydration, sleep quality, and fetal movement daily with simple logs.",
                "Report any sudden swelling, headache, or reduced fetal movement immediately.",
            ],
            Self::PregnancyStable => &[
                "Continue routine prenatal follow-up and recommended screening schedule.",
                "Sustain hydration, nutrition balance, and sleep consistency every day.",
                "Monitor blood pressure and sugar regularly and report notable shifts early.",
            ],
        }
    }
}

const ADULT_HIGH_PRIORITY: &str = "Clinical Summary:
Current measurements indicate multiple elevated prevention markers, including metabolic or cardiovascular stress indicators that can compound over time if not managed early. Blood pressure and blood sugar trends suggest a need for closer short-interval monitoring, while lifestyle load and stress profile increase the probability of progression toward chronic risk states.

Risk Interpretation:
This pattern aligns with a high-priority prevention category, not because a diagnosis is confirmed, but because several risk dimensions are active at once. The combination of physiologic readings and behavioral factors increases near-term vulnerability to fatigue, reduced functional wellbeing, and long-term cardiometabolic burden if no intervention plan is put in place.

Prevention Roadmap:
A structured plan should focus first on stabilization: consistent sleep routine, meal timing, hydration, and low-impact activity progression. Clinical follow-up should reassess blood pressure and glucose promptly, then track trend response every 2 to 4 weeks. Practical stress regulation, daily adherence tracking, and targeted clinician coaching are recommended to sustain risk reduction.";

const ADULT_MODERATE: &str = "Clinical Summary:
The profile shows moderate prevention burden with early warning indicators in weight and lifestyle-linked factors. Current values do not indicate the highest risk tier, but they suggest a trajectory that can shift unfavorably without deliberate habit correction and routine monitoring.

Risk Interpretation:
This pattern is consistent with a medium prevention category where timely behavior change has high impact. The objective is to prevent escalation by stabilizing nutrition quality, activity consistency, and sleep adequacy before physiologic markers worsen.

Prevention Roadmap:
A focused four-week routine should include moderate exercise frequency, hydration targets, and improved sleep regularity. Trend tracking for blood pressure, blood sugar, and weight should continue at least weekly. Reinforcement through coaching or accountability tools can improve consistency and lower long-term risk accumulation.";

const ADULT_STABLE: &str = "Clinical Summary:
The current data indicates a stable baseline prevention profile with no dominant high-risk cluster. Vitals and lifestyle factors appear generally balanced, supporting a low immediate prevention burden.

Risk Interpretation:
Even with a stable profile, prevention focus should remain active because risk can increase when sleep, stress, activity, or nutrition patterns drift over time. Early detection and routine monitoring remain essential for preserving long-term health trajectory.

Prevention Roadmap:
Continue structured self-monitoring, maintain present lifestyle habits, and complete periodic reassessment. Reinforce consistency in activity, sleep duration, hydration, and nutrition quality. If new symptoms or metric shifts appear, escalate review promptly to avoid delayed intervention.";

const PREGNANCY_HIGH_PRIORITY: &str = "Clinical Summary:
Maternal indicators show a high-priority prevention pattern requiring tighter follow-up. Blood pressure or glucose elevation, high stress load, or prior high-risk history introduces compounded maternal and fetal monitoring needs. The profile warrants proactive care coordination rather than routine-only observation.

Risk Interpretation:
This is a precautionary high-risk prevention category where early action can reduce complications. Without close monitoring, risk of adverse maternal trends may increase in later gestation, especially when physiologic strain and behavioral stress are both present.

Prevention Roadmap:
Care should shift to short-interval review, including blood pressure and glucose trend checks, symptom surveillance, and strict hydration and rest routines. Obstetric team coordination should be prioritized this week, with defined escalation thresholds for concerning symptoms. A structured daily adherence plan is recommended to improve stability and reduce uncertainty.";

const PREGNANCY_LATE_STAGE: &str = "Clinical Summary:
The current profile reflects a later-stage pregnancy monitoring context with moderate prevention needs. While values are not in the highest concern range, third-trimester progression requires more consistent trend surveillance and adherence to maternal wellness routines.

Risk Interpretation:
Risk is moderate due to gestational stage and the natural increase in physiologic demand. Prevention priorities are centered on early detection of trend shifts in blood pressure, glucose, hydration, and rest quality.

Prevention Roadmap:
Maintain weekly prenatal monitoring, reinforce daily hydration and sleep targets, and track fetal movement consistently. The care approach should emphasize steady routine adherence and rapid reporting of any symptom change. Continued preventative coaching can help keep the pregnancy course stable through delivery planning.";

const PREGNANCY_STABLE: &str = "Clinical Summary:
Maternal data currently appears stable with no dominant high-risk signal. Routine prenatal prevention monitoring remains appropriate, and present metrics support continued standard surveillance.

Risk Interpretation:
Current prevention risk is low to moderate, but ongoing physiologic changes during pregnancy require consistent observation. Small trend shifts can become clinically meaningful, so continuity in monitoring remains important.

Prevention Roadmap:
Continue scheduled prenatal visits, maintain hydration and balanced nutrition, and preserve sleep consistency as a daily target. Keep regular blood pressure and glucose checks according to care guidance. Promptly escalate review if new symptoms or measurable trend changes are detected.";
