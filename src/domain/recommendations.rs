//! Preventive lifestyle recommendations by disease and risk level.
//!
//! General advice bundled with the client. Not clinical prescriptions.

use super::{DiseaseType, RiskLevel};

type Bullets = &'static [&'static str];

struct DiseaseAdvice {
    low: Bullets,
    moderate: Bullets,
    high: Bullets,
    critical: Bullets,
}

const HEART: DiseaseAdvice = DiseaseAdvice {
    low: &[
        "Maintain a heart-healthy diet rich in vegetables, fruits, and whole grains.",
        "Aim for at least 150 minutes of moderate aerobic activity per week.",
        "Keep cholesterol and blood pressure within healthy ranges with routine checks.",
        "Avoid smoking and limit alcohol to moderate levels.",
    ],
    moderate: &[
        "Reduce saturated fat and sodium; focus on fiber and lean protein.",
        "Engage in 30 minutes of moderate cardio most days of the week.",
        "Schedule a follow-up with your doctor to review heart health markers.",
        "Monitor blood pressure regularly at home if advised.",
        "Limit alcohol and avoid smoking.",
    ],
    high: &[
        "Reduce daily sodium intake to under 1,500 mg.",
        "Engage in 30 minutes of moderate cardio 5x per week.",
        "Schedule a cardiology consultation within 2 weeks.",
        "Monitor blood pressure daily.",
        "Avoid smoking and limit alcohol consumption.",
    ],
    critical: &[
        "Seek prompt medical evaluation; do not delay care.",
        "Reduce sodium to under 1,500 mg and follow a strict heart-healthy diet.",
        "Only exercise as cleared by your cardiologist.",
        "Monitor blood pressure and symptoms daily; report any worsening.",
        "Avoid smoking entirely and eliminate or strictly limit alcohol.",
    ],
};

const DIABETES: DiseaseAdvice = DiseaseAdvice {
    low: &[
        "Choose whole grains and limit added sugars and refined carbs.",
        "Stay active with at least 150 minutes of moderate activity per week.",
        "Maintain a healthy weight and get routine blood glucose checks.",
        "Stay hydrated and prioritize consistent meal timing.",
    ],
    moderate: &[
        "Follow a balanced diet with controlled carbohydrate portions.",
        "Aim for 30 minutes of physical activity most days.",
        "Check blood sugar as advised by your care team.",
        "Schedule a diabetes care visit to review targets and lifestyle.",
        "Limit sugary drinks and processed snacks.",
    ],
    high: &[
        "Work with a dietitian on a personalized meal plan and carb management.",
        "Engage in regular physical activity as approved by your doctor.",
        "Monitor blood glucose as recommended; keep a log.",
        "Schedule a diabetes specialist visit within 2 weeks.",
        "Avoid smoking and limit alcohol; both affect glucose control.",
    ],
    critical: &[
        "Seek immediate medical guidance for blood sugar and medication review.",
        "Strictly follow your prescribed diet and medication plan.",
        "Do not start or change exercise without medical clearance.",
        "Monitor glucose and symptoms closely; report dizziness or confusion.",
        "Ensure someone close knows your condition and emergency steps.",
    ],
};

const HYPERTENSION: DiseaseAdvice = DiseaseAdvice {
    low: &[
        "Limit sodium and eat plenty of potassium-rich fruits and vegetables.",
        "Stay active with at least 150 minutes of moderate activity weekly.",
        "Have blood pressure checked at least once a year.",
        "Limit alcohol and avoid smoking.",
    ],
    moderate: &[
        "Reduce sodium to under 2,300 mg per day; aim for under 1,500 mg if advised.",
        "Get 30 minutes of moderate activity most days.",
        "Monitor blood pressure at home if your doctor recommends it.",
        "Schedule a follow-up to review lifestyle and medication needs.",
        "Limit caffeine and alcohol; avoid smoking.",
    ],
    high: &[
        "Reduce daily sodium intake to under 1,500 mg.",
        "Engage in 30 minutes of moderate cardio 5x per week.",
        "Schedule a cardiology or hypertension consultation within 2 weeks.",
        "Monitor blood pressure daily and keep a log.",
        "Avoid smoking and limit alcohol consumption.",
    ],
    critical: &[
        "Seek prompt medical care; do not delay evaluation.",
        "Restrict sodium strictly and take medications as prescribed.",
        "Only exercise as cleared by your doctor.",
        "Monitor blood pressure and symptoms daily; report chest pain or severe headache.",
        "Avoid smoking entirely and eliminate alcohol until medically cleared.",
    ],
};

const STROKE: DiseaseAdvice = DiseaseAdvice {
    low: &[
        "Maintain healthy blood pressure and blood sugar through diet and activity.",
        "Aim for 150 minutes of moderate aerobic activity per week.",
        "Avoid smoking and limit alcohol.",
        "Have routine check-ups to monitor vascular risk factors.",
    ],
    moderate: &[
        "Control blood pressure and blood sugar with lifestyle and any prescribed care.",
        "Get regular physical activity most days of the week.",
        "Schedule a follow-up to review stroke risk and prevention.",
        "Limit sodium and alcohol; avoid smoking.",
        "Know the signs of stroke (e.g. FAST) and when to call emergency services.",
    ],
    high: &[
        "Reduce sodium to under 1,500 mg and follow a heart- and brain-healthy diet.",
        "Engage in 30 minutes of moderate activity 5x per week if medically cleared.",
        "Schedule a neurology or vascular consultation within 2 weeks.",
        "Monitor blood pressure daily; take medications as prescribed.",
        "Avoid smoking and limit alcohol; know stroke warning signs.",
    ],
    critical: &[
        "Seek immediate medical evaluation; time is critical for stroke prevention and care.",
        "Strictly follow prescribed medications and diet for blood pressure and clotting.",
        "Do not start or change exercise without medical approval.",
        "Monitor blood pressure and report any sudden weakness, speech change, or vision loss.",
        "Ensure family or caregivers know stroke signs and your emergency plan.",
    ],
};

/// Ordered advice for a disease and risk level.
///
/// `Medium` is looked up as `Moderate`. Returns `None` when the table has no
/// entry for the combination.
#[must_use]
pub fn recommendations(disease: DiseaseType, level: RiskLevel) -> Option<&'static [&'static str]> {
    let advice = match disease {
        DiseaseType::Heart => &HEART,
        DiseaseType::Diabetes => &DIABETES,
        DiseaseType::Hypertension => &HYPERTENSION,
        DiseaseType::Stroke => &STROKE,
    };

    let bullets = match level.normalized() {
        RiskLevel::Low => advice.low,
        RiskLevel::Moderate | RiskLevel::Medium => advice.moderate,
        RiskLevel::High => advice.high,
        RiskLevel::Critical => advice.critical,
    };

    if bullets.is_empty() {
        None
    } else {
        Some(bullets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medium_matches_moderate() {
        for disease in DiseaseType::ALL {
            assert_eq!(
                recommendations(disease, RiskLevel::Medium),
                recommendations(disease, RiskLevel::Moderate)
            );
        }
    }

    #[test]
    fn test_every_combination_has_advice() {
        for disease in DiseaseType::ALL {
            for level in RiskLevel::CHART_ORDER {
                let bullets = recommendations(disease, level).expect("Should have advice");
                assert!(bullets.len() >= 4);
            }
        }
    }

    #[test]
    fn test_order_is_preserved() {
        let bullets = recommendations(DiseaseType::Heart, RiskLevel::High).unwrap();
        assert_eq!(bullets[0], "Reduce daily sodium intake to under 1,500 mg.");
        assert_eq!(bullets[2], "Schedule a cardiology consultation within 2 weeks.");
    }
}
