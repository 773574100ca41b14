//! Per-disease input schemas and the feature vector built from them.
//!
//! Field names and order match the feature order the backend models were
//! trained on. Bounds are hints for the input control only; the backend is
//! the authority on what it accepts.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::DiseaseType;

/// A single numeric input of a prediction form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Feature name sent to the backend
    pub name: &'static str,
    /// Label shown next to the input
    pub label: &'static str,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub step: Option<f64>,
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            minimum: Some(0.0),
            maximum: None,
            step: None,
        }
    }

    const fn max(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    const fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    /// Human-readable range hint, e.g. `0-3` or `>= 0`.
    #[must_use]
    pub fn hint(&self) -> String {
        match (self.minimum, self.maximum) {
            (Some(min), Some(max)) => format!("{min}-{max}"),
            (Some(min), None) => format!(">= {min}"),
            (None, Some(max)) => format!("<= {max}"),
            (None, None) => "any number".to_string(),
        }
    }

    /// Whether `value` lies within the advisory bounds.
    #[must_use]
    pub fn in_range(&self, value: f64) -> bool {
        self.minimum.map_or(true, |min| value >= min) && self.maximum.map_or(true, |max| value <= max)
    }
}

const HEART_FIELDS: [FieldSpec; 13] = [
    FieldSpec::new("age", "Age").max(120.0),
    FieldSpec::new("sex", "Sex (0=F, 1=M)").max(1.0),
    FieldSpec::new("cp", "Chest pain type (0-3)").max(3.0),
    FieldSpec::new("trestbps", "Resting BP (mm Hg)"),
    FieldSpec::new("chol", "Cholesterol (mg/dl)"),
    FieldSpec::new("fbs", "Fasting blood sugar > 120 (0/1)").max(1.0),
    FieldSpec::new("restecg", "Rest ECG (0-2)").max(2.0),
    FieldSpec::new("thalach", "Max heart rate"),
    FieldSpec::new("exang", "Exercise angina (0/1)").max(1.0),
    FieldSpec::new("oldpeak", "ST depression").step(0.1),
    FieldSpec::new("slope", "Slope (0-2)").max(2.0),
    FieldSpec::new("ca", "Major vessels (0-3)").max(3.0),
    FieldSpec::new("thal", "Thal (0-3)").max(3.0),
];

const DIABETES_FIELDS: [FieldSpec; 8] = [
    FieldSpec::new("pregnancies", "Pregnancies"),
    FieldSpec::new("glucose", "Glucose"),
    FieldSpec::new("blood_pressure", "Blood pressure"),
    FieldSpec::new("skin_thickness", "Skin thickness"),
    FieldSpec::new("insulin", "Insulin"),
    FieldSpec::new("bmi", "BMI").step(0.1),
    FieldSpec::new("diabetes_pedigree_function", "Diabetes pedigree function").step(0.001),
    FieldSpec::new("age", "Age"),
];

const HYPERTENSION_FIELDS: [FieldSpec; 13] = [
    FieldSpec::new("age", "Age"),
    FieldSpec::new("sex", "Sex (0=F, 1=M)").max(1.0),
    FieldSpec::new("cp", "Chest pain (0-3)").max(3.0),
    FieldSpec::new("trestbps", "Resting BP"),
    FieldSpec::new("chol", "Cholesterol"),
    FieldSpec::new("fbs", "FBS > 120 (0/1)").max(1.0),
    FieldSpec::new("restecg", "Rest ECG (0-2)").max(2.0),
    FieldSpec::new("thalach", "Max heart rate"),
    FieldSpec::new("exang", "Exercise angina (0/1)").max(1.0),
    FieldSpec::new("oldpeak", "ST depression").step(0.1),
    FieldSpec::new("slope", "Slope (0-2)").max(2.0),
    FieldSpec::new("ca", "Major vessels (0-3)").max(3.0),
    FieldSpec::new("thal", "Thal (0-3)").max(3.0),
];

const STROKE_FIELDS: [FieldSpec; 10] = [
    FieldSpec::new("gender", "Gender (0=F, 1=M)").max(1.0),
    FieldSpec::new("age", "Age"),
    FieldSpec::new("hypertension", "Hypertension (0/1)").max(1.0),
    FieldSpec::new("heart_disease", "Heart disease (0/1)").max(1.0),
    FieldSpec::new("ever_married", "Ever married (0/1)").max(1.0),
    FieldSpec::new("work_type", "Work type (0-4)").max(4.0),
    FieldSpec::new("residence_type", "Residence type (0/1)").max(1.0),
    FieldSpec::new("avg_glucose_level", "Avg glucose level"),
    FieldSpec::new("bmi", "BMI").step(0.1),
    FieldSpec::new("smoking_status", "Smoking status (0-3)").max(3.0),
];

/// Ordered field list for a disease.
#[must_use]
pub fn schema_for(disease: DiseaseType) -> &'static [FieldSpec] {
    match disease {
        DiseaseType::Heart => &HEART_FIELDS,
        DiseaseType::Diabetes => &DIABETES_FIELDS,
        DiseaseType::Hypertension => &HYPERTENSION_FIELDS,
        DiseaseType::Stroke => &STROKE_FIELDS,
    }
}

/// Look up the schema for a raw disease identifier.
///
/// Returns `None` for identifiers that name no known disease.
#[must_use]
pub fn get_schema(disease: &str) -> Option<&'static [FieldSpec]> {
    DiseaseType::from_id(disease).map(schema_for)
}

/// Numeric inputs keyed by field name, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(&'static str, f64)>,
}

impl FeatureVector {
    /// One entry per field, all set to zero.
    #[must_use]
    pub fn zeroed(schema: &'static [FieldSpec]) -> Self {
        Self {
            entries: schema.iter().map(|field| (field.name, 0.0)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| *value)
    }

    /// Set an existing field. Returns `false` when the field is not part of the schema.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.entries.iter_mut().find(|(field, _)| *field == name) {
            Some(entry) => {
                entry.1 = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
