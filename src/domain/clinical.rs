//! Clinical input types for heart disease risk prediction.
//!
//! Based on the 13 features of the UCI Cleveland heart disease dataset.

use serde::{Deserialize, Serialize};

/// Number of clinical features submitted per prediction.
pub const FEATURE_COUNT: usize = 13;

/// Wire names of the clinical features, in submission order.
pub const FIELD_NAMES: [&str; FEATURE_COUNT] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// Numeric clinical features for one prediction request.
///
/// Serializes to the exact JSON body expected by `POST /predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ClinicalInput {
    /// Age in years (20-100)
    pub age: f64,

    /// Sex: 0 = female, 1 = male
    pub sex: f64,

    /// Chest pain type: 0 = typical angina, 1 = atypical, 2 = non-anginal, 3 = asymptomatic
    pub cp: f64,

    /// Resting blood pressure in mmHg (90-200)
    pub trestbps: f64,

    /// Serum cholesterol in mg/dL (100-600)
    pub chol: f64,

    /// Fasting blood sugar > 120 mg/dL: 0 = false, 1 = true
    pub fbs: f64,

    /// Resting ECG: 0 = normal, 1 = ST-T abnormality, 2 = LV hypertrophy
    pub restecg: f64,

    /// Maximum heart rate achieved (60-220)
    pub thalach: f64,

    /// Exercise induced angina: 0 = no, 1 = yes
    pub exang: f64,

    /// ST depression induced by exercise relative to rest (0-10)
    pub oldpeak: f64,

    /// Slope of the peak exercise ST segment (0-2)
    pub slope: f64,

    /// Major vessels colored by fluoroscopy (0-3)
    pub ca: f64,

    /// Thalassemia: 0 = normal, 1 = fixed defect, 2 = reversible defect
    pub thal: f64,
}

/// Accepted range for one clinical feature.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub hint: &'static str,
    pub min: f64,
    pub max: f64,
    /// Whether only whole numbers are meaningful
    pub integer: bool,
}

/// Field metadata in submission order.
pub const FIELD_SPECS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec { name: "age", label: "Age", hint: "years (20-100)", min: 20.0, max: 100.0, integer: true },
    FieldSpec { name: "sex", label: "Sex", hint: "0=female, 1=male", min: 0.0, max: 1.0, integer: true },
    FieldSpec { name: "cp", label: "Chest Pain Type", hint: "0-3", min: 0.0, max: 3.0, integer: true },
    FieldSpec { name: "trestbps", label: "Resting Blood Pressure", hint: "mmHg (90-200)", min: 90.0, max: 200.0, integer: true },
    FieldSpec { name: "chol", label: "Cholesterol", hint: "mg/dL (100-600)", min: 100.0, max: 600.0, integer: true },
    FieldSpec { name: "fbs", label: "Fasting Blood Sugar", hint: "0=<=120, 1=>120 mg/dL", min: 0.0, max: 1.0, integer: true },
    FieldSpec { name: "restecg", label: "Resting ECG Results", hint: "0-2", min: 0.0, max: 2.0, integer: true },
    FieldSpec { name: "thalach", label: "Maximum Heart Rate", hint: "bpm (60-220)", min: 60.0, max: 220.0, integer: true },
    FieldSpec { name: "exang", label: "Exercise Induced Angina", hint: "0=no, 1=yes", min: 0.0, max: 1.0, integer: true },
    FieldSpec { name: "oldpeak", label: "ST Depression", hint: "0-10", min: 0.0, max: 10.0, integer: false },
    FieldSpec { name: "slope", label: "Slope of Peak Exercise", hint: "0-2", min: 0.0, max: 2.0, integer: true },
    FieldSpec { name: "ca", label: "Major Vessels", hint: "0-3", min: 0.0, max: 3.0, integer: true },
    FieldSpec { name: "thal", label: "Thalassemia", hint: "0-2", min: 0.0, max: 2.0, integer: true },
];

impl ClinicalInput {
    /// Convert features to a vector in submission order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.age,
            self.sex,
            self.cp,
            self.trestbps,
            self.chol,
            self.fbs,
            self.restecg,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.thal,
        ]
    }

    /// Create features from a vector in submission order.
    ///
    /// # Errors
    /// Returns error if vector length is not 13.
    pub fn from_vec(v: &[f64]) -> Result<Self, String> {
        if v.len() != FEATURE_COUNT {
            return Err(format!("Expected {FEATURE_COUNT} features, got {}", v.len()));
        }

        Ok(Self {
            age: v[0],
            sex: v[1],
            cp: v[2],
            trestbps: v[3],
            chol: v[4],
            fbs: v[5],
            restecg: v[6],
            thalach: v[7],
            exang: v[8],
            oldpeak: v[9],
            slope: v[10],
            ca: v[11],
            thal: v[12],
        })
    }

    /// Look up a feature by its wire name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FIELD_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.to_vec()[i])
    }

    /// Check every feature against the ranges the prediction service accepts.
    ///
    /// Submission does not require this; the service performs the same checks
    /// and answers with a remote error.
    ///
    /// # Errors
    /// Returns the list of out-of-range messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let errors: Vec<String> = FIELD_SPECS
            .iter()
            .zip(self.to_vec())
            .filter_map(|(spec, value)| {
                if !(spec.min..=spec.max).contains(&value) {
                    Some(format!(
                        "{} {} out of range [{}, {}]",
                        spec.label, value, spec.min, spec.max
                    ))
                } else if spec.integer && value.fract() != 0.0 {
                    Some(format!("{} {} must be a whole number", spec.label, value))
                } else {
                    None
                }
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClinicalInput {
        ClinicalInput {
            age: 63.0,
            sex: 1.0,
            cp: 3.0,
            trestbps: 145.0,
            chol: 233.0,
            fbs: 1.0,
            restecg: 0.0,
            thalach: 150.0,
            exang: 0.0,
            oldpeak: 2.3,
            slope: 0.0,
            ca: 0.0,
            thal: 1.0,
        }
    }

    #[test]
    fn test_vec_order_matches_field_names() {
        let input = sample();
        let v = input.to_vec();
        assert_eq!(v.len(), FEATURE_COUNT);
        assert_eq!(input.get("chol"), Some(233.0));
        assert_eq!(input.get("oldpeak"), Some(2.3));
        assert_eq!(input.get("unknown"), None);

        let back = ClinicalInput::from_vec(&v).expect("Should parse");
        assert_eq!(back, input);
        assert!(ClinicalInput::from_vec(&v[..12]).is_err());
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let json = serde_json::to_value(sample()).expect("Should serialize");
        let obj = json.as_object().expect("Object body");
        assert_eq!(obj.len(), FEATURE_COUNT);
        for name in FIELD_NAMES {
            assert!(obj.contains_key(name), "missing {name}");
        }
        assert_eq!(obj["age"], serde_json::json!(63.0));
    }

    #[test]
    fn test_validation_ranges() {
        assert!(sample().validate().is_ok());

        let invalid = ClinicalInput {
            age: 10.0,
            cp: 1.5,
            ..sample()
        };
        let errors = invalid.validate().expect_err("Should be invalid");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Age"));
        assert!(errors[1].contains("whole number"));
    }
}
