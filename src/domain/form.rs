//! Raw form input and numeric coercion.
//!
//! Values arrive as strings (typed by a user, or `key=value` pairs on the
//! command line) and must all be present and numeric before a request is made.

use zeroize::Zeroize;

use super::clinical::{ClinicalInput, FieldSpec, FEATURE_COUNT, FIELD_SPECS};

/// Local rejection of a form before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Fields left empty
    pub missing: Vec<&'static str>,
    /// Fields whose value is not a number
    pub invalid: Vec<&'static str>,
    /// Keys that do not name a clinical field
    pub unknown: Vec<String>,
}

impl ValidationError {
    /// Every field this error refers to, missing first.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        fields.extend(self.missing.iter().copied());
        fields.extend(self.invalid.iter().copied());
        fields.extend(self.unknown.iter().map(String::as_str));
        fields
    }

    /// User-facing description.
    #[must_use]
    pub fn message(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!(
                "Please fill in all fields. Missing: {}",
                self.missing.join(", ")
            ));
        }
        for name in &self.invalid {
            parts.push(format!("Invalid value for {name}. Please enter a valid number."));
        }
        if !self.unknown.is_empty() {
            parts.push(format!("Unknown field: {}", self.unknown.join(", ")));
        }
        parts.join(" ")
    }

    fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty() && self.unknown.is_empty()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ValidationError {}

/// One form field and its raw text.
#[derive(Debug, Clone)]
pub struct FormField {
    pub spec: FieldSpec,
    pub value: String,
}

/// The 13-field prediction form.
#[derive(Debug, Clone)]
pub struct PredictionForm {
    pub fields: Vec<FormField>,
}

impl Default for PredictionForm {
    fn default() -> Self {
        Self {
            fields: FIELD_SPECS
                .iter()
                .map(|spec| FormField {
                    spec: *spec,
                    value: String::new(),
                })
                .collect(),
        }
    }
}

impl PredictionForm {
    /// Build a form from `name=value` pairs.
    ///
    /// # Errors
    /// Returns a `ValidationError` listing keys that are not clinical fields.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut form = Self::default();
        form.apply_pairs(pairs)?;
        Ok(form)
    }

    /// Overwrite fields from `name=value` pairs.
    ///
    /// Known fields are set even when some keys are rejected.
    ///
    /// # Errors
    /// Returns a `ValidationError` listing keys that are not clinical fields.
    pub fn apply_pairs<'a, I>(&mut self, pairs: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut unknown = Vec::new();
        for (name, value) in pairs {
            if !self.set(name, value) {
                unknown.push(name.to_string());
            }
        }

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                missing: Vec::new(),
                invalid: Vec::new(),
                unknown,
            })
        }
    }

    /// Set a field's raw text. Returns false if `name` is not a field.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|f| f.spec.name == name) {
            Some(field) => {
                field.value.zeroize();
                field.value = value.trim().to_string();
                true
            }
            None => false,
        }
    }

    /// Raw text of a field.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.spec.name == name)
            .map(|f| f.value.as_str())
    }

    /// Coerce every field to a number.
    ///
    /// All empty fields are reported together; non-numeric fields are
    /// reported by name. No range checks happen here.
    ///
    /// # Errors
    /// Returns `ValidationError` if any field is empty or not a number.
    pub fn to_clinical_input(&self) -> Result<ClinicalInput, ValidationError> {
        let mut error = ValidationError {
            missing: Vec::new(),
            invalid: Vec::new(),
            unknown: Vec::new(),
        };
        let mut values = Vec::with_capacity(FEATURE_COUNT);

        for field in &self.fields {
            if field.value.is_empty() {
                error.missing.push(field.spec.name);
                continue;
            }
            match field.value.parse::<f64>() {
                Ok(v) if v.is_finite() => values.push(v),
                _ => error.invalid.push(field.spec.name),
            }
        }

        if !error.is_empty() {
            return Err(error);
        }

        ClinicalInput::from_vec(&values).map_err(|_| error)
    }

    /// Load a typical high-risk sample patient.
    pub fn load_sample_data(&mut self) {
        let sample = [
            "63",  // age
            "1",   // sex (male)
            "3",   // cp (asymptomatic)
            "145", // trestbps
            "233", // chol
            "1",   // fbs
            "0",   // restecg
            "150", // thalach
            "0",   // exang
            "2.3", // oldpeak
            "0",   // slope
            "0",   // ca
            "1",   // thal
        ];
        for (field, val) in self.fields.iter_mut().zip(sample) {
            field.value = val.to_string();
        }
    }

    /// Wipe all raw buffers.
    ///
    /// Called once a submission has been handed off so plaintext inputs do
    /// not linger in the form.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_form_parses() {
        let mut form = PredictionForm::default();
        form.load_sample_data();
        let input = form.to_clinical_input().expect("Should parse");
        assert!((input.age - 63.0).abs() < f64::EPSILON);
        assert!((input.oldpeak - 2.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reports_all_missing_fields() {
        let mut form = PredictionForm::default();
        form.load_sample_data();
        form.set("chol", "");
        form.set("thal", "  ");

        let err = form.to_clinical_input().expect_err("Should fail");
        assert_eq!(err.missing, vec!["chol", "thal"]);
        assert!(err.invalid.is_empty());
        assert_eq!(
            err.message(),
            "Please fill in all fields. Missing: chol, thal"
        );
    }

    #[test]
    fn test_rejects_non_numeric() {
        let mut form = PredictionForm::default();
        form.load_sample_data();
        form.set("age", "sixty");
        form.set("ca", "NaN");

        let err = form.to_clinical_input().expect_err("Should fail");
        assert_eq!(err.invalid, vec!["age", "ca"]);
        assert_eq!(err.fields(), vec!["age", "ca"]);
        assert!(err
            .message()
            .contains("Invalid value for age. Please enter a valid number."));
    }

    #[test]
    fn test_from_pairs_flags_unknown_keys() {
        let err = PredictionForm::from_pairs([("age", "50"), ("weight", "80")])
            .expect_err("Unknown key");
        assert_eq!(err.unknown, vec!["weight".to_string()]);

        let form = PredictionForm::from_pairs([("age", " 50 ")]).expect("Known key");
        assert_eq!(form.value("age"), Some("50"));
    }

    #[test]
    fn test_apply_pairs_overrides_sample() {
        let mut form = PredictionForm::default();
        form.load_sample_data();
        form.apply_pairs([("chol", "300")]).expect("Known key");
        assert_eq!(form.value("chol"), Some("300"));
        assert_eq!(form.value("age"), Some("63"));

        let err = form
            .apply_pairs([("bmi", "31"), ("age", "70")])
            .expect_err("Unknown key");
        assert_eq!(err.message(), "Unknown field: bmi");
        assert_eq!(form.value("age"), Some("70"));
    }

    #[test]
    fn test_clear_sensitive_wipes_values() {
        let mut form = PredictionForm::default();
        form.load_sample_data();
        form.clear_sensitive();
        assert!(form.fields.iter().all(|f| f.value.is_empty()));
    }
}
