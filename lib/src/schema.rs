//! The nine water-quality measurements and the binary potability label.
//!
//! Column order here is the canonical order of every feature matrix in the
//! crate: datasets, prediction tables and the fitted artifact all use it.

use crate::error::PotabilityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of feature columns.
pub const N_FEATURES: usize = 9;

/// Feature column names, in canonical order.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "ph",
    "Hardness",
    "Solids",
    "Chloramines",
    "Sulfate",
    "Conductivity",
    "Organic_carbon",
    "Trihalomethanes",
    "Turbidity",
];

/// Name of the label column in training data.
pub const LABEL_COLUMN: &str = "Potability";

/// Name of the column appended to batch prediction output.
pub const PREDICTION_COLUMN: &str = "Prediction";

/// Position of `name` in [`FEATURE_NAMES`], if it is a feature column.
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|&f| f == name)
}

/// One water sample with all nine measurements present.
///
/// Field names serialize to the dataset's column names, so the same struct
/// reads JSON bodies and form submissions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureRow {
    pub ph: f64,
    #[serde(rename = "Hardness")]
    pub hardness: f64,
    #[serde(rename = "Solids")]
    pub solids: f64,
    #[serde(rename = "Chloramines")]
    pub chloramines: f64,
    #[serde(rename = "Sulfate")]
    pub sulfate: f64,
    #[serde(rename = "Conductivity")]
    pub conductivity: f64,
    #[serde(rename = "Organic_carbon")]
    pub organic_carbon: f64,
    #[serde(rename = "Trihalomethanes")]
    pub trihalomethanes: f64,
    #[serde(rename = "Turbidity")]
    pub turbidity: f64,
}

impl Default for FeatureRow {
    /// The sample pre-filled in the prediction form.
    fn default() -> Self {
        Self {
            ph: 7.0,
            hardness: 100.0,
            solids: 10000.0,
            chloramines: 7.0,
            sulfate: 300.0,
            conductivity: 400.0,
            organic_carbon: 10.0,
            trihalomethanes: 70.0,
            turbidity: 4.0,
        }
    }
}

impl FeatureRow {
    /// Build a row from values in canonical column order.
    pub fn from_values(values: [f64; N_FEATURES]) -> Self {
        let [
            ph,
            hardness,
            solids,
            chloramines,
            sulfate,
            conductivity,
            organic_carbon,
            trihalomethanes,
            turbidity,
        ] = values;
        Self {
            ph,
            hardness,
            solids,
            chloramines,
            sulfate,
            conductivity,
            organic_carbon,
            trihalomethanes,
            turbidity,
        }
    }

    /// Values in canonical column order.
    pub fn to_values(&self) -> [f64; N_FEATURES] {
        [
            self.ph,
            self.hardness,
            self.solids,
            self.chloramines,
            self.sulfate,
            self.conductivity,
            self.organic_carbon,
            self.trihalomethanes,
            self.turbidity,
        ]
    }

    /// Build a row from `(column, text)` pairs such as submitted form fields.
    ///
    /// Every feature column must appear exactly once with a finite number;
    /// unknown names are rejected.
    pub fn from_named_fields<'a, I>(fields: I) -> Result<Self, PotabilityError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut values: [Option<f64>; N_FEATURES] = [None; N_FEATURES];
        for (name, text) in fields {
            let idx = feature_index(name).ok_or_else(|| {
                PotabilityError::SchemaMismatch(format!("unexpected field `{name}`"))
            })?;
            if values[idx].is_some() {
                return Err(PotabilityError::SchemaMismatch(format!(
                    "field `{name}` given more than once"
                )));
            }
            let value: f64 = text.trim().parse().map_err(|_| {
                PotabilityError::SchemaMismatch(format!("field `{name}` is not a number: {text:?}"))
            })?;
            values[idx] = Some(value);
        }

        let missing: Vec<&str> = FEATURE_NAMES
            .iter()
            .zip(values.iter())
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(PotabilityError::SchemaMismatch(format!(
                "missing fields: {}",
                missing.join(", ")
            )));
        }

        let row = Self::from_values(values.map(|v| v.unwrap_or(f64::NAN)));
        row.validate()?;
        Ok(row)
    }

    /// Reject NaN and infinite values; a single-row request must be complete.
    pub fn validate(&self) -> Result<(), PotabilityError> {
        for (name, value) in FEATURE_NAMES.iter().zip(self.to_values()) {
            if !value.is_finite() {
                return Err(PotabilityError::SchemaMismatch(format!(
                    "field `{name}` must be a finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Predicted class of a water sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Potability {
    Potable,
    NotPotable,
}

impl Potability {
    /// Decision threshold on the positive-class probability.
    pub const THRESHOLD: f64 = 0.5;

    /// Label for a positive-class probability.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= Self::THRESHOLD {
            Potability::Potable
        } else {
            Potability::NotPotable
        }
    }

    /// The class value used in the dataset's `Potability` column.
    pub fn as_class(&self) -> f64 {
        match self {
            Potability::Potable => 1.0,
            Potability::NotPotable => 0.0,
        }
    }

    /// Canonical label: `POTABLE` or `NOT_POTABLE`.
    pub fn label(&self) -> &'static str {
        match self {
            Potability::Potable => "POTABLE",
            Potability::NotPotable => "NOT_POTABLE",
        }
    }

    /// Human-readable text for display and CSV export.
    pub fn annotation(&self) -> &'static str {
        match self {
            Potability::Potable => "Potable",
            Potability::NotPotable => "Not Potable",
        }
    }
}

impl fmt::Display for Potability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_follow_canonical_order() {
        let row = FeatureRow::from_values([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(row.ph, 1.0);
        assert_eq!(row.turbidity, 9.0);
        assert_eq!(
            row.to_values(),
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]
        );
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("ph"), Some(0));
        assert_eq!(feature_index("Turbidity"), Some(8));
        assert_eq!(feature_index("pH"), None);
        assert_eq!(feature_index(LABEL_COLUMN), None);
    }

    #[test]
    fn test_from_named_fields_any_order() {
        let values = [
            "4.0", "70.0", "10.0", "400.0", "300.0", "7.0", "10000.0", "100.0", "7.0",
        ];
        let fields = FEATURE_NAMES.iter().rev().copied().zip(values);
        let row = FeatureRow::from_named_fields(fields).unwrap();
        assert_eq!(row, FeatureRow::default());
    }

    #[test]
    fn test_from_named_fields_missing_field() {
        let fields = FEATURE_NAMES[..8].iter().map(|&name| (name, "1.0"));
        let err = FeatureRow::from_named_fields(fields).unwrap_err();
        assert!(matches!(err, PotabilityError::SchemaMismatch(_)));
        assert!(err.to_string().contains("Turbidity"));
    }

    #[test]
    fn test_from_named_fields_rejects_text_and_unknown_names() {
        let mut fields: Vec<(&str, &str)> = FEATURE_NAMES.iter().map(|&n| (n, "1.0")).collect();
        fields[2].1 = "lots";
        assert!(matches!(
            FeatureRow::from_named_fields(fields.clone()),
            Err(PotabilityError::SchemaMismatch(_))
        ));

        fields[2].1 = "1.0";
        fields.push(("Colour", "3"));
        assert!(matches!(
            FeatureRow::from_named_fields(fields),
            Err(PotabilityError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let mut row = FeatureRow::default();
        row.sulfate = f64::NAN;
        assert!(row.validate().is_err());
        row.sulfate = f64::INFINITY;
        assert!(row.validate().is_err());
    }

    #[test]
    fn test_serialized_names_match_dataset_columns() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(FeatureRow::default()).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, FEATURE_NAMES.join(","));
    }

    #[test]
    fn test_potability_labels() {
        assert_eq!(Potability::from_probability(0.5), Potability::Potable);
        assert_eq!(Potability::from_probability(0.49), Potability::NotPotable);
        assert_eq!(Potability::Potable.to_string(), "POTABLE");
        assert_eq!(Potability::NotPotable.label(), "NOT_POTABLE");
        assert_eq!(Potability::NotPotable.annotation(), "Not Potable");
        assert_eq!(Potability::Potable.as_class(), 1.0);
    }
}
