//! CSV input and output for labeled datasets and prediction tables.
//!
//! Columns are matched by header name, so any column order is accepted.
//! Empty cells and the usual missing-value tokens become NaN.

use super::LabeledDataset;
use crate::error::PotabilityError;
use crate::schema::{FEATURE_NAMES, LABEL_COLUMN, N_FEATURES, PREDICTION_COLUMN};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use ndarray::Array2;
use std::io::{Read, Write};
use tracing::warn;

/// Cell contents read as a missing value.
const MISSING_TOKENS: [&str; 6] = ["", "NA", "NaN", "nan", "N/A", "null"];

/// Parse one feature cell. Missing tokens give NaN; `None` means the cell is
/// neither missing nor a finite number.
fn parse_cell(text: &str) -> Option<f64> {
    let text = text.trim();
    if MISSING_TOKENS.contains(&text) {
        return Some(f64::NAN);
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Where each feature (and optionally the label) sits in a header row.
#[derive(Debug)]
struct ColumnMap {
    features: [usize; N_FEATURES],
    label: Option<usize>,
    extra: Vec<String>,
}

impl ColumnMap {
    /// Resolve columns by name. Missing or duplicated names are reported as
    /// plain messages so callers can pick the error kind.
    fn resolve(headers: &StringRecord, with_label: bool) -> Result<Self, String> {
        let mut features: [Option<usize>; N_FEATURES] = [None; N_FEATURES];
        let mut label = None;
        let mut extra = Vec::new();

        for (pos, name) in headers.iter().enumerate() {
            let name = name.trim();
            let slot = if let Some(idx) = FEATURE_NAMES.iter().position(|&f| f == name) {
                &mut features[idx]
            } else if with_label && name == LABEL_COLUMN {
                &mut label
            } else {
                extra.push(name.to_string());
                continue;
            };
            if slot.replace(pos).is_some() {
                return Err(format!("column `{name}` appears more than once"));
            }
        }

        let missing: Vec<&str> = FEATURE_NAMES
            .iter()
            .zip(features.iter())
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing columns: {}", missing.join(", ")));
        }
        if with_label && label.is_none() {
            return Err(format!("missing label column `{LABEL_COLUMN}`"));
        }

        Ok(Self {
            features: features.map(|pos| pos.unwrap_or_default()),
            label,
            extra,
        })
    }

    /// Feature values of one record in canonical order.
    fn features(&self, record: &StringRecord, row: usize) -> Result<[f64; N_FEATURES], String> {
        let mut values = [0.0; N_FEATURES];
        let columns = self.features.iter().zip(FEATURE_NAMES);
        for (slot, (&pos, name)) in values.iter_mut().zip(columns) {
            let text = record.get(pos).unwrap_or("");
            *slot = parse_cell(text)
                .ok_or_else(|| format!("row {row}, column `{name}`: {text:?} is not a number"))?;
        }
        Ok(values)
    }
}

fn reader<R: Read>(rdr: R) -> csv::Reader<R> {
    ReaderBuilder::new().has_headers(true).from_reader(rdr)
}

/// Read a labeled dataset. Every failure is a `DatasetLoad` error naming `origin`.
pub(crate) fn read_labeled<R: Read>(
    rdr: R,
    origin: &str,
) -> Result<LabeledDataset, PotabilityError> {
    let fail = |reason: String| PotabilityError::dataset(origin, reason);

    let mut rdr = reader(rdr);
    let headers = rdr.headers().map_err(|e| fail(e.to_string()))?.clone();
    let columns = ColumnMap::resolve(&headers, true).map_err(fail)?;
    if !columns.extra.is_empty() {
        warn!(origin, columns = ?columns.extra, "ignoring extra dataset columns");
    }
    let label_pos = columns.label.unwrap_or_default();

    let mut values = Vec::new();
    let mut labels = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| fail(e.to_string()))?;
        values.extend_from_slice(&columns.features(&record, row).map_err(fail)?);

        let text = record.get(label_pos).unwrap_or("").trim();
        let label = match text.parse::<f64>() {
            Ok(v) if v == 0.0 || v == 1.0 => v,
            _ => return Err(fail(format!("row {row}: label {text:?} must be 0 or 1"))),
        };
        labels.push(label);
    }

    if labels.is_empty() {
        return Err(fail("dataset has no rows".to_string()));
    }
    let features = Array2::from_shape_vec((labels.len(), N_FEATURES), values)
        .map_err(|e| fail(e.to_string()))?;
    LabeledDataset::new(features, labels)
}

/// A table of rows to classify, keeping the original cells for output.
#[derive(Clone, Debug)]
pub struct FeatureTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
    features: Array2<f64>,
}

impl FeatureTable {
    /// Parse a CSV table with exactly the nine feature columns, in any order.
    ///
    /// Missing, duplicated, unknown or non-numeric columns are a
    /// `SchemaMismatch`. Empty cells are kept as NaN for imputation.
    pub fn from_csv_reader<R: Read>(rdr: R) -> Result<Self, PotabilityError> {
        let mut rdr = reader(rdr);
        let headers = rdr
            .headers()
            .map_err(|e| PotabilityError::SchemaMismatch(e.to_string()))?
            .clone();
        let columns = ColumnMap::resolve(&headers, false)
            .map_err(PotabilityError::SchemaMismatch)?;
        if !columns.extra.is_empty() {
            return Err(PotabilityError::SchemaMismatch(format!(
                "unexpected columns: {}",
                columns.extra.join(", ")
            )));
        }

        let mut records = Vec::new();
        let mut values = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record
                .map_err(|e| PotabilityError::SchemaMismatch(e.to_string()))?;
            values.extend_from_slice(
                &columns
                    .features(&record, row)
                    .map_err(PotabilityError::SchemaMismatch)?,
            );
            records.push(record);
        }

        let features = Array2::from_shape_vec((records.len(), N_FEATURES), values)
            .map_err(|e| PotabilityError::SchemaMismatch(e.to_string()))?;
        Ok(Self {
            headers,
            records,
            features,
        })
    }

    /// Build a table from rows in canonical column order.
    pub fn from_rows(rows: &[[f64; N_FEATURES]]) -> Self {
        let headers = StringRecord::from(FEATURE_NAMES.to_vec());
        let records = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| {
                        if v.is_nan() {
                            String::new()
                        } else {
                            v.to_string()
                        }
                    })
                    .collect::<StringRecord>()
            })
            .collect();
        let features = Array2::from_shape_fn((rows.len(), N_FEATURES), |(i, j)| rows[i][j]);
        Self {
            headers,
            records,
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature matrix in canonical column order, NaN where missing.
    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Write the original table with one appended `Prediction` column.
    pub fn write_csv_with_predictions<W, S>(
        &self,
        wtr: W,
        predictions: &[S],
    ) -> Result<(), PotabilityError>
    where
        W: Write,
        S: AsRef<str>,
    {
        if predictions.len() != self.records.len() {
            return Err(PotabilityError::SchemaMismatch(format!(
                "{} predictions for {} rows",
                predictions.len(),
                self.records.len()
            )));
        }

        let mut wtr = WriterBuilder::new().from_writer(wtr);
        let mut header = self.headers.clone();
        header.push_field(PREDICTION_COLUMN);
        wtr.write_record(&header)?;
        for (record, prediction) in self.records.iter().zip(predictions) {
            let mut out = record.clone();
            out.push_field(prediction.as_ref());
            wtr.write_record(&out)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
