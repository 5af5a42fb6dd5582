use ndarray::Array2;
use potability::dataset::{FeatureTable, LabeledDataset};
use potability::schema::N_FEATURES;
use potability::PotabilityError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Value range of each feature, in canonical column order.
pub const RANGES: [(f64, f64); N_FEATURES] = [
    (0.0, 14.0),
    (50.0, 320.0),
    (300.0, 60000.0),
    (0.5, 13.0),
    (130.0, 480.0),
    (180.0, 750.0),
    (2.0, 28.0),
    (1.0, 124.0),
    (1.5, 6.7),
];

/// Columns with gaps in the public dataset: ph, Sulfate, Trihalomethanes.
const SPARSE_COLUMNS: [usize; 3] = [0, 4, 7];

/// Seeded generator of water samples.
///
/// A sample is labeled potable when ph lies in `[6.0, 9.0)` and Sulfate is
/// below 340. Cells in the sparse columns are dropped to NaN with
/// probability `missing_rate`.
#[derive(Debug, Clone)]
pub struct WaterSampler {
    rng: ChaCha8Rng,
    missing_rate: f64,
}

impl WaterSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            missing_rate: 0.1,
        }
    }

    /// Set the probability of a sparse cell being missing.
    pub fn missing_rate(mut self, rate: f64) -> Self {
        self.missing_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Draw one sample and its label.
    pub fn sample(&mut self) -> ([f64; N_FEATURES], f64) {
        let mut row = [0.0; N_FEATURES];
        for (value, &(lo, hi)) in row.iter_mut().zip(RANGES.iter()) {
            *value = self.rng.gen_range(lo..hi);
        }
        let potable = (6.0..9.0).contains(&row[0]) && row[4] < 340.0;
        for &j in &SPARSE_COLUMNS {
            if self.rng.gen_bool(self.missing_rate) {
                row[j] = f64::NAN;
            }
        }
        (row, if potable { 1.0 } else { 0.0 })
    }

    /// Draw `n` unlabeled rows.
    pub fn rows(&mut self, n: usize) -> Vec<[f64; N_FEATURES]> {
        (0..n).map(|_| self.sample().0).collect()
    }

    /// Draw `n` labeled samples.
    pub fn dataset(&mut self, n: usize) -> Result<LabeledDataset, PotabilityError> {
        let (rows, labels): (Vec<_>, Vec<_>) = (0..n).map(|_| self.sample()).unzip();
        let features = Array2::from_shape_fn((n, N_FEATURES), |(i, j)| rows[i][j]);
        LabeledDataset::new(features, labels)
    }

    /// Draw `n` rows as a batch-prediction table.
    pub fn table(&mut self, n: usize) -> FeatureTable {
        FeatureTable::from_rows(&self.rows(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_samples() {
        let a = WaterSampler::new(7).missing_rate(0.0).rows(20);
        let b = WaterSampler::new(7).missing_rate(0.0).rows(20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_values_within_ranges() {
        let rows = WaterSampler::new(1).missing_rate(0.0).rows(200);
        for row in rows {
            for (v, &(lo, hi)) in row.iter().zip(RANGES.iter()) {
                assert!(*v >= lo && *v < hi);
            }
        }
    }

    #[test]
    fn test_missing_cells_only_in_sparse_columns() {
        let rows = WaterSampler::new(3).missing_rate(0.5).rows(200);
        let mut n_missing = 0;
        for row in &rows {
            for (j, v) in row.iter().enumerate() {
                if v.is_nan() {
                    assert!(SPARSE_COLUMNS.contains(&j));
                    n_missing += 1;
                }
            }
        }
        assert!(n_missing > 0);
    }

    #[test]
    fn test_dataset_has_both_classes() {
        let dataset = WaterSampler::new(11).dataset(500).unwrap();
        assert_eq!(dataset.len(), 500);
        assert!(dataset.n_positive() > 0);
        assert!(dataset.n_positive() < 500);
    }

    #[test]
    fn test_table_shape() {
        let table = WaterSampler::new(5).table(12);
        assert_eq!(table.len(), 12);
        assert_eq!(table.features().ncols(), N_FEATURES);
    }
}
