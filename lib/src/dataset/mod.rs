//! Labeled training data and the tables fed to the predictor.
//!
//! - [`LabeledDataset`] holds a feature matrix in canonical column order plus
//!   0/1 labels, and knows how to split itself into training and holdout rows.
//! - [`FeatureTable`] holds rows to classify together with their original
//!   CSV cells, so results can be written back next to the input.
//!
//! # Example
//!
//! ```rust
//! use potability::dataset::LabeledDataset;
//!
//! let csv = "ph,Hardness,Solids,Chloramines,Sulfate,Conductivity,Organic_carbon,Trihalomethanes,Turbidity,Potability\n\
//!            7,100,10000,7,300,400,10,70,4,1\n\
//!            ,180,22000,6,,420,14,60,3.9,0\n";
//! let dataset = LabeledDataset::from_csv_reader(csv.as_bytes())?;
//! assert_eq!(dataset.len(), 2);
//! assert!(dataset.features()[[1, 0]].is_nan());
//! # Ok::<(), potability::PotabilityError>(())
//! ```

mod csv_io;

pub use self::csv_io::FeatureTable;

use crate::error::PotabilityError;
use crate::schema::N_FEATURES;
use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Feature matrix with one 0/1 label per row.
#[derive(Clone, Debug)]
pub struct LabeledDataset {
    features: Array2<f64>,
    labels: Vec<f64>,
}

impl LabeledDataset {
    /// Creates a dataset from a `(n_samples, 9)` matrix and matching labels.
    pub fn new(features: Array2<f64>, labels: Vec<f64>) -> Result<Self, PotabilityError> {
        if features.ncols() != N_FEATURES {
            return Err(PotabilityError::dataset(
                "in-memory",
                format!(
                    "expected {N_FEATURES} feature columns, got {}",
                    features.ncols()
                ),
            ));
        }
        if features.nrows() != labels.len() {
            return Err(PotabilityError::dataset(
                "in-memory",
                format!("{} rows but {} labels", features.nrows(), labels.len()),
            ));
        }
        Ok(Self { features, labels })
    }

    /// Loads a labeled CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, PotabilityError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let file = File::open(path)
            .map_err(|e| PotabilityError::dataset(&origin, e.to_string()))?;
        let dataset = csv_io::read_labeled(BufReader::new(file), &origin)?;
        info!(
            path = %origin,
            rows = dataset.len(),
            positive = dataset.n_positive(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Loads labeled CSV from any reader.
    pub fn from_csv_reader<R: std::io::Read>(rdr: R) -> Result<Self, PotabilityError> {
        csv_io::read_labeled(rdr, "reader")
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// Number of rows labeled 1.
    pub fn n_positive(&self) -> usize {
        self.labels.iter().filter(|&&y| y == 1.0).count()
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Seeded random split into `(train, test)`.
    ///
    /// The test partition holds `ceil(n * test_size)` rows: the first rows of
    /// a ChaCha8 shuffle of `0..n`. The same seed always yields the same split.
    pub fn train_test_split(
        &self,
        test_size: f64,
        seed: u64,
    ) -> Result<(Self, Self), PotabilityError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PotabilityError::dataset(
                "split",
                format!("test_size must be in (0, 1), got {test_size}"),
            ));
        }
        let n = self.len();
        let n_test = (n as f64 * test_size).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(PotabilityError::dataset(
                "split",
                format!("{n} rows cannot be split with test_size {test_size}"),
            ));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        let (test_idx, train_idx) = indices.split_at(n_test);

        info!(
            train = train_idx.len(),
            test = test_idx.len(),
            seed,
            "split dataset"
        );
        Ok((self.select(train_idx), self.select(test_idx)))
    }
}
