//! The impute → scale → classify pipeline and its on-disk artifact.
//!
//! [`Pipeline`] holds the three unfitted stages; fitting it yields a
//! [`FittedPipeline`], the only thing the predictor ever needs. The artifact
//! is the fitted pipeline's parameters behind a magic tag and format version:
//!
//! ```text
//! b"H2OP" | bincode(ArtifactParams { format_version, feature_names, imputer, scaler, model })
//! ```

use crate::error::PotabilityError;
use crate::model::{BoostingConfig, GbdtParams, GradientBoostingClassifier, InferenceModel};
use crate::model::{Fitted, Unfitted};
use crate::preprocessing::{
    FittedSimpleImputer, FittedStandardScaler, FittedTransformer, PreprocessingError,
    SimpleImputer, SimpleImputerParams, StandardScaler, StandardScalerParams, Transformer,
};
use crate::schema::{FEATURE_NAMES, N_FEATURES};
use crate::serialization::SerializableParams;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Leading bytes of every artifact file.
pub const ARTIFACT_MAGIC: [u8; 4] = *b"H2OP";

/// Artifact layout version written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Serializable envelope for a fitted pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactParams {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub imputer: SimpleImputerParams,
    pub scaler: StandardScalerParams,
    pub model: GbdtParams,
}

/// Unfitted pipeline: mean imputation, standardization, boosted trees.
#[derive(Clone, Debug)]
pub struct Pipeline {
    imputer: SimpleImputer,
    scaler: StandardScaler,
    model: GradientBoostingClassifier<Unfitted>,
}

impl Pipeline {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            imputer: SimpleImputer::new(),
            scaler: StandardScaler::new(),
            model: GradientBoostingClassifier::new(config),
        }
    }

    /// Fit every stage in order on the training rows only.
    ///
    /// `x` must be in canonical column order; NaN marks a missing value.
    pub fn fit(self, x: &Array2<f64>, y: &[f64]) -> Result<FittedPipeline, PotabilityError> {
        if x.ncols() != N_FEATURES {
            return Err(PotabilityError::SchemaMismatch(format!(
                "expected {N_FEATURES} feature columns, got {}",
                x.ncols()
            )));
        }

        let imputer = self.imputer.fit(x)?;
        let imputed = imputer.transform(x)?;
        debug!(statistics = ?imputer.statistics().to_vec(), "fitted mean imputer");

        let scaler = self.scaler.fit(&imputed)?;
        let scaled = scaler.transform(&imputed)?;
        debug!(
            mean = ?scaler.mean().to_vec(),
            std = ?scaler.std().to_vec(),
            "fitted standard scaler"
        );

        let model = self.model.fit(&scaled, y)?;

        Ok(FittedPipeline {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            imputer,
            scaler,
            model,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(BoostingConfig::default())
    }
}

/// The fitted imputer, scaler and classifier, applied together.
#[derive(Clone, Debug)]
pub struct FittedPipeline {
    feature_names: Vec<String>,
    imputer: FittedSimpleImputer,
    scaler: FittedStandardScaler,
    model: GradientBoostingClassifier<Fitted>,
}

impl FittedPipeline {
    /// Column names the pipeline was fitted on, in order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features_in(&self) -> usize {
        self.feature_names.len()
    }

    pub fn imputer(&self) -> &FittedSimpleImputer {
        &self.imputer
    }

    pub fn scaler(&self) -> &FittedStandardScaler {
        &self.scaler
    }

    pub fn model(&self) -> &GradientBoostingClassifier<Fitted> {
        &self.model
    }

    /// Impute then scale, using training-time statistics.
    pub fn preprocess(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError> {
        let imputed = self.imputer.transform(data)?;
        self.scaler.transform(&imputed)
    }

    /// Positive class probability for each row.
    pub fn predict_proba(&self, data: &Array2<f64>) -> Result<Array1<f64>, PotabilityError> {
        let cols = data.ncols();
        if cols != self.n_features_in() {
            return Err(PotabilityError::SchemaMismatch(format!(
                "expected {} feature columns, got {cols}",
                self.n_features_in()
            )));
        }
        let processed = self.preprocess(data)?;
        Ok(self.model.predict_batch(&processed))
    }

    pub fn extract_params(&self) -> ArtifactParams {
        ArtifactParams {
            format_version: FORMAT_VERSION,
            feature_names: self.feature_names.clone(),
            imputer: self.imputer.extract_params(),
            scaler: self.scaler.extract_params(),
            model: self.model.extract_params(),
        }
    }

    /// Rebuild from parameters, checking they describe this crate's schema.
    pub fn from_params(params: ArtifactParams) -> Result<Self, String> {
        if params.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                params.format_version
            ));
        }
        let names = params.feature_names.iter().map(String::as_str);
        if names.ne(FEATURE_NAMES) {
            return Err(format!(
                "artifact was fitted on columns [{}], expected [{}]",
                params.feature_names.join(", "),
                FEATURE_NAMES.join(", ")
            ));
        }

        let imputer =
            FittedSimpleImputer::from_params(params.imputer).map_err(|e| e.to_string())?;
        let scaler =
            FittedStandardScaler::from_params(params.scaler).map_err(|e| e.to_string())?;
        let model =
            GradientBoostingClassifier::from_params(params.model).map_err(|e| e.to_string())?;

        let n = params.feature_names.len();
        if imputer.n_features_in() != n || scaler.n_features_in() != n || model.n_features() != n {
            return Err(format!(
                "stage widths {}, {}, {} do not match {n} feature names",
                imputer.n_features_in(),
                scaler.n_features_in(),
                model.n_features()
            ));
        }

        Ok(Self {
            feature_names: params.feature_names,
            imputer,
            scaler,
            model,
        })
    }

    /// Encode as artifact bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        let mut bytes = ARTIFACT_MAGIC.to_vec();
        bytes.extend(self.extract_params().to_bytes()?);
        Ok(bytes)
    }

    /// Decode artifact bytes. Errors are plain messages; [`FittedPipeline::load`]
    /// attaches the path.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let body = bytes
            .strip_prefix(&ARTIFACT_MAGIC[..])
            .ok_or_else(|| "not a potability artifact (bad magic)".to_string())?;
        // format_version is the first field of the envelope.
        let version: u32 =
            bincode::deserialize(body).map_err(|e| format!("truncated header: {e}"))?;
        if version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {version} (expected {FORMAT_VERSION})"
            ));
        }
        let params =
            ArtifactParams::from_bytes(body).map_err(|e| format!("decode failed: {e}"))?;
        Self::from_params(params)
    }

    /// Write the artifact, replacing any existing file atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PotabilityError> {
        let path = path.as_ref();
        let save_err = |reason: String| PotabilityError::ArtifactSave {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = self.to_bytes().map_err(|e| save_err(e.to_string()))?;
        let tmp = temp_path(path);
        fs::write(&tmp, &bytes).map_err(|e| save_err(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            save_err(e.to_string())
        })?;

        info!(
            path = %path.display(),
            bytes = bytes.len(),
            trees = self.model.trees().len(),
            "saved artifact"
        );
        Ok(())
    }

    /// Read and validate an artifact file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PotabilityError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| PotabilityError::artifact_load(path, e))?;
        let pipeline =
            Self::from_bytes(&bytes).map_err(|e| PotabilityError::artifact_load(path, e))?;
        info!(path = %path.display(), trees = pipeline.model.trees().len(), "loaded artifact");
        Ok(pipeline)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
