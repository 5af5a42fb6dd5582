//! Feature scaling transformers.
//!
//! | Transformer | Formula |
//! |-------------|---------|
//! | [`StandardScaler`] | `z = (x - mean) / std` |

pub mod standard;

pub use standard::{
    FittedStandardScaler, StandardScaler, StandardScalerConfig, StandardScalerParams,
};
