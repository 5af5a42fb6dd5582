//! Imputation transformers for handling missing values.
//!
//! | Transformer | Description |
//! |-------------|-------------|
//! | [`SimpleImputer`] | Impute with the training-set mean of each column |

pub mod simple;

pub use simple::{FittedSimpleImputer, SimpleImputer, SimpleImputerParams};
