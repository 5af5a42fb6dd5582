/// A marker type indicating that a model is **not yet trained**.
///
/// This phantom type is used in generic parameters (e.g.,
/// `GradientBoostingClassifier<Unfitted>`) to enforce compile-time guarantees:
/// - `fit` is only available on an `Unfitted` model.
/// - Inference methods (`predict`) are **not available** until the model is
///   converted to `Fitted`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unfitted;

/// A marker type indicating that a model has been **fully trained**.
///
/// A `Fitted` model contains **only inference parameters** (the tree
/// ensemble and its base margin); it implements [`super::InferenceModel`] and
/// can be serialized.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fitted;
