use ort::Error as OrtError;

use crate::model_manager::ModelError;

/// Represents the different types of errors that can occur while classifying a waste image.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// No model has been loaded into the handle, so inference was not attempted
    #[error("Model unavailable: no classifier has been loaded")]
    ModelUnavailable,
    /// The image could not be decoded or converted to the model's input format
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    /// The model produced a score index that has no entry in the label list
    #[error("Unknown label: model produced {num_scores} scores for {num_labels} labels (best index {index:?})")]
    UnknownLabel {
        index: Option<usize>,
        num_scores: usize,
        num_labels: usize,
    },
    /// The model artifact could not be fetched, read or loaded
    #[error("Model load failed: {0}")]
    ModelLoadFailed(String),
    /// Error occurred while running inference
    #[error("Prediction error: {0}")]
    PredictionError(String),
    /// Error occurred during the build phase
    #[error("Build error: {0}")]
    BuildError(String),
    /// Error occurred due to invalid configuration data
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelLoadFailed(err.to_string())
    }
}

impl From<ModelError> for ClassifierError {
    fn from(err: ModelError) -> Self {
        ClassifierError::ModelLoadFailed(err.to_string())
    }
}

impl From<image::ImageError> for ClassifierError {
    fn from(err: image::ImageError) -> Self {
        ClassifierError::InvalidImage(err.to_string())
    }
}
