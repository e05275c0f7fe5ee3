use std::path::PathBuf;

use crate::models::TensorLayout;

mod error;
mod catalog;
mod classifier;
mod handle;
mod preprocess;
mod scorer;
pub mod builder;
mod utils;

pub use error::ClassifierError;
pub use catalog::{BuiltinCatalog, Catalog, CategoryDefinition};
pub use classifier::{classify, Classification, Classifier, ModelSource};
pub use handle::ModelHandle;
pub use preprocess::{decode_image, open_image, preprocess};
pub use scorer::{OnnxScorer, Scorer};
pub use builder::ClassifierBuilder;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file, if the classifier loads one itself
    pub model_path: Option<PathBuf>,
    /// Number of categories the model distinguishes
    pub num_classes: usize,
    /// Labels in model output order
    pub class_labels: Vec<String>,
    /// Side length of the square model input
    pub input_size: u32,
    pub layout: TensorLayout,
    /// Whether the model handle currently holds a loaded model
    pub model_loaded: bool,
    /// Path the handle's model was actually loaded from, if known. For a shared
    /// handle this can differ from `model_path`.
    pub loaded_from: Option<PathBuf>,
}
