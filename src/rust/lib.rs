//! Waste photo classification with disposal tips, using ONNX image models.
//!
//! An image is converted to RGB, resized to the model's square input,
//! scaled to [0, 1] and scored by the model. The best score picks a label
//! from an ordered catalog, which also supplies the disposal tip.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ecosort::{BuiltinCatalog, Classifier};
//!
//! let classifier = Classifier::builder()
//!     .with_builtin_catalog(BuiltinCatalog::TenClass)
//!     .with_input_size(150)
//!     .with_model_file("models/ecosort.onnx")?
//!     .build()?;
//!
//! let result = classifier.classify_path("bottle.jpg")?;
//! println!("{} ({:.2}%): {}", result.label, result.confidence, result.tip);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The model is loaded into a `ModelHandle` at most once and then shared
//! read-only, so a classifier can be shared across threads using `Arc`:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ecosort::{BuiltinCatalog, Classifier, ModelHandle};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let classifier = Arc::new(Classifier::builder()
//!     .with_builtin_catalog(BuiltinCatalog::FourClass)
//!     .with_handle(ModelHandle::global())
//!     .with_model_file("models/ecosort.onnx")?
//!     .build()?);
//!
//! let mut handles = vec![];
//! for path in ["a.jpg", "b.jpg", "c.jpg"] {
//!     let classifier = Arc::clone(&classifier);
//!     handles.push(thread::spawn(move || classifier.classify_path(path)));
//! }
//!
//! for handle in handles {
//!     println!("{:?}", handle.join().unwrap());
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
mod runtime;
pub mod model_manager;
pub mod models;

pub use classifier::{
    classify, decode_image, open_image, preprocess, BuiltinCatalog, Catalog, CategoryDefinition,
    Classification, Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, ModelHandle,
    ModelSource, OnnxScorer, Scorer,
};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use model_manager::{ModelManager, ModelError};
pub use models::{ModelCharacteristics, ModelInfo, TensorLayout, DEFAULT_INPUT_SIZE};

pub fn init_logger() {
    env_logger::init();
}
