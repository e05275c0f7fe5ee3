use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use log::{debug, warn};
use serde::Serialize;

use super::catalog::Catalog;
use super::error::ClassifierError;
use super::handle::ModelHandle;
use super::preprocess::{decode_image, open_image, preprocess};
use super::scorer::{OnnxScorer, Scorer};
use super::utils::{argmax, to_percentage};
use crate::models::ModelCharacteristics;
use crate::runtime::RuntimeConfig;

/// The outcome of classifying one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: String,
    /// Highest model score as a percentage in [0, 100]
    pub confidence: f32,
    pub tip: String,
}

/// Renders the result card: upper-cased label, confidence with two decimals, tip.
impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.label.to_uppercase())?;
        writeln!(f, "Confidence: {:.2}%", self.confidence)?;
        write!(f, "{}", self.tip)
    }
}

/// Where a classifier gets its model from when the handle is still empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// An ONNX artifact on the local filesystem
    File(PathBuf),
}

impl ModelSource {
    fn load(
        &self,
        characteristics: &ModelCharacteristics,
        runtime_config: &RuntimeConfig,
    ) -> Result<Arc<dyn Scorer>, ClassifierError> {
        match self {
            ModelSource::File(path) => {
                let scorer = OnnxScorer::from_file(path, characteristics, runtime_config)?;
                Ok(Arc::new(scorer))
            }
        }
    }
}

/// Classifies `image` with the model held by `model`.
///
/// Fails with `ModelUnavailable` before touching the image if the handle is
/// empty. Label order and tips come from `catalog`.
pub fn classify(
    image: &DynamicImage,
    model: &ModelHandle,
    catalog: &Catalog,
    characteristics: &ModelCharacteristics,
) -> Result<Classification, ClassifierError> {
    let scorer = model.scorer()?;
    run_pipeline(image, scorer.as_ref(), catalog, characteristics.input_size)
}

fn run_pipeline(
    image: &DynamicImage,
    scorer: &dyn Scorer,
    catalog: &Catalog,
    input_size: u32,
) -> Result<Classification, ClassifierError> {
    let batch = preprocess(image, input_size)?;
    let scores = scorer.infer(batch.view())?;
    debug!("Scores: {:?}", scores);
    resolve(&scores, catalog)
}

/// Maps a score vector onto the catalog.
fn resolve(scores: &[f32], catalog: &Catalog) -> Result<Classification, ClassifierError> {
    let best = argmax(scores);
    let unknown = || ClassifierError::UnknownLabel {
        index: best.map(|(i, _)| i),
        num_scores: scores.len(),
        num_labels: catalog.len(),
    };

    if scores.len() != catalog.len() {
        return Err(unknown());
    }
    let (index, score) = best.ok_or_else(|| {
        ClassifierError::PredictionError(format!("Model produced non-finite scores: {:?}", scores))
    })?;
    let label = catalog.label(index).ok_or_else(unknown)?;
    let tip = catalog.tip(label).ok_or_else(unknown)?;

    Ok(Classification {
        label: label.to_string(),
        confidence: to_percentage(score),
        tip: tip.to_string(),
    })
}

/// A waste image classifier: a catalog, model input settings and a model handle.
///
/// This type is `Send + Sync`; wrap it in `Arc` to share it across threads.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use ecosort::{BuiltinCatalog, Classifier, ClassifierError};
/// use image::{DynamicImage, RgbImage};
///
/// let classifier = Classifier::builder()
///     .with_builtin_catalog(BuiltinCatalog::FourClass)
///     .build()?;
///
/// // No model source configured and nothing loaded yet
/// let image = DynamicImage::ImageRgb8(RgbImage::new(300, 300));
/// assert!(matches!(classifier.classify(&image), Err(ClassifierError::ModelUnavailable)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) handle: Arc<ModelHandle>,
    pub(crate) source: Option<ModelSource>,
    pub(crate) model_characteristics: ModelCharacteristics,
    pub(crate) runtime_config: RuntimeConfig,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.source.as_ref().map(|ModelSource::File(path)| path.clone()),
            num_classes: self.catalog.len(),
            class_labels: self.catalog.labels().to_vec(),
            input_size: self.model_characteristics.input_size,
            layout: self.model_characteristics.layout,
            model_loaded: self.handle.is_loaded(),
            loaded_from: self.handle.origin().map(|ModelSource::File(path)| path.clone()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }

    /// Makes sure the model is loaded, loading it from the configured source if needed.
    ///
    /// Call this at startup to pay the load cost up front. Without a configured
    /// source this only succeeds if the handle was already loaded.
    ///
    /// With a configured source, a shared handle that already holds a model from
    /// a different (or unknown) source is rejected with `ModelLoadFailed` instead
    /// of classifying with the wrong model.
    pub fn load(&self) -> Result<Arc<dyn Scorer>, ClassifierError> {
        let Some(source) = &self.source else {
            return self.handle.scorer();
        };

        let scorer = self.handle.get_or_load_from(source, || {
            source.load(&self.model_characteristics, &self.runtime_config)
        })?;
        match self.handle.origin() {
            Some(origin) if origin == source => Ok(scorer),
            origin => {
                warn!("Model handle holds {:?}, classifier is configured for {:?}", origin, source);
                Err(ClassifierError::ModelLoadFailed(format!(
                    "Shared model handle already holds a different model ({:?}) than the configured {:?}",
                    origin, source
                )))
            }
        }
    }

    /// Classifies a decoded image.
    ///
    /// The model is loaded on first use if a source was configured.
    ///
    /// # Errors
    /// - `ModelUnavailable` if no model is loaded and no source is configured
    /// - `ModelLoadFailed` if the configured source cannot be loaded, or the
    ///   shared handle holds a model from another source
    /// - `InvalidImage` if the image cannot be converted to the model input
    /// - `UnknownLabel` if the model output does not line up with the catalog
    pub fn classify(&self, image: &DynamicImage) -> Result<Classification, ClassifierError> {
        let scorer = self.load()?;
        run_pipeline(image, scorer.as_ref(), &self.catalog, self.model_characteristics.input_size)
    }

    /// Decodes an encoded image (e.g. an upload) and classifies it.
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<Classification, ClassifierError> {
        let image = decode_image(bytes)?;
        self.classify(&image)
    }

    pub fn classify_path<P: AsRef<Path>>(&self, path: P) -> Result<Classification, ClassifierError> {
        let image = open_image(path)?;
        self.classify(&image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BuiltinCatalog;

    #[test]
    fn test_resolve_picks_label_and_tip() {
        let catalog = Catalog::builtin(BuiltinCatalog::FourClass);
        let result = resolve(&[0.1, 0.7, 0.1, 0.1], &catalog).unwrap();
        assert_eq!(result.label, "organic");
        assert!((result.confidence - 70.0).abs() < 1e-3);
        assert_eq!(Some(result.tip.as_str()), catalog.tip("organic"));
    }

    #[test]
    fn test_resolve_length_mismatch() {
        let catalog = Catalog::builtin(BuiltinCatalog::FourClass);
        let result = resolve(&[0.1, 0.2, 0.3, 0.1, 0.3, 0.9], &catalog);
        assert!(matches!(
            result,
            Err(ClassifierError::UnknownLabel { index: Some(5), num_scores: 6, num_labels: 4 })
        ));
        assert!(matches!(resolve(&[], &catalog), Err(ClassifierError::UnknownLabel { index: None, .. })));
    }

    #[test]
    fn test_resolve_non_finite_scores() {
        let catalog = Catalog::builtin(BuiltinCatalog::FourClass);
        for scores in [
            [f32::NAN; 4],
            [0.2, f32::INFINITY, 0.1, 0.1],
            [0.2, f32::NAN, 0.1, 0.1],
        ] {
            let result = resolve(&scores, &catalog);
            assert!(matches!(result, Err(ClassifierError::PredictionError(_))), "{:?}", scores);
        }
    }

    #[test]
    fn test_result_card() {
        let result = Classification {
            label: "paper".into(),
            confidence: 85.0,
            tip: "Recycle it.".into(),
        };
        assert_eq!(result.to_string(), "PAPER\nConfidence: 85.00%\nRecycle it.");
    }
}
