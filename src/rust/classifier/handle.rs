use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use lazy_static::lazy_static;
use log::{debug, info, warn};

use super::classifier::ModelSource;
use super::error::ClassifierError;
use super::scorer::Scorer;

lazy_static! {
    static ref GLOBAL_HANDLE: Arc<ModelHandle> = Arc::new(ModelHandle::new());
}

/// A lazily initialized, read-only slot for a loaded model.
///
/// The model is loaded at most once, even when several threads ask for it at
/// the same time. After that the scorer is shared through `Arc` and never
/// mutated. A failed load leaves the handle empty so a later call can retry.
///
/// A handle loaded through [`ModelHandle::get_or_load_from`] remembers the
/// source it was loaded from, so classifiers sharing it can tell whether it
/// holds the model they were configured with.
///
/// ```
/// use ecosort::{ClassifierError, ModelHandle};
///
/// let handle = ModelHandle::new();
/// assert!(!handle.is_loaded());
/// assert!(matches!(handle.scorer(), Err(ClassifierError::ModelUnavailable)));
/// ```
pub struct ModelHandle {
    scorer: OnceLock<Arc<dyn Scorer>>,
    origin: OnceLock<ModelSource>,
    init_lock: Mutex<()>,
}

impl ModelHandle {
    /// Creates an empty handle, typically scoped to one session or request pipeline.
    pub fn new() -> Self {
        Self {
            scorer: OnceLock::new(),
            origin: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Creates a handle that already holds `scorer`.
    pub fn loaded(scorer: Arc<dyn Scorer>) -> Self {
        let handle = Self::new();
        let _ = handle.scorer.set(scorer);
        handle
    }

    /// The process-wide handle.
    pub fn global() -> Arc<ModelHandle> {
        Arc::clone(&GLOBAL_HANDLE)
    }

    pub fn is_loaded(&self) -> bool {
        self.scorer.get().is_some()
    }

    /// The source the loaded model came from, if it was loaded from one.
    pub fn origin(&self) -> Option<&ModelSource> {
        self.origin.get()
    }

    /// Returns the loaded scorer, or `ModelUnavailable` without attempting a load.
    pub fn scorer(&self) -> Result<Arc<dyn Scorer>, ClassifierError> {
        self.scorer.get().cloned().ok_or(ClassifierError::ModelUnavailable)
    }

    /// Returns the loaded scorer, running `load` first if nothing is loaded yet.
    ///
    /// Concurrent callers block until the first load finishes; `load` runs at
    /// most once per successful initialization.
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<dyn Scorer>, ClassifierError>
    where
        F: FnOnce() -> Result<Arc<dyn Scorer>, ClassifierError>,
    {
        self.load_with_origin(None, load)
    }

    /// Like [`ModelHandle::get_or_load`], recording `source` as the origin of the model.
    ///
    /// If the handle already holds a model this returns it without checking the
    /// origin; compare [`ModelHandle::origin`] to detect a mismatch.
    pub fn get_or_load_from<F>(&self, source: &ModelSource, load: F) -> Result<Arc<dyn Scorer>, ClassifierError>
    where
        F: FnOnce() -> Result<Arc<dyn Scorer>, ClassifierError>,
    {
        self.load_with_origin(Some(source), load)
    }

    fn load_with_origin<F>(&self, source: Option<&ModelSource>, load: F) -> Result<Arc<dyn Scorer>, ClassifierError>
    where
        F: FnOnce() -> Result<Arc<dyn Scorer>, ClassifierError>,
    {
        if let Some(scorer) = self.scorer.get() {
            return Ok(Arc::clone(scorer));
        }

        // A panicking loader leaves nothing behind, so a poisoned lock is still usable
        let _guard = self.init_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(scorer) = self.scorer.get() {
            debug!("Model was loaded by another caller while waiting");
            return Ok(Arc::clone(scorer));
        }

        info!("Loading model into handle...");
        let scorer = load().map_err(|e| {
            warn!("Model load failed, handle stays empty: {}", e);
            match e {
                ClassifierError::ModelLoadFailed(_) => e,
                other => ClassifierError::ModelLoadFailed(other.to_string()),
            }
        })?;
        // Origin is set before the scorer so readers never see a model without it
        if let Some(source) = source {
            let _ = self.origin.set(source.clone());
        }
        let _ = self.scorer.set(Arc::clone(&scorer));
        info!("Model handle initialized");
        Ok(scorer)
    }
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("loaded", &self.is_loaded())
            .field("origin", &self.origin())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayView4;

    struct ConstantScorer;

    impl Scorer for ConstantScorer {
        fn infer(&self, _batch: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError> {
            Ok(vec![1.0])
        }
    }

    #[test]
    fn test_empty_handle_is_unavailable() {
        let handle = ModelHandle::new();
        assert!(!handle.is_loaded());
        assert!(matches!(handle.scorer(), Err(ClassifierError::ModelUnavailable)));
    }

    #[test]
    fn test_failed_load_can_be_retried() {
        let handle = ModelHandle::new();
        let result = handle.get_or_load(|| Err(ClassifierError::ModelLoadFailed("offline".into())));
        assert!(matches!(result, Err(ClassifierError::ModelLoadFailed(_))));
        assert!(!handle.is_loaded());

        let result = handle.get_or_load(|| Ok(Arc::new(ConstantScorer) as Arc<dyn Scorer>));
        assert!(result.is_ok());
        assert!(handle.is_loaded());
    }

    #[test]
    fn test_loader_errors_become_load_failures() {
        let handle = ModelHandle::new();
        let result = handle.get_or_load(|| Err(ClassifierError::BuildError("bad path".into())));
        assert!(matches!(result, Err(ClassifierError::ModelLoadFailed(_))));
    }

    #[test]
    fn test_origin_is_recorded() {
        let source = ModelSource::File("waste.onnx".into());
        let handle = ModelHandle::new();
        assert_eq!(handle.origin(), None);

        handle.get_or_load_from(&source, || Ok(Arc::new(ConstantScorer) as Arc<dyn Scorer>)).unwrap();
        assert_eq!(handle.origin(), Some(&source));

        // A second source does not replace the loaded model or its origin
        let other = ModelSource::File("other.onnx".into());
        handle.get_or_load_from(&other, || panic!("loader must not run")).unwrap();
        assert_eq!(handle.origin(), Some(&source));
    }

    #[test]
    fn test_failed_load_records_no_origin() {
        let handle = ModelHandle::new();
        let source = ModelSource::File("missing.onnx".into());
        let result = handle.get_or_load_from(&source, || Err(ClassifierError::ModelLoadFailed("missing".into())));
        assert!(result.is_err());
        assert_eq!(handle.origin(), None);
    }

    #[test]
    fn test_loaded_handle_skips_loader() {
        let handle = ModelHandle::loaded(Arc::new(ConstantScorer));
        let result = handle.get_or_load(|| panic!("loader must not run"));
        assert!(result.is_ok());
    }
}
