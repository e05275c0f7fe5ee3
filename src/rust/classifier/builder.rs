use std::path::PathBuf;
use std::sync::Arc;

use log::info;

use super::catalog::{BuiltinCatalog, Catalog, CategoryDefinition, MAX_CATEGORIES};
use super::classifier::{Classifier, ModelSource};
use super::error::ClassifierError;
use super::handle::ModelHandle;
use super::scorer::Scorer;
use crate::models::{ModelCharacteristics, TensorLayout};
use crate::runtime::RuntimeConfig;

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Debug, Default)]
pub struct ClassifierBuilder {
    catalog: Option<Catalog>,
    categories: Vec<CategoryDefinition>,
    handle: Option<Arc<ModelHandle>>,
    scorer: Option<Arc<dyn Scorer>>,
    source: Option<ModelSource>,
    model_characteristics: ModelCharacteristics,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use ecosort::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Uses one of the label sets shipped with the crate
    pub fn with_builtin_catalog(mut self, preset: BuiltinCatalog) -> Self {
        self.catalog = Some(Catalog::builtin(preset));
        self
    }

    /// Uses a catalog built elsewhere, e.g. loaded from JSON
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Appends a category to a custom catalog. Categories must be added in
    /// model output order.
    ///
    /// # Example
    /// ```
    /// use ecosort::{ClassifierBuilder, CategoryDefinition};
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .add_category(CategoryDefinition::new("glass", "Rinse and use the bottle bank."))
    ///     .and_then(|b| b.add_category(CategoryDefinition::new("paper", "Keep it dry.")));
    /// assert!(builder.is_ok());
    /// ```
    pub fn add_category(mut self, category: CategoryDefinition) -> Result<Self, ClassifierError> {
        if self.catalog.is_some() {
            return Err(ClassifierError::BuildError(
                "Cannot add categories after a catalog was set".to_string()
            ));
        }
        if self.categories.len() >= MAX_CATEGORIES {
            return Err(ClassifierError::ValidationError(
                format!("Maximum number of categories ({}) exceeded", MAX_CATEGORIES)
            ));
        }
        if self.categories.iter().any(|c| c.label == category.label) {
            return Err(ClassifierError::ValidationError(
                format!("Duplicate label '{}'", category.label)
            ));
        }
        // Validate the entry on its own so errors surface at the call that caused them
        Catalog::new(vec![category.clone()])?;

        self.categories.push(category);
        Ok(self)
    }

    /// Loads the model lazily from an ONNX file on first classification
    pub fn with_model_file(mut self, path: impl Into<PathBuf>) -> Result<Self, ClassifierError> {
        if self.source.is_some() || self.scorer.is_some() {
            return Err(ClassifierError::BuildError("Model source already set".to_string()));
        }
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ClassifierError::BuildError("Model path cannot be empty".to_string()));
        }
        self.source = Some(ModelSource::File(path));
        Ok(self)
    }

    /// Uses an already constructed scorer, e.g. a stub in tests
    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Result<Self, ClassifierError> {
        if self.source.is_some() || self.scorer.is_some() {
            return Err(ClassifierError::BuildError("Model source already set".to_string()));
        }
        self.scorer = Some(scorer);
        Ok(self)
    }

    /// Shares a model handle with other classifiers, e.g. `ModelHandle::global()`
    ///
    /// The first classifier to load wins. A classifier configured with
    /// [`ClassifierBuilder::with_model_file`] refuses to classify with a shared
    /// handle that was loaded from a different file.
    pub fn with_handle(mut self, handle: Arc<ModelHandle>) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Sets the square input resolution the model was trained on
    pub fn with_input_size(mut self, input_size: u32) -> Self {
        self.model_characteristics.input_size = input_size;
        self
    }

    pub fn with_layout(mut self, layout: TensorLayout) -> Self {
        self.model_characteristics.layout = layout;
        self
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Returns
    /// * `Result<Classifier, ClassifierError>` - The constructed Classifier if successful, or an error if:
    ///   - Neither a catalog nor any categories were provided
    ///   - The input size is zero
    ///
    /// A scorer passed together with an already loaded shared handle is ignored.
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        if self.model_characteristics.input_size == 0 {
            return Err(ClassifierError::BuildError("Model input size must be positive".to_string()));
        }

        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None if self.categories.is_empty() => {
                return Err(ClassifierError::BuildError("A catalog or at least one category must be added".to_string()));
            }
            None => Catalog::new(self.categories)?,
        };

        let handle = match (self.handle, self.scorer) {
            (Some(handle), Some(scorer)) => {
                handle.get_or_load(|| Ok(scorer))?;
                handle
            }
            (Some(handle), None) => handle,
            (None, Some(scorer)) => Arc::new(ModelHandle::loaded(scorer)),
            (None, None) => Arc::new(ModelHandle::new()),
        };

        info!(
            "Classifier built with {} labels, input {}x{} ({})",
            catalog.len(),
            self.model_characteristics.input_size,
            self.model_characteristics.input_size,
            self.model_characteristics.layout
        );

        Ok(Classifier {
            catalog: Arc::new(catalog),
            handle,
            source: self.source,
            model_characteristics: self.model_characteristics,
            runtime_config: self.runtime_config,
        })
    }
}
