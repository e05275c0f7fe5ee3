use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use ndarray::{ArrayView4, CowArray, IxDyn};
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use crate::models::{ModelCharacteristics, TensorLayout};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// The narrow capability the classification pipeline needs from a model.
///
/// `batch` always arrives as `[1, height, width, 3]` with values in [0, 1].
/// Implementations return one score per label, in the label order the model
/// was trained with. Inference must not mutate the scorer, so a loaded scorer
/// can be shared by any number of threads.
pub trait Scorer: Send + Sync {
    fn infer(&self, batch: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError>;
}

impl std::fmt::Debug for dyn Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Scorer")
    }
}

/// A `Scorer` backed by an ONNX Runtime session.
///
/// The model is expected to:
/// - Accept one float32 image input, NHWC or NCHW depending on `layout`
/// - Produce the class scores as its first output, shape `[1, num_labels]`
#[derive(Debug)]
pub struct OnnxScorer {
    session: Session,
    input_name: String,
    layout: TensorLayout,
}

impl OnnxScorer {
    /// Loads an ONNX model from disk.
    ///
    /// Missing files, corrupt artifacts and runtime failures are all reported
    /// as `ModelLoadFailed`.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        characteristics: &ModelCharacteristics,
        runtime_config: &RuntimeConfig,
    ) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ClassifierError::ModelLoadFailed(format!("Model file not found: {:?}", path)));
        }

        info!("Loading ONNX model from {:?}", path);
        let session = create_session_builder(runtime_config)?
            .commit_from_file(path)?;

        Self::validate_model(&session)?;
        let input_name = session.inputs[0].name.clone();
        info!("Model loaded (input '{}', layout {})", input_name, characteristics.layout);

        Ok(Self {
            session,
            input_name,
            layout: characteristics.layout,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.is_empty() {
            return Err(ClassifierError::ModelLoadFailed(
                "Model must have an image input".to_string()
            ));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelLoadFailed(
                "Model must have at least 1 output for class scores".to_string()
            ));
        }
        Ok(())
    }
}

/// Arranges an NHWC batch for the model input and makes it contiguous.
///
/// NHWC batches are borrowed as-is; NCHW batches are copied into `[N, C, H, W]` order.
pub(crate) fn to_layout(batch: ArrayView4<'_, f32>, layout: TensorLayout) -> CowArray<'_, f32, IxDyn> {
    let batch = match layout {
        TensorLayout::Nhwc => batch,
        TensorLayout::Nchw => batch.permuted_axes([0, 3, 1, 2]),
    }
    .into_dyn();

    if batch.is_standard_layout() {
        CowArray::from(batch)
    } else {
        CowArray::from(batch.as_standard_layout().into_owned())
    }
}

impl Scorer for OnnxScorer {
    fn infer(&self, batch: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError> {
        let input = to_layout(batch, self.layout);

        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.as_str(), Tensor::from_array(&input)
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to create input tensor: {}", e)))?);

        let outputs = self.session.run(input_tensors)
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to extract output tensor: {}", e)))?;

        debug!("Model output shape: {:?}", output_tensor.shape());
        Ok(output_tensor.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn indexed_batch() -> Array4<f32> {
        // value encodes its NHWC position as h*100 + w*10 + c
        Array4::from_shape_fn((1, 2, 2, 3), |(_, h, w, c)| (h * 100 + w * 10 + c) as f32)
    }

    #[test]
    fn test_nchw_layout_moves_channels_first() {
        let batch = indexed_batch();
        let input = to_layout(batch.view(), TensorLayout::Nchw);

        assert_eq!(input.shape(), &[1, 3, 2, 2]);
        assert!(input.is_standard_layout());
        for c in 0..3 {
            for h in 0..2 {
                for w in 0..2 {
                    assert_eq!(input[[0, c, h, w]], batch[[0, h, w, c]]);
                }
            }
        }
        // Memory order is the first channel plane, then the second, then the third
        let flat: Vec<f32> = input.as_slice().unwrap().to_vec();
        assert_eq!(&flat[..4], &[0.0, 10.0, 100.0, 110.0]);
        assert_eq!(&flat[4..8], &[1.0, 11.0, 101.0, 111.0]);
    }

    #[test]
    fn test_nhwc_layout_is_unchanged() {
        let batch = indexed_batch();
        let input = to_layout(batch.view(), TensorLayout::Nhwc);

        assert_eq!(input.shape(), &[1, 2, 2, 3]);
        assert!(input.is_view());
        assert_eq!(input.as_slice().unwrap(), batch.as_slice().unwrap());
    }

    #[test]
    fn test_missing_model_file() {
        let result = OnnxScorer::from_file(
            "/nonexistent/ecosort/model.onnx",
            &ModelCharacteristics::default(),
            &RuntimeConfig::default(),
        );
        assert!(matches!(result, Err(ClassifierError::ModelLoadFailed(_))));
    }

    #[test]
    fn test_corrupt_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"corrupted data").unwrap();

        let result = OnnxScorer::from_file(&path, &ModelCharacteristics::default(), &RuntimeConfig::default());
        assert!(matches!(result, Err(ClassifierError::ModelLoadFailed(_))));
    }
}
