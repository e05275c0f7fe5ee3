use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default square input resolution of the EcoSort image models.
pub const DEFAULT_INPUT_SIZE: u32 = 150;

/// Memory layout the model expects for its single image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[batch, height, width, channels]`, the layout Keras exports use
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]`, the layout PyTorch exports use
    Nchw,
}

impl fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorLayout::Nhwc => write!(f, "nhwc"),
            TensorLayout::Nchw => write!(f, "nchw"),
        }
    }
}

impl FromStr for TensorLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nhwc" => Ok(TensorLayout::Nhwc),
            "nchw" => Ok(TensorLayout::Nchw),
            other => Err(format!("unknown tensor layout '{}' (expected nhwc or nchw)", other)),
        }
    }
}

/// Input characteristics of an image classification model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCharacteristics {
    /// Side length of the square RGB input the model was trained on
    pub input_size: u32,
    pub layout: TensorLayout,
}

impl Default for ModelCharacteristics {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::Nhwc,
        }
    }
}

/// Identifies a downloadable model artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Directory name under the models cache
    pub name: String,
    pub model_url: String,
    /// Expected SHA-256 of the artifact, lowercase hex. Unverified when absent.
    pub model_hash: Option<String>,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, model_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_url: model_url.into(),
            model_hash: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.model_hash = Some(hash.into().to_ascii_lowercase());
        self
    }
}
