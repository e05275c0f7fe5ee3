use std::sync::OnceLock;

use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;

use crate::classifier::ClassifierError;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Execution settings for ONNX Runtime sessions.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

impl RuntimeConfig {
    /// Uses `threads` for intra-op parallelism and leaves everything else at defaults.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            intra_threads: threads,
            ..Self::default()
        }
    }
}

// GraphOptimizationLevel is not Clone
fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
        }
    }
}

fn init_onnx_environment() -> ort::Result<()> {
    ort::init()
        .with_name("ecosort")
        .commit()?;
    Ok(())
}

/// Initializes the ONNX Runtime environment once per process.
///
/// A failed initialization is remembered and reported to every later caller.
pub fn ensure_initialized() -> Result<(), ClassifierError> {
    INIT.get_or_init(|| init_onnx_environment().map_err(|e| e.to_string()))
        .clone()
        .map_err(|e| ClassifierError::ModelLoadFailed(format!("Failed to initialize ONNX Runtime: {}", e)))
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, ClassifierError> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }
    builder = builder.with_optimization_level(copy_level(&config.optimization_level))?;

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_initialization() {
        assert!(ensure_initialized().is_ok());
        assert!(ensure_initialized().is_ok()); // Second call should be fine
    }

    #[test]
    fn test_session_builder_config() {
        let config = RuntimeConfig {
            inter_threads: 2,
            intra_threads: 2,
            optimization_level: GraphOptimizationLevel::Level1,
        };
        let builder = create_session_builder(&config);
        assert!(builder.is_ok());
    }

    #[test]
    fn test_with_threads() {
        let config = RuntimeConfig::with_threads(4);
        assert_eq!(config.intra_threads, 4);
        assert_eq!(config.inter_threads, 0);
        assert!(matches!(config.clone().optimization_level, GraphOptimizationLevel::Level3));
    }
}
