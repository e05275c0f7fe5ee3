use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::ModelInfo;

const MODEL_FILE_NAME: &str = "model.onnx";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download failed with HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Downloads, verifies and caches model artifacts.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("ECOSORT_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("ecosort").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("ecosort").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("ecosort").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, info: &ModelInfo) -> PathBuf {
        self.models_dir.join(&info.name).join(MODEL_FILE_NAME)
    }

    pub fn is_model_downloaded(&self, info: &ModelInfo) -> bool {
        let model_path = self.get_model_path(info);
        log::debug!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        model_path.exists()
    }

    /// Returns the cached artifact path, failing if it has not been downloaded yet.
    pub fn require_model(&self, info: &ModelInfo) -> Result<PathBuf, ModelError> {
        let model_path = self.get_model_path(info);
        if !model_path.exists() {
            return Err(ModelError::NotDownloaded(info.name.clone()));
        }
        Ok(model_path)
    }

    pub async fn download_model(&self, info: &ModelInfo) -> Result<PathBuf, ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.get_model_path(info);
        let result = if model_path.exists() && self.verify_model(info)? {
            log::info!("Existing model file verified successfully");
            Ok(())
        } else {
            if model_path.exists() {
                log::warn!("Model file verification failed, redownloading");
            }
            self.download_and_verify_file(&info.model_url, &model_path, info.model_hash.as_deref(), "model").await
        };

        match result {
            Ok(()) => {
                log::info!("Model ready to use at {:?}", model_path);
                Ok(model_path)
            }
            Err(e) => {
                log::error!("Failed to setup model file: {}", e);
                // Cleanup on failure
                let _ = self.remove_download(info);
                Err(e)
            }
        }
    }

    fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let hash = Self::hash_bytes(&bytes);
        log::debug!("Verifying {:?}: calculated {}, expected {}", path, hash, expected_hash);
        Ok(hash == expected_hash)
    }

    /// Checks the cached artifact against its expected hash.
    ///
    /// Returns `false` if the file is missing. Without an expected hash an
    /// existing file is accepted as is.
    pub fn verify_model(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        let model_path = self.get_model_path(info);
        if !model_path.exists() {
            log::info!("Model file {:?} does not exist", model_path);
            return Ok(false);
        }

        match &info.model_hash {
            Some(expected) => {
                let ok = self.verify_file(&model_path, expected)?;
                log::info!("Model hash verification for '{}': {}", info.name, ok);
                Ok(ok)
            }
            None => {
                log::warn!("No hash configured for model '{}', skipping verification", info.name);
                Ok(true)
            }
        }
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?;
        log::info!("Download response status: {}", response.status());
        if !response.status().is_success() {
            return Err(ModelError::HttpStatus(response.status()));
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        self.install_file(&bytes, path, expected_hash, file_type)
    }

    /// Checks `bytes` against `expected_hash` and moves them into place at `path`.
    ///
    /// The hash is computed on the bytes in memory, so nothing is read back from
    /// disk. The bytes go to a `.part` file first and are renamed over `path`,
    /// so an interrupted write never leaves a truncated artifact at `path`.
    fn install_file(
        &self,
        bytes: &[u8],
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        let hash = Self::hash_bytes(bytes);
        if let Some(expected) = expected_hash {
            if hash != expected {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let part_path = Self::part_path(path);
        if let Err(e) = fs::write(&part_path, bytes).and_then(|()| fs::rename(&part_path, path)) {
            let _ = fs::remove_file(&part_path);
            return Err(e.into());
        }

        log::info!("{} file installed at {:?} (sha256 {})", file_type, path, hash);
        Ok(())
    }

    fn part_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".part");
        path.with_file_name(name)
    }

    pub fn remove_download(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let model_path = self.get_model_path(info);
        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        let part_path = Self::part_path(&model_path);
        if part_path.exists() {
            fs::remove_file(&part_path)?;
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ModelInfo) -> Result<PathBuf, ModelError> {
        log::info!("Checking if model '{}' is downloaded...", info.name);
        if self.is_model_downloaded(info) && self.verify_model(info)? {
            log::info!("Model verification successful");
            return Ok(self.get_model_path(info));
        }
        if self.is_model_downloaded(info) {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(info)?;
        }
        self.download_model(info).await
    }
}
