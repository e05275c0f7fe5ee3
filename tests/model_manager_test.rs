use ecosort::{ClassifierError, ModelError, ModelInfo, ModelManager};
use std::fs;

fn test_model(name: &str) -> ModelInfo {
    ModelInfo::new(name, "http://127.0.0.1:9/model.onnx")
}

#[test]
fn test_model_paths() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ModelManager::new(dir.path().join("models")).unwrap();
    let model = test_model("ecosort-4");

    let path = manager.get_model_path(&model);
    assert!(path.starts_with(manager.models_dir()));
    assert!(path.ends_with("ecosort-4/model.onnx"));
    assert!(!manager.is_model_downloaded(&model));
    assert!(matches!(manager.require_model(&model), Err(ModelError::NotDownloaded(_))));
}

#[test]
fn test_model_verification() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    // sha256("abc")
    let model = test_model("hashed")
        .with_hash("BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD");

    // Test verification of non-existent model
    assert!(!manager.verify_model(&model)?);

    let path = manager.get_model_path(&model);
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(&path, "abc")?;
    assert!(manager.verify_model(&model)?);
    assert_eq!(manager.require_model(&model)?, path);

    // Corrupt file and verify
    fs::write(&path, "corrupted data")?;
    assert!(!manager.verify_model(&model)?);

    Ok(())
}

#[test]
fn test_unhashed_model_is_accepted() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    let model = test_model("unhashed");

    let path = manager.get_model_path(&model);
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(&path, "anything")?;
    assert!(manager.verify_model(&model)?);
    Ok(())
}

#[test]
fn test_remove_download() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    let model = test_model("removable");

    // Removing a model that was never downloaded is fine
    manager.remove_download(&model)?;

    let path = manager.get_model_path(&model);
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(&path, "weights")?;
    assert!(manager.is_model_downloaded(&model));

    manager.remove_download(&model)?;
    assert!(!manager.is_model_downloaded(&model));
    Ok(())
}

#[tokio::test]
async fn test_cached_model_skips_download() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    // The URL is unreachable, so success proves no request was made
    let model = test_model("cached").with_hash("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");

    let path = manager.get_model_path(&model);
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(&path, "abc")?;

    assert_eq!(manager.ensure_model_downloaded(&model).await?, path);
    Ok(())
}

#[test]
fn test_failed_download_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ModelManager::new(dir.path()).unwrap();
    let model = test_model("stale").with_hash("0000");

    let path = manager.get_model_path(&model);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "stale weights").unwrap();

    let result = tokio_test::block_on(manager.ensure_model_downloaded(&model));
    assert!(matches!(result, Err(ModelError::DownloadError(_))));
    assert!(!manager.is_model_downloaded(&model));

    let err: ClassifierError = result.unwrap_err().into();
    assert!(matches!(err, ClassifierError::ModelLoadFailed(_)));
}
