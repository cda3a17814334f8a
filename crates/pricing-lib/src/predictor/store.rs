//! Learned-model artifact loading and copy-on-reload
//!
//! The store owns the artifact paths and the currently active
//! `LearnedModelAdapter`. Readers take an `Arc` snapshot and never hold a
//! lock while predicting; reload builds a new adapter off to the side and
//! swaps it in. A failed load or reload keeps the engine usable.

use super::encoder::CategoricalEncoder;
use super::inference::{LearnedModelAdapter, OnnxRegressor};
use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{error, info, warn};

/// Where the learned model and its encoder live on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub model_path: PathBuf,
    pub encoder_path: PathBuf,
}

impl ModelPaths {
    pub fn new(model_path: impl Into<PathBuf>, encoder_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            encoder_path: encoder_path.into(),
        }
    }

    /// Optional `<model>.sha256` file holding the expected digest
    pub fn checksum_path(&self) -> PathBuf {
        let mut name = self.model_path.as_os_str().to_os_string();
        name.push(".sha256");
        PathBuf::from(name)
    }
}

/// Result of an explicit reload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub loaded: bool,
    pub version: Option<String>,
}

/// Snapshot of the store for health reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub loaded: bool,
    pub version: Option<String>,
    pub model_path: Option<String>,
    pub last_error: Option<String>,
}

/// Holder of the active learned-model adapter
pub struct ModelStore {
    paths: Option<ModelPaths>,
    current: RwLock<Arc<LearnedModelAdapter>>,
    last_error: RwLock<Option<String>>,
    reload_lock: Mutex<()>,
}

impl ModelStore {
    /// Load artifacts once; never fails
    ///
    /// A missing model file is a normal heuristic-only mode. A broken
    /// artifact is recorded as the last error and also leaves the store in
    /// heuristic-only mode.
    pub fn load(paths: ModelPaths) -> Self {
        let (adapter, last_error) = match build_adapter(&paths) {
            Ok(Some(adapter)) => {
                info!(
                    path = %paths.model_path.display(),
                    version = adapter.model_version().unwrap_or_default(),
                    "Learned model loaded"
                );
                (adapter, None)
            }
            Ok(None) => {
                warn!(
                    path = %paths.model_path.display(),
                    "Model file not found, using heuristic model"
                );
                (LearnedModelAdapter::without_model(), None)
            }
            Err(e) => {
                let message = format!("{:#}", e);
                error!(path = %paths.model_path.display(), error = %message, "Failed to load learned model");
                (LearnedModelAdapter::without_model(), Some(message))
            }
        };

        Self {
            paths: Some(paths),
            current: RwLock::new(Arc::new(adapter)),
            last_error: RwLock::new(last_error),
            reload_lock: Mutex::new(()),
        }
    }

    /// Store around an already built adapter, with nothing to reload from
    pub fn from_adapter(adapter: LearnedModelAdapter) -> Self {
        Self {
            paths: None,
            current: RwLock::new(Arc::new(adapter)),
            last_error: RwLock::new(None),
            reload_lock: Mutex::new(()),
        }
    }

    /// Heuristic-only store
    pub fn empty() -> Self {
        Self::from_adapter(LearnedModelAdapter::without_model())
    }

    pub fn paths(&self) -> Option<&ModelPaths> {
        self.paths.as_ref()
    }

    /// Immutable snapshot of the active adapter
    pub fn current(&self) -> Arc<LearnedModelAdapter> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_model_loaded(&self) -> bool {
        self.current().is_loaded()
    }

    pub fn status(&self) -> ModelStatus {
        let adapter = self.current();
        ModelStatus {
            loaded: adapter.is_loaded(),
            version: adapter.model_version().map(str::to_string),
            model_path: self
                .paths
                .as_ref()
                .map(|p| p.model_path.display().to_string()),
            last_error: self
                .last_error
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
        }
    }

    /// Re-read the artifacts and swap in a new adapter
    ///
    /// Reloads are serialized. On failure the previous adapter stays active
    /// and the error is returned. A model file that has disappeared switches
    /// the store to heuristic-only mode.
    pub fn reload(&self) -> Result<ReloadOutcome> {
        let _guard = self
            .reload_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let paths = self
            .paths
            .as_ref()
            .context("No artifact paths configured for this model store")?;

        let adapter = match build_adapter(paths) {
            Ok(Some(adapter)) => adapter,
            Ok(None) => {
                warn!(path = %paths.model_path.display(), "Model file not found on reload, using heuristic model");
                LearnedModelAdapter::without_model()
            }
            Err(e) => {
                let message = format!("{:#}", e);
                warn!(error = %message, "Model reload failed, keeping previous version");
                *self
                    .last_error
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(message);
                return Err(e);
            }
        };

        let outcome = ReloadOutcome {
            loaded: adapter.is_loaded(),
            version: adapter.model_version().map(str::to_string),
        };

        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(adapter);
        *self
            .last_error
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;

        info!(loaded = outcome.loaded, version = ?outcome.version, "Model store reloaded");
        Ok(outcome)
    }
}

/// `Ok(None)` when there is no model file to load
fn build_adapter(paths: &ModelPaths) -> Result<Option<LearnedModelAdapter>> {
    if !paths.model_path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(&paths.model_path)
        .with_context(|| format!("Failed to read model file {:?}", paths.model_path))?;
    let checksum = compute_checksum(&bytes);
    verify_checksum(&paths.checksum_path(), &checksum)?;

    let version = format!("sha256:{}", &checksum[..12]);
    let regressor = OnnxRegressor::from_bytes(&bytes, version)?;
    let encoder = CategoricalEncoder::load(&paths.encoder_path)?;
    if encoder.is_empty() {
        warn!(
            path = %paths.encoder_path.display(),
            "Encoder artifact missing, categorical columns will use default codes"
        );
    }

    Ok(Some(LearnedModelAdapter::new(Arc::new(regressor), encoder)))
}

/// Compare against the sidecar digest when one exists
fn verify_checksum(checksum_path: &Path, computed: &str) -> Result<()> {
    if !checksum_path.exists() {
        return Ok(());
    }
    let content = fs::read_to_string(checksum_path)
        .with_context(|| format!("Failed to read checksum file {:?}", checksum_path))?;
    // Accepts both a bare digest and `sha256sum` output ("<digest>  <file>")
    let expected = content.split_whitespace().next().unwrap_or_default();
    if !expected.eq_ignore_ascii_case(computed) {
        anyhow::bail!("Checksum mismatch: expected {}, got {}", expected, computed);
    }
    Ok(())
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::inference::testing::{dataset_encoder, LinearModel};

    fn paths_in(dir: &Path) -> ModelPaths {
        ModelPaths::new(dir.join("model.onnx"), dir.join("encoder.json"))
    }

    #[test]
    fn test_compute_checksum() {
        assert_eq!(
            compute_checksum(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_checksum_path() {
        let paths = ModelPaths::new("/models/model.onnx", "/models/encoder.json");
        assert_eq!(paths.checksum_path(), PathBuf::from("/models/model.onnx.sha256"));
    }

    #[test]
    fn test_missing_model_is_heuristic_mode() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::load(paths_in(dir.path()));
        let status = store.status();
        assert!(!status.loaded);
        assert!(status.last_error.is_none());
        assert!(status.model_path.unwrap().ends_with("model.onnx"));
    }

    #[test]
    fn test_corrupt_model_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        fs::write(&paths.model_path, b"garbage").unwrap();

        let store = ModelStore::load(paths);
        assert!(!store.is_model_loaded());
        assert!(store.status().last_error.is_some());
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        fs::write(&paths.model_path, b"garbage").unwrap();
        fs::write(paths.checksum_path(), "deadbeef  model.onnx\n").unwrap();

        let err = build_adapter(&paths).err().unwrap();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_verify_checksum_accepts_matching_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx.sha256");
        let digest = compute_checksum(b"model");
        fs::write(&path, digest.to_uppercase()).unwrap();
        assert!(verify_checksum(&path, &digest).is_ok());
    }

    #[test]
    fn test_reload_failure_keeps_previous_adapter() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        let store = ModelStore {
            paths: Some(paths.clone()),
            current: RwLock::new(Arc::new(LearnedModelAdapter::new(
                Arc::new(LinearModel::new()),
                dataset_encoder(),
            ))),
            last_error: RwLock::new(None),
            reload_lock: Mutex::new(()),
        };

        fs::write(&paths.model_path, b"garbage").unwrap();
        assert!(store.reload().is_err());
        assert!(store.is_model_loaded());
        assert_eq!(store.status().version.as_deref(), Some("linear-test"));
        assert!(store.status().last_error.is_some());
    }

    #[test]
    fn test_reload_swaps_without_touching_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore {
            paths: Some(paths_in(dir.path())),
            current: RwLock::new(Arc::new(LearnedModelAdapter::new(
                Arc::new(LinearModel::new()),
                dataset_encoder(),
            ))),
            last_error: RwLock::new(None),
            reload_lock: Mutex::new(()),
        };

        let snapshot = store.current();
        // Model file is absent, so reload switches to heuristic-only mode
        let outcome = store.reload().unwrap();
        assert_eq!(outcome, ReloadOutcome { loaded: false, version: None });
        assert!(!store.is_model_loaded());
        assert!(snapshot.is_loaded());
    }

    #[test]
    fn test_reload_without_paths_fails() {
        let store = ModelStore::empty();
        assert!(store.reload().is_err());
        assert!(store.paths().is_none());
    }
}
