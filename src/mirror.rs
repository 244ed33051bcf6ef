//! Audit-only JSON snapshot of each model definition on disk. Never read back.

use crate::model::ModelDefinition;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct FileMirror {
    dir: PathBuf,
}

impl FileMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileMirror { dir: dir.into() }
    }

    fn path_for(&self, model_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", model_name))
    }

    /// Write `<dir>/<Name>.json`: the definition plus `createdAt`/`updatedAt`.
    pub async fn write(&self, def: &ModelDefinition) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut snapshot = serde_json::to_value(def)?;
        let now = chrono::Utc::now().to_rfc3339();
        if let Some(obj) = snapshot.as_object_mut() {
            obj.insert("createdAt".into(), now.clone().into());
            obj.insert("updatedAt".into(), now.into());
        }
        let path = self.path_for(&def.name);
        tokio::fs::write(&path, serde_json::to_vec_pretty(&snapshot)?).await?;
        Ok(path)
    }

    /// Best-effort write: failures are logged, never surfaced.
    pub async fn write_best_effort(&self, def: &ModelDefinition) -> Option<PathBuf> {
        match self.write(def).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(model = %def.name, error = %e, "model mirror write failed");
                None
            }
        }
    }

    /// Best-effort removal; a missing file is not an error.
    pub async fn remove(&self, model_name: &str) {
        match tokio::fs::remove_file(self.path_for(model_name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(model = %model_name, error = %e, "model mirror removal failed"),
        }
    }
}
