//! Directory-backed store: `<root>/<id>.json`, pretty-printed.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{check_id, sort_summaries, ModelStore, StoreResult};
use crate::model::{DataModel, ModelSummary};

/// One JSON document per model in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Use `root` as the storage directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &str) -> StoreResult<PathBuf> {
        check_id(id)?;
        Ok(self.root.join(format!("{}.json", id)))
    }
}

impl ModelStore for FileStore {
    fn save(&self, model: &DataModel) -> StoreResult<()> {
        let path = self.document_path(&model.id)?;
        let json = serde_json::to_string_pretty(model)?;

        // Write beside the target and rename so readers never see a partial file.
        let tmp = self.root.join(format!(".{}.json.tmp", model.id));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        info!(id = %model.id, path = %path.display(), "saved model");
        Ok(())
    }

    fn load(&self, id: &str) -> StoreResult<Option<DataModel>> {
        let path = self.document_path(id)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn list(&self, owner: Option<&str>) -> StoreResult<Vec<ModelSummary>> {
        let mut summaries = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_document = path.extension().is_some_and(|ext| ext == "json")
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
            if !is_document {
                continue;
            }

            let model: DataModel = match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
            {
                Ok(model) => model,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable model document");
                    continue;
                }
            };

            if owner.map_or(true, |o| model.owner == o) {
                summaries.push(model.summary());
            }
        }

        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    fn delete(&self, id: &str) -> StoreResult<bool> {
        let path = self.document_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(id, "deleted model");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
