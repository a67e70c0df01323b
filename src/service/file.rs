use super::{RecordService, check_identifier};
use crate::data::FormRecord;
use crate::error::ServiceError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores one pretty-printed JSON file per record identifier under a root directory.
#[derive(Debug, Clone)]
pub struct JsonFileRecordService {
    root: PathBuf,
}

impl JsonFileRecordService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `identifier`.
    pub fn path_for(&self, identifier: &str) -> Result<PathBuf, ServiceError> {
        check_identifier(identifier)?;
        Ok(self.root.join(format!("{}.json", identifier)))
    }
}

impl RecordService for JsonFileRecordService {
    async fn fetch(&self, identifier: &str) -> Result<Option<FormRecord>, ServiceError> {
        let path = self.path_for(identifier)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_slice(&bytes)?;
        debug!(path = %path.display(), "record read");
        Ok(Some(record))
    }

    async fn save(&self, identifier: &str, record: &FormRecord) -> Result<(), ServiceError> {
        let path = self.path_for(identifier)?;
        let body = serde_json::to_vec_pretty(record)?;
        tokio::fs::create_dir_all(&self.root).await?;

        // Write to a sibling file first so a crash never leaves a truncated record.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), "record written");
        Ok(())
    }
}
