use super::{RecordService, check_identifier};
use crate::data::FormRecord;
use crate::error::ServiceError;
use ahash::AHashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Keeps records in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRecordService {
    records: Mutex<AHashMap<String, FormRecord>>,
}

impl InMemoryRecordService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store, e.g. with a record saved in an earlier session.
    pub fn with_record(self, identifier: &str, record: FormRecord) -> Self {
        self.records().insert(identifier.to_string(), record);
        self
    }

    /// The record currently stored under `identifier`.
    pub fn stored(&self, identifier: &str) -> Option<FormRecord> {
        self.records().get(identifier).cloned()
    }

    fn records(&self) -> MutexGuard<'_, AHashMap<String, FormRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordService for InMemoryRecordService {
    async fn fetch(&self, identifier: &str) -> Result<Option<FormRecord>, ServiceError> {
        check_identifier(identifier)?;
        Ok(self.records().get(identifier).cloned())
    }

    async fn save(&self, identifier: &str, record: &FormRecord) -> Result<(), ServiceError> {
        check_identifier(identifier)?;
        self.records().insert(identifier.to_string(), record.clone());
        Ok(())
    }
}
