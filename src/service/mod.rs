//! Record services: where a form's record is fetched from and saved to.
//!
//! The engine only ever sees the two futures a service returns; transport,
//! authentication and storage layout stay behind the [`RecordService`] trait.

use crate::data::FormRecord;
use crate::error::ServiceError;
use std::future::Future;

mod file;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use file::JsonFileRecordService;
#[cfg(feature = "http")]
pub use http::HttpRecordService;
pub use memory::InMemoryRecordService;

/// An asynchronous fetch/save pair keyed by a record identifier
/// (e.g. "lipid profile for patient 1042").
pub trait RecordService: Send + Sync {
    /// Fetches the stored record. `Ok(None)` means nothing has been saved yet.
    fn fetch(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<Option<FormRecord>, ServiceError>> + Send;

    /// Stores the whole record under `identifier`.
    fn save(
        &self,
        identifier: &str,
        record: &FormRecord,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

/// Supplies the bearer credential for outbound calls.
///
/// The session store owns login state; services only ask for the token at
/// request time.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token, for tools and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential {
    token: Option<String>,
}

impl StaticCredential {
    pub fn new(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl CredentialProvider for StaticCredential {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Rejects identifiers that could escape a storage namespace.
pub(crate) fn check_identifier(identifier: &str) -> Result<(), ServiceError> {
    let invalid = identifier.is_empty()
        || identifier.contains(['/', '\\'])
        || identifier.contains("..")
        || identifier.chars().any(char::is_control);
    if invalid {
        Err(ServiceError::InvalidIdentifier(identifier.to_string()))
    } else {
        Ok(())
    }
}
