use super::{CredentialProvider, RecordService, check_identifier};
use crate::data::FormRecord;
use crate::error::ServiceError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Error payload the portal API returns on rejected requests.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Fetches and saves records against a REST resource:
/// `GET {base_url}/{resource}/{id}` and `PUT {base_url}/{resource}/{id}`.
pub struct HttpRecordService {
    client: Client,
    base_url: String,
    resource: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpRecordService {
    pub fn new(base_url: &str, resource: &str, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            resource: resource.trim_matches('/').to_string(),
            credentials,
        }
    }

    pub fn url_for(&self, identifier: &str) -> Result<String, ServiceError> {
        check_identifier(identifier)?;
        Ok(format!("{}/{}/{}", self.base_url, self.resource, identifier))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn rejected(response: Response) -> ServiceError {
        let status = response.status().as_u16();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);
        ServiceError::Rejected { status, message }
    }
}

impl RecordService for HttpRecordService {
    async fn fetch(&self, identifier: &str) -> Result<Option<FormRecord>, ServiceError> {
        let url = self.url_for(identifier)?;
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let record = response
            .json::<FormRecord>()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        debug!(%url, fields = record.len(), "record fetched");
        Ok(Some(record))
    }

    async fn save(&self, identifier: &str, record: &FormRecord) -> Result<(), ServiceError> {
        let url = self.url_for(identifier)?;
        let response = self
            .authorize(self.client.put(&url))
            .json(record)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        debug!(%url, "record saved");
        Ok(())
    }
}
