use reqwest::{header::ACCEPT, Client};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::RelayConfig;
use crate::error::ClientError;
use crate::pipedrive::types::{Deal, Envelope, FileDescriptor, Organization};
use crate::relay::SourceCrm;

const SERVICE: &str = "Pipedrive";

pub struct PipedriveClient {
    client: Client,
    api_base: String,
    api_token: Option<String>,
}

impl PipedriveClient {
    pub fn new(config: &RelayConfig) -> Self {
        PipedriveClient {
            client: Client::new(),
            api_base: config.pipedrive_api_base.clone(),
            api_token: config.pipedrive_api_token.clone(),
        }
    }

    /// Builds `{api_base}/{segments..}?api_token=..`, escaping every segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let token = RelayConfig::require(&self.api_token, "PIPEDRIVE_API_TOKEN")?;

        let mut url = Url::parse(&self.api_base)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api_token", token);

        Ok(url)
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Option<T>, ClientError> {
        let url = self.endpoint(segments)?;
        log::debug!("GET {} /{}", SERVICE, segments.join("/"));

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body: response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read response body>".to_string()),
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        if !envelope.success {
            log::warn!("{} reported success=false for /{}", SERVICE, segments.join("/"));
        }
        Ok(envelope.data)
    }
}

fn non_empty<'a>(id: &'a str, record: &'static str) -> Result<&'a str, ClientError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ClientError::EmptyIdentifier(record));
    }
    Ok(id)
}

impl SourceCrm for PipedriveClient {
    async fn fetch_deal(&self, id: &str) -> Result<Deal, ClientError> {
        let id = non_empty(id, "deal")?;
        self.get_data(&["deals", id])
            .await?
            .ok_or(ClientError::EmptyResponse("Pipedrive deal"))
    }

    async fn fetch_organization(&self, id: &str) -> Result<Organization, ClientError> {
        let id = non_empty(id, "organization")?;
        self.get_data(&["organizations", id])
            .await?
            .ok_or(ClientError::EmptyResponse("Pipedrive organization"))
    }

    async fn list_deal_files(&self, deal_id: &str) -> Result<Vec<FileDescriptor>, ClientError> {
        let deal_id = non_empty(deal_id, "deal")?;
        Ok(self
            .get_data(&["deals", deal_id, "files"])
            .await?
            .unwrap_or_default())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ClientError> {
        let file_id = non_empty(file_id, "file")?;
        let url = self.endpoint(&["files", file_id, "download"])?;
        log::debug!("GET {} /files/{}/download", SERVICE, file_id);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
