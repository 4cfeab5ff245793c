use base64::Engine;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    multipart::{Form, Part},
    Client, Response,
};
use serde_json::Value;

use crate::config::RelayConfig;
use crate::error::ClientError;
use crate::jira::types::CreatedIssue;
use crate::relay::IssueTracker;

const SERVICE: &str = "Jira";

pub struct JiraClient {
    client: Client,
    domain: Option<String>,
    email: Option<String>,
    api_token: Option<String>,
}

impl JiraClient {
    pub fn new(config: &RelayConfig) -> Self {
        JiraClient {
            client: Client::new(),
            domain: config.jira_domain.clone(),
            email: config.jira_email.clone(),
            api_token: config.jira_api_token.clone(),
        }
    }

    /// `JIRA_DOMAIN` may be a bare host or a full URL.
    fn base_url(&self) -> Result<String, ClientError> {
        let domain = RelayConfig::require(&self.domain, "JIRA_DOMAIN")?.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            Ok(domain.to_string())
        } else {
            Ok(format!("https://{}", domain))
        }
    }

    fn auth_header(&self) -> Result<String, ClientError> {
        let email = RelayConfig::require(&self.email, "JIRA_EMAIL")?;
        let token = RelayConfig::require(&self.api_token, "JIRA_API_TOKEN")?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{email}:{token}"));
        Ok(format!("Basic {encoded}"))
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(ClientError::Status {
        service: SERVICE,
        status: status.as_u16(),
        body: response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string()),
    })
}

impl IssueTracker for JiraClient {
    async fn create_issue(&self, payload: &Value) -> Result<CreatedIssue, ClientError> {
        let url = format!("{}/rest/api/3/issue", self.base_url()?);
        let auth = self.auth_header()?;

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await?;

        let issue: CreatedIssue = ensure_success(response).await?.json().await?;
        Ok(issue)
    }

    async fn upload_attachment(
        &self,
        issue_key: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<(), ClientError> {
        let url = format!("{}/rest/api/3/issue/{}/attachments", self.base_url()?, issue_key);
        let auth = self.auth_header()?;

        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(guess_content_type(file_name))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .header("X-Atlassian-Token", "no-check")
            .multipart(form)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
