//! Deal-to-issue relay: one webhook call fetches the deal and its organization
//! from Pipedrive, creates a Jira issue, then copies the deal's files over.
//!
//! The flow is strictly sequential:
//! `Received -> Validated -> DealFetched -> OrgFetched -> Transformed -> IssueCreated -> AttachmentsRelayed`.
//! A failure before `IssueCreated` aborts the call; attachment failures do not.

pub mod attachments;
pub mod transform;

#[cfg(test)]
pub(crate) mod testing;

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::RelayConfig;
use crate::error::{ClientError, RelayError};
use crate::jira::CreatedIssue;
use crate::pipedrive::{record_id, Deal, FileDescriptor, Organization};

pub use attachments::{relay_attachments, AttachmentReport};
pub use transform::transform;

/// Read side: the CRM the deal lives in.
#[allow(async_fn_in_trait)]
pub trait SourceCrm {
    async fn fetch_deal(&self, id: &str) -> Result<Deal, ClientError>;
    async fn fetch_organization(&self, id: &str) -> Result<Organization, ClientError>;
    async fn list_deal_files(&self, deal_id: &str) -> Result<Vec<FileDescriptor>, ClientError>;
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ClientError>;
}

/// Write side: the tracker issues are created in.
#[allow(async_fn_in_trait)]
pub trait IssueTracker {
    async fn create_issue(&self, payload: &Value) -> Result<CreatedIssue, ClientError>;
    async fn upload_attachment(
        &self,
        issue_key: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<(), ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    DealFetched,
    OrgFetched,
    Transformed,
    IssueCreated,
    AttachmentsRelayed,
}

impl Stage {
    /// Last stage reached before `err` stopped the invocation.
    pub fn before(err: &RelayError) -> Stage {
        match err {
            RelayError::MissingIdentifiers => Stage::Received,
            RelayError::DealFetch { .. } => Stage::Validated,
            RelayError::OrganizationFetch { .. } => Stage::DealFetched,
            RelayError::IssueCreation(_) => Stage::Transformed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::DealFetched => "deal_fetched",
            Stage::OrgFetched => "org_fetched",
            Stage::Transformed => "transformed",
            Stage::IssueCreated => "issue_created",
            Stage::AttachmentsRelayed => "attachments_relayed",
        }
    }
}

/// Deal and organization ids carried by an inbound webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookIds {
    pub deal_id: String,
    pub org_id: String,
}

impl WebhookIds {
    /// Accepts `current.{id,org_id}` (Pipedrive webhooks v1), `data.{id,org_id}`
    /// (v2) and a flat `{deal_id, org_id}` body, in that order.
    pub fn from_body(body: &Value) -> Option<Self> {
        let candidates = [
            (body.get("current"), "id"),
            (body.get("data"), "id"),
            (Some(body), "deal_id"),
        ];

        candidates.into_iter().find_map(|(container, deal_key)| {
            let container = container?;
            Some(WebhookIds {
                deal_id: container.get(deal_key).and_then(record_id)?,
                org_id: container.get("org_id").and_then(record_id)?,
            })
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RelayedIssue {
    #[serde(flatten)]
    pub issue: CreatedIssue,
    pub attachments: AttachmentReport,
}

/// Status code and JSON body answered to the webhook caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayOutcome {
    pub status: u16,
    pub body: Value,
}

pub async fn handle_webhook<C, T>(
    body: &Value,
    config: &RelayConfig,
    crm: &C,
    tracker: &T,
) -> RelayOutcome
where
    C: SourceCrm,
    T: IssueTracker,
{
    match relay_deal(body, config, crm, tracker).await {
        Ok(relayed) => RelayOutcome {
            status: 201,
            body: json!(relayed),
        },
        Err(err) => {
            let stage = Stage::before(&err);
            if matches!(err, RelayError::MissingIdentifiers) {
                log::warn!("Rejected webhook: {}", err);
            } else {
                log::error!("Relay failed after {}: {}", stage.as_str(), err);
            }
            RelayOutcome {
                status: err.status(),
                body: json!({ "error": err.to_string(), "stage": stage.as_str() }),
            }
        }
    }
}

pub async fn relay_deal<C, T>(
    body: &Value,
    config: &RelayConfig,
    crm: &C,
    tracker: &T,
) -> Result<RelayedIssue, RelayError>
where
    C: SourceCrm,
    T: IssueTracker,
{
    log::debug!("{:?}", Stage::Received);
    let ids = WebhookIds::from_body(body).ok_or(RelayError::MissingIdentifiers)?;
    log::debug!("{:?}: deal {} org {}", Stage::Validated, ids.deal_id, ids.org_id);

    let deal = crm
        .fetch_deal(&ids.deal_id)
        .await
        .map_err(|source| RelayError::DealFetch {
            id: ids.deal_id.clone(),
            source,
        })?;
    log::debug!("{:?}", Stage::DealFetched);

    let organization = crm
        .fetch_organization(&ids.org_id)
        .await
        .map_err(|source| RelayError::OrganizationFetch {
            id: ids.org_id.clone(),
            source,
        })?;
    log::debug!("{:?}", Stage::OrgFetched);

    let fields = transform(&ids.deal_id, &deal, &organization, config);
    let payload = fields.to_payload(config);
    log::debug!("{:?}: {}", Stage::Transformed, payload);

    let issue = tracker
        .create_issue(&payload)
        .await
        .map_err(RelayError::IssueCreation)?;
    log::info!("{:?}: {} for deal {}", Stage::IssueCreated, issue.key, ids.deal_id);

    let attachments = relay_attachments(&ids.deal_id, &issue, crm, tracker).await;
    log::debug!(
        "{:?}: {} uploaded, {} failed",
        Stage::AttachmentsRelayed,
        attachments.uploaded.len(),
        attachments.failed.len()
    );

    Ok(RelayedIssue { issue, attachments })
}
