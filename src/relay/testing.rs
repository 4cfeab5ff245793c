//! In-memory stand-ins for Pipedrive and Jira used by the relay tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::config::{RelayConfig, SourceFields, TrackerFields};
use crate::error::ClientError;
use crate::jira::CreatedIssue;
use crate::pipedrive::{Deal, FileDescriptor, Organization};
use crate::relay::{IssueTracker, SourceCrm};

pub const PRESENTATION_KEY: &str = "5bc985e61592b58e001c657305423499b6a23ce4";
pub const DATE_1_KEY: &str = "77554ed03246265be68e75bc152243b19d492d9f";
pub const DATE_2_KEY: &str = "348bc2d5699beb5a76ae34f9318055a0bbbef3a8";
pub const DATE_3_KEY: &str = "db137c6e874446aaa7e42d1638538f5138786633";
pub const PARTNER_KEY: &str = "fea50f9d3ff5801b5fa9c451a8110445442db46d";

pub fn sample_config() -> RelayConfig {
    let mut config = RelayConfig::from_lookup(|_| None);
    config.source_fields = SourceFields {
        presentation_type: Some(PRESENTATION_KEY.into()),
        date_1: Some(DATE_1_KEY.into()),
        date_2: Some(DATE_2_KEY.into()),
        date_3: Some(DATE_3_KEY.into()),
        partner: Some(PARTNER_KEY.into()),
    };
    config.tracker_fields = TrackerFields {
        client: Some("customfield_10088".into()),
        presentation_type: Some("customfield_1008".into()),
        date_1: Some("customfield_10090".into()),
        date_2: Some("customfield_10089".into()),
        date_3: Some("customfield_10091".into()),
        partner: Some("customfield_10092".into()),
    };
    config.presentation_options = HashMap::from([
        ("33".to_string(), "33".to_string()),
        ("34".to_string(), "10034".to_string()),
    ]);
    config
}

fn not_found(what: &str) -> ClientError {
    ClientError::Status {
        service: "Pipedrive",
        status: 404,
        body: format!("{{\"error\":\"{what} not found\"}}"),
    }
}

#[derive(Default)]
pub struct FakeCrm {
    pub deals: HashMap<String, Value>,
    pub organizations: HashMap<String, Value>,
    /// `None` makes the file listing fail.
    pub files: Option<Vec<Value>>,
    /// Files missing here fail to download.
    pub contents: HashMap<String, Vec<u8>>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeCrm {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl SourceCrm for FakeCrm {
    async fn fetch_deal(&self, id: &str) -> Result<Deal, ClientError> {
        self.calls.borrow_mut().push(format!("deal:{id}"));
        let value = self.deals.get(id).ok_or_else(|| not_found("deal"))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    async fn fetch_organization(&self, id: &str) -> Result<Organization, ClientError> {
        self.calls.borrow_mut().push(format!("organization:{id}"));
        let value = self
            .organizations
            .get(id)
            .ok_or_else(|| not_found("organization"))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    async fn list_deal_files(&self, deal_id: &str) -> Result<Vec<FileDescriptor>, ClientError> {
        self.calls.borrow_mut().push(format!("files:{deal_id}"));
        let files = self.files.clone().ok_or_else(|| not_found("files"))?;
        Ok(serde_json::from_value(Value::Array(files))?)
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ClientError> {
        self.calls.borrow_mut().push(format!("download:{file_id}"));
        self.contents
            .get(file_id)
            .cloned()
            .ok_or_else(|| not_found("file"))
    }
}

#[derive(Default)]
pub struct FakeTracker {
    pub create_failure: Option<(u16, String)>,
    pub failing_uploads: HashSet<String>,
    pub created: RefCell<Vec<Value>>,
    pub uploads: RefCell<Vec<(String, String, Vec<u8>)>>,
}

impl IssueTracker for FakeTracker {
    async fn create_issue(&self, payload: &Value) -> Result<CreatedIssue, ClientError> {
        if let Some((status, body)) = &self.create_failure {
            return Err(ClientError::Status {
                service: "Jira",
                status: *status,
                body: body.clone(),
            });
        }

        let mut created = self.created.borrow_mut();
        created.push(payload.clone());
        let n = created.len();
        Ok(CreatedIssue {
            id: format!("{}", 10000 + n),
            key: format!("RQIMP-{n}"),
            url: None,
        })
    }

    async fn upload_attachment(
        &self,
        issue_key: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<(), ClientError> {
        if self.failing_uploads.contains(file_name) {
            return Err(ClientError::Status {
                service: "Jira",
                status: 413,
                body: "attachment too large".into(),
            });
        }
        self.uploads
            .borrow_mut()
            .push((issue_key.to_string(), file_name.to_string(), content));
        Ok(())
    }
}
