//! Translation of a Pipedrive deal/organization pair into Jira issue fields.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::config::{RelayConfig, TrackerFields};
use crate::jira::{adf_document, OptionRef};
use crate::pipedrive::{Deal, Organization};

pub const UNTITLED_DEAL: &str = "Untitled deal";
pub const UNKNOWN_ORGANIZATION: &str = "Unknown organization";

/// Shape of the organization's partner field as Pipedrive delivers it.
#[derive(Debug, Clone, PartialEq)]
pub enum PartnerField {
    /// Linked record, e.g. `{"name": "Partner Co", "value": 5}`.
    Object(Map<String, Value>),
    Scalar(Value),
    Absent,
}

impl PartnerField {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => PartnerField::Absent,
            Some(Value::Object(obj)) => PartnerField::Object(obj.clone()),
            Some(other) => PartnerField::Scalar(other.clone()),
        }
    }

    pub fn normalize(self) -> Option<String> {
        match self {
            PartnerField::Absent => None,
            PartnerField::Object(obj) => match obj.get("name") {
                Some(name) => scalar_text(name),
                None => {
                    log::warn!("Partner field is an object without a name; omitting it");
                    None
                }
            },
            PartnerField::Scalar(Value::Array(_)) => {
                log::warn!("Partner field is a list; omitting it");
                None
            }
            PartnerField::Scalar(value) => scalar_text(&value),
        }
    }
}

/// Field set destined for one Jira issue.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueFields {
    pub summary: String,
    pub description: String,
    pub client: Option<String>,
    pub partner: Option<String>,
    pub presentation_types: Vec<OptionRef>,
    pub dates: [Option<Value>; 3],
}

pub fn transform(
    deal_id: &str,
    deal: &Deal,
    organization: &Organization,
    config: &RelayConfig,
) -> IssueFields {
    let source = &config.source_fields;
    let deal_field = |key: &Option<String>| key.as_deref().and_then(|key| deal.fields.get(key));

    let summary = deal
        .title
        .clone()
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED_DEAL.to_string());

    let client = organization
        .name
        .clone()
        .filter(|name| !name.trim().is_empty());

    let description = format!(
        "Organization: {}\nPipedrive deal: {}",
        client.as_deref().unwrap_or(UNKNOWN_ORGANIZATION),
        deal_id
    );

    let partner = PartnerField::from_value(
        source
            .partner
            .as_deref()
            .and_then(|key| organization.fields.get(key)),
    )
    .normalize();

    let presentation_types = map_presentation_types(
        deal_field(&source.presentation_type),
        &config.presentation_options,
    );

    let dates = [&source.date_1, &source.date_2, &source.date_3]
        .map(|key| deal_field(key).filter(|v| is_truthy(v)).cloned());

    IssueFields {
        summary,
        description,
        client,
        partner,
        presentation_types,
        dates,
    }
}

/// Looks each source option up in `options`, keeping source order and
/// dropping values the table does not know.
pub fn map_presentation_types(
    value: Option<&Value>,
    options: &HashMap<String, String>,
) -> Vec<OptionRef> {
    let raw: Vec<String> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let text = scalar_text(item);
                if text.is_none() {
                    log::warn!("Skipping presentation type element {}", item);
                }
                text
            })
            .collect(),
        // multi-option fields arrive as "33,34"
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(other) => match scalar_text(other) {
            Some(text) => vec![text],
            None => {
                log::warn!("Skipping presentation type value {}", other);
                Vec::new()
            }
        },
    };

    raw.into_iter()
        .filter_map(|source_id| match options.get(&source_id) {
            Some(id) => Some(OptionRef { id: id.clone() }),
            None => {
                log::warn!("No Jira option mapped for presentation type {:?}; skipping", source_id);
                None
            }
        })
        .collect()
}

impl IssueFields {
    /// Request body for `POST /rest/api/3/issue`. Optional custom fields are
    /// left out entirely when their value is empty or their Jira id is not configured.
    pub fn to_payload(&self, config: &RelayConfig) -> Value {
        let mut fields = Map::new();
        fields.insert("project".into(), json!({ "key": config.jira_project_key }));
        fields.insert("summary".into(), json!(self.summary));
        fields.insert("description".into(), adf_document(&self.description));
        fields.insert("issuetype".into(), json!({ "name": config.jira_issue_type }));

        let target: &TrackerFields = &config.tracker_fields;
        let mut set = |field: &Option<String>, value: Option<Value>| {
            if let (Some(field), Some(value)) = (field, value) {
                if is_truthy(&value) {
                    fields.insert(field.clone(), value);
                }
            }
        };

        set(&target.client, self.client.clone().map(Value::String));
        set(&target.date_1, self.dates[0].clone());
        set(&target.date_2, self.dates[1].clone());
        set(&target.date_3, self.dates[2].clone());
        set(&target.partner, self.partner.clone().map(Value::String));
        set(
            &target.presentation_type,
            Some(json!(self.presentation_types)),
        );

        json!({ "fields": fields })
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Python-style truthiness, used to decide whether an optional field is sent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
    }
}
