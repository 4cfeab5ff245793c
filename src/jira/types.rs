use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Response of `POST /rest/api/3/issue`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A select-list option reference, `{"id": "10033"}`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OptionRef {
    pub id: String,
}

/// Wraps plain text into an Atlassian Document Format document, one paragraph per line.
pub fn adf_document(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            json!({
                "type": "paragraph",
                "content": [{ "type": "text", "text": line }]
            })
        })
        .collect();

    json!({
        "type": "doc",
        "version": 1,
        "content": paragraphs
    })
}
