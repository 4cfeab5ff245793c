use serde::Deserialize;
use serde_json::{Map, Value};

/// Every Pipedrive v1 read wraps its payload as `{"success": .., "data": ..}`.
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Deal {
    pub title: Option<String>,
    /// Remaining attributes, custom fields included, keyed by their opaque field key.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Organization {
    pub name: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FileDescriptor {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub file_name: Option<String>,
}

impl FileDescriptor {
    pub fn id(&self) -> Option<String> {
        self.id.as_ref().and_then(record_id)
    }

    /// Original upload name, falling back to the stored file name.
    pub fn file_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.file_name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }
}

/// Normalizes a Pipedrive id: a non-zero number, a non-empty string, or an
/// object such as `{"value": 2, "name": "Acme"}` carrying one of those.
pub fn record_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => (n.as_f64() != Some(0.0)).then(|| n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Object(obj) => obj.get("value").and_then(record_id),
        _ => None,
    }
}
