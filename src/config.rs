use std::collections::HashMap;

use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use worker::Env;

use crate::error::ClientError;

pub const DEFAULT_PIPEDRIVE_API_BASE: &str = "https://api.pipedrive.com/v1";
pub const DEFAULT_JIRA_PROJECT_KEY: &str = "RQIMP";
pub const DEFAULT_JIRA_ISSUE_TYPE: &str = "Task";

const REQUIRED_SETTINGS: [&str; 4] = [
    "PIPEDRIVE_API_TOKEN",
    "JIRA_API_TOKEN",
    "JIRA_EMAIL",
    "JIRA_DOMAIN",
];

/// Pipedrive custom-field keys read from the deal and the organization.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct SourceFields {
    pub presentation_type: Option<String>,
    pub date_1: Option<String>,
    pub date_2: Option<String>,
    pub date_3: Option<String>,
    pub partner: Option<String>,
}

/// Jira custom-field ids the translated values are written to.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct TrackerFields {
    pub client: Option<String>,
    pub presentation_type: Option<String>,
    pub date_1: Option<String>,
    pub date_2: Option<String>,
    pub date_3: Option<String>,
    pub partner: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub pipedrive_api_token: Option<String>,
    pub pipedrive_api_base: String,
    pub jira_api_token: Option<String>,
    pub jira_email: Option<String>,
    pub jira_domain: Option<String>,
    pub jira_project_key: String,
    pub jira_issue_type: String,
    pub source_fields: SourceFields,
    pub tracker_fields: TrackerFields,
    /// Pipedrive option id -> Jira option id for the presentation-type field.
    pub presentation_options: HashMap<String, String>,
    pub log_level: LevelFilter,
}

impl RelayConfig {
    /// Reads secrets first and falls back to plain `[vars]`.
    pub fn from_env(env: &Env) -> Self {
        Self::from_lookup(|key| {
            env.secret(key)
                .ok()
                .map(|v| v.to_string())
                .or_else(|| env.var(key).ok().map(|v| v.to_string()))
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        for key in REQUIRED_SETTINGS {
            if get(key).is_none() {
                log::warn!("{} is not set; calls that need it will fail", key);
            }
        }

        let log_level = get("RELAY_LOG_LEVEL")
            .and_then(|level| match level.parse::<LevelFilter>() {
                Ok(level) => Some(level),
                Err(_) => {
                    log::warn!("Ignoring invalid RELAY_LOG_LEVEL {:?}", level);
                    None
                }
            })
            .unwrap_or(LevelFilter::Info);

        RelayConfig {
            pipedrive_api_token: get("PIPEDRIVE_API_TOKEN"),
            pipedrive_api_base: get("PIPEDRIVE_API_BASE")
                .unwrap_or_else(|| DEFAULT_PIPEDRIVE_API_BASE.to_string()),
            jira_api_token: get("JIRA_API_TOKEN"),
            jira_email: get("JIRA_EMAIL"),
            jira_domain: get("JIRA_DOMAIN"),
            jira_project_key: get("JIRA_PROJECT_KEY")
                .unwrap_or_else(|| DEFAULT_JIRA_PROJECT_KEY.to_string()),
            jira_issue_type: get("JIRA_ISSUE_TYPE")
                .unwrap_or_else(|| DEFAULT_JIRA_ISSUE_TYPE.to_string()),
            source_fields: json_table(get("PIPEDRIVE_FIELDS"), "PIPEDRIVE_FIELDS"),
            tracker_fields: json_table(get("JIRA_FIELDS"), "JIRA_FIELDS"),
            presentation_options: json_table(
                get("PRESENTATION_TYPE_OPTIONS"),
                "PRESENTATION_TYPE_OPTIONS",
            ),
            log_level,
        }
    }

    pub fn require<'a>(
        value: &'a Option<String>,
        name: &'static str,
    ) -> Result<&'a str, ClientError> {
        value.as_deref().ok_or(ClientError::MissingConfig(name))
    }
}

fn json_table<T: DeserializeOwned + Default>(raw: Option<String>, name: &str) -> T {
    let Some(raw) = raw else {
        log::warn!("{} is not set; the fields it maps will be omitted", name);
        return T::default();
    };

    match serde_json::from_str(&raw) {
        Ok(table) => table,
        Err(e) => {
            log::warn!("{} is not valid JSON ({}); ignoring it", name, e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = RelayConfig::from_lookup(|_| None);

        assert_eq!(config.pipedrive_api_base, DEFAULT_PIPEDRIVE_API_BASE);
        assert_eq!(config.jira_project_key, "RQIMP");
        assert_eq!(config.jira_issue_type, "Task");
        assert!(config.pipedrive_api_token.is_none());
        assert!(config.presentation_options.is_empty());
        assert!(config.tracker_fields.partner.is_none());
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = RelayConfig::from_lookup(lookup_from(&[("JIRA_EMAIL", "  ")]));
        assert!(config.jira_email.is_none());
        assert!(matches!(
            RelayConfig::require(&config.jira_email, "JIRA_EMAIL"),
            Err(ClientError::MissingConfig("JIRA_EMAIL"))
        ));
    }

    #[test]
    fn field_tables_are_parsed_from_json() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            (
                "PIPEDRIVE_FIELDS",
                r#"{"presentation_type":"5bc985e6","partner":"fea50f9d"}"#,
            ),
            (
                "JIRA_FIELDS",
                r#"{"client":"customfield_10088","partner":"customfield_10092"}"#,
            ),
            ("PRESENTATION_TYPE_OPTIONS", r#"{"33":"10033"}"#),
            ("RELAY_LOG_LEVEL", "debug"),
        ]));

        assert_eq!(
            config.source_fields.presentation_type.as_deref(),
            Some("5bc985e6")
        );
        assert_eq!(config.source_fields.date_1, None);
        assert_eq!(
            config.tracker_fields.client.as_deref(),
            Some("customfield_10088")
        );
        assert_eq!(
            config.presentation_options.get("33").map(String::as_str),
            Some("10033")
        );
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn malformed_table_falls_back_to_empty() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("PRESENTATION_TYPE_OPTIONS", "{not json"),
            ("RELAY_LOG_LEVEL", "loud"),
        ]));
        assert!(config.presentation_options.is_empty());
        assert_eq!(config.log_level, LevelFilter::Info);
    }
}
