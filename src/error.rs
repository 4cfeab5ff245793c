use thiserror::Error;

/// Failure of a single outbound call to Pipedrive or Jira.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("{0} identifier is empty")]
    EmptyIdentifier(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} response carried no data")]
    EmptyResponse(&'static str),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure that aborts a webhook invocation.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("request is missing the deal id or the organization id")]
    MissingIdentifiers,

    #[error("failed to fetch deal {id}: {source}")]
    DealFetch {
        id: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to fetch organization {id}: {source}")]
    OrganizationFetch {
        id: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to create Jira issue: {0}")]
    IssueCreation(#[source] ClientError),
}

impl RelayError {
    /// HTTP status answered to the webhook caller.
    ///
    /// A failed read passes an upstream 5xx through; a failed issue creation
    /// and every other fault is a 500.
    pub fn status(&self) -> u16 {
        let source = match self {
            RelayError::MissingIdentifiers => return 400,
            RelayError::IssueCreation(_) => return 500,
            RelayError::DealFetch { source, .. } => source,
            RelayError::OrganizationFetch { source, .. } => source,
        };

        match source.upstream_status() {
            Some(status) if (500..600).contains(&status) => status,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16) -> ClientError {
        ClientError::Status {
            service: "Jira",
            status,
            body: "{\"errorMessages\":[\"boom\"]}".to_string(),
        }
    }

    #[test]
    fn missing_identifiers_is_bad_request() {
        assert_eq!(RelayError::MissingIdentifiers.status(), 400);
    }

    #[test]
    fn client_side_upstream_status_becomes_500() {
        assert_eq!(RelayError::IssueCreation(status_error(400)).status(), 500);
        assert_eq!(
            RelayError::DealFetch {
                id: "1".into(),
                source: status_error(404)
            }
            .status(),
            500
        );
    }

    #[test]
    fn server_side_fetch_status_is_passed_through() {
        let err = RelayError::DealFetch {
            id: "1".into(),
            source: status_error(503),
        };
        assert_eq!(err.status(), 503);
    }

    #[test]
    fn issue_creation_failure_is_always_500() {
        assert_eq!(RelayError::IssueCreation(status_error(503)).status(), 500);
        assert_eq!(RelayError::IssueCreation(status_error(502)).status(), 500);
    }

    #[test]
    fn config_fault_is_500() {
        let err = RelayError::OrganizationFetch {
            id: "2".into(),
            source: ClientError::MissingConfig("PIPEDRIVE_API_TOKEN"),
        };
        assert_eq!(err.status(), 500);
        assert!(err.to_string().contains("PIPEDRIVE_API_TOKEN"));
    }

    #[test]
    fn upstream_body_is_part_of_message() {
        let err = RelayError::IssueCreation(status_error(400));
        assert!(err.to_string().contains("errorMessages"));
    }
}
