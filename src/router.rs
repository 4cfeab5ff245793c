//! Request routing kept apart from the worker types that carry the request,
//! so every branch answers with a plain [`RelayOutcome`].

use serde_json::{json, Value};
use worker::Method;

use crate::config::RelayConfig;
use crate::relay::{self, IssueTracker, RelayOutcome, SourceCrm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Webhook,
    Liveness,
}

fn error_outcome(status: u16, message: &str) -> RelayOutcome {
    RelayOutcome {
        status,
        body: json!({ "error": message }),
    }
}

/// Resolves `path` to a route, or the 404/405 answer when there is none.
pub fn route(method: &Method, path: &str) -> Result<Route, RelayOutcome> {
    let (route, allowed) = match path {
        "/webhook" => (Route::Webhook, Method::Post),
        "/" | "/health" => (Route::Liveness, Method::Get),
        _ => return Err(error_outcome(404, "Not Found")),
    };

    if *method != allowed {
        return Err(error_outcome(405, "Method Not Allowed"));
    }
    Ok(route)
}

pub fn liveness() -> RelayOutcome {
    RelayOutcome {
        status: 200,
        body: json!({ "status": "ok" }),
    }
}

/// `body` is the parsed request body, or why it could not be parsed.
pub async fn webhook<C, T>(
    body: Result<Value, String>,
    config: &RelayConfig,
    crm: &C,
    tracker: &T,
) -> RelayOutcome
where
    C: SourceCrm,
    T: IssueTracker,
{
    match body {
        Ok(body) => relay::handle_webhook(&body, config, crm, tracker).await,
        Err(e) => {
            log::warn!("Unreadable webhook body: {}", e);
            error_outcome(400, "Bad Request")
        }
    }
}
