use serde_json::Value;
use worker::*;

mod config;
mod error;
mod jira;
mod pipedrive;
mod relay;
mod router;
mod utils;

use config::RelayConfig;
use jira::JiraClient;
use pipedrive::PipedriveClient;
use router::Route;

fn json_response(body: &Value, status: u16) -> Result<Response> {
    Ok(Response::from_json(body)?.with_status(status))
}

// Fetch Event Handler
#[event(fetch)]
pub async fn main(mut req: Request, env: Env, _ctx: worker::Context) -> Result<Response> {
    // Set panic hook for Cloudflare
    utils::set_panic_hook();
    utils::init_logger(log::LevelFilter::Info);

    let config = RelayConfig::from_env(&env);
    log::set_max_level(config.log_level);

    log::debug!("{:?} {}", req.method(), req.path());

    let outcome = match router::route(&req.method(), &req.path()) {
        Ok(Route::Webhook) => {
            let body = req.json::<Value>().await.map_err(|e| e.to_string());
            let crm = PipedriveClient::new(&config);
            let tracker = JiraClient::new(&config);
            router::webhook(body, &config, &crm, &tracker).await
        }
        Ok(Route::Liveness) => router::liveness(),
        Err(outcome) => outcome,
    };

    json_response(&outcome.body, outcome.status)
}
