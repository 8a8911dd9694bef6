//! First-use registration
//!
//! Every entry point runs [`ensure_registered`] before its first authenticated
//! call. There is no process-wide "already registered" flag: the presence of
//! both credentials in the resolved config is the only state.

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use ulid::Ulid;

use crate::client::response::{self, Endpoint};
use crate::config::{Config, ConfigStore, Source, ENV_AGENT_ID, ENV_API_KEY};
use crate::error::PriorError;
use crate::transport::{ApiRequest, Transport};

const REGISTER_PATH: &str = "/v1/agents/register";

/// Credentials issued by the service
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuedCredentials {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    agent_id: String,
}

/// Return a config with both `api_key` and `agent_id` set.
///
/// Already registered: returned unchanged, no request is made. Otherwise one
/// registration request is sent; the issued pair replaces the config's
/// credentials and is persisted before returning. Any failure surfaces as
/// [`PriorError::Registration`] with the file left untouched. No retries.
///
/// Half a pair supplied by the environment or an override is rejected
/// without a request: the issued pair would be shadowed by it on the next
/// run. A base URL from the environment or an override is used for the
/// request but never written to the file.
pub fn ensure_registered<T: Transport>(
    config: Config,
    store: &ConfigStore,
    transport: &T,
) -> Result<Config, PriorError> {
    if config.is_registered() {
        return Ok(config);
    }

    let external = |source: Source| matches!(source, Source::Env | Source::Override);
    if external(config.origins.api_key) || external(config.origins.agent_id) {
        let (set, missing) = if config.api_key.is_some() {
            ("API key", "agent ID")
        } else {
            ("agent ID", "API key")
        };
        return Err(PriorError::Registration(format!(
            "an {} was supplied without an {}; set both ({} and {}) or neither",
            set, missing, ENV_API_KEY, ENV_AGENT_ID
        )));
    }

    // Read before the network call so a corrupt file fails fast and is not
    // silently replaced.
    let mut record = store.read()?.unwrap_or_default();

    let name = agent_name();
    info!(%name, base_url = %config.base_url, "registering new agent");

    let request = ApiRequest::post(REGISTER_PATH, json!({ "name": name }));
    let response = transport
        .send(&request)
        .map_err(|e| PriorError::Registration(e.to_string()))?;
    let issued: IssuedCredentials = response::decode(Endpoint::Register, response)
        .map_err(|e| PriorError::Registration(e.to_string()))?;

    if issued.api_key.trim().is_empty() || issued.agent_id.trim().is_empty() {
        return Err(PriorError::Registration(
            "server response is missing apiKey or agentId".to_string(),
        ));
    }

    record.api_key = Some(issued.api_key.clone());
    record.agent_id = Some(issued.agent_id.clone());
    // The key is only valid on the server that issued it.
    match config.origins.base_url {
        Source::File | Source::Default | Source::Unset => {
            record.base_url = Some(config.base_url.clone());
        }
        Source::Env | Source::Override => {
            warn!(
                base_url = %config.base_url,
                source = %config.origins.base_url,
                "agent registered against a base URL that is not persisted; set it again on later runs"
            );
        }
    }
    store.save(&record)?;

    info!(agent_id = %issued.agent_id, "agent registered");
    Ok(Config {
        api_key: Some(issued.api_key),
        agent_id: Some(issued.agent_id),
        origins: crate::config::Origins {
            api_key: Source::File,
            agent_id: Source::File,
            ..config.origins
        },
        ..config
    })
}

fn agent_name() -> String {
    let id = Ulid::new().to_string().to_lowercase();
    format!("prior-rust-{}", &id[id.len() - 8..])
}
