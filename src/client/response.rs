//! Response decoding and error translation
//!
//! The service answers either with a bare JSON document or with an envelope
//! `{"ok": bool, "data": ..., "error": ...}`. Both are accepted.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PriorError;
use crate::transport::{ApiResponse, TransportError};

/// Which remote capability produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Register,
    Search,
    Contribute,
    Feedback,
    Get,
    Retract,
    Claim,
    Verify,
    Profile,
}

impl Endpoint {
    fn is_handshake(&self) -> bool {
        matches!(self, Endpoint::Claim | Endpoint::Verify)
    }
}

/// Decode a response into `T`, or translate it into a [`PriorError`]
pub(crate) fn decode<T: DeserializeOwned>(
    endpoint: Endpoint,
    response: ApiResponse,
) -> Result<T, PriorError> {
    let payload = payload(endpoint, response)?;
    serde_json::from_value(payload).map_err(|e| {
        PriorError::Transport(TransportError::Decode(format!(
            "unexpected {:?} response shape: {}",
            endpoint, e
        )))
    })
}

/// Success payload with any envelope removed. An empty body is `null`.
pub(crate) fn payload(endpoint: Endpoint, response: ApiResponse) -> Result<Value, PriorError> {
    let body = parse_body(&response)?;

    if !response.is_success() {
        return Err(classify(endpoint, response.status, &body));
    }

    match envelope_ok(&body) {
        Some(true) => Ok(body.get("data").cloned().unwrap_or(Value::Null)),
        // `ok: false` on a 2xx is still a rejected request.
        Some(false) => Err(classify(endpoint, 400, &body)),
        None => Ok(body),
    }
}

fn parse_body(response: &ApiResponse) -> Result<Value, PriorError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_str(&response.body) {
        Ok(value) => Ok(value),
        // Error pages from proxies are often HTML; keep the status meaningful.
        Err(_) if !response.is_success() => Ok(Value::String(truncate(&response.body, 200))),
        Err(e) => Err(PriorError::Transport(TransportError::Decode(e.to_string()))),
    }
}

fn envelope_ok(body: &Value) -> Option<bool> {
    body.as_object()?.get("ok")?.as_bool()
}

/// Map a rejected request to the error taxonomy
pub(crate) fn classify(endpoint: Endpoint, status: u16, body: &Value) -> PriorError {
    let detail = ErrorDetail::from_body(body, status);

    if matches!(status, 401 | 403) || detail.code_is(&["UNAUTHORIZED", "FORBIDDEN", "INVALID_API_KEY"]) {
        return PriorError::Auth(detail.message);
    }

    if matches!(status, 402 | 429)
        || detail.code_is(&["INSUFFICIENT_CREDITS", "RATE_LIMITED", "TOO_MANY_REQUESTS"])
    {
        return PriorError::RateLimitOrCredit {
            message: detail.message,
            balance: find_balance(body),
        };
    }

    if endpoint.is_handshake() && (400..500).contains(&status) {
        return PriorError::Verification(detail.message);
    }

    match status {
        404 => PriorError::NotFound(detail.message),
        400 | 409 | 413 | 422 => PriorError::Validation(detail.message),
        _ if detail.code_is(&["VALIDATION_ERROR", "INVALID_REQUEST"]) => {
            PriorError::Validation(detail.message)
        }
        _ if detail.code_is(&["NOT_FOUND"]) => PriorError::NotFound(detail.message),
        _ => PriorError::Server {
            status,
            message: detail.message,
        },
    }
}

/// Error message and machine code pulled out of the several body shapes in use
struct ErrorDetail {
    message: String,
    code: Option<String>,
}

impl ErrorDetail {
    fn from_body(body: &Value, status: u16) -> Self {
        let error = body.get("error");

        let message = match error {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(obj)) => obj.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        }
        .or_else(|| body.get("message").and_then(Value::as_str).map(str::to_string))
        .or_else(|| body.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("request failed with status {}", status));

        let code = error
            .and_then(|e| e.get("code"))
            .or_else(|| body.get("code"))
            .and_then(Value::as_str)
            .map(str::to_ascii_uppercase);

        Self { message, code }
    }

    fn code_is(&self, codes: &[&str]) -> bool {
        self.code.as_deref().is_some_and(|c| codes.contains(&c))
    }
}

/// Server-reported balance, wherever the body put it
fn find_balance(body: &Value) -> Option<f64> {
    static KEYS: [&str; 3] = ["balance", "balanceRemaining", "credits"];

    let scopes = [Some(body), body.get("data"), body.get("error")];
    scopes
        .into_iter()
        .flatten()
        .flat_map(|scope| KEYS.iter().filter_map(move |k| scope.get(*k)))
        .find_map(Value::as_f64)
}

fn truncate(s: &str, max: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(max).collect();
        format!("{}…", head)
    }
}
