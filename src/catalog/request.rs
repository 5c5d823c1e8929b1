use crate::error::{MarketError, MarketResult};
use reqwest::{Response, StatusCode};
use serde_json::Value;

/// Maps a non-success response onto the error taxonomy. `what` names the
/// resource for `NotFound` and log messages.
pub async fn check_status(response: Response, what: &str) -> MarketResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = server_message(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.to_string()
        } else {
            body.clone()
        }
    });

    Err(match status {
        StatusCode::NOT_FOUND => MarketError::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MarketError::Unauthorized(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            MarketError::Validation(detail)
        }
        _ => MarketError::Network(format!("{} returned HTTP {}: {}", what, status, detail)),
    })
}

/// Pulls a human-readable message out of a JSON error body: the top-level
/// `message` (or `error`), followed by any `errors[]` entries as
/// `CODE : message` lines.
pub fn server_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    let mut out = json
        .get("message")
        .or_else(|| json.get("error"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let errors = json
        .get("errors")
        .or_else(|| json.get("payload").and_then(|p| p.get("errors")))
        .and_then(|e| e.as_array());
    if let Some(errors) = errors {
        for err in errors {
            let code = err.get("code").and_then(|v| v.as_str()).unwrap_or("UNKNOWN");
            let msg = err.get("message").and_then(|v| v.as_str()).unwrap_or("");
            if !out.is_empty() {
                out.push_str("\n-> ");
            }
            out.push_str(&format!("{} : {}", code, msg));
        }
    }

    if out.is_empty() { None } else { Some(out) }
}

/// Reads the whole body and decodes it as JSON.
pub async fn read_json<T: serde::de::DeserializeOwned>(
    response: Response,
    what: &str,
) -> MarketResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| MarketError::Protocol(format!("Failed to parse {}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_message_and_error_list() {
        let body = r#"{"message":"Invalid review","errors":[{"code":"RATING","message":"must be 1-5"}]}"#;
        assert_eq!(
            server_message(body).as_deref(),
            Some("Invalid review\n-> RATING : must be 1-5")
        );
    }

    #[test]
    fn nested_payload_errors_are_found() {
        let body = r#"{"payload":{"errors":[{"code":"X","message":"y"}]}}"#;
        assert_eq!(server_message(body).as_deref(), Some("X : y"));
    }

    #[test]
    fn non_json_bodies_have_no_message() {
        assert_eq!(server_message("<html>oops</html>"), None);
        assert_eq!(server_message("{}"), None);
    }
}
