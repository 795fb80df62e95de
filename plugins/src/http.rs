//! Response handling shared by the REST store and the auth client.

use serde::de::DeserializeOwned;
use serde_json::Value;
use taskboard_core::api::{RemoteError, RemoteErrorKind};

pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> RemoteError {
    let kind = if err.is_timeout() {
        RemoteErrorKind::Timeout
    } else if err.is_connect() {
        RemoteErrorKind::Connect
    } else if err.is_request() {
        RemoteErrorKind::Request
    } else if err.is_body() {
        RemoteErrorKind::Body
    } else if err.is_decode() {
        RemoteErrorKind::Decode
    } else {
        RemoteErrorKind::Unknown
    };
    let mut out = RemoteError::new(kind, err.to_string()).with_url(url);
    if let Some(status) = err.status() {
        out = out.with_status(status.as_u16());
    }
    out.with_source(err)
}

/// The human-readable part of a backend error body.
///
/// PostgREST answers `{"message": ...}`; the auth endpoint uses
/// `error_description` or `msg`. Anything else is passed through as text.
pub(crate) fn backend_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error_description", "msg", "error"] {
            if let Some(Value::String(msg)) = map.get(key) {
                if !msg.trim().is_empty() {
                    return msg.clone();
                }
            }
        }
    }
    body.to_string()
}

fn status_error(status: reqwest::StatusCode, url: String, body: &str) -> RemoteError {
    RemoteError::new(RemoteErrorKind::Status, backend_message(body))
        .with_status(status.as_u16())
        .with_url(url)
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, RemoteError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp.text().await.map_err(|err| from_reqwest(err, &url))?;

    if !status.is_success() {
        return Err(status_error(status, url, &body));
    }

    serde_json::from_str::<T>(&body).map_err(|err| {
        RemoteError::new(
            RemoteErrorKind::Decode,
            format!("failed to decode response body: {} | body={}", err, body),
        )
        .with_status(status.as_u16())
        .with_url(url)
        .with_source(err)
    })
}

pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<(), RemoteError> {
    let status = resp.status();
    let url = resp.url().to_string();

    if status.is_success() {
        return Ok(());
    }

    let body = resp.text().await.map_err(|err| from_reqwest(err, &url))?;
    Err(status_error(status, url, &body))
}
