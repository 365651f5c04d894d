use std::time::{Duration, Instant};

use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    StatusCode,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{ConnectionStatus, RemoteError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_client(timeout: Duration) -> Result<Client, RemoteError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Sends the request and turns non-2xx answers into errors.
pub(crate) fn send(request: RequestBuilder) -> Result<Response, RemoteError> {
    let response = request.send()?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    debug!(status = status.as_u16(), "remote request rejected");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::Unauthorized(
            format!("{} {}", status.as_u16(), body.trim()),
        )),
        _ => Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        }),
    }
}

pub(crate) fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, RemoteError> {
    let text = send(request)?.text()?;
    serde_json::from_str(&text).map_err(|err| RemoteError::Decode(err.to_string()))
}

/// Runs a health-check request, timing it and describing failures with `describe`.
pub(crate) fn probe_request(
    request: RequestBuilder,
    timeout: Duration,
    describe: fn(u16, &str) -> String,
) -> ConnectionStatus {
    let started = Instant::now();
    match request.timeout(timeout).send() {
        Ok(response) if response.status().is_success() => {
            ConnectionStatus::online(started.elapsed().as_millis() as u64)
        }
        Ok(response) => {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            ConnectionStatus::failed(describe(status, &body))
        }
        Err(err) => ConnectionStatus::failed(describe_transport_error(&err, timeout)),
    }
}

pub(crate) fn describe_transport_error(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("connection timed out ({} ms)", timeout.as_millis())
    } else if err.is_connect() {
        "network connection failed; check your internet connection".to_string()
    } else {
        format!("network error: {}", err)
    }
}
