//! Shared blocking HTTP helpers

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::error::{RewriteError, RewriteResult};

pub(crate) fn client(timeout: Duration) -> RewriteResult<Client> {
    Client::builder()
        .user_agent(concat!("sheetlingo/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| RewriteError::Network(e.to_string()))
}

/// Send and turn a non-success status into [`RewriteError::Http`]
pub(crate) fn send(request: RequestBuilder) -> RewriteResult<Response> {
    let response = request
        .send()
        .map_err(|e| RewriteError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(RewriteError::Http(status.as_u16(), body));
    }
    Ok(response)
}

pub(crate) fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}
