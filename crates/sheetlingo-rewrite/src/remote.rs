//! LibreTranslate-compatible remote rewriter

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::{RewriteError, RewriteResult};
use crate::http;
use crate::rewriter::TextRewriter;

/// Public LibreTranslate mirrors, tried in order
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://libretranslate.de/translate",
    "https://translate.argosopentech.com/translate",
    "https://libretranslate.com/translate",
];

/// Remote rewriter settings
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Full URLs of `/translate` endpoints
    pub endpoints: Vec<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// Calls each configured endpoint until one answers
///
/// An endpoint that fails at the transport level (refused connection,
/// timeout) is skipped for the rest of the rewriter's life, so a dead
/// network costs one timeout per endpoint rather than one per cell.
/// Endpoints that answer with an error status stay in rotation.
pub struct RemoteRewriter {
    http: Client,
    endpoints: Vec<String>,
    unreachable: Vec<AtomicBool>,
}

impl RemoteRewriter {
    pub fn new(config: RemoteConfig) -> RewriteResult<Self> {
        let unreachable = config
            .endpoints
            .iter()
            .map(|_| AtomicBool::new(false))
            .collect();
        Ok(Self {
            http: http::client(config.timeout)?,
            endpoints: config.endpoints,
            unreachable,
        })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Endpoints not yet written off as unreachable
    pub fn reachable_endpoints(&self) -> Vec<&str> {
        self.endpoints
            .iter()
            .zip(&self.unreachable)
            .filter(|(_, down)| !down.load(Ordering::Relaxed))
            .map(|(url, _)| url.as_str())
            .collect()
    }

    /// Put every endpoint back in rotation
    pub fn reset(&self) {
        for down in &self.unreachable {
            down.store(false, Ordering::Relaxed);
        }
    }

    fn call(&self, url: &str, text: &str, direction: Direction) -> RewriteResult<String> {
        let body = TranslateRequest {
            q: text,
            source: direction.source_lang(),
            target: direction.target_lang(),
            format: "text",
        };
        let response = http::send(self.http.post(url).json(&body))?;
        let parsed: TranslateResponse = response
            .json()
            .map_err(|e| RewriteError::Parse(e.to_string()))?;

        match parsed.translated_text {
            Some(t) if !t.trim().is_empty() => Ok(t),
            _ => Err(RewriteError::EmptyResponse),
        }
    }
}

impl TextRewriter for RemoteRewriter {
    fn rewrite(&self, text: &str, direction: Direction) -> RewriteResult<String> {
        if self.endpoints.is_empty() {
            return Err(RewriteError::NoEndpoints);
        }

        let mut last_error = None;
        for (url, down) in self.endpoints.iter().zip(&self.unreachable) {
            if down.load(Ordering::Relaxed) {
                continue;
            }
            match self.call(url, text, direction) {
                Ok(t) => return Ok(t),
                Err(e) => {
                    if matches!(e, RewriteError::Network(_)) {
                        log::warn!("Endpoint {} unreachable, skipping it from now on: {}", url, e);
                        down.store(true, Ordering::Relaxed);
                    } else {
                        log::debug!("Endpoint {} failed: {}", url, e);
                    }
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            RewriteError::Network("every endpoint is marked unreachable".to_string())
        }))
    }
}

impl std::fmt::Debug for RemoteRewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteRewriter")
            .field("endpoints", &self.endpoints)
            .field("reachable", &self.reachable_endpoints())
            .finish()
    }
}
