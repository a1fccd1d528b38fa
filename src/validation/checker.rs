use async_trait::async_trait;
use log::debug;

use crate::core::error::Result;
use crate::core::types::{CheckOutcome, Match};

/// Completes a match with the outcome of checking its URL.
///
/// Implementations must never fail the pipeline: every failure is turned
/// into a [`CheckOutcome::Error`] on the returned match.
#[async_trait]
pub trait CheckLink: Send + Sync {
    async fn check(&self, unchecked: Match) -> Match;
}

/// Issues exactly one GET per match with a default HTTP client.
#[derive(Debug, Clone)]
pub struct LivenessChecker {
    client: reqwest::Client,
}

impl LivenessChecker {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    /// Checker around a caller-configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> CheckOutcome {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                // Only the status line matters, the body is never read
                drop(response);
                CheckOutcome::Status {
                    code: status.as_u16(),
                    text: status.to_string(),
                }
            }
            Err(err) => CheckOutcome::Error(describe_error(&err)),
        }
    }
}

#[async_trait]
impl CheckLink for LivenessChecker {
    async fn check(&self, unchecked: Match) -> Match {
        let outcome = self.fetch(unchecked.url()).await;
        debug!("{} -> {}", unchecked.url(), outcome);
        unchecked.complete(outcome)
    }
}

/// Flatten an error and its sources into one line, skipping repeats.
fn describe_error(err: &dyn std::error::Error) -> String {
    let mut parts: Vec<String> = vec![err.to_string()];
    let mut source = err.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.iter().any(|part| part.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }

    parts.join(": ")
}
