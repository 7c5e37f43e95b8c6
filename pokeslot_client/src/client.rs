use std::time::Duration;

use futures::future::BoxFuture;
use pokeslot_core::{Outcome, OutcomeError};
use pokeslot_shared::SpinResponse;
use reqwest::{StatusCode, Url};
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for outcome requests.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(StatusCode),
    #[error("malformed outcome: {0}")]
    Decode(#[from] DecodeError),
    #[error("invalid server url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ClientError {
    /// Transport failures and non-success statuses.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Status(_))
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Outcome(#[from] OutcomeError),
}

/// Anything that can hand the driver an outcome.
pub trait OutcomeSource {
    fn fetch(&self) -> BoxFuture<'static, Result<Outcome, ClientError>>;
}

/// One GET to `/spin` per call. No retries.
#[derive(Debug, Clone)]
pub struct OutcomeClient {
    http: reqwest::Client,
    spin_url: Url,
}

impl OutcomeClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };
        let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        let spin_url = base.join("spin").map_err(|e| invalid(e.to_string()))?;
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, spin_url })
    }

    /// Seeds the provably-fair draw on the server side.
    pub fn with_client_seed(mut self, client_seed: &str) -> Self {
        self.spin_url
            .query_pairs_mut()
            .clear()
            .append_pair("client_seed", client_seed);
        self
    }

    pub fn spin_url(&self) -> &Url {
        &self.spin_url
    }

    pub async fn fetch_outcome(&self) -> Result<Outcome, ClientError> {
        let resp = self.http.get(self.spin_url.clone()).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ClientError::Status(status));
        }
        let body = resp.bytes().await?;
        let wire: SpinResponse = serde_json::from_slice(&body).map_err(DecodeError::from)?;
        let outcome = Outcome::try_from(wire).map_err(DecodeError::from)?;
        Ok(outcome)
    }
}

impl OutcomeSource for OutcomeClient {
    fn fetch(&self) -> BoxFuture<'static, Result<Outcome, ClientError>> {
        let client = self.clone();
        Box::pin(async move { client.fetch_outcome().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_url_is_joined_to_base() {
        let client = OutcomeClient::new("http://127.0.0.1:3000/").unwrap();
        assert_eq!(client.spin_url().as_str(), "http://127.0.0.1:3000/spin");

        let seeded = client.with_client_seed("a b");
        assert_eq!(
            seeded.spin_url().as_str(),
            "http://127.0.0.1:3000/spin?client_seed=a+b"
        );
    }

    #[test]
    fn rejects_garbage_url() {
        assert!(matches!(
            OutcomeClient::new("not a url"),
            Err(ClientError::InvalidUrl { .. })
        ));
    }
}
