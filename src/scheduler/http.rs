//! HTTP client for the external job scheduler.
//!
//! API surface used:
//!
//! | Method   | Path            | Purpose                      |
//! |----------|-----------------|------------------------------|
//! | `POST`   | `/jobs`         | create or replace by name    |
//! | `GET`    | `/jobs?q=name`  | search by name prefix        |
//! | `DELETE` | `/jobs/{name}`  | delete; 404 means "gone"     |
//!
//! Transport errors, `429`, and `5xx` responses are retried up to
//! `retries` times with a fixed delay between attempts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use super::{JobDefinition, JobScheduler};
use crate::error::GatewayError;

/// reqwest-backed [`JobScheduler`].
#[derive(Debug, Clone)]
pub struct HttpJobScheduler {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retries: u32,
    retry_delay: Duration,
}

impl HttpJobScheduler {
    /// Builds a client for the scheduler at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the HTTP client cannot be
    /// constructed.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        retries: u32,
        retry_delay: Duration,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("cannot build scheduler client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            retries,
            retry_delay,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Sends the request built by `build`, retrying transient failures.
    ///
    /// Returns the last response (which may still be an error status), or
    /// the last transport error as a string.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response, String>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = self.authorize(build()).send().await;
            let retryable = match &outcome {
                Ok(response) => is_transient(response.status()),
                Err(_) => true,
            };
            if !retryable || attempt >= self.retries {
                return outcome.map_err(|e| e.to_string());
            }

            attempt += 1;
            match &outcome {
                Ok(response) => tracing::warn!(
                    status = %response.status(),
                    attempt,
                    max = self.retries,
                    "scheduler request failed, retrying"
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    attempt,
                    max = self.retries,
                    "scheduler request failed, retrying"
                ),
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

async fn describe_failure(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }
}

#[async_trait]
impl JobScheduler for HttpJobScheduler {
    async fn upsert_job(&self, job: JobDefinition) -> Result<(), GatewayError> {
        let url = self.url("/jobs");
        let failure = |reason: String| GatewayError::SchedulerCreateFailure {
            job_name: job.name.clone(),
            reason,
        };

        let response = self
            .send_with_retry(|| self.client.post(&url).json(&job))
            .await
            .map_err(failure)?;
        if !response.status().is_success() {
            return Err(failure(describe_failure(response).await));
        }

        tracing::debug!(job_name = %job.name, schedule = %job.schedule, "scheduler job upserted");
        Ok(())
    }

    async fn delete_job(&self, name: &str) -> Result<(), GatewayError> {
        let url = self.url(&format!("/jobs/{name}"));
        let failure = |reason: String| GatewayError::SchedulerDeleteFailure {
            job_name: name.to_string(),
            reason,
        };

        let response = self
            .send_with_retry(|| self.client.delete(&url))
            .await
            .map_err(failure)?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(job_name = name, "scheduler job already absent");
                Ok(())
            }
            status if status.is_success() => Ok(()),
            _ => Err(failure(describe_failure(response).await)),
        }
    }

    async fn find_jobs(&self, query: &str) -> Result<Vec<JobDefinition>, GatewayError> {
        let url = self.url("/jobs");
        let response = self
            .send_with_retry(|| self.client.get(&url).query(&[("q", query)]))
            .await
            .map_err(|e| GatewayError::Internal(format!("scheduler search failed: {e}")))?;
        if !response.status().is_success() {
            return Err(GatewayError::Internal(format!(
                "scheduler search failed: {}",
                describe_failure(response).await
            )));
        }
        response
            .json::<Vec<JobDefinition>>()
            .await
            .map_err(|e| GatewayError::Internal(format!("invalid scheduler response: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses() {
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_transient(StatusCode::BAD_REQUEST));
        assert!(!is_transient(StatusCode::NOT_FOUND));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let Ok(client) = HttpJobScheduler::new(
            "http://scheduler.local/",
            None,
            0,
            Duration::ZERO,
            Duration::from_secs(1),
        ) else {
            panic!("client should build");
        };
        assert_eq!(client.url("/jobs"), "http://scheduler.local/jobs");
    }
}
