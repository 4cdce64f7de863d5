use crate::error::{Result, SourceError};
use log::{info, warn};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Knobs shared by every HTTP source.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    /// Attempts per request before the source reports failure
    pub max_tries: u32,
    /// Sleep before the first retry; doubled after each further failure
    pub backoff: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            timeout: Duration::from_secs(20),
            max_tries: 2,
            backoff: Duration::from_millis(500),
            user_agent: concat!("ecoscan/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A `reqwest` client with retry and exponential backoff.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    settings: HttpSettings,
}

impl HttpClient {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(HttpClient { client, settings })
    }

    /// GET `url` and return the body as text.
    pub async fn get_text(&self, label: &str, url: &str) -> Result<String> {
        self.send_with_retry(label, url, || self.client.get(url))
            .await
    }

    /// GET `url` with extra headers and return the body as text.
    pub async fn get_text_with_headers(
        &self,
        label: &str,
        url: &str,
        headers: &[(&'static str, &str)],
    ) -> Result<String> {
        self.send_with_retry(label, url, || {
            headers
                .iter()
                .fold(self.client.get(url), |req, (k, v)| req.header(*k, *v))
        })
        .await
    }

    /// POST a form to `url` and return the body as text.
    pub async fn post_form(&self, label: &str, url: &str, form: &[(&str, &str)]) -> Result<String> {
        self.send_with_retry(label, url, || self.client.post(url).form(form))
            .await
    }

    async fn send_with_retry<F>(&self, label: &str, url: &str, build: F) -> Result<String>
    where
        F: Fn() -> RequestBuilder,
    {
        let max_tries = self.settings.max_tries.max(1);
        let mut backoff = self.settings.backoff;
        let mut last_error = SourceError::Api(format!("{label}: no attempt made"));

        for attempt in 1..=max_tries {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        warn!(
                            "Attempt {}/{}: Bad response status for {}: {}",
                            attempt, max_tries, label, status
                        );
                        last_error = SourceError::BadStatus {
                            status: status.as_u16(),
                            url: url.to_string(),
                        };
                    } else {
                        match response.text().await {
                            Ok(body) if body.trim().is_empty() => {
                                warn!("Attempt {}/{}: Empty response for {}", attempt, max_tries, label);
                                last_error = SourceError::InvalidFormat("empty response".to_string());
                            }
                            Ok(body) => return Ok(body),
                            Err(e) => {
                                warn!(
                                    "Attempt {}/{}: Failed to read response body for {}: {}",
                                    attempt, max_tries, label, e
                                );
                                last_error = e.into();
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{}: Request failed for {}: {}",
                        attempt, max_tries, label, e
                    );
                    last_error = e.into();
                }
            }

            if attempt < max_tries {
                info!(
                    "Sleeping for {} milliseconds before retry for {}",
                    backoff.as_millis(),
                    label
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(last_error)
    }
}
