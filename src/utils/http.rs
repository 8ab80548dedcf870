// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Anything that can return the body of a page by URL.
///
/// The crawl only ever issues GET requests and reads the body as text.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url` and return its body. Any transport failure or
    /// non-success status is reported as [`AppError::Transport`].
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Create a configured asynchronous HTTP client.
///
/// Every request carries both a connect timeout and a whole-request timeout,
/// and is routed through the configured proxies, if any.
pub fn create_async_client(config: &CrawlerConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

    if let Some(endpoint) = &config.proxy.http {
        let proxy =
            Proxy::http(endpoint).map_err(|e| AppError::config(format!("Invalid proxy: {e}")))?;
        builder = builder.proxy(proxy);
    }
    if let Some(endpoint) = &config.proxy.https {
        let proxy =
            Proxy::https(endpoint).map_err(|e| AppError::config(format!("Invalid proxy: {e}")))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// [`PageSource`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build the client from configuration.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::new(create_async_client(config)?))
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::transport(url, e))?;

        response.text().await.map_err(|e| AppError::transport(url, e))
    }
}
