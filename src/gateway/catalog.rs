use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::models::{Product, SaleRecord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{message}")]
    CatalogFetch { message: String },
    #[error("{message}")]
    SaleSubmit { message: String },
}

impl GatewayError {
    /// Human readable message, shown to the operator as is.
    pub fn message(&self) -> &str {
        match self {
            GatewayError::CatalogFetch { message } | GatewayError::SaleSubmit { message } => {
                message
            }
        }
    }
}

/// Backend boundary: product catalog in, completed sales out.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Product>, GatewayError>;
    async fn submit_sale(&self, record: &SaleRecord) -> Result<(), GatewayError>;
}

/// JSON over HTTP implementation of CatalogGateway
pub struct HttpCatalogGateway {
    client: Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpCatalogGateway {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        info!("Catalog gateway configured for {}", base_url);
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Turns a non-2xx response into the message the backend gave, or the status line.
    async fn failure_message(response: Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(ErrorBody {
                message: Some(message),
            }) if !message.trim().is_empty() => message,
            _ => status.to_string(),
        }
    }
}

#[async_trait]
impl CatalogGateway for HttpCatalogGateway {
    async fn fetch_all(&self) -> Result<Vec<Product>, GatewayError> {
        let url = self.endpoint("products");
        debug!("Fetching catalog from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::CatalogFetch {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::CatalogFetch {
                message: Self::failure_message(response).await,
            });
        }

        let products = response
            .json::<Vec<Product>>()
            .await
            .map_err(|e| GatewayError::CatalogFetch {
                message: e.to_string(),
            })?;

        debug!("Catalog returned {} products", products.len());
        Ok(products)
    }

    async fn submit_sale(&self, record: &SaleRecord) -> Result<(), GatewayError> {
        let url = self.endpoint("sales");
        debug!(
            "Submitting sale with {} lines, total {}",
            record.details.len(),
            record.total
        );

        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| GatewayError::SaleSubmit {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::SaleSubmit {
                message: Self::failure_message(response).await,
            });
        }

        Ok(())
    }
}
