use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::Product;
use crate::config::{CatalogConfig, RequestConfig};
use crate::error::{CatalogError, CatalogResult};

const API_VERSION: &str = "v2024-01-01";

/// Client for the headless-CMS catalog API.
///
/// Reads the product list and applies best-effort stock decrements. A
/// decrement failure is reported to the caller but is expected to be
/// tolerated: checkout proceeds on local state when the provider rejects
/// the write.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    dataset: String,
    token: Option<String>,
    request_config: RequestConfig,
}

/// Query responses wrap the result set.
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

impl CatalogClient {
    /// Create a new catalog client
    pub fn new(config: &CatalogConfig, request_config: RequestConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(CatalogError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dataset: config.dataset.clone(),
            token: config.token.clone(),
            request_config,
        })
    }

    /// Fetch the full product list, retrying with exponential backoff.
    pub async fn fetch_products(&self) -> CatalogResult<Vec<Product>> {
        let query = r#"*[_type == "product"] | order(_createdAt desc)"#;

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying catalog fetch"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.run_query::<Vec<Product>>(query).await {
                Ok(products) => {
                    info!(
                        count = products.len(),
                        latency_ms = start.elapsed().as_millis(),
                        "Catalog fetch succeeded"
                    );
                    return Ok(products);
                }
                Err(e) => {
                    error!(
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Catalog fetch failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(CatalogError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    /// Decrement a product's stock, floored at 0.
    ///
    /// The provider has no atomic decrement, so this reads the current
    /// stock and writes back the floored value, matching the original
    /// storefront's write path. Single attempt: the caller treats failure
    /// as non-fatal.
    pub async fn decrement_stock(&self, product_id: &str, quantity: u32) -> CatalogResult<u32> {
        let query = format!(
            r#"*[_type == "product" && _id == "{}"][0]"#,
            product_id.replace('"', "")
        );

        let product: Option<Product> = self.run_query(&query).await?;
        let product = product.ok_or_else(|| CatalogError::InvalidResponse {
            message: format!("Product not found: {}", product_id),
        })?;

        let new_stock = product.stock.saturating_sub(quantity);

        let url = format!(
            "{}/{}/data/mutate/{}",
            self.base_url, API_VERSION, self.dataset
        );
        let body = serde_json::json!({
            "mutations": [{
                "patch": {
                    "id": product_id,
                    "set": { "stock": new_stock }
                }
            }]
        });

        debug!(product_id = %product_id, new_stock, "Writing stock decrement");

        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::Timeout {
                    timeout_ms: self.request_config.timeout_ms,
                }
            } else {
                CatalogError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        info!(product_id = %product_id, new_stock, "Stock decrement applied");
        Ok(new_stock)
    }

    /// Execute a single query (internal)
    async fn run_query<T: serde::de::DeserializeOwned>(&self, query: &str) -> CatalogResult<T> {
        let url = format!(
            "{}/{}/data/query/{}",
            self.base_url, API_VERSION, self.dataset
        );

        let mut request = self.client.get(&url).query(&[("query", query)]);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::Timeout {
                    timeout_ms: self.request_config.timeout_ms,
                }
            } else {
                CatalogError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let wrapped: QueryResponse<T> =
            response
                .json()
                .await
                .map_err(|e| CatalogError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        Ok(wrapped.result)
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = CatalogConfig {
            base_url: "https://api.sanity.io".to_string(),
            project_id: "demo".to_string(),
            dataset: "production".to_string(),
            token: None,
        };

        let client = CatalogClient::new(&config, RequestConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = CatalogConfig {
            base_url: "https://api.sanity.io/".to_string(),
            project_id: "demo".to_string(),
            dataset: "production".to_string(),
            token: None,
        };

        let client = CatalogClient::new(&config, RequestConfig::default()).unwrap();
        assert_eq!(client.base_url(), "https://api.sanity.io");
    }
}
