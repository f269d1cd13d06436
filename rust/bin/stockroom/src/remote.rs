//! HTTP access to the backend catalog.

use anyhow::Result;
use stockroom_catalog::{CatalogError, Product, RemoteCatalog};
use tracing::debug;

use crate::config::RemoteConfig;

/// Fetches `GET {server}/products`, expecting a JSON array of products.
pub struct HttpCatalog {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(remote: &RemoteConfig) -> Result<Self> {
        if remote.server.is_empty() {
            anyhow::bail!(
                "No remote server configured. Run `stockroom remote set --server <url>` or pass --snapshot <file>."
            );
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if !remote.token.is_empty() {
            let val = format!("Bearer {}", remote.token);
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&val)?,
            );
        }

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: remote.server.trim_end_matches('/').to_string(),
        })
    }
}

impl RemoteCatalog for HttpCatalog {
    fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let url = format!("{}/products", self.base_url);
        debug!(%url, "fetching remote catalog");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| CatalogError::Remote(format!("GET {}: {}", url, e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Remote(format!("GET {}: status {}", url, status)));
        }

        resp.json::<Vec<Product>>()
            .map_err(|e| CatalogError::Remote(format!("GET {}: invalid body: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_server() {
        let err = HttpCatalog::new(&RemoteConfig::default()).err().unwrap();
        assert!(err.to_string().contains("No remote server"));
    }

    #[test]
    fn trims_trailing_slash() {
        let catalog = HttpCatalog::new(&RemoteConfig {
            server: "http://localhost:8080/".into(),
            token: "t0k".into(),
        })
        .unwrap();
        assert_eq!(catalog.base_url, "http://localhost:8080");
    }
}
