//! HTTP client for the IDB machine inventory API (v3).

use super::{Inventory, Machine};
use crate::config::InventoryConfig;
use crate::utils::errors::{Result, SyncError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

/// Header carrying the API token (`X-IDB-API-Token`).
pub const TOKEN_HEADER: &str = "x-idb-api-token";

pub struct IdbClient {
    http: reqwest::Client,
    base_url: Url,
}

impl IdbClient {
    pub fn new(config: &InventoryConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| SyncError::Config(format!("inventory.url is invalid: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Config(format!(
                "inventory.url can't be used as a base: {}",
                config.url
            )));
        }

        let mut token = HeaderValue::from_str(&config.api_token)
            .map_err(|_| SyncError::Config("inventory.api_token contains invalid characters".into()))?;
        token.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("inventory-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Make sure the inventory answers at all. Any HTTP status counts as
    /// reachable; only transport failures are errors.
    pub async fn check_connection(&self) -> Result<()> {
        let resp = self.http.get(self.base_url.clone()).send().await?;
        debug!(url = %self.base_url, status = %resp.status(), "Inventory reachable");
        Ok(())
    }

    fn endpoint(&self, fqdn: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "v3", "machines"]);
            if let Some(fqdn) = fqdn {
                segments.push(fqdn);
            }
        }
        url
    }
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();
    Err(SyncError::Api {
        status: status.as_u16(),
        url,
        body,
    })
}

#[async_trait]
impl Inventory for IdbClient {
    async fn find_machine(&self, fqdn: &str) -> Result<Option<Machine>> {
        let url = self.endpoint(Some(fqdn));
        let resp = self.http.get(url.clone()).send().await?;
        debug!(method = "GET", url = %url, status = %resp.status(), "Inventory request");

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = ensure_success(resp).await?.bytes().await?;

        // Only existence matters to callers; tolerate records we can't parse.
        let machine = serde_json::from_slice::<Machine>(&body).unwrap_or_else(|e| {
            debug!(fqdn = %fqdn, error = %e, "Unparseable machine record");
            Machine {
                fqdn: fqdn.to_string(),
                ..Machine::default()
            }
        });
        Ok(Some(machine))
    }

    async fn create_machine(&self, machine: &Machine) -> Result<()> {
        let url = self.endpoint(None);
        let resp = self.http.post(url.clone()).json(machine).send().await?;
        debug!(method = "POST", url = %url, status = %resp.status(), "Inventory request");
        ensure_success(resp).await?;
        Ok(())
    }

    async fn update_machine(&self, fqdn: &str, machine: &Machine) -> Result<()> {
        let url = self.endpoint(Some(fqdn));
        let resp = self.http.put(url.clone()).json(machine).send().await?;
        debug!(method = "PUT", url = %url, status = %resp.status(), "Inventory request");
        ensure_success(resp).await?;
        Ok(())
    }
}
