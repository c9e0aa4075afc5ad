//! Azure adapter, backed by the public Azure Retail Prices API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cloudarb_core::ProviderAdapter;
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId, Region};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::catalog::AZURE as AZURE_CATALOG;

#[derive(Debug, Deserialize)]
struct RetailPricesResponse {
    #[serde(rename = "Items")]
    items: Vec<RetailPriceItem>,
}

#[derive(Debug, Deserialize)]
struct RetailPriceItem {
    #[serde(rename = "armSkuName")]
    arm_sku_name: String,
    #[serde(rename = "unitPrice")]
    unit_price: f64,
    #[serde(rename = "priceType")]
    price_type: String,
    #[serde(rename = "meterName")]
    meter_name: String,
}

const DEFAULT_BASE_URL: &str = "https://prices.azure.com";

/// Adapter for Azure GPU virtual-machine pricing.
pub struct AzureAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl AzureAdapter {
    /// Build a new adapter with a dedicated HTTP client. No credential is
    /// required: the retail prices API is public.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build an adapter against a non-default base URL, for testing against
    /// a mock server.
    #[must_use]
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch_sku(
        &self,
        sku_name: &str,
        region: &Region,
    ) -> Result<Option<f64>, CloudArbError> {
        let filter = format!(
            "serviceName eq 'Virtual Machines' and armRegionName eq '{}' and armSkuName eq '{}' and priceType eq 'Consumption'",
            region.as_str(),
            sku_name
        );
        let url = format!(
            "{}/api/retail/prices?$filter={}",
            self.base_url,
            url::form_urlencoded::byte_serialize(filter.as_bytes()).collect::<String>()
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CloudArbError::Other(format!("azure: request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(CloudArbError::Other(format!(
                "azure: retail prices returned {}",
                resp.status()
            )));
        }
        let parsed: RetailPricesResponse = resp
            .json()
            .await
            .map_err(|e| CloudArbError::Other(format!("azure: invalid retail price payload: {e}")))?;
        let linux_price = parsed
            .items
            .into_iter()
            .find(|i| i.price_type == "Consumption" && !i.meter_name.contains("Windows"))
            .map(|i| i.unit_price);
        Ok(linux_price)
    }
}

#[async_trait]
impl ProviderAdapter for AzureAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Azure
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            supports_spot: true,
            has_region_granularity: true,
            sustainable_qps: 2.0,
            min_poll_interval: Duration::from_secs(15),
        }
    }

    async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
        let mut points = Vec::new();
        for region in &filter.regions {
            for entry in AZURE_CATALOG {
                let Some(price) = self.fetch_sku(entry.name, region).await? else {
                    continue;
                };
                let Ok(on_demand) = Decimal::try_from(price) else {
                    continue;
                };
                points.push(PricePoint {
                    line: cloudarb_types::Line::new(ProviderId::Azure, entry.name, region.clone()),
                    instance: entry.instance_type(),
                    on_demand_per_hour: on_demand,
                    spot_per_hour: None,
                    observed_at: Utc::now(),
                });
            }
        }
        points.retain(|p| filter.allows(p));
        Ok(points)
    }
}
