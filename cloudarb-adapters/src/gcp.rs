//! GCP Compute Engine adapter, backed by the Cloud Billing Catalog API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cloudarb_core::ProviderAdapter;
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId, Region};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::catalog::GCP as GCP_CATALOG;
use crate::credential::CredentialHandle;

/// Compute Engine's published Cloud Billing Catalog service id.
const COMPUTE_ENGINE_SERVICE: &str = "6F81-5844-456A";

const DEFAULT_BASE_URL: &str = "https://cloudbilling.googleapis.com";

#[derive(Debug, Deserialize)]
struct SkuListResponse {
    skus: Vec<Sku>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: String,
}

#[derive(Debug, Deserialize)]
struct Sku {
    description: String,
    category: SkuCategory,
    #[serde(rename = "pricingInfo")]
    pricing_info: Vec<PricingInfo>,
}

#[derive(Debug, Deserialize)]
struct SkuCategory {
    #[serde(rename = "resourceGroup", default)]
    resource_group: String,
    #[serde(rename = "usageType", default)]
    usage_type: String,
}

#[derive(Debug, Deserialize)]
struct PricingInfo {
    #[serde(rename = "pricingExpression")]
    pricing_expression: PricingExpression,
}

#[derive(Debug, Deserialize)]
struct PricingExpression {
    #[serde(rename = "tieredRates")]
    tiered_rates: Vec<TieredRate>,
}

#[derive(Debug, Deserialize)]
struct TieredRate {
    #[serde(rename = "unitPrice")]
    unit_price: Money,
}

#[derive(Debug, Deserialize)]
struct Money {
    units: Option<String>,
    nanos: Option<i64>,
}

impl Money {
    fn as_decimal(&self) -> Decimal {
        let whole: i64 = self.units.as_deref().unwrap_or("0").parse().unwrap_or(0);
        let nanos = self.nanos.unwrap_or(0);
        Decimal::new(whole, 0) + Decimal::new(nanos, 9)
    }
}

/// Adapter for Google Compute Engine GPU machine-type pricing.
pub struct GcpAdapter {
    client: reqwest::Client,
    credential: CredentialHandle,
    base_url: String,
}

impl GcpAdapter {
    /// Build a new adapter, reading the billing API key from `credential`.
    #[must_use]
    pub fn new(client: reqwest::Client, credential: CredentialHandle) -> Self {
        Self {
            client,
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build an adapter against a non-default base URL, for testing against
    /// a mock server.
    #[must_use]
    pub fn with_base_url(client: reqwest::Client, credential: CredentialHandle, base_url: impl Into<String>) -> Self {
        Self {
            client,
            credential,
            base_url: base_url.into(),
        }
    }

    async fn fetch_skus(&self, page_token: &str) -> Result<SkuListResponse, CloudArbError> {
        let key = self.credential.require_key(ProviderId::Gcp)?;
        let mut url = format!(
            "{}/v1/services/{COMPUTE_ENGINE_SERVICE}/skus?currencyCode=USD&key={key}",
            self.base_url
        );
        if !page_token.is_empty() {
            url.push_str("&pageToken=");
            url.push_str(page_token);
        }
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CloudArbError::Other(format!("gcp: request failed: {e}")))?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED
            || resp.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(CloudArbError::auth_failed("gcp"));
        }
        if !resp.status().is_success() {
            return Err(CloudArbError::Other(format!(
                "gcp: billing catalog returned {}",
                resp.status()
            )));
        }
        resp.json()
            .await
            .map_err(|e| CloudArbError::Other(format!("gcp: invalid billing payload: {e}")))
    }

    fn points_for_region(&self, skus: &[Sku], region: &Region) -> Vec<PricePoint> {
        let mut points = Vec::new();
        for entry in GCP_CATALOG {
            let on_demand_sku = skus.iter().find(|s| {
                s.category.usage_type == "OnDemand"
                    && (s.description.contains(entry.name) || s.description.contains(entry.gpu_kind))
            });
            let Some(sku) = on_demand_sku else { continue };
            let Some(rate) = sku.pricing_info.first().and_then(|p| p.pricing_expression.tiered_rates.last())
            else {
                continue;
            };
            points.push(PricePoint {
                line: cloudarb_types::Line::new(ProviderId::Gcp, entry.name, region.clone()),
                instance: entry.instance_type(),
                on_demand_per_hour: rate.unit_price.as_decimal(),
                spot_per_hour: None,
                observed_at: Utc::now(),
            });
        }
        points
    }
}

#[async_trait]
impl ProviderAdapter for GcpAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Gcp
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            supports_spot: true,
            has_region_granularity: true,
            sustainable_qps: 1.0,
            min_poll_interval: Duration::from_secs(30),
        }
    }

    async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
        let mut skus = Vec::new();
        let mut page_token = String::new();
        loop {
            let page = self.fetch_skus(&page_token).await?;
            let done = page.next_page_token.is_empty();
            skus.extend(page.skus);
            if done {
                break;
            }
            page_token = page.next_page_token;
        }
        let mut all = Vec::new();
        for region in &filter.regions {
            all.extend(self.points_for_region(&skus, region));
        }
        all.retain(|p| filter.allows(p));
        Ok(all)
    }
}
