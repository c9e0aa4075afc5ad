//! AWS EC2 adapter, backed by the public (unauthenticated) bulk pricing API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cloudarb_core::ProviderAdapter;
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId, Region};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::catalog::{self, AWS as AWS_CATALOG};

/// AWS's per-region bulk pricing offer files have no stable region-code to
/// AWS-region mapping endpoint; this table is the one AWS documents for
/// its EC2 offer index.
fn region_code(region: &Region) -> &str {
    match region.as_str() {
        "us-east-1" => "us-east-1",
        "us-west-2" => "us-west-2",
        "eu-west-1" => "eu-west-1",
        "ap-northeast-1" => "ap-northeast-1",
        other => other,
    }
}

#[derive(Debug, Deserialize)]
struct OfferIndex {
    products: std::collections::HashMap<String, Product>,
    terms: Terms,
}

#[derive(Debug, Deserialize)]
struct Product {
    attributes: ProductAttributes,
}

#[derive(Debug, Deserialize)]
struct ProductAttributes {
    #[serde(rename = "instanceType")]
    instance_type: Option<String>,
    tenancy: Option<String>,
    #[serde(rename = "operatingSystem")]
    operating_system: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Terms {
    #[serde(rename = "OnDemand", default)]
    on_demand: std::collections::HashMap<String, std::collections::HashMap<String, OfferTerm>>,
}

#[derive(Debug, Deserialize)]
struct OfferTerm {
    #[serde(rename = "priceDimensions")]
    price_dimensions: std::collections::HashMap<String, PriceDimension>,
}

#[derive(Debug, Deserialize)]
struct PriceDimension {
    #[serde(rename = "pricePerUnit")]
    price_per_unit: std::collections::HashMap<String, String>,
}

const DEFAULT_BASE_URL: &str = "https://pricing.us-east-1.amazonaws.com";

/// Adapter for Amazon EC2 GPU instance pricing.
pub struct AwsAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl AwsAdapter {
    /// Build a new adapter with a dedicated HTTP client.
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

    fn offer_url(&self, region: &Region) -> String {
        format!(
            "{}/offers/v1.0/aws/AmazonEC2/current/{}/index.json",
            self.base_url,
            region_code(region)
        )
    }

    async fn fetch_region(&self, region: &Region) -> Result<Vec<PricePoint>, CloudArbError> {
        let url = self.offer_url(region);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CloudArbError::Other(format!("aws: request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(CloudArbError::Other(format!(
                "aws: pricing endpoint returned {}",
                resp.status()
            )));
        }
        let index: OfferIndex = resp
            .json()
            .await
            .map_err(|e| CloudArbError::Other(format!("aws: invalid pricing payload: {e}")))?;

        let mut points = Vec::new();
        for (sku, product) in &index.products {
            let Some(instance_type) = &product.attributes.instance_type else {
                continue;
            };
            let Some(entry) = catalog::find(AWS_CATALOG, instance_type) else {
                continue;
            };
            let is_shared_linux = product
                .attributes
                .tenancy
                .as_deref()
                .is_none_or(|t| t == "Shared")
                && product
                    .attributes
                    .operating_system
                    .as_deref()
                    .is_none_or(|os| os == "Linux");
            if !is_shared_linux {
                continue;
            }
            let Some(terms) = index.on_demand_terms(sku) else {
                continue;
            };
            let Some(price) = terms else { continue };
            points.push(PricePoint {
                line: cloudarb_types::Line::new(ProviderId::Aws, entry.name, region.clone()),
                instance: entry.instance_type(),
                on_demand_per_hour: price,
                // The public bulk pricing file carries no spot quotes; spot
                // requires a signed EC2 API call out of scope for this
                // adapter (see DESIGN.md).
                spot_per_hour: None,
                observed_at: Utc::now(),
            });
        }
        Ok(points)
    }
}

impl OfferIndex {
    fn on_demand_terms(&self, sku: &str) -> Option<Option<Decimal>> {
        let offer_terms = self.terms.on_demand.get(sku)?;
        let (_, term) = offer_terms.iter().next()?;
        let (_, dimension) = term.price_dimensions.iter().next()?;
        let raw = dimension.price_per_unit.get("USD")?;
        Some(raw.parse::<Decimal>().ok())
    }
}

#[async_trait]
impl ProviderAdapter for AwsAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Aws
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
        let mut all = Vec::new();
        for region in &filter.regions {
            all.extend(self.fetch_region(region).await?);
        }
        all.retain(|p| filter.allows(p));
        Ok(all)
    }
}
