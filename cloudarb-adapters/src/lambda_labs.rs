//! Lambda Labs adapter, backed by the public Cloud API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cloudarb_core::ProviderAdapter;
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId, Region};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::catalog::{self, LAMBDA_LABS as LAMBDA_CATALOG};
use crate::credential::CredentialHandle;

const INSTANCE_TYPES_URL: &str = "https://cloud.lambdalabs.com/api/v1/instance-types";

#[derive(Debug, Deserialize)]
struct InstanceTypesResponse {
    data: std::collections::HashMap<String, InstanceTypeEntry>,
}

#[derive(Debug, Deserialize)]
struct InstanceTypeEntry {
    #[serde(rename = "instance_type")]
    instance_type: InstanceTypeDetail,
    #[serde(rename = "regions_with_capacity_available")]
    regions_with_capacity_available: Vec<RegionDescriptor>,
}

#[derive(Debug, Deserialize)]
struct InstanceTypeDetail {
    name: String,
    #[serde(rename = "price_cents_per_hour")]
    price_cents_per_hour: i64,
}

#[derive(Debug, Deserialize)]
struct RegionDescriptor {
    name: String,
}

/// Adapter for Lambda Labs on-demand GPU instance pricing.
///
/// Lambda Labs has no spot market: `PricePoint::spot_per_hour` is always
/// `None` for lines from this adapter, matching
/// `ProviderId::LambdaLabs.supports_spot() == false`.
pub struct LambdaLabsAdapter {
    client: reqwest::Client,
    credential: CredentialHandle,
    instance_types_url: String,
}

impl LambdaLabsAdapter {
    /// Build a new adapter, reading the API key from `credential`.
    #[must_use]
    pub fn new(client: reqwest::Client, credential: CredentialHandle) -> Self {
        Self {
            client,
            credential,
            instance_types_url: INSTANCE_TYPES_URL.to_string(),
        }
    }

    /// Build an adapter against a non-default base URL, for testing against
    /// a mock server.
    #[must_use]
    pub fn with_base_url(client: reqwest::Client, credential: CredentialHandle, base_url: impl Into<String>) -> Self {
        Self {
            client,
            credential,
            instance_types_url: format!("{}/api/v1/instance-types", base_url.into()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for LambdaLabsAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::LambdaLabs
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            has_region_granularity: true,
            sustainable_qps: 1.0,
            min_poll_interval: Duration::from_secs(20),
            ..AdapterCapabilities::no_spot()
        }
    }

    async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
        let key = self.credential.require_key(ProviderId::LambdaLabs)?;
        let resp = self
            .client
            .get(&self.instance_types_url)
            .bearer_auth(key)
            .send()
            .await
            .map_err(|e| CloudArbError::Other(format!("lambda-labs: request failed: {e}")))?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CloudArbError::auth_failed("lambda-labs"));
        }
        if !resp.status().is_success() {
            return Err(CloudArbError::Other(format!(
                "lambda-labs: instance-types returned {}",
                resp.status()
            )));
        }
        let parsed: InstanceTypesResponse = resp
            .json()
            .await
            .map_err(|e| CloudArbError::Other(format!("lambda-labs: invalid payload: {e}")))?;

        let mut points = Vec::new();
        for entry in parsed.data.values() {
            let Some(catalog_entry) = catalog::find(LAMBDA_CATALOG, &entry.instance_type.name) else {
                continue;
            };
            let on_demand = Decimal::new(entry.instance_type.price_cents_per_hour, 2);
            for available_region in &entry.regions_with_capacity_available {
                let region = Region::new(available_region.name.clone());
                if !filter.regions.is_empty() && !filter.regions.contains(&region) {
                    continue;
                }
                points.push(PricePoint {
                    line: cloudarb_types::Line::new(ProviderId::LambdaLabs, catalog_entry.name, region.clone()),
                    instance: catalog_entry.instance_type(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use serde_json::json;

    #[tokio::test]
    async fn fetches_and_filters_by_requested_region() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/api/v1/instance-types");
            then.status(200).json_body(json!({
                "data": {
                    "gpu_1x_a100": {
                        "instance_type": { "name": "gpu_1x_a100", "price_cents_per_hour": 240 },
                        "regions_with_capacity_available": [
                            { "name": "us-east-1" },
                            { "name": "us-west-1" }
                        ]
                    }
                }
            }));
        });

        let adapter = LambdaLabsAdapter::with_base_url(
            reqwest::Client::new(),
            CredentialHandle::ApiKey("test-key".into()),
            server.base_url(),
        );
        let filter = PricingFilter::for_regions(vec![Region::new("us-east-1")]);
        let points = adapter.fetch_pricing(&filter).await.unwrap();

        mock.assert();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].line.region, Region::new("us-east-1"));
        assert_eq!(points[0].on_demand_per_hour, Decimal::new(240, 2));
        assert!(points[0].spot_per_hour.is_none());
    }

    #[tokio::test]
    async fn missing_credential_is_an_auth_error_before_any_request() {
        let adapter = LambdaLabsAdapter::new(reqwest::Client::new(), CredentialHandle::None);
        let filter = PricingFilter::for_regions(vec![Region::new("us-east-1")]);
        let err = adapter.fetch_pricing(&filter).await.unwrap_err();
        assert!(matches!(err, CloudArbError::AuthFailed { .. }));
    }
}
