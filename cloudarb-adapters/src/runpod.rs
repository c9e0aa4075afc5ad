//! RunPod adapter, backed by the public GraphQL API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cloudarb_core::ProviderAdapter;
use cloudarb_types::{AdapterCapabilities, CloudArbError, PricePoint, PricingFilter, ProviderId, Region};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::catalog::{self, RUNPOD as RUNPOD_CATALOG};
use crate::credential::CredentialHandle;

const GRAPHQL_URL: &str = "https://api.runpod.io/graphql";

const GPU_TYPES_QUERY: &str = "query GpuTypes { gpuTypes { displayName communityPrice secureCloudPrice } }";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GpuTypesData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GpuTypesData {
    #[serde(rename = "gpuTypes")]
    gpu_types: Vec<GpuType>,
}

#[derive(Debug, Deserialize)]
struct GpuType {
    #[serde(rename = "displayName")]
    display_name: String,
    #[serde(rename = "communityPrice")]
    community_price: Option<f64>,
    #[serde(rename = "secureCloudPrice")]
    secure_cloud_price: Option<f64>,
}

/// Adapter for `RunPod` GPU pod pricing.
///
/// `RunPod` has no single fixed "region": community and secure cloud pods
/// are priced globally, so every line is reported under a single
/// `"global"` region regardless of the filter's region list.
pub struct RunPodAdapter {
    client: reqwest::Client,
    credential: CredentialHandle,
    graphql_url: String,
}

impl RunPodAdapter {
    /// Build a new adapter, reading the API key from `credential`.
    #[must_use]
    pub fn new(client: reqwest::Client, credential: CredentialHandle) -> Self {
        Self {
            client,
            credential,
            graphql_url: GRAPHQL_URL.to_string(),
        }
    }

    /// Build an adapter against a non-default base URL, for testing against
    /// a mock server.
    #[must_use]
    pub fn with_base_url(client: reqwest::Client, credential: CredentialHandle, base_url: impl Into<String>) -> Self {
        Self {
            client,
            credential,
            graphql_url: format!("{}/graphql", base_url.into()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for RunPodAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::RunPod
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            has_region_granularity: false,
            sustainable_qps: 1.0,
            min_poll_interval: Duration::from_secs(20),
            ..AdapterCapabilities::no_spot()
        }
    }

    async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
        let key = self.credential.require_key(ProviderId::RunPod)?;
        let resp = self
            .client
            .post(&self.graphql_url)
            .query(&[("api_key", key)])
            .json(&json!({ "query": GPU_TYPES_QUERY }))
            .send()
            .await
            .map_err(|e| CloudArbError::Other(format!("runpod: request failed: {e}")))?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CloudArbError::auth_failed("runpod"));
        }
        if !resp.status().is_success() {
            return Err(CloudArbError::Other(format!(
                "runpod: graphql endpoint returned {}",
                resp.status()
            )));
        }
        let parsed: GraphQlResponse = resp
            .json()
            .await
            .map_err(|e| CloudArbError::Other(format!("runpod: invalid payload: {e}")))?;
        if let Some(err) = parsed.errors.first() {
            return Err(CloudArbError::Other(format!("runpod: {}", err.message)));
        }
        let Some(data) = parsed.data else {
            return Ok(vec![]);
        };

        let region = Region::new("global");
        let mut points = Vec::new();
        for gpu in data.gpu_types {
            let Some(entry) = catalog::find(RUNPOD_CATALOG, &gpu.display_name) else {
                continue;
            };
            let Some(price) = gpu.secure_cloud_price.or(gpu.community_price) else {
                continue;
            };
            let Ok(on_demand) = Decimal::try_from(price) else {
                continue;
            };
            points.push(PricePoint {
                line: cloudarb_types::Line::new(ProviderId::RunPod, entry.name, region.clone()),
                instance: entry.instance_type(),
                on_demand_per_hour: on_demand,
                spot_per_hour: None,
                observed_at: Utc::now(),
            });
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
    async fn prefers_secure_cloud_price_over_community_price() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/graphql");
            then.status(200).json_body(json!({
                "data": {
                    "gpuTypes": [
                        {
                            "displayName": "NVIDIA A100 80GB PCIe",
                            "communityPrice": 1.1,
                            "secureCloudPrice": 1.64
                        },
                        {
                            "displayName": "Some Unknown GPU",
                            "communityPrice": 0.5,
                            "secureCloudPrice": 0.8
                        }
                    ]
                }
            }));
        });

        let adapter = RunPodAdapter::with_base_url(
            reqwest::Client::new(),
            CredentialHandle::ApiKey("test-key".into()),
            server.base_url(),
        );
        let points = adapter.fetch_pricing(&PricingFilter::default()).await.unwrap();

        mock.assert();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].line.region, Region::new("global"));
        assert_eq!(points[0].on_demand_per_hour, Decimal::try_from(1.64).unwrap());
    }

    #[tokio::test]
    async fn graphql_errors_surface_as_adapter_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/graphql");
            then.status(200).json_body(json!({
                "data": null,
                "errors": [{ "message": "rate limited" }]
            }));
        });

        let adapter = RunPodAdapter::with_base_url(
            reqwest::Client::new(),
            CredentialHandle::ApiKey("test-key".into()),
            server.base_url(),
        );
        let err = adapter.fetch_pricing(&PricingFilter::default()).await.unwrap_err();
        assert!(matches!(err, CloudArbError::Other(msg) if msg.contains("rate limited")));
    }
}
