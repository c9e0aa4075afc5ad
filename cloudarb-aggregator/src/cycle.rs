//! One pricing aggregation cycle: fan out to every adapter under a cycle
//! deadline, merge successes into the prior table, evict stale entries.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cloudarb_core::ProviderAdapter;
use cloudarb_types::{CycleConfig, Line, PricePoint, PricingFilter, PricingTable, ProviderId, Region};
use futures::stream::{FuturesUnordered, StreamExt};

/// One configured adapter plus the regions it should be polled for.
pub struct AdapterEntry {
    /// Adapter implementation.
    pub adapter: Arc<dyn ProviderAdapter>,
    /// Regions to request from this adapter this cycle.
    pub regions: Vec<Region>,
}

/// Outcome of fanning out to every adapter for one cycle.
pub struct CycleOutcome {
    /// Fresh price points collected from adapters that responded in time.
    pub fresh: Vec<PricePoint>,
    /// Providers that failed or did not respond within the cycle deadline,
    /// paired with a human-readable reason.
    pub failed: Vec<(ProviderId, String)>,
}

/// Fan out to every adapter concurrently, collecting whatever responds
/// before `cfg.cycle_deadline` elapses. Adapters still in flight past the
/// deadline are simply dropped from this cycle's result; they get another
/// chance on the next cycle.
pub async fn fan_out(adapters: &[AdapterEntry], cfg: &CycleConfig) -> CycleOutcome {
    let mut futs = FuturesUnordered::new();
    for entry in adapters {
        let adapter = Arc::clone(&entry.adapter);
        let filter = PricingFilter::for_regions(entry.regions.clone());
        let per_adapter_timeout = cfg.adapter_timeout;
        futs.push(async move {
            let provider = adapter.provider();
            let result = cloudarb_core::adapter::call_with_timeout(provider, per_adapter_timeout, async {
                adapter.fetch_pricing(&filter).await
            })
            .await;
            (provider, result)
        });
    }

    let mut fresh = Vec::new();
    let mut failed = Vec::new();
    let deadline = tokio::time::sleep(cfg.cycle_deadline);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            biased;
            () = &mut deadline => {
                for entry in adapters {
                    let provider = entry.adapter.provider();
                    if !fresh.iter().any(|p: &PricePoint| p.line.provider == provider)
                        && !failed.iter().any(|(p, _): &(ProviderId, String)| *p == provider)
                    {
                        failed.push((provider, "cycle deadline exceeded".to_string()));
                    }
                }
                break;
            }
            next = futs.next() => {
                match next {
                    Some((provider, Ok(points))) => fresh.extend(points),
                    Some((provider, Err(e))) => failed.push((provider, e.to_string())),
                    None => break,
                }
            }
        }
    }
    CycleOutcome { fresh, failed }
}

/// A point is only ever mergeable if its prices are physically sane:
/// strictly positive on-demand, and spot (when quoted) no higher than
/// on-demand. Points failing this are dropped before they ever reach the
/// table, regardless of how fresh they are.
fn is_valid(point: &PricePoint) -> bool {
    if point.on_demand_per_hour <= rust_decimal::Decimal::ZERO {
        return false;
    }
    match point.spot_per_hour {
        Some(spot) => spot <= point.on_demand_per_hour,
        None => true,
    }
}

/// Merge fresh observations into the prior table, evicting any line whose
/// most recent observation is older than `freshness_ttl` relative to `now`.
///
/// A fresh point only overwrites a line's stored entry if it is newer
/// (`observed_at` strictly greater) than what is already there, so a
/// straggling response from a slow adapter can never clobber a more
/// recent one that arrived first; malformed points (non-positive price,
/// or spot quoted above on-demand) are dropped rather than merged.
#[must_use]
pub fn merge(prior: &PricingTable, fresh: Vec<PricePoint>, freshness_ttl: Duration) -> PricingTable {
    let mut prices: BTreeMap<Line, PricePoint> = prior.prices.clone();
    for point in fresh {
        if !is_valid(&point) {
            continue;
        }
        match prices.get(&point.line) {
            Some(existing) if existing.observed_at >= point.observed_at => {}
            _ => {
                prices.insert(point.line.clone(), point);
            }
        }
    }
    let now = Utc::now();
    prices.retain(|_, point| {
        let age = now.signed_duration_since(point.observed_at);
        age.to_std().map(|age| age <= freshness_ttl).unwrap_or(false)
    });
    PricingTable {
        generation: prior.generation,
        prices,
        published_at: Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use cloudarb_types::{AdapterCapabilities, CloudArbError, GpuKind, InstanceType};
    use std::str::FromStr;
    use std::time::Duration as StdDuration;

    struct SlowAdapter {
        provider: ProviderId,
        delay: StdDuration,
    }

    #[async_trait]
    impl ProviderAdapter for SlowAdapter {
        fn provider(&self) -> ProviderId {
            self.provider
        }

        fn capabilities(&self) -> AdapterCapabilities {
            AdapterCapabilities::conventional()
        }

        async fn fetch_pricing(&self, filter: &PricingFilter) -> Result<Vec<PricePoint>, CloudArbError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![PricePoint {
                line: Line::new(self.provider, "test-instance", filter.regions[0].clone()),
                instance: InstanceType {
                    name: "test-instance".into(),
                    gpu_kind: GpuKind::new("A100"),
                    gpu_count: 1,
                    vcpus: None,
                    memory_gib: None,
                },
                on_demand_per_hour: rust_decimal::Decimal::ONE,
                spot_per_hour: None,
                observed_at: Utc::now(),
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_adapter_is_excluded_from_the_cycle() {
        let cfg = CycleConfig {
            cycle_deadline: StdDuration::from_millis(50),
            adapter_timeout: StdDuration::from_millis(40),
            ..CycleConfig::default()
        };
        let adapters = vec![
            AdapterEntry {
                adapter: Arc::new(SlowAdapter { provider: ProviderId::Aws, delay: StdDuration::from_millis(5) }),
                regions: vec![Region::new("us-east-1")],
            },
            AdapterEntry {
                adapter: Arc::new(SlowAdapter { provider: ProviderId::Gcp, delay: StdDuration::from_millis(200) }),
                regions: vec![Region::new("us-central1")],
            },
        ];
        let outcome = fan_out(&adapters, &cfg).await;
        assert_eq!(outcome.fresh.len(), 1);
        assert_eq!(outcome.fresh[0].line.provider, ProviderId::Aws);
        assert!(outcome.failed.iter().any(|(p, _)| *p == ProviderId::Gcp));
    }

    #[test]
    fn merge_evicts_stale_entries() {
        let mut prior = PricingTable::empty();
        let stale_line = Line::new(ProviderId::Aws, "old", Region::new("us-east-1"));
        prior.prices.insert(
            stale_line.clone(),
            PricePoint {
                line: stale_line,
                instance: InstanceType {
                    name: "old".into(),
                    gpu_kind: GpuKind::new("A100"),
                    gpu_count: 1,
                    vcpus: None,
                    memory_gib: None,
                },
                on_demand_per_hour: rust_decimal::Decimal::ONE,
                spot_per_hour: None,
                observed_at: Utc::now() - chrono::Duration::hours(2),
            },
        );
        let merged = merge(&prior, vec![], StdDuration::from_secs(300));
        assert!(merged.prices.is_empty());
    }

    fn point_at(line: Line, price: &str, spot: Option<&str>, observed_at: DateTime<Utc>) -> PricePoint {
        PricePoint {
            line,
            instance: InstanceType {
                name: "test-instance".into(),
                gpu_kind: GpuKind::new("A100"),
                gpu_count: 1,
                vcpus: None,
                memory_gib: None,
            },
            on_demand_per_hour: rust_decimal::Decimal::from_str(price).unwrap(),
            spot_per_hour: spot.map(|s| rust_decimal::Decimal::from_str(s).unwrap()),
            observed_at,
        }
    }

    #[test]
    fn merge_never_lets_an_older_observation_overwrite_a_newer_one() {
        let line = Line::new(ProviderId::Aws, "test-instance", Region::new("us-east-1"));
        let now = Utc::now();
        let mut prior = PricingTable::empty();
        let newer = point_at(line.clone(), "3.00", None, now);
        prior.prices.insert(line.clone(), newer.clone());

        let stale_duplicate = point_at(line.clone(), "1.00", None, now - chrono::Duration::seconds(5));
        let merged = merge(&prior, vec![stale_duplicate], StdDuration::from_secs(300));

        assert_eq!(merged.prices[&line].on_demand_per_hour, newer.on_demand_per_hour);
    }

    #[test]
    fn merge_drops_a_non_positive_price() {
        let line = Line::new(ProviderId::Aws, "test-instance", Region::new("us-east-1"));
        let bad = point_at(line.clone(), "0.00", None, Utc::now());
        let merged = merge(&PricingTable::empty(), vec![bad], StdDuration::from_secs(300));
        assert!(merged.prices.is_empty());
    }

    #[test]
    fn merge_drops_a_spot_quote_above_on_demand() {
        let line = Line::new(ProviderId::Aws, "test-instance", Region::new("us-east-1"));
        let bad = point_at(line.clone(), "1.00", Some("1.50"), Utc::now());
        let merged = merge(&PricingTable::empty(), vec![bad], StdDuration::from_secs(300));
        assert!(merged.prices.is_empty());
    }
}
