//! Composes the fixed three-layer middleware stack around a raw adapter.

use std::time::Duration;

use cloudarb_core::ProviderAdapter;

use crate::blacklist::BlacklistMiddleware;
use crate::cache::CacheMiddleware;
use crate::quota::QuotaMiddleware;

/// Wrap a raw adapter with the standard CloudArb middleware stack, in the
/// required order: cache outermost, then blacklist, then quota, then the
/// raw adapter. Requests that hit the cache never reach the quota check,
/// so a cache hit never counts against an adapter's call budget.
pub fn standard_stack<A: ProviderAdapter + 'static>(
    raw: A,
    cache_ttl: Duration,
    quarantine: Duration,
) -> CacheMiddleware<BlacklistMiddleware<QuotaMiddleware<A>>> {
    let quota = QuotaMiddleware::new(raw);
    let blacklist = BlacklistMiddleware::new(quota, quarantine);
    CacheMiddleware::new(blacklist, cache_ttl)
}
