use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::{Chain, ChainId, HealthStatus, RouteRequest, RouteResult, Token};

/// Identifies one backend query by its operation and full parameter tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Chains,
    Tokens(ChainId),
    Health,
    Routes(RouteRequest),
    BestRoute(RouteRequest),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Chains => write!(f, "chains"),
            QueryKey::Tokens(chain) => write!(f, "tokens[{}]", chain),
            QueryKey::Health => write!(f, "health"),
            QueryKey::Routes(request) => write!(
                f,
                "routes[{}->{} {} {}]",
                request.from_chain,
                request.to_chain,
                request.token_address,
                request.amount_base_units
            ),
            QueryKey::BestRoute(request) => write!(
                f,
                "best-route[{}->{} {} {}]",
                request.from_chain,
                request.to_chain,
                request.token_address,
                request.amount_base_units
            ),
        }
    }
}

/// A decoded backend response. Results are shared, never mutated after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Chains(Arc<Vec<Chain>>),
    Tokens(Arc<Vec<Token>>),
    Health(Arc<HealthStatus>),
    Routes(Arc<Vec<RouteResult>>),
    BestRoute(Arc<RouteResult>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Forever,
    Within(Duration),
}

impl Freshness {
    pub fn is_fresh(&self, age: Duration) -> bool {
        match self {
            Freshness::Forever => true,
            Freshness::Within(window) => age < *window,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub routes: Freshness,
    pub best_route: Freshness,
    pub health: Freshness,
    pub health_retries: u32,
}

impl CachePolicy {
    pub fn freshness(&self, key: &QueryKey) -> Freshness {
        match key {
            QueryKey::Chains | QueryKey::Tokens(_) => Freshness::Forever,
            QueryKey::Health => self.health,
            QueryKey::Routes(_) => self.routes,
            QueryKey::BestRoute(_) => self.best_route,
        }
    }

    pub fn retries(&self, key: &QueryKey) -> u32 {
        match key {
            QueryKey::Health => self.health_retries,
            _ => 0,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy {
            routes: Freshness::Within(Duration::from_secs(30)),
            best_route: Freshness::Within(Duration::from_secs(30)),
            health: Freshness::Within(Duration::from_secs(10)),
            health_retries: 1,
        }
    }
}

impl From<&config::CacheConfig> for CachePolicy {
    fn from(config: &config::CacheConfig) -> Self {
        CachePolicy {
            routes: Freshness::Within(Duration::from_secs(config.routes_stale_after_sec)),
            best_route: Freshness::Within(Duration::from_secs(config.best_route_stale_after_sec)),
            health: Freshness::Within(Duration::from_secs(config.health_stale_after_sec)),
            health_retries: config.health_retries,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub value: QueryValue,
    pub fetched_at: Instant,
}

#[derive(Debug, Default)]
pub(crate) struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
}

impl QueryCache {
    pub fn insert(&mut self, key: QueryKey, value: QueryValue) {
        self.entries.insert(key, CacheEntry { value, fetched_at: Instant::now() });
    }

    /// The cached value for `key` and whether it is still fresh.
    pub fn lookup(&self, key: &QueryKey, policy: &CachePolicy) -> Option<(QueryValue, bool)> {
        self.entries.get(key).map(|entry| {
            let fresh = policy.freshness(key).is_fresh(entry.fetched_at.elapsed());
            (entry.value.clone(), fresh)
        })
    }

    pub fn remove(&mut self, key: &QueryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn retain(&mut self, keep: impl Fn(&QueryKey) -> bool) {
        self.entries.retain(|key, _| keep(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> config::CacheConfig {
        config::get_sample_config().cache
    }

    #[test]
    fn test_policy_from_config() {
        let policy = CachePolicy::from(&config());

        assert_eq!(policy, CachePolicy::default());
        assert_eq!(policy.retries(&QueryKey::Health), 1);
        assert_eq!(policy.retries(&QueryKey::Chains), 0);
        assert_eq!(policy.freshness(&QueryKey::Tokens(ChainId::from("1"))), Freshness::Forever);
    }

    #[test]
    fn test_freshness_window_is_exclusive() {
        let window = Freshness::Within(Duration::from_secs(30));
        assert!(window.is_fresh(Duration::from_secs(29)));
        assert!(!window.is_fresh(Duration::from_secs(30)));
        assert!(Freshness::Forever.is_fresh(Duration::from_secs(u64::MAX)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_reports_staleness() {
        let policy = CachePolicy::default();
        let mut cache = QueryCache::default();
        cache.insert(QueryKey::Health, QueryValue::Health(Arc::new(HealthStatus::default())));
        cache.insert(QueryKey::Chains, QueryValue::Chains(Arc::new(vec![])));

        assert_eq!(cache.lookup(&QueryKey::Health, &policy).map(|(_, fresh)| fresh), Some(true));

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(cache.lookup(&QueryKey::Health, &policy).map(|(_, fresh)| fresh), Some(false));
        assert_eq!(cache.lookup(&QueryKey::Chains, &policy).map(|(_, fresh)| fresh), Some(true));

        cache.retain(|key| !matches!(key, QueryKey::Chains));
        assert!(cache.lookup(&QueryKey::Chains, &policy).is_none());
        assert!(cache.remove(&QueryKey::Health));
        assert!(!cache.remove(&QueryKey::Health));
    }
}
