use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::backend::RouteApi;
use crate::cache::{CachePolicy, QueryCache, QueryKey, QueryValue};
use crate::error::ClientError;
use crate::types::{Chain, ChainId, HealthStatus, RouteRequest, RouteResult, Token};

type SharedQuery = Shared<BoxFuture<'static, Result<QueryValue, ClientError>>>;

#[derive(Default)]
struct ClientState {
    // Lock order: in_flight before cache
    in_flight: Mutex<HashMap<QueryKey, SharedQuery>>,
    cache: Mutex<QueryCache>,
}

/// Routes from the cache, with whether they have outlived their freshness window.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRoutes {
    pub routes: Arc<Vec<RouteResult>>,
    pub stale: bool,
}

/// Caching, coalescing front for a [`RouteApi`].
///
/// Identical queries issued while one is in flight share a single backend call. The call runs
/// on its own task, so it completes and fills the cache even if every caller stops waiting.
pub struct RouteQueryClient<A: RouteApi> {
    api: Arc<A>,
    policy: CachePolicy,
    state: Arc<ClientState>,
}

impl<A: RouteApi> Clone for RouteQueryClient<A> {
    fn clone(&self) -> Self {
        RouteQueryClient {
            api: self.api.clone(),
            policy: self.policy.clone(),
            state: self.state.clone(),
        }
    }
}

impl<A: RouteApi> fmt::Debug for RouteQueryClient<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteQueryClient")
            .field("api", &self.api)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<A: RouteApi> RouteQueryClient<A> {
    pub fn new(api: Arc<A>, policy: CachePolicy) -> Self {
        RouteQueryClient { api, policy, state: Arc::new(ClientState::default()) }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub async fn list_chains(&self) -> Result<Arc<Vec<Chain>>, ClientError> {
        match self.query(QueryKey::Chains).await? {
            QueryValue::Chains(chains) => Ok(chains),
            other => Err(mismatch(&QueryKey::Chains, &other)),
        }
    }

    pub async fn list_tokens(&self, chain: &ChainId) -> Result<Arc<Vec<Token>>, ClientError> {
        let key = QueryKey::Tokens(chain.clone());
        match self.query(key.clone()).await? {
            QueryValue::Tokens(tokens) => Ok(tokens),
            other => Err(mismatch(&key, &other)),
        }
    }

    pub async fn find_routes(
        &self,
        request: &RouteRequest,
    ) -> Result<Arc<Vec<RouteResult>>, ClientError> {
        let key = QueryKey::Routes(request.clone());
        match self.query(key.clone()).await? {
            QueryValue::Routes(routes) => Ok(routes),
            other => Err(mismatch(&key, &other)),
        }
    }

    pub async fn find_best_route(
        &self,
        request: &RouteRequest,
    ) -> Result<Arc<RouteResult>, ClientError> {
        let key = QueryKey::BestRoute(request.clone());
        match self.query(key.clone()).await? {
            QueryValue::BestRoute(route) => Ok(route),
            other => Err(mismatch(&key, &other)),
        }
    }

    pub async fn health_check(&self) -> Result<Arc<HealthStatus>, ClientError> {
        match self.query(QueryKey::Health).await? {
            QueryValue::Health(status) => Ok(status),
            other => Err(mismatch(&QueryKey::Health, &other)),
        }
    }

    /// Whatever is cached for `request`, fresh or not. Never calls the backend.
    pub async fn cached_routes(&self, request: &RouteRequest) -> Option<CachedRoutes> {
        let key = QueryKey::Routes(request.clone());
        match self.state.cache.lock().await.lookup(&key, &self.policy) {
            Some((QueryValue::Routes(routes), fresh)) => {
                Some(CachedRoutes { routes, stale: !fresh })
            }
            _ => None,
        }
    }

    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        let removed = self.state.cache.lock().await.remove(key);
        if removed {
            info!("Invalidated {}", key);
        }
        removed
    }

    pub async fn invalidate_reference_data(&self) {
        info!("Invalidating cached chains and tokens");
        self.state
            .cache
            .lock()
            .await
            .retain(|key| !matches!(key, QueryKey::Chains | QueryKey::Tokens(_)));
    }

    async fn query(&self, key: QueryKey) -> Result<QueryValue, ClientError> {
        let pending = {
            let mut in_flight = self.state.in_flight.lock().await;

            if let Some((value, true)) = self.state.cache.lock().await.lookup(&key, &self.policy) {
                debug!("Cache hit for {}", key);
                return Ok(value);
            }

            match in_flight.get(&key) {
                Some(pending) => {
                    debug!("Joining in-flight request for {}", key);
                    pending.clone()
                }
                None => {
                    debug!("Cache miss for {}, fetching", key);
                    let pending = self.spawn_fetch(key.clone());
                    in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    fn spawn_fetch(&self, key: QueryKey) -> SharedQuery {
        let api = self.api.clone();
        let state = self.state.clone();
        let retries = self.policy.retries(&key);

        let task = tokio::spawn(async move {
            let result = fetch_with_retries(api.as_ref(), &key, retries).await;

            let mut in_flight = state.in_flight.lock().await;
            if let Ok(value) = &result {
                state.cache.lock().await.insert(key.clone(), value.clone());
            }
            in_flight.remove(&key);
            result
        });

        async move { task.await.unwrap_or_else(|err| Err(ClientError::Aborted(err.to_string()))) }
            .boxed()
            .shared()
    }
}

async fn fetch_with_retries<A: RouteApi>(
    api: &A,
    key: &QueryKey,
    retries: u32,
) -> Result<QueryValue, ClientError> {
    let mut attempt = 0;
    loop {
        match fetch(api, key).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retries => {
                attempt += 1;
                warn!("Request for {} failed: {}. Retrying ({}/{})", key, err, attempt, retries);
            }
            Err(err) => {
                warn!("Request for {} failed: {}", key, err);
                return Err(err);
            }
        }
    }
}

async fn fetch<A: RouteApi>(api: &A, key: &QueryKey) -> Result<QueryValue, ClientError> {
    Ok(match key {
        QueryKey::Chains => QueryValue::Chains(Arc::new(api.chains().await?)),
        QueryKey::Tokens(chain) => QueryValue::Tokens(Arc::new(api.tokens(chain).await?)),
        QueryKey::Health => QueryValue::Health(Arc::new(api.health().await?)),
        QueryKey::Routes(request) => QueryValue::Routes(Arc::new(api.routes(request).await?)),
        QueryKey::BestRoute(request) => {
            QueryValue::BestRoute(Arc::new(api.best_route(request).await?))
        }
    })
}

fn mismatch(key: &QueryKey, value: &QueryValue) -> ClientError {
    ClientError::Decode {
        body: format!("{:?}", value),
        message: format!("Unexpected cached value for {}", key),
    }
}
