use std::fmt;
use std::sync::{Arc, Mutex};

use log::{debug, info};
use thiserror::Error;
use tokio::sync::watch;

use crate::backend::RouteApi;
use crate::cache::Freshness;
use crate::client::RouteQueryClient;
use crate::error::ClientError;
use crate::types::{RouteRequest, RouteResult};

/// What a route list view should show.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus {
    Idle,
    Pending(RouteRequest),
    Success { request: RouteRequest, routes: Arc<Vec<RouteResult>> },
    Error { request: RouteRequest, error: ClientError },
}

impl QueryStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryStatus::Pending(_))
    }
}

/// Non-blocking hint that the routes on screen are older than their freshness window.
#[derive(Debug, Error, Clone, PartialEq)]
pub struct StaleDataWarning {
    pub freshness: Freshness,
}

impl fmt::Display for StaleDataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.freshness {
            Freshness::Within(window) => write!(
                f,
                "Routes are older than {} seconds and may no longer reflect current prices",
                window.as_secs()
            ),
            Freshness::Forever => write!(f, "Routes may no longer reflect current prices"),
        }
    }
}

#[derive(Debug, Default)]
struct SearchState {
    active: Option<RouteRequest>,
    detached: bool,
}

/// Tracks the route search a view is currently showing.
///
/// Only the most recently submitted request may change the visible status. A slower, older
/// request that resolves afterwards is returned to its caller but not displayed.
#[derive(Debug)]
pub struct RouteSearch<A: RouteApi> {
    client: RouteQueryClient<A>,
    state: Mutex<SearchState>,
    status: watch::Sender<QueryStatus>,
}

impl<A: RouteApi> RouteSearch<A> {
    pub fn new(client: RouteQueryClient<A>) -> Self {
        let (status, _) = watch::channel(QueryStatus::Idle);
        RouteSearch { client, state: Mutex::new(SearchState::default()), status }
    }

    pub fn status(&self) -> QueryStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryStatus> {
        self.status.subscribe()
    }

    pub async fn submit(
        &self,
        request: RouteRequest,
    ) -> Result<Arc<Vec<RouteResult>>, ClientError> {
        self.with_state(|state, status| {
            state.active = Some(request.clone());
            if !state.detached {
                status.send_replace(QueryStatus::Pending(request.clone()));
            }
        });

        let mut guard = PendingGuard { search: self, request: &request, armed: true };
        let result = self.client.find_routes(&request).await;
        guard.armed = false;

        let next = match &result {
            Ok(routes) => QueryStatus::Success { request: request.clone(), routes: routes.clone() },
            Err(error) => QueryStatus::Error { request: request.clone(), error: error.clone() },
        };
        self.apply(&request, next);

        result
    }

    /// Stops all further status changes, e.g. once the view is gone.
    pub fn detach(&self) {
        self.with_state(|state, _| state.detached = true);
    }

    pub async fn stale_warning(&self) -> Option<StaleDataWarning> {
        let request = match &*self.status.borrow() {
            QueryStatus::Success { request, .. } => request.clone(),
            _ => return None,
        };

        let freshness = self.client.policy().routes;
        match self.client.cached_routes(&request).await {
            Some(cached) if !cached.stale => None,
            _ => Some(StaleDataWarning { freshness }),
        }
    }

    fn apply(&self, request: &RouteRequest, next: QueryStatus) {
        self.with_state(|state, status| {
            if state.detached {
                debug!("Search view detached, dropping result");
            } else if state.active.as_ref() != Some(request) {
                info!(
                    "Ignoring result for superseded search {} -> {} amount {}",
                    request.from_chain, request.to_chain, request.amount_base_units
                );
            } else {
                status.send_replace(next);
            }
        });
    }

    fn with_state<R>(
        &self,
        f: impl FnOnce(&mut SearchState, &watch::Sender<QueryStatus>) -> R,
    ) -> R {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state, &self.status)
    }
}

// Resets a dangling Pending status when a submit future is dropped before it resolves.
struct PendingGuard<'a, A: RouteApi> {
    search: &'a RouteSearch<A>,
    request: &'a RouteRequest,
    armed: bool,
}

impl<A: RouteApi> Drop for PendingGuard<'_, A> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let request = self.request;
        self.search.with_state(|state, status| {
            if state.active.as_ref() == Some(request) {
                state.active = None;
                if !state.detached {
                    status.send_replace(QueryStatus::Idle);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::poll;

    use super::*;
    use crate::cache::CachePolicy;
    use crate::client::tests::{request, route, GatedApi};

    fn search() -> (Arc<GatedApi>, RouteSearch<GatedApi>) {
        let api = Arc::new(GatedApi::default());
        let client = RouteQueryClient::new(api.clone(), CachePolicy::default());
        (api, RouteSearch::new(client))
    }

    #[tokio::test]
    async fn test_success_is_published() {
        let (api, search) = search();
        let gate = api.gate("100000000");
        let mut updates = search.subscribe();

        let mut submit = Box::pin(search.submit(request("100000000")));
        assert!(poll!(&mut submit).is_pending());
        assert_eq!(search.status(), QueryStatus::Pending(request("100000000")));
        assert!(updates.has_changed().unwrap());

        gate.send(Ok(vec![route("Stargate")])).unwrap();
        submit.await.unwrap();

        match search.status() {
            QueryStatus::Success { request: shown, routes } => {
                assert_eq!(shown, request("100000000"));
                assert_eq!(routes[0].protocol, "Stargate");
            }
            status => panic!("unexpected status: {:?}", status),
        }
        assert!(!updates.borrow_and_update().is_pending());
    }

    #[tokio::test]
    async fn test_failure_is_published() {
        let (api, search) = search();
        api.gate("100000000")
            .send(Err(ClientError::Transport("connection refused".to_string())))
            .unwrap();

        assert!(search.submit(request("100000000")).await.is_err());
        assert_eq!(
            search.status(),
            QueryStatus::Error {
                request: request("100000000"),
                error: ClientError::Transport("connection refused".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_older_request_cannot_overwrite_newer() {
        let (api, search) = search();
        let old_gate = api.gate("1000000");
        let new_gate = api.gate("2000000");

        let mut old = Box::pin(search.submit(request("1000000")));
        assert!(poll!(&mut old).is_pending());
        let mut new = Box::pin(search.submit(request("2000000")));
        assert!(poll!(&mut new).is_pending());

        // old resolves while the new one is still pending
        old_gate.send(Ok(vec![route("Across")])).unwrap();
        assert_eq!(old.await.unwrap()[0].protocol, "Across");
        assert_eq!(search.status(), QueryStatus::Pending(request("2000000")));

        new_gate.send(Ok(vec![route("Stargate")])).unwrap();
        new.await.unwrap();
        let newest = request("2000000");
        assert!(matches!(
            search.status(),
            QueryStatus::Success { request, .. } if request == newest
        ));
    }

    #[tokio::test]
    async fn test_late_older_response_is_ignored() {
        let (api, search) = search();
        let old_gate = api.gate("1000000");
        let new_gate = api.gate("2000000");

        let mut old = Box::pin(search.submit(request("1000000")));
        assert!(poll!(&mut old).is_pending());

        new_gate.send(Ok(vec![route("Stargate")])).unwrap();
        search.submit(request("2000000")).await.unwrap();

        old_gate.send(Ok(vec![route("Across")])).unwrap();
        old.await.unwrap();

        match search.status() {
            QueryStatus::Success { routes, .. } => assert_eq!(routes[0].protocol, "Stargate"),
            status => panic!("unexpected status: {:?}", status),
        }
    }

    #[tokio::test]
    async fn test_dropped_submit_resets_to_idle() {
        let (api, search) = search();
        let _gate = api.gate("100000000");

        let mut submit = Box::pin(search.submit(request("100000000")));
        assert!(poll!(&mut submit).is_pending());
        assert!(search.status().is_pending());

        drop(submit);
        assert_eq!(search.status(), QueryStatus::Idle);
    }

    #[tokio::test]
    async fn test_detached_view_receives_nothing() {
        let (api, search) = search();
        let gate = api.gate("100000000");

        let mut submit = Box::pin(search.submit(request("100000000")));
        assert!(poll!(&mut submit).is_pending());
        search.detach();

        gate.send(Ok(vec![route("Stargate")])).unwrap();
        assert!(submit.await.is_ok());
        assert_eq!(search.status(), QueryStatus::Pending(request("100000000")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_warning_after_freshness_window() {
        let (api, search) = search();
        assert_eq!(search.stale_warning().await, None);

        api.gate("100000000").send(Ok(vec![route("Stargate")])).unwrap();
        search.submit(request("100000000")).await.unwrap();
        assert_eq!(search.stale_warning().await, None);

        tokio::time::advance(Duration::from_secs(31)).await;

        let warning = search.stale_warning().await.unwrap();
        assert_eq!(
            warning.to_string(),
            "Routes are older than 30 seconds and may no longer reflect current prices"
        );
    }
}
