use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::RouteApi;
use crate::client::RouteQueryClient;
use crate::types::HealthStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    Unknown,
    Available(Arc<HealthStatus>),
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }
}

pub async fn check_availability<A: RouteApi>(client: &RouteQueryClient<A>) -> Availability {
    match client.health_check().await {
        Ok(status) => Availability::Available(status),
        Err(err) => Availability::Unavailable(err.to_string()),
    }
}

#[derive(Debug)]
pub struct HealthPoller {
    pub availability: watch::Receiver<Availability>,
    pub handle: JoinHandle<()>,
}

/// Polls the backend health endpoint every `interval` until every receiver is dropped.
pub fn spawn_health_poller<A: RouteApi>(
    client: RouteQueryClient<A>,
    interval: Duration,
) -> HealthPoller {
    let (sender, availability) = watch::channel(Availability::Unknown);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            let next = check_availability(&client).await;
            match &next {
                Availability::Available(_) => info!("Routing backend is available"),
                other => warn!("Routing backend is unavailable: {:?}", other),
            }

            if sender.send(next).is_err() {
                info!("No health subscribers left, stopping poller");
                break;
            }
        }
    });

    HealthPoller { availability, handle }
}
