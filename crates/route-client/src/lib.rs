pub use amount::{format_address, to_base_units, to_human_units, AmountError};
pub use backend::{HttpRouteApi, RouteApi};
pub use cache::{CachePolicy, Freshness, QueryKey, QueryValue};
pub use client::{CachedRoutes, RouteQueryClient};
pub use error::{ClientError, RequestError};
pub use form::FormState;
pub use health::{check_availability, spawn_health_poller, Availability, HealthPoller};
pub use preferences::{PreferenceStore, PreferenceStoreError, Preferences};
pub use request::TokenRegistry;
pub use search::{QueryStatus, RouteSearch, StaleDataWarning};
pub use types::*;

pub mod amount;
pub mod backend;
pub mod cache;
pub mod client;
pub mod error;
pub mod form;
pub mod health;
mod lenient;
pub mod preferences;
pub mod request;
pub mod search;
pub mod types;
