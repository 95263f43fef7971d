use std::fmt::Debug;

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::{header, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::types::{ChainsResponse, RoutesResponse, TokensResponse};
use crate::error::ClientError;
use crate::types::{Chain, ChainId, HealthStatus, RouteRequest, RouteResult, Token};

mod types;

/// The routing backend's HTTP contract.
#[async_trait]
pub trait RouteApi: Debug + Send + Sync + 'static {
    async fn chains(&self) -> Result<Vec<Chain>, ClientError>;

    async fn tokens(&self, chain: &ChainId) -> Result<Vec<Token>, ClientError>;

    async fn routes(&self, request: &RouteRequest) -> Result<Vec<RouteResult>, ClientError>;

    async fn best_route(&self, request: &RouteRequest) -> Result<RouteResult, ClientError>;

    async fn health(&self) -> Result<HealthStatus, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpRouteApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpRouteApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|err| {
            ClientError::Transport(format!("Invalid base url {}: {}", base_url, err))
        })?;

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(HttpRouteApi { base_url, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::Transport(format!("Base url {} cannot hold a path", self.base_url))
            })?;
            path.pop_if_empty().push("api").extend(segments);
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);
        Self::decode(self.client.get(url).send().await?).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        request: &RouteRequest,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        debug!("POST {}", url);
        // .json() sets the content type
        Self::decode(self.client.post(url).json(request).send().await?).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        let raw_text = response.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str::<Value>(&raw_text).unwrap_or(Value::String(raw_text));
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

            error!("Backend request failed with status {}: {}", status, message);
            return Err(ClientError::Api { status: status.as_u16(), message, body });
        }

        serde_json::from_str(&raw_text).map_err(|err| {
            error!("Could not decode backend response: {}", err);
            ClientError::Decode { body: raw_text, message: err.to_string() }
        })
    }
}

#[async_trait]
impl RouteApi for HttpRouteApi {
    async fn chains(&self) -> Result<Vec<Chain>, ClientError> {
        let response: ChainsResponse = self.get(&["chains"]).await?;
        info!("Fetched {} chains", response.chains.len());
        Ok(response.chains)
    }

    async fn tokens(&self, chain: &ChainId) -> Result<Vec<Token>, ClientError> {
        let response: TokensResponse = self.get(&["tokens", chain.as_str()]).await?;
        info!("Fetched {} tokens for chain {}", response.tokens.len(), chain);
        Ok(response.tokens)
    }

    async fn routes(&self, request: &RouteRequest) -> Result<Vec<RouteResult>, ClientError> {
        let response: RoutesResponse = self.post(&["routes"], request).await?;
        info!(
            "Fetched {} routes from chain {} to chain {}",
            response.routes.len(),
            request.from_chain,
            request.to_chain
        );
        Ok(response.routes)
    }

    async fn best_route(&self, request: &RouteRequest) -> Result<RouteResult, ClientError> {
        let route: RouteResult = self.post(&["routes", "best"], request).await?;
        info!(
            "Best route from chain {} to chain {}: {}",
            request.from_chain, request.to_chain, route.protocol
        );
        Ok(route)
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.get(&["health"]).await
    }
}
