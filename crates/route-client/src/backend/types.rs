use serde::Deserialize;

use crate::lenient;
use crate::types::{Chain, RouteResult, Token};

#[derive(Debug, Deserialize)]
pub(crate) struct ChainsResponse {
    #[serde(deserialize_with = "lenient::entries")]
    pub chains: Vec<Chain>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokensResponse {
    #[serde(deserialize_with = "lenient::entries")]
    pub tokens: Vec<Token>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoutesResponse {
    #[serde(deserialize_with = "lenient::entries")]
    pub routes: Vec<RouteResult>,
}
