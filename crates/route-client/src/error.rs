use serde_json::Value;
use thiserror::Error;

use crate::amount::AmountError;
use crate::types::ChainId;

/// Terminal failure of a backend call. Cloneable so one coalesced call can fan out to every
/// waiting caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    #[error("{message} (status {status})")]
    Api { status: u16, message: String, body: Value },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Could not decode response: {message}")]
    Decode { body: String, message: String },

    #[error("Background request stopped before completing: {0}")]
    Aborted(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// Problems found before a search is sent.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),

    #[error("Token {symbol} is not available on chain {chain}")]
    UnsupportedTokenOnChain { symbol: String, chain: ChainId },

    #[error("Unknown token {0}")]
    UnknownToken(String),
}
