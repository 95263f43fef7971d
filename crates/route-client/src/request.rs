use log::debug;

use crate::amount::to_base_units;
use crate::error::RequestError;
use crate::form::FormState;
use crate::types::{Chain, ChainId, RouteRequest, Token};

/// Static chain and token reference tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenRegistry {
    chains: Vec<Chain>,
    tokens: Vec<Token>,
}

impl TokenRegistry {
    pub fn from_config(config: &config::Config) -> Self {
        TokenRegistry {
            chains: config.chains.iter().map(Chain::from).collect(),
            tokens: config.tokens.iter().map(Token::from).collect(),
        }
    }

    pub fn token(&self, symbol: &str) -> Option<&Token> {
        self.tokens.iter().find(|token| token.symbol == symbol)
    }

    pub fn chain_label<'a>(&'a self, id: &'a ChainId) -> &'a str {
        self.chains
            .iter()
            .find(|chain| &chain.id == id)
            .map_or(id.as_str(), |chain| chain.label.as_str())
    }
}

impl RouteRequest {
    /// Validates the form and builds the request the backend expects.
    pub fn build(form: &FormState, registry: &TokenRegistry) -> Result<RouteRequest, RequestError> {
        let token = registry
            .token(&form.token_symbol)
            .ok_or_else(|| RequestError::UnknownToken(form.token_symbol.clone()))?;

        let token_address = token.address_on(&form.from_chain).ok_or_else(|| {
            RequestError::UnsupportedTokenOnChain {
                symbol: token.symbol.clone(),
                chain: form.from_chain.clone(),
            }
        })?;

        let amount_base_units = to_base_units(&form.amount, token.decimals)?;
        debug!("{} {} is {} base units", form.amount, token.symbol, amount_base_units);

        Ok(RouteRequest {
            from_chain: form.from_chain.clone(),
            to_chain: form.to_chain.clone(),
            token_address: token_address.to_string(),
            amount_base_units,
            from_address: non_empty(&form.from_address),
            to_address: non_empty(&form.to_address),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
