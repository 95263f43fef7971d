use crate::types::ChainId;

pub const DEFAULT_TOKEN: &str = "USDC";
pub const DEFAULT_AMOUNT: &str = "100";
pub const DEFAULT_FROM_CHAIN: &str = "1";
pub const DEFAULT_TO_CHAIN: &str = "137";

/// The user's search inputs, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub token_symbol: String,
    // Human decimal amount
    pub amount: String,
    pub from_chain: ChainId,
    pub to_chain: ChainId,
    // Empty when not given
    pub from_address: String,
    pub to_address: String,
}

impl Default for FormState {
    fn default() -> Self {
        FormState {
            token_symbol: DEFAULT_TOKEN.to_string(),
            amount: DEFAULT_AMOUNT.to_string(),
            from_chain: ChainId::from(DEFAULT_FROM_CHAIN),
            to_chain: ChainId::from(DEFAULT_TO_CHAIN),
            from_address: String::new(),
            to_address: String::new(),
        }
    }
}

impl FormState {
    pub fn swap_chains(&mut self) {
        std::mem::swap(&mut self.from_chain, &mut self.to_chain);
    }
}
