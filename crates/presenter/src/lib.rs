//! Display-ready views of backend route results.
//!
//! Every view is derived from a borrowed [`RouteResult`](route_client::RouteResult) and never
//! modifies it, so presenting the same result twice yields identical output.

use route_client::Token;

pub use detail::{
    describe, is_high_price_impact, DetailSection, MetricLine, PoolLine, RouteDetail, StepLine,
};
pub use list::{summarize, summarize_all, DataQualityWarning, RouteSummary};
pub use render::{render_detail, render_list};

pub mod detail;
pub mod list;
pub mod render;

pub const DEFAULT_LIST_DECIMALS: u8 = 2;
pub const DEFAULT_DETAIL_DECIMALS: u8 = 6;

/// The searched token and how many fractional digits each view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayContext {
    pub symbol: String,
    pub decimals: u8,
    pub list_decimals: u8,
    pub detail_decimals: u8,
}

impl DisplayContext {
    pub fn new(token: &Token) -> Self {
        DisplayContext {
            symbol: token.symbol.clone(),
            decimals: token.decimals,
            list_decimals: DEFAULT_LIST_DECIMALS,
            detail_decimals: DEFAULT_DETAIL_DECIMALS,
        }
    }

    pub fn with_precision(mut self, list_decimals: u8, detail_decimals: u8) -> Self {
        self.list_decimals = list_decimals;
        self.detail_decimals = detail_decimals;
        self
    }
}

// JavaScript-style Math.round, halves round up
pub(crate) fn round_minutes(seconds: f64) -> i64 {
    (seconds / 60.0 + 0.5).floor() as i64
}

pub(crate) fn percent(value: f64) -> String {
    format!("{}%", value)
}
