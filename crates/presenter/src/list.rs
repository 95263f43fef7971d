use std::fmt;

use log::debug;
use route_client::{to_human_units, RouteResult};

use crate::{round_minutes, DisplayContext};

const AUTO_GAS: &str = "Auto";
const UNKNOWN_ETA: &str = "unknown";

/// A field the list view had to fill in because the backend left it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataQualityWarning {
    MissingOutput,
    MissingFee,
    MissingTime,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::MissingOutput => write!(f, "Estimated output not reported"),
            DataQualityWarning::MissingFee => write!(f, "Estimated fee not reported"),
            DataQualityWarning::MissingTime => write!(f, "Estimated time not reported"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub protocol: String,
    // e.g. "99.85 USDC"
    pub output: String,
    pub fee: String,
    // e.g. "2 min"
    pub eta: String,
    // e.g. "87.0%"
    pub score: Option<String>,
    pub gas: String,
    pub reasons: Vec<String>,
    pub warnings: Vec<DataQualityWarning>,
}

pub fn summarize(route: &RouteResult, context: &DisplayContext) -> RouteSummary {
    let mut warnings = Vec::new();

    let mut amount = |value: Option<&str>, missing: DataQualityWarning| {
        let value = value.filter(|value| !value.is_empty());
        if value.is_none() {
            warnings.push(missing);
        }
        let human =
            to_human_units(value.unwrap_or_default(), context.decimals, context.list_decimals);
        format!("{} {}", human, context.symbol)
    };

    let output = amount(route.estimated_output.as_deref(), DataQualityWarning::MissingOutput);
    let fee = amount(route.estimated_fee.as_deref(), DataQualityWarning::MissingFee);

    let eta = match route.estimated_time {
        Some(seconds) => format!("{} min", round_minutes(seconds)),
        None => {
            warnings.push(DataQualityWarning::MissingTime);
            UNKNOWN_ETA.to_string()
        }
    };

    let gas_costs = route
        .route
        .as_ref()
        .and_then(|detail| detail.estimate.as_ref())
        .and_then(|estimate| estimate.gas_costs.as_ref());
    let gas = gas_costs
        .and_then(|gas| {
            [gas.total.as_deref(), gas.usd.as_deref()]
                .into_iter()
                .flatten()
                .find(|value| !value.is_empty())
        })
        .unwrap_or(AUTO_GAS)
        .to_string();

    if !warnings.is_empty() {
        debug!("Route from {} is missing fields: {:?}", route.protocol, warnings);
    }

    RouteSummary {
        protocol: route.protocol.clone(),
        output,
        fee,
        eta,
        score: route.score.map(|score| format!("{:.1}%", score * 100.0)),
        gas,
        reasons: route.reasons.clone().unwrap_or_default(),
        warnings,
    }
}

/// Summaries in exactly the order the backend ranked the routes.
pub fn summarize_all(routes: &[RouteResult], context: &DisplayContext) -> Vec<RouteSummary> {
    routes.iter().map(|route| summarize(route, context)).collect()
}
