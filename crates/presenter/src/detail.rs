use log::warn;
use route_client::{
    format_address, to_human_units, GasCosts, LiquidityAnalysis, Performance, ProtocolDetail,
    RouteResult, SecurityMetrics,
};
use serde_json::Value;

use crate::{percent, round_minutes, DisplayContext};

const HIGH_PRICE_IMPACT_PERCENT: f64 = 1.0;

pub fn is_high_price_impact(price_impact: f64) -> bool {
    price_impact > HIGH_PRICE_IMPACT_PERCENT
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLine {
    pub label: String,
    // "Ethereum → Polygon", only when both ends are known
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolLine {
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLine {
    pub label: &'static str,
    pub value: String,
    pub warning: bool,
}

impl MetricLine {
    fn new(label: &'static str, value: String) -> Self {
        MetricLine { label, value, warning: false }
    }

    fn warning(label: &'static str, value: String) -> Self {
        MetricLine { label, value, warning: true }
    }
}

/// One independently optional part of the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailSection {
    Steps(Vec<StepLine>),
    Pools(Vec<PoolLine>),
    Contracts(Vec<(String, String)>),
    Slippage(String),
    PriceImpact { value: String, high: bool },
    GasBreakdown(Vec<MetricLine>),
    Security(Vec<MetricLine>),
    Performance(Vec<MetricLine>),
    Liquidity(Vec<MetricLine>),
}

impl DetailSection {
    pub fn title(&self) -> &'static str {
        match self {
            DetailSection::Steps(_) => "Transaction Steps",
            DetailSection::Pools(_) => "Liquidity Pools",
            DetailSection::Contracts(_) => "Smart Contracts",
            DetailSection::Slippage(_) => "Slippage Tolerance",
            DetailSection::PriceImpact { .. } => "Price Impact",
            DetailSection::GasBreakdown(_) => "Gas Breakdown",
            DetailSection::Security(_) => "Security Information",
            DetailSection::Performance(_) => "Historical Performance",
            DetailSection::Liquidity(_) => "Liquidity Analysis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDetail {
    pub protocol: String,
    pub route_information: Vec<DetailSection>,
    pub additional_metrics: Vec<DetailSection>,
    // Pretty-printed JSON
    pub raw: String,
}

pub fn describe(route: &RouteResult, context: &DisplayContext) -> RouteDetail {
    let route_information = route.route.as_ref().map(protocol_sections).unwrap_or_default();

    let gas = route
        .route
        .as_ref()
        .and_then(|detail| detail.estimate.as_ref())
        .and_then(|estimate| estimate.gas_costs.as_ref())
        .and_then(gas_breakdown);

    let additional_metrics = [
        gas,
        route.security_metrics.as_ref().and_then(security),
        route.performance.as_ref().and_then(performance),
        route.liquidity_analysis.as_ref().and_then(|liquidity| self::liquidity(liquidity, context)),
    ]
    .into_iter()
    .flatten()
    .collect();

    RouteDetail {
        protocol: route.protocol.clone(),
        route_information,
        additional_metrics,
        raw: raw_payload(route),
    }
}

fn protocol_sections(detail: &ProtocolDetail) -> Vec<DetailSection> {
    let mut sections = Vec::new();

    if let Some(steps) = detail.steps.as_ref().filter(|steps| !steps.is_empty()) {
        let lines = steps
            .iter()
            .map(|step| StepLine {
                label: [step.action.as_deref(), step.kind.as_deref()]
                    .into_iter()
                    .flatten()
                    .find(|label| !label.is_empty())
                    .unwrap_or("Transfer")
                    .to_string(),
                path: match (non_empty(&step.from), non_empty(&step.to)) {
                    (Some(from), Some(to)) => Some(format!("{} → {}", from, to)),
                    _ => None,
                },
            })
            .collect();
        sections.push(DetailSection::Steps(lines));
    }

    if let Some(pools) = detail.pools.as_ref().filter(|pools| !pools.is_empty()) {
        let lines = pools
            .iter()
            .enumerate()
            .map(|(index, pool)| PoolLine {
                name: non_empty(&pool.name)
                    .map_or_else(|| format!("Pool {}", index + 1), str::to_string),
                address: non_empty(&pool.address).map(|address| format_address(Some(address))),
            })
            .collect();
        sections.push(DetailSection::Pools(lines));
    }

    if let Some(contracts) = detail.contracts.as_ref().filter(|contracts| !contracts.is_empty()) {
        let lines = contracts
            .iter()
            .map(|(label, address)| (label.clone(), format_address(Some(address))))
            .collect();
        sections.push(DetailSection::Contracts(lines));
    }

    if let Some(slippage) = detail.slippage {
        sections.push(DetailSection::Slippage(percent(slippage)));
    }

    if let Some(price_impact) = detail.price_impact {
        sections.push(DetailSection::PriceImpact {
            value: percent(price_impact),
            high: is_high_price_impact(price_impact),
        });
    }

    sections
}

fn gas_breakdown(gas: &GasCosts) -> Option<DetailSection> {
    let lines: Vec<MetricLine> = [
        ("Approval Transaction", &gas.approval),
        ("Bridge Transaction", &gas.bridge),
        ("Destination Chain", &gas.destination),
        ("Total Gas Cost", &gas.total),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        non_empty(value).map(|value| MetricLine::new(label, format!("${}", value)))
    })
    .collect();

    (!lines.is_empty()).then_some(DetailSection::GasBreakdown(lines))
}

fn security(metrics: &SecurityMetrics) -> Option<DetailSection> {
    let mut lines = Vec::new();
    if let Some(tvl) = metrics.tvl.filter(|tvl| *tvl != 0.0) {
        lines.push(MetricLine::new("Total Value Locked", format!("${:.2}M", tvl / 1_000_000.0)));
    }
    if let Some(audit_status) = non_empty(&metrics.audit_status) {
        lines.push(MetricLine::new("Audit Status", audit_status.to_string()));
    }
    if let Some(uptime) = metrics.uptime {
        lines.push(MetricLine::new("Uptime", percent(uptime)));
    }
    (!lines.is_empty()).then_some(DetailSection::Security(lines))
}

fn performance(performance: &Performance) -> Option<DetailSection> {
    let mut lines = Vec::new();
    if let Some(seconds) = performance.avg_completion_time.filter(|seconds| *seconds != 0.0) {
        let minutes = format!("{} min", round_minutes(seconds));
        lines.push(MetricLine::new("Avg. Completion Time", minutes));
    }
    if let Some(success_rate) = performance.success_rate {
        lines.push(MetricLine::new("Success Rate", percent(success_rate)));
    }
    (!lines.is_empty()).then_some(DetailSection::Performance(lines))
}

fn liquidity(liquidity: &LiquidityAnalysis, context: &DisplayContext) -> Option<DetailSection> {
    let mut lines = Vec::new();
    if let Some(available) = non_empty(&liquidity.available) {
        let human = to_human_units(available, context.decimals, context.detail_decimals);
        lines.push(MetricLine::new("Available Liquidity", format!("{} {}", human, context.symbol)));
    }
    if let Some(utilization_rate) = liquidity.utilization_rate {
        lines.push(MetricLine::new("Pool Utilization", percent(utilization_rate)));
    }
    if let Some(delay) = non_empty(&liquidity.potential_delay) {
        lines.push(MetricLine::warning("Potential Delay", delay.to_string()));
    }
    (!lines.is_empty()).then_some(DetailSection::Liquidity(lines))
}

// rawResponse, else the protocol detail, else the whole result, as the backend sent them
fn raw_payload(route: &RouteResult) -> String {
    let received = &route.received;
    let payload = match (&route.raw_response, received.get("route")) {
        (Some(raw), _) if is_truthy(raw) => Ok(raw.clone()),
        (_, Some(detail)) if is_truthy(detail) => Ok(detail.clone()),
        _ if !received.is_null() => Ok(received.clone()),
        _ => match &route.route {
            Some(detail) => serde_json::to_value(detail),
            None => serde_json::to_value(route),
        },
    };

    match payload.and_then(|payload| serde_json::to_string_pretty(&payload)) {
        Ok(text) => text,
        Err(err) => {
            warn!("Could not serialize raw payload for {}: {}", route.protocol, err);
            String::new()
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tests::usdc;

    fn full_route() -> RouteResult {
        serde_json::from_value(json!({
            "protocol": "Stargate",
            "estimatedOutput": "99850000",
            "estimatedFee": "150000",
            "estimatedTime": 120,
            "route": {
                "steps": [
                    {"action": "Approve"},
                    {"type": "bridge", "from": "Ethereum", "to": "Polygon"},
                    {"from": "Polygon"}
                ],
                "pools": [
                    {"name": "USDC Pool", "address": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"},
                    {}
                ],
                "contracts": {"router": "0x8731d54E9D02c286767d56ac03e8037C07e01e98"},
                "slippage": 0.5,
                "priceImpact": 1.4,
                "estimate": {"gasCosts": {"approval": "0.50", "bridge": "", "total": "3.21"}}
            },
            "securityMetrics": {"tvl": 412500000, "auditStatus": "Audited", "uptime": 99.9},
            "performance": {"avgCompletionTime": 150, "successRate": 99.5},
            "liquidityAnalysis": {
                "available": "5000000000000",
                "utilizationRate": 42,
                "potentialDelay": "Up to 10 min"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_high_price_impact_threshold() {
        assert!(!is_high_price_impact(0.99));
        assert!(!is_high_price_impact(1.0));
        assert!(is_high_price_impact(1.01));
    }

    #[test]
    fn test_route_information_sections() {
        let detail = describe(&full_route(), &usdc());

        assert_eq!(
            detail.route_information,
            vec![
                DetailSection::Steps(vec![
                    StepLine { label: "Approve".to_string(), path: None },
                    StepLine {
                        label: "bridge".to_string(),
                        path: Some("Ethereum → Polygon".to_string()),
                    },
                    StepLine { label: "Transfer".to_string(), path: None },
                ]),
                DetailSection::Pools(vec![
                    PoolLine {
                        name: "USDC Pool".to_string(),
                        address: Some("0xA0b8...eB48".to_string()),
                    },
                    PoolLine { name: "Pool 2".to_string(), address: None },
                ]),
                DetailSection::Contracts(vec![("router".to_string(), "0x8731...1e98".to_string())]),
                DetailSection::Slippage("0.5%".to_string()),
                DetailSection::PriceImpact { value: "1.4%".to_string(), high: true },
            ]
        );
    }

    #[test]
    fn test_additional_metrics_sections() {
        let detail = describe(&full_route(), &usdc());

        assert_eq!(
            detail.additional_metrics,
            vec![
                DetailSection::GasBreakdown(vec![
                    MetricLine::new("Approval Transaction", "$0.50".to_string()),
                    MetricLine::new("Total Gas Cost", "$3.21".to_string()),
                ]),
                DetailSection::Security(vec![
                    MetricLine::new("Total Value Locked", "$412.50M".to_string()),
                    MetricLine::new("Audit Status", "Audited".to_string()),
                    MetricLine::new("Uptime", "99.9%".to_string()),
                ]),
                DetailSection::Performance(vec![
                    MetricLine::new("Avg. Completion Time", "3 min".to_string()),
                    MetricLine::new("Success Rate", "99.5%".to_string()),
                ]),
                DetailSection::Liquidity(vec![
                    MetricLine::new("Available Liquidity", "5000000.000000 USDC".to_string()),
                    MetricLine::new("Pool Utilization", "42%".to_string()),
                    MetricLine::warning("Potential Delay", "Up to 10 min".to_string()),
                ]),
            ]
        );
    }

    #[test]
    fn test_absent_sections_render_nothing() {
        let route: RouteResult = serde_json::from_value(json!({
            "protocol": "Hop",
            "route": {
                "steps": [],
                "pools": [],
                "contracts": {},
                "estimate": {"gasCosts": {"usd": "1.20"}}
            },
            "securityMetrics": {},
            "performance": {"avgCompletionTime": 0}
        }))
        .unwrap();

        let detail = describe(&route, &usdc());
        assert!(detail.route_information.is_empty());
        assert!(detail.additional_metrics.is_empty());

        let bare: RouteResult = serde_json::from_value(json!({"protocol": "Hop"})).unwrap();
        let detail = describe(&bare, &usdc());
        assert!(detail.route_information.is_empty());
        assert!(detail.additional_metrics.is_empty());
    }

    fn raw_of(route: &RouteResult) -> Value {
        serde_json::from_str(&describe(route, &usdc()).raw).unwrap()
    }

    #[test]
    fn test_raw_payload_fallback_order() {
        let route: RouteResult = serde_json::from_value(json!({
            "protocol": "Stargate",
            "route": {"slippage": 0.5},
            "rawResponse": {"bridge": "stargate", "quote": 1}
        }))
        .unwrap();
        assert_eq!(raw_of(&route), json!({"bridge": "stargate", "quote": 1}));

        let route: RouteResult = serde_json::from_value(json!({
            "protocol": "Stargate",
            "route": {"slippage": 0.5},
            "rawResponse": ""
        }))
        .unwrap();
        assert_eq!(raw_of(&route), json!({"slippage": 0.5}));

        let bare = json!({"protocol": "Stargate", "estimatedOutput": "99850000", "route": null});
        let route: RouteResult = serde_json::from_value(bare.clone()).unwrap();
        assert_eq!(raw_of(&route), bare);
    }

    #[test]
    fn test_raw_payload_shows_fields_the_view_could_not_read() {
        let payload = json!({
            "protocol": "Stargate",
            "score": "high",
            "route": {"pools": "unavailable", "priceImpact": {"bps": 12}}
        });
        let route: RouteResult = serde_json::from_value(payload.clone()).unwrap();
        assert_eq!(raw_of(&route), payload["route"]);

        let payload = json!({"protocol": "Stargate", "score": "high"});
        let route: RouteResult = serde_json::from_value(payload.clone()).unwrap();
        assert_eq!(raw_of(&route), payload);
    }

    #[test]
    fn test_raw_payload_of_locally_built_route() {
        let route = RouteResult {
            protocol: "Hop".to_string(),
            route: Some(ProtocolDetail { slippage: Some(0.5), ..Default::default() }),
            ..Default::default()
        };
        assert_eq!(raw_of(&route), json!({"slippage": 0.5}));

        let route = RouteResult { protocol: "Hop".to_string(), ..Default::default() };
        assert_eq!(raw_of(&route), json!({"protocol": "Hop"}));
    }

    #[test]
    fn test_describe_is_idempotent() {
        let route = full_route();
        let before = route.clone();

        assert_eq!(describe(&route, &usdc()), describe(&route, &usdc()));
        assert_eq!(route, before);
    }
}
