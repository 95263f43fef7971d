use std::collections::BTreeMap;

use derive_more::{Display, From, Into};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::lenient;

/// Numeric chain id kept in its decimal string form, e.g. `"137"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChainId {
    fn from(id: &str) -> Self {
        ChainId(id.to_string())
    }
}

// Numbers arrive as `Value` so exact digits survive arbitrary-precision parsing
impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(id) => Ok(ChainId(id)),
            Value::Number(id) if id.is_u64() || id.is_i64() => Ok(ChainId(id.to_string())),
            other => Err(de::Error::custom(format!(
                "expected a chain id as a string or an integer, got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub id: ChainId,
    #[serde(default, alias = "name")]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub decimals: u8,
    #[serde(default, alias = "addressByChain")]
    pub addresses: BTreeMap<ChainId, String>,
}

impl Token {
    pub fn address_on(&self, chain: &ChainId) -> Option<&str> {
        self.addresses.get(chain).map(String::as_str).filter(|address| !address.is_empty())
    }
}

impl From<&config::ChainConfig> for Chain {
    fn from(chain: &config::ChainConfig) -> Self {
        Chain { id: ChainId::from(chain.id.as_str()), label: chain.label.clone() }
    }
}

impl From<&config::TokenConfig> for Token {
    fn from(token: &config::TokenConfig) -> Self {
        Token {
            symbol: token.symbol.clone(),
            decimals: token.decimals,
            addresses: token
                .addresses
                .iter()
                .map(|(chain, address)| (ChainId::from(chain.as_str()), address.clone()))
                .collect(),
        }
    }
}

// POST /api/routes, POST /api/routes/best
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub from_chain: ChainId,
    pub to_chain: ChainId,
    // Token address on `from_chain`
    #[serde(rename = "token")]
    pub token_address: String,
    // Unsigned integer, no decimal point
    #[serde(rename = "amount")]
    pub amount_base_units: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
}

/// One protocol's quote. Every section other than `protocol` may be missing depending on the
/// bridge that produced it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct RouteResult {
    #[serde(default, deserialize_with = "lenient::label")]
    pub protocol: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub estimated_output: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub estimated_fee: Option<String>,
    // Seconds
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::section",
        skip_serializing_if = "Option::is_none"
    )]
    pub reasons: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient::section",
        skip_serializing_if = "Option::is_none"
    )]
    pub route: Option<ProtocolDetail>,
    #[serde(
        default,
        deserialize_with = "lenient::section",
        skip_serializing_if = "Option::is_none"
    )]
    pub security_metrics: Option<SecurityMetrics>,
    #[serde(
        default,
        deserialize_with = "lenient::section",
        skip_serializing_if = "Option::is_none"
    )]
    pub performance: Option<Performance>,
    #[serde(
        default,
        deserialize_with = "lenient::section",
        skip_serializing_if = "Option::is_none"
    )]
    pub liquidity_analysis: Option<LiquidityAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    /// The quote exactly as the backend sent it, `Null` for routes built locally.
    #[serde(skip)]
    pub received: Value,
}

impl<'de> Deserialize<'de> for RouteResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let received = Value::deserialize(deserializer)?;
        let mut route = RouteResult::deserialize(&received).map_err(de::Error::custom)?;
        route.received = received;
        Ok(route)
    }
}

impl Serialize for RouteResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RouteResult::serialize(self, serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolDetail {
    #[serde(
        default,
        deserialize_with = "lenient::section",
        skip_serializing_if = "Option::is_none"
    )]
    pub steps: Option<Vec<RouteStep>>,
    #[serde(
        default,
        deserialize_with = "lenient::section",
        skip_serializing_if = "Option::is_none"
    )]
    pub pools: Option<Vec<Pool>>,
    #[serde(
        default,
        deserialize_with = "lenient::section",
        skip_serializing_if = "Option::is_none"
    )]
    pub contracts: Option<BTreeMap<String, String>>,
    // Percent
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub slippage: Option<f64>,
    // Percent
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub price_impact: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::section",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimate: Option<Estimate>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteStep {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pool {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    #[serde(
        default,
        deserialize_with = "lenient::section",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_costs: Option<GasCosts>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// Decimal strings, in USD
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GasCosts {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub approval: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub usd: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityMetrics {
    // USD
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub tvl: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub audit_status: Option<String>,
    // Percent
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub uptime: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    // Seconds
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub avg_completion_time: Option<f64>,
    // Percent
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityAnalysis {
    // Base units of the searched token
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub available: Option<String>,
    // Percent
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub utilization_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub potential_delay: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// GET /api/health
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_request_omits_absent_addresses() {
        let request = RouteRequest {
            from_chain: ChainId::from("1"),
            to_chain: ChainId::from("137"),
            token_address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
            amount_base_units: "100000000".to_string(),
            from_address: None,
            to_address: Some("0x00000ebe3fa7cb71aE471547C836E0cE0AE758c2".to_string()),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "fromChain": "1",
                "toChain": "137",
                "token": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                "amount": "100000000",
                "toAddress": "0x00000ebe3fa7cb71aE471547C836E0cE0AE758c2"
            })
        );
    }

    #[test]
    fn test_route_result_tolerates_sparse_payload() {
        let result: RouteResult = serde_json::from_str(r#"{"protocol": "Stargate"}"#).unwrap();

        assert_eq!(result.protocol, "Stargate");
        assert_eq!(result.estimated_output, None);
        assert_eq!(result.route, None);
        assert!(result.extra.is_empty());
    }

    #[test]
    fn test_route_result_tolerates_mixed_shapes() {
        let result: RouteResult = serde_json::from_str(
            r#"{
                "protocol": "Across",
                "estimatedOutput": 99850000,
                "estimatedFee": "150000",
                "estimatedTime": "120",
                "score": 0.87,
                "route": {
                    "steps": [{"type": "bridge", "from": "Ethereum", "to": "Polygon"}],
                    "pools": "unavailable",
                    "priceImpact": "1.4",
                    "estimate": {"gasCosts": {"total": 3.21}},
                    "bridgeId": 7
                },
                "securityMetrics": null,
                "performance": [],
                "quoteId": "q-1"
            }"#,
        )
        .unwrap();

        assert_eq!(result.estimated_output.as_deref(), Some("99850000"));
        assert_eq!(result.estimated_time, Some(120.0));
        let route = result.route.as_ref().unwrap();
        assert_eq!(route.steps.as_ref().unwrap()[0].kind.as_deref(), Some("bridge"));
        assert_eq!(route.pools, None);
        assert_eq!(route.price_impact, Some(1.4));
        assert_eq!(
            route.estimate.as_ref().unwrap().gas_costs.as_ref().unwrap().total.as_deref(),
            Some("3.21")
        );
        assert_eq!(route.extra.get("bridgeId"), Some(&serde_json::json!(7)));
        assert_eq!(result.security_metrics, None);
        assert_eq!(result.performance, None);
        assert_eq!(result.extra.get("quoteId"), Some(&serde_json::json!("q-1")));
    }

    #[test]
    fn test_large_integer_amounts_keep_every_digit() {
        let result: RouteResult = serde_json::from_str(
            r#"{
                "protocol": "Stargate",
                "estimatedOutput": 100000000000000000000,
                "estimatedFee": 2500000000000000000,
                "liquidityAnalysis": {"available": 123456789012345678901234567890}
            }"#,
        )
        .unwrap();

        assert_eq!(result.estimated_output.as_deref(), Some("100000000000000000000"));
        assert_eq!(result.estimated_fee.as_deref(), Some("2500000000000000000"));
        assert_eq!(
            result.liquidity_analysis.unwrap().available.as_deref(),
            Some("123456789012345678901234567890")
        );
    }

    #[test]
    fn test_route_result_keeps_received_payload() {
        let payload = serde_json::json!({
            "protocol": 42,
            "score": "high",
            "route": {"pools": "unavailable", "priceImpact": {"bps": 12}}
        });
        let result: RouteResult = serde_json::from_value(payload.clone()).unwrap();

        assert_eq!(result.protocol, "42");
        assert_eq!(result.score, None);
        assert_eq!(result.route.as_ref().unwrap().pools, None);
        assert_eq!(result.route.as_ref().unwrap().price_impact, None);
        assert_eq!(result.received, payload);
        assert!(serde_json::to_value(&result).unwrap().get("received").is_none());
    }

    #[test]
    fn test_token_accepts_numeric_chain_keys_and_alias() {
        let token: Token = serde_json::from_str(
            r#"{"symbol": "USDC", "decimals": 6, "addressByChain": {"1": "0xA0b8", "137": ""}}"#,
        )
        .unwrap();

        assert_eq!(token.address_on(&ChainId::from("1")), Some("0xA0b8"));
        assert_eq!(token.address_on(&ChainId::from("137")), None);

        let chain: Chain = serde_json::from_str(r#"{"id": 42161, "name": "Arbitrum"}"#).unwrap();
        assert_eq!(chain.id, ChainId::from("42161"));
        assert_eq!(chain.label, "Arbitrum");

        assert!(serde_json::from_str::<Chain>(r#"{"id": 1.5}"#).is_err());
    }
}
