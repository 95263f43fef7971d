use std::fmt::{self, Write};

use crate::detail::{DetailSection, MetricLine, RouteDetail};
use crate::list::RouteSummary;

const NO_ROUTES: &str = "No routes found for this transfer.";

/// Numbered route list, one block per route.
pub fn render_list(summaries: &[RouteSummary]) -> String {
    if summaries.is_empty() {
        return format!("{}\n", NO_ROUTES);
    }

    summaries
        .iter()
        .enumerate()
        .map(|(index, summary)| format!("{}. {}", index + 1, summary))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_detail(detail: &RouteDetail) -> String {
    detail.to_string()
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.protocol)?;
        if let Some(score) = &self.score {
            write!(f, "  [{}]", score)?;
        }
        writeln!(f)?;
        writeln!(f, "   Output:   {}", self.output)?;
        writeln!(f, "   Fee:      {}", self.fee)?;
        writeln!(f, "   ETA:      {}", self.eta)?;
        writeln!(f, "   Gas cost: {}", self.gas)?;
        for reason in &self.reasons {
            writeln!(f, "   - {}", reason)?;
        }
        for warning in &self.warnings {
            writeln!(f, "   ! {}", warning)?;
        }
        Ok(())
    }
}

impl fmt::Display for RouteDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Route Details: {}", self.protocol)?;

        let groups = [
            ("Route Information", &self.route_information),
            ("Additional Metrics", &self.additional_metrics),
        ];
        for (heading, sections) in groups {
            if sections.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{}", heading)?;
            for section in sections {
                write!(f, "{}", section)?;
            }
        }

        if !self.raw.is_empty() {
            writeln!(f)?;
            writeln!(f, "Raw API Response")?;
            writeln!(f, "{}", self.raw)?;
        }
        Ok(())
    }
}

impl fmt::Display for DetailSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailSection::Slippage(value) => writeln!(f, "  {}: {}", self.title(), value),
            DetailSection::PriceImpact { value, high } => {
                write!(f, "  {}: {}", self.title(), value)?;
                if *high {
                    write!(f, " (high)")?;
                }
                writeln!(f)
            }
            DetailSection::Steps(steps) => {
                writeln!(f, "  {}", self.title())?;
                for (index, step) in steps.iter().enumerate() {
                    write!(f, "    {}. {}", index + 1, step.label)?;
                    if let Some(path) = &step.path {
                        write!(f, " ({})", path)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            DetailSection::Pools(pools) => {
                writeln!(f, "  {}", self.title())?;
                for pool in pools {
                    write!(f, "    {}", pool.name)?;
                    if let Some(address) = &pool.address {
                        write!(f, " ({})", address)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            DetailSection::Contracts(contracts) => {
                writeln!(f, "  {}", self.title())?;
                for (label, address) in contracts {
                    writeln!(f, "    {}: {}", label, address)?;
                }
                Ok(())
            }
            DetailSection::GasBreakdown(lines)
            | DetailSection::Security(lines)
            | DetailSection::Performance(lines)
            | DetailSection::Liquidity(lines) => {
                writeln!(f, "  {}", self.title())?;
                write_metrics(f, lines)
            }
        }
    }
}

fn write_metrics(f: &mut impl Write, lines: &[MetricLine]) -> fmt::Result {
    for line in lines {
        let marker = if line.warning { "! " } else { "" };
        writeln!(f, "    {}{}: {}", marker, line.label, line.value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use route_client::RouteResult;
    use serde_json::json;

    use super::*;
    use crate::tests::usdc;
    use crate::{describe, summarize_all};

    #[test]
    fn test_render_list() {
        let routes: Vec<RouteResult> = serde_json::from_value(json!([
            {
                "protocol": "Stargate",
                "estimatedOutput": "99850000",
                "estimatedFee": "150000",
                "estimatedTime": 120,
                "score": 0.87,
                "reasons": ["Lowest fee"]
            },
            {"protocol": "Hop", "estimatedOutput": "99700000", "estimatedFee": "300000"}
        ]))
        .unwrap();

        let rendered = render_list(&summarize_all(&routes, &usdc()));
        assert_eq!(
            rendered,
            concat!(
                "1. Stargate  [87.0%]\n",
                "   Output:   99.85 USDC\n",
                "   Fee:      0.15 USDC\n",
                "   ETA:      2 min\n",
                "   Gas cost: Auto\n",
                "   - Lowest fee\n",
                "\n",
                "2. Hop\n",
                "   Output:   99.70 USDC\n",
                "   Fee:      0.30 USDC\n",
                "   ETA:      unknown\n",
                "   Gas cost: Auto\n",
                "   ! Estimated time not reported\n",
            )
        );
        assert_eq!(render_list(&[]), "No routes found for this transfer.\n");
    }

    #[test]
    fn test_group_headings_only_with_content() {
        let route: RouteResult = serde_json::from_value(json!({
            "protocol": "Across",
            "route": {"priceImpact": 0.2},
            "rawResponse": {"id": 1}
        }))
        .unwrap();

        let rendered = render_detail(&describe(&route, &usdc()));
        assert_eq!(
            rendered,
            concat!(
                "Route Details: Across\n",
                "\n",
                "Route Information\n",
                "  Price Impact: 0.2%\n",
                "\n",
                "Raw API Response\n",
                "{\n  \"id\": 1\n}\n",
            )
        );
        assert!(!rendered.contains("Additional Metrics"));
    }

    #[test]
    fn test_render_detail_sections() {
        let route: RouteResult = serde_json::from_value(json!({
            "protocol": "Stargate",
            "route": {
                "steps": [{"type": "bridge", "from": "Ethereum", "to": "Polygon"}],
                "priceImpact": 2.5
            },
            "liquidityAnalysis": {"potentialDelay": "Up to 10 min"}
        }))
        .unwrap();

        let rendered = render_detail(&describe(&route, &usdc()));
        assert!(rendered.contains("  Transaction Steps\n    1. bridge (Ethereum → Polygon)\n"));
        assert!(rendered.contains("  Price Impact: 2.5% (high)\n"));
        assert!(rendered.contains(concat!(
            "Additional Metrics\n",
            "  Liquidity Analysis\n",
            "    ! Potential Delay: Up to 10 min\n"
        )));
    }
}
