use crate::domain::market::{
    AnalysisResult, ExtendedAnalysis, LivePrice, MarketItem, Opportunity, OpportunityStance,
    Recommendation, RiskLevel, Source,
};
use anyhow::ensure;
use serde::{Deserialize, Serialize};

pub const OPPORTUNITY_COUNT: usize = 10;

/// Raw symbol analysis exactly as the provider is asked to emit it. Every field is
/// required by the declared schema, so none of them default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSymbolAnalysis {
    pub symbol: String,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub technical_summary: String,
    pub fundamental_summary: String,
    pub political_impact: String,
    pub historical_context: String,
    pub data_date: String,
    pub risks: Vec<String>,
    pub targets: Vec<f64>,
    pub stop_loss: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmLivePrice {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmOpportunity {
    pub name: String,
    pub symbol: String,
    pub expected_return: String,
    pub risk_level: RiskLevel,
    pub recommendation: OpportunityStance,
}

impl LlmSymbolAnalysis {
    pub fn validate_and_into_analysis(self, sources: Vec<Source>) -> anyhow::Result<ExtendedAnalysis> {
        let symbol = required_text("symbol", self.symbol)?;
        let technical_summary = required_text("technicalSummary", self.technical_summary)?;
        let fundamental_summary = required_text("fundamentalSummary", self.fundamental_summary)?;
        let political_impact = required_text("politicalImpact", self.political_impact)?;
        let historical_context = required_text("historicalContext", self.historical_context)?;
        let data_date = required_text("dataDate", self.data_date)?;

        let confidence = clamp_confidence(self.confidence)?;

        ensure!(
            self.stop_loss.is_finite(),
            "stopLoss must be a finite number (got {})",
            self.stop_loss
        );
        for target in &self.targets {
            ensure!(target.is_finite(), "targets must be finite numbers (got {target})");
        }

        let risks = self
            .risks
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(ExtendedAnalysis {
            result: AnalysisResult {
                symbol,
                recommendation: self.recommendation,
                confidence,
                technical_summary,
                fundamental_summary,
                targets: self.targets,
                stop_loss: self.stop_loss,
                risks,
                sources,
            },
            political_impact,
            historical_context,
            data_date,
        })
    }
}

impl LlmLivePrice {
    fn validate_and_into_live_price(self) -> anyhow::Result<LivePrice> {
        let name = required_text("name", self.name)?;
        let symbol = required_text("symbol", self.symbol)?;
        ensure!(
            self.price.is_finite() && self.price >= 0.0,
            "price must be a non-negative number for {symbol} (got {})",
            self.price
        );
        ensure!(
            self.change_percent.is_finite(),
            "changePercent must be finite for {symbol} (got {})",
            self.change_percent
        );

        Ok(LivePrice {
            name,
            symbol,
            price: self.price,
            change_percent: self.change_percent,
        })
    }
}

impl LlmOpportunity {
    fn validate_and_into_opportunity(self) -> anyhow::Result<Opportunity> {
        Ok(Opportunity {
            name: required_text("name", self.name)?,
            symbol: required_text("symbol", self.symbol)?,
            expected_return: required_text("expectedReturn", self.expected_return)?,
            risk_level: self.risk_level,
            recommendation: self.recommendation,
        })
    }
}

pub fn validate_live_prices(raw: Vec<LlmLivePrice>) -> anyhow::Result<Vec<MarketItem>> {
    ensure!(!raw.is_empty(), "live price list must not be empty");

    raw.into_iter()
        .enumerate()
        .map(|(idx, item)| -> anyhow::Result<MarketItem> {
            Ok(MarketItem::from_live_price(idx, item.validate_and_into_live_price()?))
        })
        .collect()
}

pub fn validate_opportunities(raw: Vec<LlmOpportunity>) -> anyhow::Result<Vec<Opportunity>> {
    ensure!(!raw.is_empty(), "opportunity list must not be empty");

    if raw.len() != OPPORTUNITY_COUNT {
        tracing::warn!(
            expected = OPPORTUNITY_COUNT,
            got = raw.len(),
            "provider returned an unexpected number of opportunities"
        );
    }

    raw.into_iter()
        .map(LlmOpportunity::validate_and_into_opportunity)
        .collect()
}

fn required_text(field: &str, value: String) -> anyhow::Result<String> {
    let value = value.trim().to_string();
    ensure!(!value.is_empty(), "{field} must be non-empty");
    Ok(value)
}

fn clamp_confidence(raw: f64) -> anyhow::Result<u8> {
    ensure!(raw.is_finite(), "confidence must be a finite number (got {raw})");
    if !(0.0..=100.0).contains(&raw) {
        tracing::warn!(confidence = raw, "provider confidence out of range; clamping to 0..=100");
    }
    Ok(raw.clamp(0.0, 100.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analysis_json() -> serde_json::Value {
        json!({
            "symbol": "فولاد",
            "recommendation": "BUY",
            "confidence": 72,
            "technicalSummary": "support held",
            "fundamentalSummary": "export margins improving",
            "politicalImpact": "talks resumed",
            "historicalContext": "similar setup in 1401",
            "dataDate": "1405/07/24 12:30",
            "risks": ["currency swing", "  "],
            "targets": [620.0, 680.0],
            "stopLoss": 540.0,
        })
    }

    #[test]
    fn accepts_complete_analysis() {
        let raw: LlmSymbolAnalysis = serde_json::from_value(analysis_json()).unwrap();
        let analysis = raw.validate_and_into_analysis(vec![]).unwrap();
        assert_eq!(analysis.result.recommendation, Recommendation::Buy);
        assert_eq!(analysis.result.confidence, 72);
        assert_eq!(analysis.result.targets, vec![620.0, 680.0]);
        // Blank risk entries are dropped.
        assert_eq!(analysis.result.risks, vec!["currency swing".to_string()]);
        assert_eq!(analysis.data_date, "1405/07/24 12:30");
    }

    #[test]
    fn every_required_field_is_enforced() {
        let required = [
            "symbol",
            "recommendation",
            "confidence",
            "technicalSummary",
            "fundamentalSummary",
            "politicalImpact",
            "historicalContext",
            "dataDate",
            "risks",
            "targets",
            "stopLoss",
        ];
        for field in required {
            let mut value = analysis_json();
            value.as_object_mut().unwrap().remove(field);
            assert!(
                serde_json::from_value::<LlmSymbolAnalysis>(value).is_err(),
                "missing {field} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_unknown_recommendation() {
        let mut value = analysis_json();
        value["recommendation"] = json!("STRONG_BUY");
        assert!(serde_json::from_value::<LlmSymbolAnalysis>(value).is_err());
    }

    #[test]
    fn clamps_out_of_range_confidence() {
        let mut value = analysis_json();
        value["confidence"] = json!(140.4);
        let raw: LlmSymbolAnalysis = serde_json::from_value(value).unwrap();
        assert_eq!(raw.validate_and_into_analysis(vec![]).unwrap().result.confidence, 100);

        let mut value = analysis_json();
        value["confidence"] = json!(-3);
        let raw: LlmSymbolAnalysis = serde_json::from_value(value).unwrap();
        assert_eq!(raw.validate_and_into_analysis(vec![]).unwrap().result.confidence, 0);
    }

    #[test]
    fn rejects_blank_narrative() {
        let mut value = analysis_json();
        value["politicalImpact"] = json!("   ");
        let raw: LlmSymbolAnalysis = serde_json::from_value(value).unwrap();
        assert!(raw.validate_and_into_analysis(vec![]).is_err());
    }

    #[test]
    fn live_prices_become_market_items_in_order() {
        let raw: Vec<LlmLivePrice> = serde_json::from_value(json!([
            {"name": "شاخص کل بورس", "symbol": "TEDPIX", "price": 2_900_000.0, "changePercent": 0.8},
            {"name": "دلار بازار آزاد", "symbol": "USD", "price": 1_050_000.0, "changePercent": -0.4},
        ]))
        .unwrap();
        let items = validate_live_prices(raw).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "0");
        assert_eq!(items[1].symbol, "USD");
        assert_eq!(items[1].category, crate::domain::market::MarketCategory::Currency);
    }

    #[test]
    fn empty_lists_are_rejected() {
        assert!(validate_live_prices(vec![]).is_err());
        assert!(validate_opportunities(vec![]).is_err());
    }

    #[test]
    fn opportunity_enums_are_strict() {
        let ok = json!({"name": "n", "symbol": "s", "expectedReturn": "12%", "riskLevel": "Low", "recommendation": "HOLD"});
        assert!(serde_json::from_value::<LlmOpportunity>(ok).is_ok());

        let bad_risk = json!({"name": "n", "symbol": "s", "expectedReturn": "12%", "riskLevel": "High", "recommendation": "BUY"});
        assert!(serde_json::from_value::<LlmOpportunity>(bad_risk).is_err());

        let bad_stance = json!({"name": "n", "symbol": "s", "expectedReturn": "12%", "riskLevel": "Low", "recommendation": "SELL"});
        assert!(serde_json::from_value::<LlmOpportunity>(bad_stance).is_err());
    }

    #[test]
    fn short_opportunity_list_is_kept() {
        let raw: Vec<LlmOpportunity> = serde_json::from_value(json!([
            {"name": "n", "symbol": "s", "expectedReturn": "8%", "riskLevel": "Medium", "recommendation": "BUY"},
        ]))
        .unwrap();
        let opps = validate_opportunities(raw).unwrap();
        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].risk_level, RiskLevel::Medium);
    }
}
