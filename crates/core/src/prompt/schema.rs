use crate::domain::contract::OPPORTUNITY_COUNT;
use crate::domain::market::{OpportunityStance, Recommendation, RiskLevel};
use crate::prompt::QueryKind;
use serde_json::{json, Value};

/// Output schema declared to the provider for `kind`. Sentiment is free text and has none.
pub fn response_schema(kind: QueryKind) -> Option<Value> {
    match kind {
        QueryKind::Sentiment => None,
        QueryKind::LivePrices => Some(live_prices_schema()),
        QueryKind::TopOpportunities => Some(opportunities_schema()),
        QueryKind::SymbolAnalysis => Some(symbol_analysis_schema()),
    }
}

fn live_prices_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": {"type": "STRING"},
                "symbol": {"type": "STRING"},
                "price": {"type": "NUMBER"},
                "changePercent": {"type": "NUMBER"}
            },
            "required": ["name", "symbol", "price", "changePercent"]
        }
    })
}

fn opportunities_schema() -> Value {
    json!({
        "type": "ARRAY",
        "minItems": OPPORTUNITY_COUNT,
        "maxItems": OPPORTUNITY_COUNT,
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": {"type": "STRING"},
                "symbol": {"type": "STRING"},
                "expectedReturn": {"type": "STRING"},
                "riskLevel": {"type": "STRING", "enum": RiskLevel::ALL},
                "recommendation": {"type": "STRING", "enum": OpportunityStance::ALL}
            },
            "required": ["name", "symbol", "expectedReturn", "riskLevel", "recommendation"]
        }
    })
}

fn symbol_analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "symbol": {"type": "STRING"},
            "recommendation": {"type": "STRING", "enum": Recommendation::ALL},
            "confidence": {"type": "NUMBER"},
            "technicalSummary": {"type": "STRING"},
            "fundamentalSummary": {"type": "STRING"},
            "politicalImpact": {"type": "STRING"},
            "historicalContext": {"type": "STRING"},
            "dataDate": {"type": "STRING", "description": "تاریخ و ساعت دقیق داده استخراج شده"},
            "risks": {"type": "ARRAY", "items": {"type": "STRING"}},
            "targets": {"type": "ARRAY", "items": {"type": "NUMBER"}},
            "stopLoss": {"type": "NUMBER"}
        },
        "required": [
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
            "stopLoss"
        ]
    })
}
