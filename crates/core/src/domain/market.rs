use serde::{Deserialize, Serialize};

/// Label shown on price cards built from a live fetch.
pub const LIVE_UPDATE_LABEL: &str = "لحظه‌ای";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketCategory {
    #[serde(rename = "bourse")]
    ExchangeEquity,
    #[serde(rename = "gold")]
    PreciousMetal,
    #[serde(rename = "currency")]
    Currency,
}

impl MarketCategory {
    /// Best-effort classification of a provider symbol/name pair.
    pub fn infer(symbol: &str, name: &str) -> Self {
        let symbol = symbol.to_ascii_uppercase();

        if contains_any(&symbol, &["USD", "EUR", "DOLLAR"]) || contains_any(name, &["دلار", "یورو", "تتر"]) {
            MarketCategory::Currency
        } else if contains_any(&symbol, &["GOLD", "SEKE", "COIN", "EMAMI"]) || contains_any(name, &["طلا", "سکه"]) {
            MarketCategory::PreciousMetal
        } else {
            MarketCategory::ExchangeEquity
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub category: MarketCategory,
    pub last_update: String,
}

impl MarketItem {
    /// Builds a price card from one entry of a live price fetch.
    ///
    /// The provider only reports a percent change, so the absolute change is derived
    /// from the current price.
    pub fn from_live_price(index: usize, live: LivePrice) -> Self {
        let previous = live.price / (1.0 + live.change_percent / 100.0);
        let change = if previous.is_finite() {
            live.price - previous
        } else {
            0.0
        };

        Self {
            id: index.to_string(),
            category: MarketCategory::infer(&live.symbol, &live.name),
            name: live.name,
            symbol: live.symbol,
            price: live.price,
            change,
            change_percent: live.change_percent,
            last_update: LIVE_UPDATE_LABEL.to_string(),
        }
    }

    pub fn trend(&self) -> Trend {
        if self.change_percent > 0.0 {
            Trend::Up
        } else if self.change_percent < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

/// Direction of a price card since the previous close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePrice {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
    Neutral,
}

impl Recommendation {
    pub const ALL: [&'static str; 4] = ["BUY", "SELL", "HOLD", "NEUTRAL"];

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::Buy => "پیشنهاد خرید",
            Recommendation::Sell => "پیشنهاد فروش",
            Recommendation::Hold => "نگهداری",
            Recommendation::Neutral => "خنثی",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
}

impl RiskLevel {
    pub const ALL: [&'static str; 2] = ["Low", "Medium"];

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "بسیار کم",
            RiskLevel::Medium => "متوسط",
        }
    }
}

/// Stance of an opportunity row; narrower than [`Recommendation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpportunityStance {
    Buy,
    Hold,
}

impl OpportunityStance {
    pub const ALL: [&'static str; 2] = ["BUY", "HOLD"];

    pub fn label(&self) -> &'static str {
        match self {
            OpportunityStance::Buy => "خرید پله‌ای",
            OpportunityStance::Hold => "نگهداری",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub symbol: String,
    pub recommendation: Recommendation,
    /// 0..=100
    pub confidence: u8,
    pub technical_summary: String,
    pub fundamental_summary: String,
    pub targets: Vec<f64>,
    pub stop_loss: f64,
    pub risks: Vec<String>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedAnalysis {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub political_impact: String,
    pub historical_context: String,
    pub data_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub name: String,
    pub symbol: String,
    /// Free text such as "۱۵٪"; not guaranteed to be numeric.
    pub expected_return: String,
    pub risk_level: RiskLevel,
    pub recommendation: OpportunityStance,
}
