//! The only side-effecting layer: one provider call per query, decoded against the
//! declared contract before anything is handed upward.

use crate::domain::contract::{self, LlmLivePrice, LlmOpportunity, LlmSymbolAnalysis};
use crate::domain::market::{ExtendedAnalysis, MarketItem, Opportunity};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{self, json, GenerateRequest, GenerateResponse, GenerativeClient};
use crate::prompt::{self, AnalysisCategory, QueryKind};
use crate::time::iran::DateInfo;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MISSING_SYMBOL_MESSAGE: &str = "لطفا نام نماد بورسی مورد نظر را وارد کنید.";
pub const DASHBOARD_FETCH_MESSAGE: &str =
    "خطا در دریافت قیمت‌های لحظه‌ای از tgju.org. لطفا دوباره تلاش کنید.";
pub const ANALYSIS_FETCH_MESSAGE: &str =
    "خطا در تحلیل زنده. هوش مصنوعی نتوانست دیتای معتبری برای امروز پیدا کند. لطفا دوباره تلاش کنید.";

#[derive(Debug)]
pub enum GatewayError {
    /// Caller input rejected before any provider call.
    Validation(String),
    /// Network failure, provider error or a response that breaks the contract.
    Fetch {
        kind: QueryKind,
        source: anyhow::Error,
    },
}

impl GatewayError {
    fn fetch(kind: QueryKind, source: anyhow::Error) -> Self {
        GatewayError::Fetch { kind, source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GatewayError::Validation(_))
    }

    /// Localized message shown in place of the result area.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Validation(msg) => msg.clone(),
            GatewayError::Fetch {
                kind: QueryKind::SymbolAnalysis,
                ..
            } => ANALYSIS_FETCH_MESSAGE.to_string(),
            GatewayError::Fetch { .. } => DASHBOARD_FETCH_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Validation(msg) => write!(f, "validation error: {msg}"),
            GatewayError::Fetch { kind, source } => write!(f, "fetch error ({kind:?}): {source:#}"),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatewayError::Validation(_) => None,
            GatewayError::Fetch { source, .. } => Some(source.as_ref()),
        }
    }
}

/// A single-symbol analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub category: AnalysisCategory,
    #[serde(default)]
    pub symbol: String,
}

impl AnalysisRequest {
    pub fn resolve(&self) -> Result<String, GatewayError> {
        self.category
            .resolve_symbol(&self.symbol)
            .ok_or_else(|| GatewayError::Validation(MISSING_SYMBOL_MESSAGE.to_string()))
    }
}

/// What the analyzer form submits: a primary symbol and an optional comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerQuery {
    pub category: Option<AnalysisCategory>,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub compare: bool,
    #[serde(default)]
    pub compare_symbol: String,
}

impl AnalyzerQuery {
    pub fn category(&self) -> AnalysisCategory {
        self.category.unwrap_or(AnalysisCategory::Bourse)
    }

    /// Comparison only applies to free-text categories and needs a non-empty symbol.
    pub fn comparison_symbol(&self) -> Option<String> {
        let category = self.category();
        if !self.compare || !category.accepts_free_text() {
            return None;
        }
        category.resolve_symbol(&self.compare_symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedAnalysis {
    /// Symbol text the provider was asked about.
    pub query: String,
    pub analysis: ExtendedAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub category: AnalysisCategory,
    pub primary: KeyedAnalysis,
    pub comparison: Option<KeyedAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub sentiment: String,
    pub prices: Vec<MarketItem>,
    pub opportunities: Vec<Opportunity>,
}

pub struct MarketGateway<C> {
    client: C,
    now: fn() -> DateTime<Utc>,
}

impl<C: GenerativeClient> MarketGateway<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            now: Utc::now,
        }
    }

    /// Pins the clock used for prompt date stamps.
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    async fn call(&self, kind: QueryKind, prompt: String) -> Result<GenerateResponse, GatewayError> {
        tracing::debug!(kind = ?kind, provider = ?self.client.provider(), "issuing provider call");
        self.client
            .generate(GenerateRequest::grounded(kind, prompt))
            .await
            .map_err(|e| {
                if let Some(diag) = e.downcast_ref::<LlmDiagnosticsError>() {
                    tracing::warn!(
                        kind = ?kind,
                        stage = diag.stage,
                        detail = %diag.detail,
                        raw_output = diag.raw_output.as_deref().unwrap_or(""),
                        raw_response = ?diag.raw_response_json,
                        "provider call failed"
                    );
                }
                GatewayError::fetch(kind, e)
            })
    }

    fn date_info(&self, kind: QueryKind) -> Result<DateInfo, GatewayError> {
        DateInfo::at((self.now)()).map_err(|e| GatewayError::fetch(kind, e))
    }

    pub async fn market_sentiment(&self) -> Result<String, GatewayError> {
        let kind = QueryKind::Sentiment;
        let date = self.date_info(kind)?;
        let res = self.call(kind, prompt::sentiment_prompt(&date)).await?;

        let text = res.text.trim().to_string();
        if text.is_empty() {
            return Err(GatewayError::fetch(kind, anyhow::anyhow!("provider returned an empty narrative")));
        }
        Ok(text)
    }

    pub async fn live_prices(&self) -> Result<Vec<MarketItem>, GatewayError> {
        let kind = QueryKind::LivePrices;
        let date = self.date_info(kind)?;
        let res = self.call(kind, prompt::live_prices_prompt(&date)).await?;

        json::parse_as::<Vec<LlmLivePrice>>(&res.text)
            .and_then(contract::validate_live_prices)
            .map_err(|e| GatewayError::fetch(kind, e))
    }

    pub async fn top_opportunities(&self) -> Result<Vec<Opportunity>, GatewayError> {
        let kind = QueryKind::TopOpportunities;
        let date = self.date_info(kind)?;
        let res = self.call(kind, prompt::opportunities_prompt(&date)).await?;

        json::parse_as::<Vec<LlmOpportunity>>(&res.text)
            .and_then(contract::validate_opportunities)
            .map_err(|e| GatewayError::fetch(kind, e))
    }

    pub async fn analyze_symbol(&self, req: &AnalysisRequest) -> Result<ExtendedAnalysis, GatewayError> {
        let symbol = req.resolve()?;
        self.analyze_resolved(&symbol, req.category).await
    }

    async fn analyze_resolved(
        &self,
        symbol: &str,
        category: AnalysisCategory,
    ) -> Result<ExtendedAnalysis, GatewayError> {
        let kind = QueryKind::SymbolAnalysis;
        let date = self.date_info(kind)?;
        let res = self
            .call(kind, prompt::symbol_analysis_prompt(&date, symbol, category))
            .await?;

        let sources = llm::sources_from_grounding(&res.grounding);
        json::parse_as::<LlmSymbolAnalysis>(&res.text)
            .and_then(|raw| raw.validate_and_into_analysis(sources))
            .with_context(|| format!("analysis of {symbol:?} ({}) broke the contract", category.as_str()))
            .map_err(|e| GatewayError::fetch(kind, e))
    }

    /// Primary and optional comparison analysis, run concurrently. Either failing
    /// fails the whole operation.
    pub async fn analyze(&self, query: &AnalyzerQuery) -> Result<AnalysisOutcome, GatewayError> {
        let category = query.category();
        let primary_symbol = AnalysisRequest {
            category,
            symbol: query.symbol.clone(),
        }
        .resolve()?;
        let comparison_symbol = query.comparison_symbol();

        tracing::info!(
            category = category.as_str(),
            primary = %primary_symbol,
            comparison = ?comparison_symbol,
            "running symbol analysis"
        );

        let primary = self.analyze_resolved(&primary_symbol, category);
        let comparison = async {
            match &comparison_symbol {
                Some(symbol) => self.analyze_resolved(symbol, category).await.map(Some),
                None => Ok(None),
            }
        };
        let (primary, comparison) = tokio::try_join!(primary, comparison)?;

        Ok(AnalysisOutcome {
            category,
            primary: KeyedAnalysis {
                query: primary_symbol,
                analysis: primary,
            },
            comparison: comparison_symbol.zip(comparison).map(|(query, analysis)| KeyedAnalysis {
                query,
                analysis,
            }),
        })
    }

    /// Sentiment, live prices and opportunities, fetched concurrently. All or nothing.
    pub async fn dashboard(&self) -> Result<DashboardData, GatewayError> {
        let (sentiment, prices, opportunities) = tokio::try_join!(
            self.market_sentiment(),
            self.live_prices(),
            self.top_opportunities()
        )?;

        Ok(DashboardData {
            sentiment,
            prices,
            opportunities,
        })
    }
}
