//! Scripted in-memory provider shared by the gateway and view tests.

use crate::llm::{GenerateRequest, GenerateResponse, GenerativeClient, GroundingChunk, Provider, WebReference};
use crate::prompt::QueryKind;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

type Handler = Box<dyn Fn(&GenerateRequest) -> anyhow::Result<GenerateResponse> + Send + Sync>;

pub struct ScriptedClient {
    handler: Handler,
    calls: Mutex<Vec<GenerateRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedClient {
    pub fn new(
        handler: impl Fn(&GenerateRequest) -> anyhow::Result<GenerateResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Answers every query kind with a valid payload.
    pub fn happy() -> Self {
        Self::new(|req| Ok(happy_response(req)))
    }

    /// Each call waits for one permit before answering.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<GenerateRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: QueryKind) -> usize {
        self.calls().iter().filter(|c| c.kind == kind).count()
    }
}

#[async_trait::async_trait]
impl GenerativeClient for ScriptedClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.calls.lock().unwrap().push(req.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        (self.handler)(&req)
    }
}

pub fn text_response(text: impl Into<String>) -> GenerateResponse {
    GenerateResponse {
        text: text.into(),
        ..Default::default()
    }
}

pub fn web_chunk(title: &str, uri: &str) -> GroundingChunk {
    GroundingChunk {
        web: Some(WebReference {
            uri: Some(uri.to_string()),
            title: Some(title.to_string()),
        }),
        retrieved_context: None,
    }
}

/// Symbol quoted in an analysis prompt (`نماد "X"`).
pub fn prompt_symbol(req: &GenerateRequest) -> String {
    req.prompt
        .split('"')
        .nth(1)
        .unwrap_or_default()
        .to_string()
}

pub fn analysis_json(symbol: &str) -> serde_json::Value {
    json!({
        "symbol": symbol,
        "recommendation": "HOLD",
        "confidence": 64,
        "technicalSummary": "range bound",
        "fundamentalSummary": "steady earnings",
        "politicalImpact": "no new sanctions news",
        "historicalContext": "tracks last quarter",
        "dataDate": "1405/07/24",
        "risks": ["liquidity"],
        "targets": [110.0, 120.0],
        "stopLoss": 90.0,
    })
}

pub fn happy_response(req: &GenerateRequest) -> GenerateResponse {
    match req.kind {
        QueryKind::Sentiment => text_response("بازار امروز در انتظار خبرهای مذاکرات است."),
        QueryKind::LivePrices => text_response(
            json!([
                {"name": "شاخص کل بورس", "symbol": "TEDPIX", "price": 2_950_000.0, "changePercent": 0.6},
                {"name": "دلار بازار آزاد", "symbol": "USD", "price": 1_040_000.0, "changePercent": -0.2},
                {"name": "سکه امامی", "symbol": "SEKE", "price": 98_000_000.0, "changePercent": 1.1},
                {"name": "طلای 18 عیار", "symbol": "GOLD18", "price": 9_100_000.0, "changePercent": 0.9},
            ])
            .to_string(),
        ),
        QueryKind::TopOpportunities => {
            let items: Vec<_> = (1..=10)
                .map(|i| {
                    json!({
                        "name": format!("نماد {i}"),
                        "symbol": format!("SYM{i}"),
                        "expectedReturn": format!("{i}%"),
                        "riskLevel": if i % 2 == 0 { "Low" } else { "Medium" },
                        "recommendation": "BUY",
                    })
                })
                .collect();
            text_response(json!(items).to_string())
        }
        QueryKind::SymbolAnalysis => GenerateResponse {
            text: analysis_json(&prompt_symbol(req)).to_string(),
            grounding: vec![web_chunk("tgju.org", "https://www.tgju.org/")],
        },
    }
}
