pub mod error;
pub mod gemini;
pub mod json;

#[cfg(test)]
pub(crate) mod testing;

use crate::domain::market::Source;
use crate::prompt::QueryKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub kind: QueryKind,
    pub prompt: String,
    /// Declared output schema; `None` for free-text answers.
    pub response_schema: Option<serde_json::Value>,
    /// Let the provider ground the answer with live web search.
    pub web_search: bool,
}

impl GenerateRequest {
    pub fn grounded(kind: QueryKind, prompt: String) -> Self {
        Self {
            kind,
            prompt,
            response_schema: if kind.expects_json() {
                crate::prompt::response_schema(kind)
            } else {
                None
            },
            web_search: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    pub text: String,
    pub grounding: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebReference>,
    #[serde(default)]
    pub retrieved_context: Option<WebReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebReference {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

#[async_trait::async_trait]
pub trait GenerativeClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerateResponse>;
}

/// Web citations only; other chunk kinds are dropped.
pub fn sources_from_grounding(chunks: &[GroundingChunk]) -> Vec<Source> {
    chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .map(|web| Source {
            title: web.title.clone().unwrap_or_default(),
            uri: web.uri.clone().unwrap_or_default(),
        })
        .collect()
}
