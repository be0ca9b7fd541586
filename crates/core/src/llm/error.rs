use crate::llm::Provider;
use crate::prompt::QueryKind;
use serde_json::Value;
use std::fmt;

/// Provider failure with enough context to see what the model actually returned.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub kind: QueryKind,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={:?}, kind={:?}, stage={}): {}",
            self.provider, self.kind, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}
