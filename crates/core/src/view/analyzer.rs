use crate::gateway::{AnalysisOutcome, AnalysisRequest, AnalyzerQuery, GatewayError, MarketGateway};
use crate::llm::GenerativeClient;
use crate::view::{StateCell, ViewState, ViewStatus};
use std::sync::Arc;

pub struct AnalyzerView<C> {
    gateway: Arc<MarketGateway<C>>,
    state: StateCell<AnalysisOutcome>,
}

impl<C: GenerativeClient> AnalyzerView<C> {
    pub fn new(gateway: Arc<MarketGateway<C>>) -> Self {
        Self {
            gateway,
            state: StateCell::new(),
        }
    }

    pub fn snapshot(&self) -> ViewState<AnalysisOutcome> {
        self.state.snapshot()
    }

    /// Runs the analysis described by `query`. A missing bourse symbol is reported
    /// inline without contacting the provider.
    pub async fn submit(&self, query: AnalyzerQuery) -> Result<ViewState<AnalysisOutcome>, GatewayError> {
        let precheck = AnalysisRequest {
            category: query.category(),
            symbol: query.symbol.clone(),
        }
        .resolve();
        if let Err(err) = precheck {
            tracing::warn!(category = query.category().as_str(), "analysis rejected: missing symbol");
            self.state.begin(ViewStatus::Error(err.user_message()));
            return Err(err);
        }

        let ticket = self.state.begin(ViewStatus::Loading);
        match self.gateway.analyze(&query).await {
            Ok(outcome) => {
                tracing::info!(
                    %ticket,
                    primary = %outcome.primary.query,
                    recommendation = ?outcome.primary.analysis.result.recommendation,
                    compared = outcome.comparison.is_some(),
                    "analysis succeeded"
                );
                self.state.finish(ticket, ViewStatus::Success(outcome));
                Ok(self.snapshot())
            }
            Err(err) => {
                tracing::error!(%ticket, error = %err, "analysis failed");
                self.state.finish(ticket, ViewStatus::Error(err.user_message()));
                Err(err)
            }
        }
    }
}
