use crate::gateway::{DashboardData, MarketGateway};
use crate::llm::GenerativeClient;
use crate::view::{StateCell, ViewState, ViewStatus};
use std::sync::Arc;
use uuid::Uuid;

pub struct DashboardView<C> {
    gateway: Arc<MarketGateway<C>>,
    state: StateCell<DashboardData>,
}

impl<C: GenerativeClient> DashboardView<C> {
    pub fn new(gateway: Arc<MarketGateway<C>>) -> Self {
        Self {
            gateway,
            state: StateCell::new(),
        }
    }

    pub fn snapshot(&self) -> ViewState<DashboardData> {
        self.state.snapshot()
    }

    /// Refetches sentiment, prices and opportunities. Loading is visible as soon as the
    /// future is first polled; the three results are applied together or not at all.
    pub async fn refresh(&self) -> ViewState<DashboardData> {
        let ticket = self.begin_refresh();
        self.complete_refresh(ticket).await
    }

    /// Marks the view loading right away and finishes the refresh on a background task.
    pub fn spawn_refresh(self: &Arc<Self>) -> ViewState<DashboardData>
    where
        C: 'static,
    {
        let ticket = self.begin_refresh();
        let view = Arc::clone(self);
        tokio::spawn(async move {
            view.complete_refresh(ticket).await;
        });
        self.snapshot()
    }

    fn begin_refresh(&self) -> Uuid {
        let ticket = self.state.begin(ViewStatus::Loading);
        tracing::info!(%ticket, "dashboard refresh started");
        ticket
    }

    async fn complete_refresh(&self, ticket: Uuid) -> ViewState<DashboardData> {
        let status = match self.gateway.dashboard().await {
            Ok(data) => {
                tracing::info!(
                    %ticket,
                    prices = data.prices.len(),
                    opportunities = data.opportunities.len(),
                    "dashboard refresh succeeded"
                );
                ViewStatus::Success(data)
            }
            Err(err) => {
                tracing::error!(%ticket, error = %err, "dashboard refresh failed");
                ViewStatus::Error(err.user_message())
            }
        };

        self.state.finish(ticket, status);
        self.snapshot()
    }
}
