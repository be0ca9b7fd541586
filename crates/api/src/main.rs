use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nabz_core::gateway::{AnalysisOutcome, AnalyzerQuery, DashboardData, MarketGateway};
use nabz_core::llm::gemini::GeminiClient;
use nabz_core::llm::GenerativeClient;
use nabz_core::view::{AnalyzerView, DashboardView, ViewState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = nabz_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let views = match GeminiClient::from_settings(&settings) {
        Ok(client) => {
            tracing::info!(model = client.model(), "provider client ready");
            let views = Views::new(client);
            // First paint: the dashboard loads without waiting for a click.
            views.dashboard.spawn_refresh();
            Some(views)
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "provider client unavailable; starting API in degraded mode");
            None
        }
    };

    let app = router(AppState { views });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

struct Views<C> {
    dashboard: Arc<DashboardView<C>>,
    analyzer: AnalyzerView<C>,
}

impl<C: GenerativeClient> Views<C> {
    fn new(client: C) -> Arc<Self> {
        let gateway = Arc::new(MarketGateway::new(client));
        Arc::new(Self {
            dashboard: Arc::new(DashboardView::new(gateway.clone())),
            analyzer: AnalyzerView::new(gateway),
        })
    }
}

struct AppState<C> {
    views: Option<Arc<Views<C>>>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            views: self.views.clone(),
        }
    }
}

impl<C> AppState<C> {
    fn views(&self) -> Result<&Arc<Views<C>>, StatusCode> {
        self.views.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)
    }
}

fn router<C: GenerativeClient + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/dashboard", get(get_dashboard::<C>))
        .route("/dashboard/refresh", post(refresh_dashboard::<C>))
        .route("/analyzer", get(get_analyzer::<C>).post(submit_analysis::<C>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_dashboard<C: GenerativeClient + 'static>(
    State(state): State<AppState<C>>,
) -> Result<Json<ViewState<DashboardData>>, StatusCode> {
    Ok(Json(state.views()?.dashboard.snapshot()))
}

async fn refresh_dashboard<C: GenerativeClient + 'static>(
    State(state): State<AppState<C>>,
) -> Result<(StatusCode, Json<ViewState<DashboardData>>), StatusCode> {
    let snapshot = state.views()?.dashboard.spawn_refresh();
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

async fn get_analyzer<C: GenerativeClient + 'static>(
    State(state): State<AppState<C>>,
) -> Result<Json<ViewState<AnalysisOutcome>>, StatusCode> {
    Ok(Json(state.views()?.analyzer.snapshot()))
}

async fn submit_analysis<C: GenerativeClient + 'static>(
    State(state): State<AppState<C>>,
    Json(query): Json<AnalyzerQuery>,
) -> Result<(StatusCode, Json<ViewState<AnalysisOutcome>>), StatusCode> {
    let analyzer = &state.views()?.analyzer;
    let status = match analyzer.submit(query).await {
        Ok(_) => StatusCode::OK,
        Err(err) if err.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
        Err(_) => StatusCode::BAD_GATEWAY,
    };
    Ok((status, Json(analyzer.snapshot())))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &nabz_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{self, Body};
    use axum::http::Request;
    use nabz_core::gateway::ANALYSIS_FETCH_MESSAGE;
    use nabz_core::llm::{GenerateRequest, GenerateResponse, Provider};
    use nabz_core::prompt::QueryKind;
    use serde_json::{json, Value};
    use tower::ServiceExt as _;

    const BODY_LIMIT: usize = 1024 * 1024;

    /// Answers analysis queries with a fixed valid payload; everything else fails,
    /// as does an analysis of the `rejects` symbol.
    struct AnalysisOnly {
        rejects: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl GenerativeClient for AnalysisOnly {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerateResponse> {
            anyhow::ensure!(req.kind == QueryKind::SymbolAnalysis, "offline");
            if let Some(symbol) = self.rejects {
                anyhow::ensure!(!req.prompt.contains(&format!("\"{symbol}\"")), "upstream 500");
            }
            let body = json!({
                "symbol": "فولاد",
                "recommendation": "SELL",
                "confidence": 55,
                "technicalSummary": "t",
                "fundamentalSummary": "f",
                "politicalImpact": "p",
                "historicalContext": "h",
                "dataDate": "1405/07/24",
                "risks": [],
                "targets": [500.0],
                "stopLoss": 620.0,
            });
            Ok(GenerateResponse {
                text: body.to_string(),
                ..Default::default()
            })
        }
    }

    fn app() -> Router {
        app_rejecting(None)
    }

    fn app_rejecting(rejects: Option<&'static str>) -> Router {
        router(AppState {
            views: Some(Views::new(AnalysisOnly { rejects })),
        })
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.expect("oneshot");
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("read body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn post_json(uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("build request")
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dashboard_starts_idle() {
        let req = Request::builder().uri("/dashboard").body(Body::empty()).unwrap();
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "idle");
    }

    #[tokio::test]
    async fn refresh_is_accepted_and_loading() {
        let (status, body) = send(app(), post_json("/dashboard/refresh", json!({}))).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["status"], "loading");
    }

    #[tokio::test]
    async fn analysis_returns_outcome() {
        let payload = json!({"category": "bourse", "symbol": "فولاد"});
        let (status, body) = send(app(), post_json("/analyzer", payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["primary"]["query"], "فولاد");
        assert_eq!(body["data"]["primary"]["analysis"]["recommendation"], "SELL");
    }

    #[tokio::test]
    async fn missing_symbol_is_unprocessable() {
        let payload = json!({"category": "bourse", "symbol": ""});
        let (status, body) = send(app(), post_json("/analyzer", payload)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn provider_failure_is_bad_gateway() {
        let payload = json!({"category": "bourse", "symbol": "فولاد"});
        let (status, body) = send(app_rejecting(Some("فولاد")), post_json("/analyzer", payload)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "error");
        assert_eq!(body["data"], ANALYSIS_FETCH_MESSAGE);
    }

    #[tokio::test]
    async fn comparison_fails_whole_when_one_side_fails() {
        let payload = json!({
            "category": "bourse",
            "symbol": "فولاد",
            "compare": true,
            "compareSymbol": "فملی",
        });
        let (status, body) = send(app_rejecting(Some("فملی")), post_json("/analyzer", payload)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "error");
        assert_eq!(body["data"], ANALYSIS_FETCH_MESSAGE);
    }

    #[tokio::test]
    async fn comparison_returns_both_sides() {
        let payload = json!({
            "category": "bourse",
            "symbol": "فولاد",
            "compare": true,
            "compareSymbol": "فملی",
        });
        let (status, body) = send(app(), post_json("/analyzer", payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["primary"]["query"], "فولاد");
        assert_eq!(body["data"]["comparison"]["query"], "فملی");
    }

    #[tokio::test]
    async fn degraded_mode_is_unavailable() {
        let app = router::<AnalysisOnly>(AppState { views: None });
        let req = Request::builder().uri("/analyzer").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
