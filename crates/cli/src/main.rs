use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nabz_core::gateway::{AnalyzerQuery, MarketGateway};
use nabz_core::llm::gemini::GeminiClient;
use nabz_core::prompt::AnalysisCategory;
use nabz_core::time::iran::DateInfo;
use nabz_core::view::{AnalyzerView, DashboardView, ViewStatus};

mod render;

#[derive(Debug, Parser)]
#[command(name = "nabz", about = "Live Tehran market pulse: prices, opportunities and symbol analysis")]
struct Args {
    /// Print the raw view state as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch sentiment, live prices and the top opportunities.
    Dashboard,

    /// Analyze one symbol, optionally side by side with a second one.
    Analyze {
        /// bourse, gold or currency. Gold and currency ignore --symbol.
        #[arg(long, default_value = "bourse")]
        category: String,

        #[arg(long, default_value = "")]
        symbol: String,

        /// Comparison symbol (bourse only).
        #[arg(long)]
        compare: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = nabz_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, args).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "nabz run failed");
    }
    result
}

async fn run(settings: &nabz_core::config::Settings, args: Args) -> anyhow::Result<()> {
    let client = GeminiClient::from_settings(settings)?;
    let gateway = Arc::new(MarketGateway::new(client));

    match args.command {
        Command::Dashboard => {
            let view = DashboardView::new(gateway);
            let state = view.refresh().await;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            }
            match &state.status {
                ViewStatus::Success(data) => {
                    if !args.json {
                        let date = DateInfo::now()?;
                        print!("{}", render::DashboardReport { date: &date, data });
                    }
                    Ok(())
                }
                ViewStatus::Error(msg) => {
                    eprintln!("{msg}");
                    anyhow::bail!("dashboard refresh failed")
                }
                ViewStatus::Idle | ViewStatus::Loading => anyhow::bail!("dashboard refresh did not complete"),
            }
        }
        Command::Analyze {
            category,
            symbol,
            compare,
        } => {
            let category = category.parse::<AnalysisCategory>()?;
            let query = AnalyzerQuery {
                category: Some(category),
                symbol,
                compare: compare.is_some(),
                compare_symbol: compare.unwrap_or_default(),
            };

            let view = AnalyzerView::new(gateway);
            let outcome = view.submit(query).await;
            let state = view.snapshot();

            if args.json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            }
            if let Err(err) = outcome {
                eprintln!("{}", err.user_message());
                return Err(err.into());
            }
            let data = state
                .status
                .data()
                .context("analysis finished without a result")?;
            if !args.json {
                print!("{}", render::AnalysisReport(data));
            }
            Ok(())
        }
    }
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
