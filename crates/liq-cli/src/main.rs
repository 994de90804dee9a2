//! Command-line interface for liq-rs

mod output;

use clap::{Parser, Subcommand, ValueEnum};
use liq_engine::{AnalysisService, EngineConfig, LlmAnalysisProvider};
use liq_llm::providers::{OpenAIConfig, OpenAIProvider};
use liq_utils::{AppConfig, LogFormat, init_tracing};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "liq", version)]
#[command(about = "Liquidity range analysis for crypto pairs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Skip the AI provider and use deterministic results only
    #[arg(long, global = true)]
    no_ai: bool,

    /// CoinGecko coin id (overrides LIQ_COIN_ID)
    #[arg(long, global = true)]
    coin: Option<String>,

    /// Quote currency (overrides LIQ_VS_CURRENCY)
    #[arg(long, global = true)]
    vs: Option<String>,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Pretty)]
    log_format: LogFormatArg,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Indicators, overall sentiment and price range
    Technical,
    /// Headline sentiment and news analysis
    Sentiment,
    /// Liquidity range prediction
    Predict,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

fn ai_provider() -> Option<Arc<LlmAnalysisProvider>> {
    let config = match OpenAIConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!("AI disabled: {e}");
            return None;
        }
    };
    let model = config.model.clone();

    match OpenAIProvider::with_config(config) {
        Ok(provider) => Some(Arc::new(LlmAnalysisProvider::new(Arc::new(provider), model))),
        Err(e) => {
            warn!("AI disabled: {e}");
            None
        }
    }
}

async fn run(args: Args) -> anyhow::Result<String> {
    let mut config = EngineConfig::from_env()?;
    if let Some(coin) = args.coin {
        config.coin_id = coin.to_lowercase();
    }
    if let Some(vs) = args.vs {
        config.vs_currency = vs.to_lowercase();
    }

    let mut service = AnalysisService::from_config(config)?;
    if !args.no_ai {
        if let Some(ai) = ai_provider() {
            service = service.with_ai(ai);
        }
    }
    info!(pair = %service.config().pair_key(), command = ?args.command, "Running");

    let json = args.format == OutputFormat::Json;
    let rendered = match args.command {
        Command::Technical => {
            let report = service.technical_analysis().await?;
            if json {
                serde_json::to_string_pretty(&*report)?
            } else {
                output::technical(&report)
            }
        }
        Command::Sentiment => {
            let report = service.sentiment().await?;
            if json {
                serde_json::to_string_pretty(&*report)?
            } else {
                output::sentiment(&report)
            }
        }
        Command::Predict => {
            let prediction = service.prediction().await?;
            if json {
                serde_json::to_string_pretty(&*prediction)?
            } else {
                output::prediction(&prediction)
            }
        }
    };

    Ok(rendered)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.log_format.into());
    let app = AppConfig::from_env();

    match run(args).await {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            if app.expose_error_details() {
                eprintln!("Error: {e:#}");
            } else {
                eprintln!("Error: analysis unavailable");
            }
            ExitCode::FAILURE
        }
    }
}
