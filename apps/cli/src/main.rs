mod cli;
mod config;
mod main_lib;
mod scoring;

use clap::Parser;

use cli::{Args, Command};
use config::Config;
use main_lib::{build_state, error_body, init_tracing, run_analyze, run_news, run_quote};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = Config::from_env();
    let state = build_state(&config)?;

    let symbol = args.command.symbol().to_string();
    let outcome = match &args.command {
        Command::Quote { .. } => run_quote(&state, &symbol).await,
        Command::News { .. } => run_news(&state, &symbol).await,
        Command::Analyze { .. } => run_analyze(&state, &symbol).await,
    };

    let (body, failed) = match outcome {
        Ok(body) => (body, false),
        Err(e) => {
            tracing::error!("{} failed: {:#}", symbol, e);
            (error_body(&e, &symbol), true)
        }
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&body)?
    } else {
        serde_json::to_string(&body)?
    };
    println!("{}", rendered);

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
