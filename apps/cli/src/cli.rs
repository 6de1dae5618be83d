//! Command-line arguments.

use clap::{Parser, Subcommand};

/// Fetch quotes, headlines and a quick score for a ticker.
///
/// Quotes are served by a rotating pool of Yahoo Finance sessions, falling
/// back to Alpha Vantage and Finnhub when every session is cooling down.
#[derive(Parser, Debug, Clone)]
#[command(name = "stockron")]
#[command(version)]
#[command(about = "Multi-provider stock quote and news fetcher", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Pretty-print JSON output
    #[arg(long, global = true, env = "STOCKRON_PRETTY")]
    pub pretty: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch a normalized quote and the provider that served it
    Quote {
        /// Ticker symbol (e.g. AAPL, BRK.B, ^GSPC)
        symbol: String,
    },

    /// Fetch recent headlines from the RSS feeds
    News {
        /// Ticker symbol
        symbol: String,
    },

    /// Fetch a quote and compute quant/quality/catalyst scores
    Analyze {
        /// Ticker symbol
        symbol: String,
    },
}

impl Command {
    pub fn symbol(&self) -> &str {
        match self {
            Command::Quote { symbol } | Command::News { symbol } | Command::Analyze { symbol } => {
                symbol
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parse_analyze() {
        let args = Args::parse_from(["stockron", "analyze", "nvda", "--pretty"]);
        assert!(args.pretty);
        assert!(matches!(args.command, Command::Analyze { .. }));
        assert_eq!(args.command.symbol(), "nvda");
    }

    #[test]
    fn test_parse_quote_defaults() {
        let args = Args::parse_from(["stockron", "quote", "AAPL"]);
        assert!(!args.pretty);
        assert_eq!(args.command.symbol(), "AAPL");
    }

    #[test]
    fn test_pretty_reads_environment() {
        let command = Args::command();
        let pretty = command
            .get_arguments()
            .find(|arg| arg.get_id() == "pretty")
            .unwrap();
        assert_eq!(pretty.get_env(), Some(std::ffi::OsStr::new("STOCKRON_PRETTY")));
    }

    #[test]
    fn test_missing_symbol_is_rejected() {
        assert!(Args::try_parse_from(["stockron", "news"]).is_err());
    }
}
