use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scout", version, about = "Vision-driven browser agents that search supplier marketplaces")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve(ServeArgs),
    /// Run one search in-process and print the records
    Search(SearchArgs),
    /// Follow a job on a running server until it finishes
    Watch(WatchArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Settings shared by every command that drives browsers.
#[derive(Args, Clone, Default)]
pub struct RuntimeArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Decision-step provider (only gemini supports computer use)
    #[arg(long)]
    pub provider: Option<String>,

    /// Decision-step model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// API key for the decision provider (or use env vars)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Provider for page extraction: gemini, openai
    #[arg(long)]
    pub extraction_provider: Option<String>,

    /// Model for page extraction
    #[arg(long)]
    pub extraction_model: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Maximum decision turns per scraper
    #[arg(long)]
    pub max_turns: Option<usize>,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    /// Bind address (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Require this bearer token on job endpoints
    #[arg(long)]
    pub api_token: Option<String>,
}

#[derive(Args, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    /// What to search for
    #[arg(long)]
    pub query: String,

    /// Comma-separated sources: alibaba, made_in_china
    #[arg(short, long, value_delimiter = ',', default_value = "alibaba,made_in_china")]
    pub sources: Vec<String>,

    /// Records per source
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Print the finished job as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct WatchArgs {
    /// Job id returned by the live-search endpoint
    pub job_id: String,

    /// Server base URL
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,

    /// Poll interval in seconds
    #[arg(short, long, default_value = "2")]
    pub interval: u64,

    /// Bearer token for a protected server
    #[arg(long)]
    pub api_token: Option<String>,

    /// Print the final results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Path to the YAML configuration file
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_sources_split_on_commas() {
        let cli = Cli::try_parse_from(["scout", "search", "--query", "M8 bolt", "--sources", "alibaba,source_b"]).unwrap();
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "M8 bolt");
                assert_eq!(args.sources, vec!["alibaba", "source_b"]);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_watch_defaults() {
        let cli = Cli::try_parse_from(["scout", "-vv", "watch", "abc"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.interval, 2);
                assert_eq!(args.server, "http://localhost:8080");
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["scout", "search"]).is_err());
    }
}
