use clap::Parser;
use scout::cli::{self, Cli, Commands};
use scout::config;
use scout::errors::ScoutError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .init();
    }

    let result = match cli.command {
        Commands::Serve(args) => cli::serve::handle_serve(args).await,
        Commands::Search(args) => cli::search::handle_search(args).await,
        Commands::Watch(args) => cli::watch::handle_watch(args).await,
        Commands::Validate(args) => handle_validate(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            ScoutError::Config(_) => 2,
            ScoutError::Browser(_) => 3,
            ScoutError::Authentication(_) => 4,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

async fn handle_validate(args: cli::commands::ValidateArgs) -> Result<(), ScoutError> {
    let path = std::path::PathBuf::from(&args.config);
    let config = config::parse_config(&path).await?;
    println!("Configuration is valid: {}", args.config);
    println!(
        "  decision: {} / {}, extraction: {}, screen {}x{}, max_turns {}",
        config.llm.provider,
        config.llm.model,
        config.llm.extraction_provider(),
        config.browser.screen_width,
        config.browser.screen_height,
        config.agent.max_turns
    );
    Ok(())
}
