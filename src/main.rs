//! mcp-reddit MCP Server & CLI (Rust)
//!
//! Dual-mode application:
//! - MCP Server Mode (no subcommand): Model Context Protocol server using stdio
//! - CLI Mode: Command-line utility for direct tool execution
//!
//! Implements seven read-only Reddit tools: subreddit posts, search, user
//! profiles, subreddit info, post comments, trending subreddits and
//! crossposts.

mod cli;
mod config;
mod error;
mod http;
mod mcp;
mod reddit;
mod tools;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::RedditConfig;
use error::AppError;
use mcp::{ServerContext, ToolResult};
use reddit::{RedditApi, RedditClient};
use std::sync::Arc;
use tools::run_with_timeout;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads env-backed flags
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = match cli.connection.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };
    debug!("Configuration: {:?}", config);

    match cli.command {
        Some(command) => run_cli_mode(command, config).await,
        None => run_mcp_mode(config).await,
    }
}

/// Log to stderr; stdout carries the protocol or the CLI output
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run in CLI mode
async fn run_cli_mode(command: Commands, config: RedditConfig) -> Result<()> {
    match execute_command(command, &config).await {
        Ok(tool_result) => {
            let text = tool_result
                .content
                .first()
                .map(|c| c.text.clone())
                .unwrap_or_default();
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Execute one subcommand through the same code path as `tools/call`
async fn execute_command(command: Commands, config: &RedditConfig) -> Result<ToolResult, AppError> {
    use tools::{cross_posts, post_comments, search, subreddit_info, subreddit_posts, trending, user_profile};

    let client = RedditClient::new(config)?;
    let api: &dyn RedditApi = &client;
    let limit = config.tool_timeout;

    match command {
        Commands::Posts(args) => {
            run_with_timeout(limit, subreddit_posts::NAME, subreddit_posts::execute_subreddit_posts(api, args)).await
        }
        Commands::Search(args) => run_with_timeout(limit, search::NAME, search::execute_search(api, args)).await,
        Commands::User(args) => {
            run_with_timeout(limit, user_profile::NAME, user_profile::execute_user_profile(api, args)).await
        }
        Commands::Subreddit(args) => {
            run_with_timeout(limit, subreddit_info::NAME, subreddit_info::execute_subreddit_info(api, args)).await
        }
        Commands::Comments(args) => {
            run_with_timeout(limit, post_comments::NAME, post_comments::execute_post_comments(api, args)).await
        }
        Commands::Trending(args) => run_with_timeout(limit, trending::NAME, trending::execute_trending(api, args)).await,
        Commands::Crossposts(args) => {
            run_with_timeout(limit, cross_posts::NAME, cross_posts::execute_cross_posts(api, args)).await
        }
    }
}

/// Run in MCP server mode
async fn run_mcp_mode(config: RedditConfig) -> Result<()> {
    info!("Starting mcp-reddit MCP Server");

    let client = RedditClient::new(&config)?;
    let context = ServerContext::new(Arc::new(client), config.tool_timeout);

    mcp::handle_stdio(context).await?;

    Ok(())
}
