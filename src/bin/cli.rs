//! Memoscope CLI
//!
//! Terminal client for the memo feed:
//! - Show latest messages
//! - Search messages
//! - Watch the live feed
//! - List known chains

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use memoscope::config::{generate_default_config, Config};
use memoscope::feed::{FeedController, FeedEvent};
use memoscope::format::{
    chain_label, format_relative, format_timestamp, format_value, shorten_address, shorten_hash,
    tx_link,
};
use memoscope::indexer::{IndexerClient, IndexerConfig};
use memoscope::types::{parse_chain_ids, FeedRequest, Message, MessagePage};
use memoscope::{chains, MessageSource};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "memoscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse on-chain memo messages across chains")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Memoscope proxy URL
    #[arg(long, default_value = "http://localhost:8082", global = true)]
    pub api_url: String,

    /// Talk to the indexing provider directly instead of the proxy
    #[arg(long, global = true)]
    pub direct: bool,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the latest messages
    Latest {
        #[arg(short, long, default_value = "10")]
        limit: u32,
        #[arg(short, long, default_value = "0")]
        offset: u32,
        /// Comma-separated chain ids
        #[arg(short, long)]
        chains: Option<String>,
    },

    /// Search messages by content
    Search {
        content: String,
        #[arg(short, long, default_value = "10")]
        limit: u32,
        #[arg(short, long, default_value = "0")]
        offset: u32,
    },

    /// Follow the live feed
    Watch {
        /// Only show these chains (comma-separated ids)
        #[arg(short, long)]
        chains: Option<String>,
        /// Seconds between polls (default from config)
        #[arg(short, long)]
        interval: Option<u64>,
        /// Announce new messages without pulling them in
        #[arg(long)]
        no_refresh: bool,
    },

    /// List known chains
    Chains,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_default();

    let source_config = if cli.direct {
        config.indexer.client_config()
    } else {
        IndexerConfig {
            request_timeout_ms: config.indexer.request_timeout_ms,
            ..IndexerConfig::proxy(cli.api_url.clone())
        }
    };

    match cli.command {
        Commands::Latest {
            limit,
            offset,
            chains,
        } => {
            let chain_ids = parse_chain_ids(chains.as_deref().unwrap_or(""))
                .context("invalid --chains value")?;
            let request = FeedRequest::latest(limit, offset).chains(chain_ids);
            let client = IndexerClient::new(source_config)?;
            let page = fetch_or_exit(&client, &request).await;
            print_page(&page, &cli.format)?;
        }

        Commands::Search {
            content,
            limit,
            offset,
        } => {
            let request = FeedRequest::search(content, limit, offset);
            let client = IndexerClient::new(source_config)?;
            let page = fetch_or_exit(&client, &request).await;
            print_page(&page, &cli.format)?;
        }

        Commands::Watch {
            chains,
            interval,
            no_refresh,
        } => {
            let filter = parse_chain_ids(chains.as_deref().unwrap_or(""))
                .context("invalid --chains value")?;
            let poll_interval = match interval {
                Some(secs) => std::time::Duration::from_secs(secs.max(1)),
                None => config.feed.poll_interval(),
            };

            let client = Arc::new(IndexerClient::new(source_config)?);
            let feed = Arc::new(FeedController::new(
                client,
                config.feed.settings(),
                poll_interval,
            ));
            feed.set_chain_filter(filter).await;

            watch(feed, !no_refresh).await?;
        }

        Commands::Chains => {
            println!("{:<10} {:<15} {}", "ID", "Name", "Explorer");
            println!("{}", "-".repeat(60));
            for chain in chains::all() {
                println!("{:<10} {:<15} {}", chain.id, chain.name, chain.explorer);
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

async fn fetch_or_exit(client: &IndexerClient, request: &FeedRequest) -> MessagePage {
    match client.fetch(request).await {
        Ok(page) => page,
        Err(e) => {
            eprintln!("Cannot fetch messages from {}", client.base_url());
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Make sure the Memoscope proxy is running:");
            eprintln!("  cargo run --bin memoscope");
            eprintln!("or pass --direct to query the indexing provider.");
            std::process::exit(1);
        }
    }
}

async fn watch(feed: Arc<FeedController<IndexerClient>>, auto_refresh: bool) -> anyhow::Result<()> {
    let mut events = feed.subscribe();

    feed.load().await;
    let state = feed.snapshot().await;
    if let Some(error) = state.last_error() {
        anyhow::bail!("initial load failed: {}", error);
    }
    print_messages(state.visible_messages());

    let poller = Arc::clone(&feed).start_polling();
    println!();
    println!("Watching for new messages (Ctrl+C to stop)...");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(FeedEvent::NewMessages { count }) => {
                    println!("{} new message(s) available", count);
                    if auto_refresh {
                        feed.refresh().await;
                    }
                }
                Ok(FeedEvent::Refreshed { added }) => {
                    let state = feed.snapshot().await;
                    let fresh = &state.messages()[..added];
                    let filter = state.chain_filter();
                    print_messages(
                        fresh
                            .iter()
                            .filter(|m| filter.is_empty() || filter.contains(&m.chain_id)),
                    );
                }
                Ok(FeedEvent::Failed { operation, error }) => {
                    eprintln!("{:?} failed: {}", operation, error);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    eprintln!("({} feed events dropped)", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.abort();
    Ok(())
}

fn print_page(page: &MessagePage, format: &str) -> anyhow::Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(page)?),
        _ => {
            if page.result.is_empty() {
                println!("No messages found.");
                return Ok(());
            }
            print_messages(page.result.iter());
            println!();
            println!(
                "Showing {}-{} of {}",
                page.pagination.offset + 1,
                u64::from(page.pagination.offset) + page.result.len() as u64,
                page.pagination.count
            );
        }
    }
    Ok(())
}

fn print_messages<'a>(messages: impl Iterator<Item = &'a Message>) {
    let now = Utc::now();

    for message in messages {
        println!(
            "[{}] {:<12} {} -> {}  value {}",
            format_relative(message.block_timestamp, now),
            chain_label(message),
            shorten_address(&message.sender),
            shorten_address(&message.receiver),
            format_value(message.value),
        );
        println!("    {}", message.content);
        println!(
            "    {} at {}  {}",
            shorten_hash(&message.txn_hash),
            format_timestamp(message.block_timestamp),
            tx_link(message).unwrap_or_default(),
        );
    }
}
