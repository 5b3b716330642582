use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod config;

use mastopipe::handler::HandlerContext;
use mastopipe::mastodon::MastodonClient;
use mastopipe::pipeline::poll::PollParams;
use mastopipe::pipeline::stream::StreamParams;
use mastopipe::pipeline::{ProcessOptions, SerializeMode};
use mastopipe::profile::Dereferencer;

/// Mastopipe: ingest Mastodon notifications, transform them into
/// ActivityStreams documents, and deliver them to an inbox directory
/// or stdout.
#[derive(Parser)]
#[command(name = "mastopipe", version, about)]
struct Cli {
    /// Mastodon instance URL (overrides MASTODON_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Access token (overrides MASTODON_ACCESS_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch notifications once and process the batch
    Fetch {
        /// Get one notification by id (ignores every other filter)
        #[arg(long)]
        id: Option<String>,

        /// Read a named account's timeline instead of notifications
        #[arg(long)]
        account: Option<String>,

        /// Only return results more recent than this id
        #[arg(long)]
        since: Option<String>,

        /// Only return results older than this id
        #[arg(long)]
        max: Option<String>,

        /// Limit the number of notifications fetched
        #[arg(long)]
        limit: Option<u32>,

        /// Comma-separated notification types to exclude
        #[arg(long)]
        exclude: Option<String>,

        /// Inbox directory to store documents, or "stdout"
        #[arg(long)]
        inbox: Option<String>,

        /// Keep and use the last seen id in this history file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Serialization mode: "native" or "as2"
        #[arg(long = "type")]
        mode: Option<String>,

        /// Notification handler (e.g. "@handler/create_event_notification")
        #[arg(long)]
        handler: Option<String>,

        /// Retry ceiling for one-shot calls
        #[arg(long)]
        retries: Option<u32>,
    },

    /// Stream notifications until the server closes the connection
    Stream {
        /// Comma-separated notification types to exclude
        #[arg(long)]
        exclude: Option<String>,

        /// Inbox directory to store documents, or "stdout"
        #[arg(long)]
        inbox: Option<String>,

        /// History file, updated after every event
        #[arg(long)]
        history: Option<PathBuf>,

        /// Serialization mode: "native" or "as2"
        #[arg(long = "type")]
        mode: Option<String>,

        /// Notification handler
        #[arg(long)]
        handler: Option<String>,
    },

    /// Post a status to the configured account
    Post {
        /// The status text
        content: String,

        /// Status visibility (public, unlisted, private, direct)
        #[arg(long, default_value = "public")]
        visibility: String,

        /// Retry ceiling for the post call
        #[arg(long)]
        retries: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging on stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mastopipe=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::load()?;
    if let Some(url) = cli.url {
        config.base_url = url;
    }
    if let Some(token) = cli.token {
        config.access_token = token;
    }
    config.require_url()?;
    config.require_token()?;

    let timeout = Duration::from_secs(config.timeout_secs);
    let client = MastodonClient::new(&config.base_url, &config.access_token, timeout)?;

    match cli.command {
        Commands::Fetch {
            id,
            account,
            since,
            max,
            limit,
            exclude,
            inbox,
            history,
            mode,
            handler,
            retries,
        } => {
            let ctx = handler_context(&config, timeout)?;
            let opts = process_options(&config, inbox, mode, handler)?;

            let params = PollParams {
                by_id: id,
                account,
                since,
                max_id: max,
                limit: limit.unwrap_or(config.limit),
                exclude: exclude
                    .map(|raw| split_list(&raw))
                    .unwrap_or_else(|| config.exclude.clone()),
                max_attempts: retries.unwrap_or(config.retry_attempts),
                history: history.or_else(|| config.history.clone().map(PathBuf::from)),
            };

            let summary = mastopipe::pipeline::poll::run(&client, &ctx, &params, &opts).await?;

            eprintln!(
                "{}",
                format!(
                    "Processed {} notifications into {} documents",
                    summary.events, summary.documents
                )
                .bold()
            );
        }

        Commands::Stream {
            exclude,
            inbox,
            history,
            mode,
            handler,
        } => {
            let ctx = handler_context(&config, timeout)?;
            let opts = process_options(&config, inbox, mode, handler)?;

            let params = StreamParams {
                exclude: exclude
                    .map(|raw| split_list(&raw))
                    .unwrap_or_else(|| config.exclude.clone()),
                history: history.or_else(|| config.history.clone().map(PathBuf::from)),
            };

            let summary = mastopipe::pipeline::stream::run(&client, &ctx, &params, &opts).await?;

            eprintln!(
                "{}",
                format!(
                    "Stream ended: {} notifications, {} documents",
                    summary.events, summary.documents
                )
                .bold()
            );
        }

        Commands::Post {
            content,
            visibility,
            retries,
        } => {
            let attempts = retries.unwrap_or(config.retry_attempts);
            let status = mastopipe::backoff::invoke(attempts, || {
                client.post_status(&content, Some(&visibility))
            })
            .await?;

            eprintln!("{}", "Status posted.".bold());
            if let Some(url) = status.url {
                println!("{url}");
            }
        }
    }

    Ok(())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Build the shared handler context for live ingestion.
fn handler_context(config: &config::Config, timeout: Duration) -> Result<HandlerContext> {
    Ok(HandlerContext {
        dereferencer: Arc::new(Dereferencer::new(timeout)?),
        origin: config.origin.clone(),
        split_links: config.split_links,
        fixed_inbox: None,
    })
}

fn process_options(
    config: &config::Config,
    inbox: Option<String>,
    mode: Option<String>,
    handler: Option<String>,
) -> Result<ProcessOptions> {
    let mode: SerializeMode = mode
        .unwrap_or_else(|| config.serialize.clone())
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    Ok(ProcessOptions {
        inbox: inbox.unwrap_or_else(|| config.inbox.clone()),
        mode,
        handler: handler.or_else(|| config.handler.clone()),
    })
}
