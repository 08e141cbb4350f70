//! Prediction index CLI
//!
//! Builds the index and feed from the content tree, and runs the browsing
//! client's update check from the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use predictions::{
    client::{AppContext, Poller},
    config,
    error::{AppError, Result},
    models::Config,
    notify::{DispatchOutcome, LogSink, StaticPrompt},
    pipeline,
    storage::{LocalStorage, ReadStateStore, SiteStorage},
};
use tokio::sync::watch;

/// Prediction index builder and update checker
#[derive(Parser, Debug)]
#[command(name = "predictions", version, about = "Prediction index builder")]
struct Cli {
    /// Path to config file (default: ./predictions.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the content tree and write index.json and feed.xml
    Build,

    /// Report symbols with unread posts or notes
    Check {
        /// Fetch the index from this site instead of the local build output
        #[arg(long)]
        url: Option<String>,
    },

    /// Mark one symbol, or everything, as read
    MarkRead {
        /// Symbol code; omit to mark all
        symbol: Option<String>,

        #[arg(long)]
        url: Option<String>,
    },

    /// Poll the site for updates until interrupted
    Watch {
        #[arg(long)]
        url: Option<String>,
    },

    /// List the most recent posts across symbols
    Latest {
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },

    /// Validate configuration
    Validate,

    /// Show output locations and state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build a client context backed by the local build output or a remote site.
async fn open_context(
    mut config: Config,
    storage: &LocalStorage,
    url: Option<String>,
) -> Result<AppContext> {
    let remote = url.is_some();
    if let Some(url) = url {
        config.site.base_url = url;
    }

    let context = AppContext::connect(config, Arc::new(storage.clone()), Arc::new(LogSink)).await?;
    if remote {
        context.load_index().await?;
    } else {
        let index = storage.load_index().await?.ok_or_else(|| {
            AppError::config(format!(
                "No index at {}. Run 'build' first.",
                storage.index_path().display()
            ))
        })?;
        context.set_index(index).await;
    }
    Ok(context)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::load_from(cli.config.as_deref())?;
    let storage = LocalStorage::from_config(&config);

    match cli.command {
        Command::Build => {
            pipeline::run_build(&config, &storage).await?;
            log::info!("Index written to {}", storage.index_path().display());
        }

        Command::Check { url } => {
            let grant = config.notify.grant;
            let context = open_context(config, &storage, url).await?;
            let updates = context.check_for_updates().await?;

            if !updates.has_updates() {
                log::info!("No unread updates");
                return Ok(());
            }
            for code in &updates.new_posts {
                log::info!("  {code}: new prediction");
            }
            for code in &updates.new_notes {
                log::info!("  {code}: new note");
            }

            context.request_permission(&StaticPrompt::new(grant)).await;
            match context.notify().await? {
                DispatchOutcome::Sent(_) => {}
                outcome => log::debug!("Notification not sent: {outcome:?}"),
            }
        }

        Command::MarkRead { symbol, url } => {
            let context = open_context(config, &storage, url).await?;
            match symbol {
                Some(code) => {
                    if context.mark_symbol_read(&code).await? {
                        log::info!("Marked {code} as read");
                    } else {
                        log::warn!("Unknown symbol: {code}");
                    }
                }
                None => {
                    context.mark_all_read().await?;
                    log::info!("Marked all symbols as read");
                }
            }
        }

        Command::Watch { url } => {
            let grant = config.notify.grant;
            let context = Arc::new(open_context(config, &storage, url).await?);
            context.request_permission(&StaticPrompt::new(grant)).await;

            let (tx, rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = tx.send(true);
                }
            });

            Poller::new(context).run(rx).await;
        }

        Command::Latest { count } => {
            let index = storage.load_index().await?.ok_or_else(|| {
                AppError::config("No index found. Run 'build' first.")
            })?;
            for entry in index.latest_posts(count) {
                log::info!(
                    "{}  [{}] {}",
                    entry.post.date,
                    entry.code,
                    entry.post.title
                );
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if !config.paths.content_root.is_dir() {
                log::warn!(
                    "Content root {} does not exist yet",
                    config.paths.content_root.display()
                );
            }
            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Content root: {}", config.paths.content_root.display());
            log::info!("Index: {}", config.index_path().display());
            log::info!("Feed: {}", config.feed_path().display());
            log::info!("Read state: {}", storage.read_state_path().display());

            match storage.load_index().await? {
                Some(index) => log::info!(
                    "Last built: {} ({} symbols, {} posts, {} notes)",
                    index.last_updated,
                    index.symbols.len(),
                    index.post_count(),
                    index.note_count()
                ),
                None => log::info!("No index built yet."),
            }

            match storage.load_read_state().await? {
                Some(state) => log::info!(
                    "Read state: {} symbols, last checked {}",
                    state.symbols.len(),
                    state.last_checked
                ),
                None => log::info!("No read state yet."),
            }
        }
    }

    Ok(())
}
