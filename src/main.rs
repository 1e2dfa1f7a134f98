//! bilitrack command line
//!
//! Thin wiring around the sync engine: pick a data directory, sync one
//! creator or everyone in the following list, or print a stored
//! listing.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use bilitrack::normalize::{parse_play_count, resolve_pub_date};
use bilitrack::store::now_timestamp;
use bilitrack::{
    BrowserSession, FollowingStore, SessionConfig, SyncEngine, VideoStore, fetch_profile_name,
};

#[derive(Parser, Debug)]
#[command(name = "bilitrack")]
#[command(about = "Track followed bilibili creators by scraping their video listings")]
struct Cli {
    /// Directory holding following.json and the per-creator stores
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Chrome/Chromium binary to drive; system-resolved when unset
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync one creator, or every followed creator when no mid is given
    Sync {
        /// Creator mid to sync
        #[arg(long)]
        mid: Option<String>,
    },
    /// Print the stored videos of one creator
    List {
        /// Creator mid to list
        #[arg(long)]
        mid: String,

        #[arg(long, value_enum, default_value = "date")]
        sort: SortOrder,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortOrder {
    /// Newest publish date first
    Date,
    /// Highest play count first
    Plays,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Sync { ref mid } => run_sync(&cli, mid.as_deref()).await,
        Command::List { ref mid, sort } => run_list(&cli.data_dir, mid, sort),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bilitrack=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run_sync(cli: &Cli, mid: Option<&str>) -> Result<()> {
    let session_config = SessionConfig {
        headless: !cli.headed,
        chrome_executable: cli.chrome.clone(),
        ..SessionConfig::default()
    };
    let engine = SyncEngine::new(session_config.clone(), VideoStore::new(&cli.data_dir));
    let mut following = FollowingStore::load(cli.data_dir.join("following.json"))
        .context("failed to load following list")?;

    match mid {
        Some(mid) => {
            let name = match following.get(mid) {
                Some(subscription) => subscription.name.clone(),
                None => {
                    // Not followed: resolve a display name from the
                    // profile page before crawling.
                    let session = BrowserSession::launch(&session_config).await?;
                    let name = fetch_profile_name(&session, mid).await;
                    session.shutdown().await;
                    name
                }
            };

            let added = engine.sync_creator(mid, &name, None).await?;
            if following.get(mid).is_some() {
                following.mark_synced(mid, now_timestamp());
                following.save().context("failed to save following list")?;
            }
            println!("{name} ({mid}): {added} new videos");
        }
        None => {
            if following.is_empty() {
                println!("following list is empty; nothing to sync");
                return Ok(());
            }

            let reports = engine.sync_all(&mut following, None).await;
            let mut synced = 0;
            for report in &reports {
                match &report.result {
                    Ok(added) => {
                        synced += 1;
                        println!("✓ {} ({}): {} new videos", report.name, report.mid, added);
                    }
                    Err(e) => println!("✗ {} ({}): {e}", report.name, report.mid),
                }
            }
            println!("{synced}/{} creators synced", reports.len());
        }
    }
    Ok(())
}

fn run_list(data_dir: &Path, mid: &str, sort: SortOrder) -> Result<()> {
    let store = VideoStore::new(data_dir);
    let mut records = store
        .load(mid)
        .with_context(|| format!("failed to load store for creator {mid}"))?;
    if records.is_empty() {
        println!("no videos stored for {mid}; run `bilitrack sync --mid {mid}` first");
        return Ok(());
    }

    let today = Local::now().date_naive();
    match sort {
        SortOrder::Date => {
            records.sort_by_key(|r| Reverse(resolve_pub_date(&r.pub_date, today)));
        }
        SortOrder::Plays => {
            records.sort_by_key(|r| Reverse(parse_play_count(&r.play_count).unwrap_or(0)));
        }
    }

    for record in &records {
        println!(
            "{:<10} {:>8} {:>7}  {}",
            record.pub_date, record.play_count, record.duration, record.title
        );
        println!("           {}", record.url);
    }
    println!("{} videos", records.len());
    Ok(())
}
