//! `recog`: review and drive the ReCog memory forge from a terminal.

mod browse;
mod display;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use recog_client::{ClientConfig, DEFAULT_BASE_URL, InsightFilter, RecogClient};
use recog_core::{DetailRef, RecordId, Tab};
use recog_store::{NoticeLevel, Workbench, WorkbenchConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recog", version, about = "Review and drive the ReCog memory forge")]
struct Cli {
    /// API root in front of `/recog/...`
    #[arg(long, env = "RECOG_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "RECOG_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout: u64,

    /// Insights per page
    #[arg(long, env = "RECOG_PAGE_SIZE", default_value_t = 20, global = true)]
    page_size: u32,

    /// Quiet period before a typed search is sent (browse only)
    #[arg(long, env = "RECOG_DEBOUNCE_MS", default_value_t = 300, global = true)]
    debounce_ms: u64,

    /// Breadcrumbs kept for `back` (browse only)
    #[arg(long, env = "RECOG_NAV_DEPTH", default_value_t = 1, global = true)]
    nav_depth: usize,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Server health and queue counters
    Status,
    /// Scan for new work and list the queue
    Check,
    /// List pending, ready and processing operations
    Pending,
    /// Confirm a pending operation
    Confirm { id: String },
    /// Return a confirmed operation to pending
    Cancel { id: String },
    /// Process every confirmed operation as one batch
    Process,
    /// List insights
    Insights {
        /// Free-text search
        #[arg(long, short)]
        search: Option<String>,
        /// all | flagged | reviewed | unreviewed | rejected
        #[arg(long, short, default_value = "all")]
        filter: InsightFilter,
        /// Page size (defaults to --page-size)
        #[arg(long)]
        limit: Option<u32>,
        /// Keep loading pages until everything is shown
        #[arg(long)]
        all: bool,
    },
    /// Show one insight
    Insight { id: String },
    /// Toggle an insight's flag
    Flag { id: String },
    /// Set reviewer context on an insight (empty text clears it)
    Context { id: String, text: Vec<String> },
    /// Reject an insight, or restore it with --restore
    Reject {
        id: String,
        #[arg(long)]
        restore: bool,
    },
    /// List patterns
    Patterns {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one pattern
    Pattern { id: String },
    /// List reports
    Reports,
    /// Show one report
    Report { id: String },
    /// Six-pillar progression summary
    Progression,
    /// Interactive browser
    Browse,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print success notices; turn a failed intent into an error carrying its
/// notices. When the intent itself succeeded, follow-up failures go to
/// stderr as warnings.
fn settle(wb: &mut Workbench, ok: bool) -> Result<()> {
    let mut errors = Vec::new();
    for notice in wb.take_notices() {
        match notice.level {
            NoticeLevel::Success => println!("{}", display::notice_line(&notice)),
            NoticeLevel::Error if ok => eprintln!("{}", display::notice_line(&notice)),
            NoticeLevel::Error => errors.push(notice.message),
        }
    }
    if ok {
        return Ok(());
    }
    if errors.is_empty() {
        bail!("request failed");
    }
    bail!(errors.join("; "))
}

fn print_detail(wb: &Workbench) {
    let now = Utc::now();
    if let Some(detail) = wb.active_detail() {
        print!("{}", display::detail_card(detail, now));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ClientConfig::new(cli.base_url.clone())
        .with_timeout(Duration::from_secs(cli.timeout));
    let client = RecogClient::new(&config).context("building HTTP client")?;
    info!(base_url = %client.base_url(), "recog v{}", env!("CARGO_PKG_VERSION"));

    let page_size = match &cli.command {
        Command::Insights {
            limit: Some(limit), ..
        } => *limit,
        _ => cli.page_size,
    };
    let mut wb = Workbench::new(
        Arc::new(client),
        WorkbenchConfig {
            page_size,
            nav_depth: cli.nav_depth,
        },
    );
    let now = Utc::now();

    match cli.command {
        Command::Status => {
            let ok = wb.refresh_status().await && wb.refresh_queue().await;
            settle(&mut wb, ok)?;
            if let Some(status) = wb.status() {
                print!("{}", display::status_card(status, wb.queue().badge_count()));
            }
        }
        Command::Check => {
            let ok = wb.check().await;
            settle(&mut wb, ok)?;
            print!("{}", display::queue_view(wb.queue(), now));
        }
        Command::Pending => {
            let ok = wb.refresh_queue().await;
            settle(&mut wb, ok)?;
            print!("{}", display::queue_view(wb.queue(), now));
        }
        Command::Confirm { id } => {
            let ok = wb.confirm(&RecordId::new(id)).await;
            settle(&mut wb, ok)?;
            print!("{}", display::queue_view(wb.queue(), now));
        }
        Command::Cancel { id } => {
            let ok = wb.cancel(&RecordId::new(id)).await;
            settle(&mut wb, ok)?;
            print!("{}", display::queue_view(wb.queue(), now));
        }
        Command::Process => {
            let ok = wb.refresh_queue().await;
            settle(&mut wb, ok)?;
            let summary = wb.process().await;
            if let Some(summary) = &summary {
                print!("{}", display::process_summary(summary));
            }
            settle(&mut wb, summary.is_some_and(|s| s.failed == 0))?;
        }
        Command::Insights {
            search,
            filter,
            all,
            ..
        } => {
            let mut ok = wb.query_insights(search, filter).await;
            while ok && all && wb.insights().list().has_more() {
                ok = wb.load_more().await;
            }
            settle(&mut wb, ok)?;
            print!("{}", display::insight_list(wb.insights()));
        }
        Command::Insight { id } => {
            let ok = wb.open(DetailRef::Insight(RecordId::new(id))).await;
            settle(&mut wb, ok)?;
            print_detail(&wb);
        }
        Command::Flag { id } => {
            let id = RecordId::new(id);
            let ok = wb.open(DetailRef::Insight(id.clone())).await
                && wb.toggle_flag(&id).await.is_some();
            settle(&mut wb, ok)?;
        }
        Command::Context { id, text } => {
            let ok = wb.save_context(&RecordId::new(id), &text.join(" ")).await;
            settle(&mut wb, ok)?;
        }
        Command::Reject { id, restore } => {
            let id = RecordId::new(id);
            let ok = if restore {
                wb.restore(&id).await
            } else {
                wb.reject(&id).await
            };
            settle(&mut wb, ok)?;
            if restore {
                print_detail(&wb);
            }
        }
        Command::Patterns { limit } => {
            let ok = wb.load_patterns(limit).await;
            settle(&mut wb, ok)?;
            print!("{}", display::pattern_list(wb.patterns().list().items()));
        }
        Command::Pattern { id } => {
            let ok = wb.open(DetailRef::Pattern(RecordId::new(id))).await;
            settle(&mut wb, ok)?;
            print_detail(&wb);
        }
        Command::Reports => {
            let ok = wb.load_reports().await;
            settle(&mut wb, ok)?;
            print!("{}", display::report_list(wb.reports().list().items(), now));
        }
        Command::Report { id } => {
            let ok = wb.open(DetailRef::Report(RecordId::new(id))).await;
            settle(&mut wb, ok)?;
            print_detail(&wb);
        }
        Command::Progression => {
            wb.show_tab(Tab::Progression).await;
            let ok = wb.progression().is_some();
            settle(&mut wb, ok)?;
            if let Some(summary) = wb.progression() {
                print!("{}", display::progression_card(summary, now));
            }
        }
        Command::Browse => {
            browse::run(wb, Duration::from_millis(cli.debounce_ms)).await?;
        }
    }
    Ok(())
}
