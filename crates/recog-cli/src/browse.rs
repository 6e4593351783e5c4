//! `recog browse`: a line-driven binder over one [`Workbench`].
//!
//! Stdin lines and completed background fetches are multiplexed in one
//! `select!` loop on the current thread. Free-text search is debounced and
//! fetched off-loop; its page comes back over the completion channel and is
//! applied only if no newer search was issued meanwhile.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use recog_client::{ClientError, InsightFilter, Page, RecogApi};
use recog_core::{DetailRef, EntityKind, Insight, RecordId, Tab};
use recog_store::{Debouncer, PageTicket, Workbench};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::display;

const HELP: &str = "\
commands:
  tab <queue|insights|reports|progression>   switch tab
  search [text]        search insights (empty clears)
  filter <all|flagged|reviewed|unreviewed|rejected>
  more                 load the next page of insights
  open [kind] <id>     open an insight, pattern or report
  go <n>               follow link n of the open pane
  back | close         previous pane | close the pane
  flag [id]            toggle flag on the open (or given) insight
  note <text>          save context on the open insight (empty clears)
  reject [id]          reject the open (or given) insight
  restore <id>         un-reject an insight
  check | ops          scan for new work | show the queue
  confirm <id> | cancel <id> | process
  progress             six-pillar progression
  help | quit";

#[derive(Debug, Clone, PartialEq)]
enum Intent {
    Show,
    Tab(Tab),
    Search(Option<String>),
    Filter(InsightFilter),
    More,
    Open(DetailRef),
    Go(usize),
    Back,
    Close,
    Flag(Option<RecordId>),
    Note(String),
    Reject(Option<RecordId>),
    Restore(RecordId),
    Check,
    Ops,
    Confirm(RecordId),
    Cancel(RecordId),
    Process,
    Progress,
    Help,
    Quit,
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let id = |what: &str| -> Result<RecordId, String> {
            if rest.is_empty() {
                Err(format!("usage: {what} <id>"))
            } else {
                Ok(RecordId::new(rest))
            }
        };
        let optional_id = || (!rest.is_empty()).then(|| RecordId::new(rest));

        Ok(match word.to_ascii_lowercase().as_str() {
            "" => Self::Show,
            "tab" => Self::Tab(rest.parse().map_err(|e| format!("{e}"))?),
            "search" | "s" => Self::Search((!rest.is_empty()).then(|| rest.to_string())),
            "filter" => Self::Filter(rest.parse().map_err(|e| format!("{e}"))?),
            "more" => Self::More,
            "open" => Self::Open(parse_target(rest)?),
            "go" => {
                let n: usize = rest
                    .parse()
                    .map_err(|_| "usage: go <n>".to_string())?;
                if n == 0 {
                    return Err("links are numbered from 1".to_string());
                }
                Self::Go(n - 1)
            }
            "back" => Self::Back,
            "close" => Self::Close,
            "flag" => Self::Flag(optional_id()),
            "note" => Self::Note(rest.to_string()),
            "reject" => Self::Reject(optional_id()),
            "restore" => Self::Restore(id("restore")?),
            "check" => Self::Check,
            "ops" => Self::Ops,
            "confirm" => Self::Confirm(id("confirm")?),
            "cancel" => Self::Cancel(id("cancel")?),
            "process" => Self::Process,
            "progress" => Self::Progress,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command {other:?}; try `help`")),
        })
    }
}

/// `open 17`, `open pattern 5`, `open r 2`.
fn parse_target(rest: &str) -> Result<DetailRef, String> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(id), None) => Ok(DetailRef::Insight(RecordId::new(id))),
        (Some(kind), Some(id)) => {
            let kind: EntityKind = kind.parse().map_err(|e| format!("{e}"))?;
            Ok(DetailRef::new(kind, RecordId::new(id)))
        }
        _ => Err("usage: open [insight|pattern|report] <id>".to_string()),
    }
}

/// A background fetch that finished.
enum Completion {
    Insights(PageTicket, Result<Page<Insight>, ClientError>),
}

fn tab_bar(wb: &Workbench) -> String {
    Tab::ALL
        .iter()
        .map(|&tab| {
            let label = match tab {
                Tab::Queue => format!("queue ({})", wb.queue().badge_count()),
                other => other.to_string(),
            };
            if tab == wb.tab() {
                format!("[{label}]")
            } else {
                format!(" {label} ")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The active pane when it belongs to the current tab, else the tab's list.
fn render(wb: &Workbench) {
    let now = Utc::now();
    println!("{}", tab_bar(wb));
    if let Some(active) = wb.active()
        && active.owning_tab() == wb.tab()
        && let Some(detail) = wb.active_detail()
    {
        print!("{}", display::detail_card(detail, now));
        if let Some(previous) = wb.navigator().back_target() {
            println!("(`back` returns to {previous})");
        }
        return;
    }
    match wb.tab() {
        Tab::Queue => print!("{}", display::queue_view(wb.queue(), now)),
        Tab::Insights => print!("{}", display::insight_list(wb.insights())),
        Tab::Reports => print!("{}", display::report_list(wb.reports().list().items(), now)),
        Tab::Progression => match wb.progression() {
            Some(summary) => print!("{}", display::progression_card(summary, now)),
            None => println!("(progression not loaded)"),
        },
    }
}

fn flush_notices(wb: &mut Workbench) {
    for notice in wb.take_notices() {
        println!("{}", display::notice_line(&notice));
    }
}

fn need_insight(wb: &mut Workbench, id: Option<RecordId>) -> Option<RecordId> {
    let id = id.or_else(|| wb.active_insight());
    if id.is_none() {
        wb.notify_error("No insight is open");
    }
    id
}

/// Apply one intent. Returns `false` to quit.
async fn execute(
    wb: &mut Workbench,
    intent: Intent,
    debouncer: &mut Debouncer,
    done: &mpsc::UnboundedSender<Completion>,
) -> bool {
    match intent {
        Intent::Show => {}
        Intent::Tab(tab) => {
            if tab == Tab::Insights {
                // the refresh re-issues any typed search
                debouncer.cancel();
            }
            wb.show_tab(tab).await
        }
        Intent::Search(text) => {
            wb.set_tab(Tab::Insights);
            let filter = wb.insights().filter();
            let ticket = wb.insights_mut().begin_query(text, filter);
            let api = wb.api();
            let done = done.clone();
            debouncer.schedule(async move {
                let result = api.insights(&ticket.query).await;
                let _ = done.send(Completion::Insights(ticket, result));
            });
            return true;
        }
        Intent::Filter(filter) => {
            debouncer.cancel();
            wb.set_tab(Tab::Insights);
            wb.set_filter(filter).await;
        }
        Intent::More => {
            wb.set_tab(Tab::Insights);
            wb.load_more().await;
        }
        Intent::Open(target) => {
            wb.open(target).await;
        }
        Intent::Go(index) => {
            wb.follow(index).await;
        }
        Intent::Back => {
            wb.back().await;
        }
        Intent::Close => wb.close(),
        Intent::Flag(id) => {
            if let Some(id) = need_insight(wb, id) {
                wb.toggle_flag(&id).await;
            }
        }
        Intent::Note(text) => {
            if let Some(id) = need_insight(wb, None) {
                wb.save_context(&id, &text).await;
            }
        }
        Intent::Reject(id) => {
            if let Some(id) = need_insight(wb, id) {
                wb.reject(&id).await;
            }
        }
        Intent::Restore(id) => {
            wb.restore(&id).await;
        }
        Intent::Check => {
            wb.set_tab(Tab::Queue);
            wb.check().await;
        }
        Intent::Ops => wb.show_tab(Tab::Queue).await,
        Intent::Confirm(id) => {
            wb.set_tab(Tab::Queue);
            wb.confirm(&id).await;
        }
        Intent::Cancel(id) => {
            wb.set_tab(Tab::Queue);
            wb.cancel(&id).await;
        }
        Intent::Process => {
            wb.set_tab(Tab::Queue);
            if let Some(summary) = wb.process().await {
                print!("{}", display::process_summary(&summary));
            }
        }
        Intent::Progress => wb.show_tab(Tab::Progression).await,
        Intent::Help => {
            println!("{HELP}");
            return true;
        }
        Intent::Quit => return false,
    }
    flush_notices(wb);
    render(wb);
    true
}

pub async fn run(mut wb: Workbench, debounce: Duration) -> Result<()> {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let mut debouncer = Debouncer::new(debounce);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    wb.refresh_status().await;
    wb.show_tab(Tab::Queue).await;
    if let Some(status) = wb.status()
        && !status.llm_available
    {
        println!("✗ LLM unavailable: processing will fail until it is back");
    }
    flush_notices(&mut wb);
    render(&wb);
    println!("(`help` lists commands)");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match line.parse::<Intent>() {
                    Ok(intent) => {
                        debug!(?intent, "intent");
                        if !execute(&mut wb, intent, &mut debouncer, &done_tx).await {
                            break;
                        }
                    }
                    Err(msg) => println!("{msg}"),
                }
            }
            Some(done) = done_rx.recv() => match done {
                Completion::Insights(ticket, result) => {
                    if wb.apply_insight_page(ticket, result) {
                        render(&wb);
                    }
                    flush_notices(&mut wb);
                }
            },
        }
    }
    debouncer.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation_intents() {
        assert_eq!(
            "open 17".parse::<Intent>().unwrap(),
            Intent::Open(DetailRef::Insight("17".into()))
        );
        assert_eq!(
            "open pattern 5".parse::<Intent>().unwrap(),
            Intent::Open(DetailRef::Pattern("5".into()))
        );
        assert_eq!("go 2".parse::<Intent>().unwrap(), Intent::Go(1));
        assert!("go 0".parse::<Intent>().is_err());
        assert_eq!("back".parse::<Intent>().unwrap(), Intent::Back);
    }

    #[test]
    fn search_text_is_kept_whole() {
        assert_eq!(
            "search  grief and loss ".parse::<Intent>().unwrap(),
            Intent::Search(Some("grief and loss".into()))
        );
        assert_eq!("search".parse::<Intent>().unwrap(), Intent::Search(None));
    }

    #[test]
    fn queue_intents_need_ids() {
        assert_eq!(
            "confirm 3".parse::<Intent>().unwrap(),
            Intent::Confirm("3".into())
        );
        assert!("cancel".parse::<Intent>().is_err());
        assert_eq!("flag".parse::<Intent>().unwrap(), Intent::Flag(None));
    }

    #[test]
    fn tabs_and_filters_parse() {
        assert_eq!(
            "tab reports".parse::<Intent>().unwrap(),
            Intent::Tab(Tab::Reports)
        );
        assert_eq!(
            "filter unreviewed".parse::<Intent>().unwrap(),
            Intent::Filter(InsightFilter::Unreviewed)
        );
        assert!("filter starred".parse::<Intent>().is_err());
        assert!("dance".parse::<Intent>().is_err());
    }
}
