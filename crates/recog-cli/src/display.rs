//! Text cards for queue, insight, pattern, report and pillar state.
//!
//! Every renderer returns a `String` so the one-shot subcommands and the
//! interactive browser print the same thing. Cross references in detail
//! cards are numbered from 1 in the order `Workbench::cross_refs` yields them,
//! so `go <n>` follows the n-th numbered line.

use std::fmt::Write as _;

use recog_core::text::{capitalize, group_thousands, relative_time, truncate_chars};
use recog_core::{
    Insight, Operation, OperationStatus, OperationType, Pattern, PillarStatus, ProgressionSummary,
    Report, StatusSnapshot, Timestamp,
};
use recog_store::{ActiveDetail, InsightStore, Notice, NoticeLevel, OperationQueue, ProcessSummary};

const MAX_LIST_ITEMS: usize = 10;
const SUMMARY_CHARS: usize = 72;

fn op_icon(kind: &OperationType) -> &'static str {
    match kind {
        OperationType::Extract => "📥",
        OperationType::ExtractDocs => "📄",
        OperationType::Correlate => "🔗",
        OperationType::Synthesise => "✨",
        OperationType::FullSweep => "🔄",
        OperationType::Other(_) => "⚙",
    }
}

fn pillar_icon(status: PillarStatus) -> &'static str {
    match status {
        PillarStatus::Populated => "✓",
        PillarStatus::Seeded => "◐",
        PillarStatus::Empty => "○",
    }
}

fn when(at: Option<Timestamp>, now: Timestamp) -> String {
    at.map(|t| relative_time(t, now))
        .unwrap_or_else(|| "unknown".to_string())
}

// ── Queue ──

pub fn operation_card(op: &Operation, status: OperationStatus, now: Timestamp) -> String {
    let mut out = String::new();
    let kind = &op.operation_type;
    let title = match kind.tier_label() {
        Some(tier) => format!("{} {}  ({tier})", op_icon(kind), kind.label()),
        None => format!("{} {}", op_icon(kind), kind.label()),
    };
    let _ = writeln!(out, "{:<44} ◆ {}", title, op.estimated_mana);
    let _ = writeln!(out, "   [{}] {}", op.id, op.description);
    let tokens = op
        .estimated_tokens
        .map(group_thousands)
        .unwrap_or_else(|| "?".to_string());
    let _ = writeln!(
        out,
        "   ~{} tokens • {} source(s) • Queued {}",
        tokens,
        op.source_count,
        when(op.queued_at, now)
    );
    let action = match status {
        OperationStatus::Pending => format!("pending    → confirm {0} | cancel {0}", op.id),
        OperationStatus::Ready => format!("✓ confirmed → unconfirm with cancel {}", op.id),
        OperationStatus::Processing => "processing...".to_string(),
        OperationStatus::Done => "done".to_string(),
        OperationStatus::Failed => "failed".to_string(),
    };
    let _ = writeln!(out, "   {action}");
    out
}

pub fn queue_view(queue: &OperationQueue, now: Timestamp) -> String {
    let mut out = String::new();
    if queue.operations().is_empty() {
        let _ = writeln!(out, "○ No pending operations");
        let _ = writeln!(out, "  Run `check` to scan for new content");
        return out;
    }
    let _ = writeln!(out, "=== Pending operations ({}) ===", queue.badge_count());
    for op in queue.operations() {
        out.push_str(&operation_card(op, queue.effective_status(op), now));
    }
    let ready = queue.ready_count();
    let hint = if queue.is_processing() {
        "batch running"
    } else if queue.can_process() {
        "run `process` to start"
    } else {
        "confirm operations to enable processing"
    };
    let _ = writeln!(out, "Ready: {ready}  ({hint})");
    out
}

pub fn process_summary(summary: &ProcessSummary) -> String {
    let mut out = String::new();
    for r in &summary.results {
        let label = r.operation_type.as_ref().map_or("Operation", |t| t.label());
        if r.success {
            let _ = writeln!(
                out,
                "  ✓ [{}] {}: {} insight(s), {} pattern(s), {} synthes(es), ◆ {} spent, {} tokens",
                r.operation_id,
                label,
                r.insights_created,
                r.patterns_found,
                r.syntheses_generated,
                r.mana_spent,
                group_thousands(r.tokens_used)
            );
        } else {
            let _ = writeln!(
                out,
                "  ✗ [{}] {}: {}",
                r.operation_id,
                label,
                r.error.as_deref().unwrap_or("failed")
            );
        }
    }
    out
}

pub fn status_card(status: &StatusSnapshot, badge: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== ReCog status ===");
    let _ = writeln!(
        out,
        "  {:<20} {}",
        "LLM",
        if status.llm_available { "available" } else { "unavailable" }
    );
    let _ = writeln!(out, "  {:<20} {}", "hot sessions", status.hot_sessions);
    let _ = writeln!(out, "  {:<20} {}", "pending insights", status.pending_insights);
    let _ = writeln!(out, "  {:<20} {}", "patterns", status.patterns);
    let _ = writeln!(out, "  {:<20} {}", "queued operations", badge);
    for (state, count) in &status.queue {
        let _ = writeln!(out, "    {state:<18} {count}");
    }
    out
}

// ── Lists ──

fn insight_row(insight: &Insight) -> String {
    let tier = insight
        .significance_tier
        .map(|t| t.as_str())
        .unwrap_or("-");
    let flag = if insight.flagged { "⚑" } else { " " };
    let reviewed = if insight.reviewed { "✓" } else { " " };
    format!(
        "  {flag}{reviewed} [{}] {:<7} {}",
        insight.id,
        tier,
        truncate_chars(&insight.summary, SUMMARY_CHARS)
    )
}

pub fn insight_list(store: &InsightStore) -> String {
    let mut out = String::new();
    let list = store.list();
    let shown = list.query();
    let mut header = format!(
        "=== Insights: {} of {} ({})",
        list.len(),
        list.total(),
        shown.filter
    );
    if let Some(search) = shown.search.as_deref()
        && !search.trim().is_empty()
    {
        let _ = write!(header, ", search \"{search}\"");
    }
    let _ = writeln!(out, "{header} ===");
    if list.is_empty() {
        let _ = writeln!(out, "  No insights match.");
    }
    for insight in list.items() {
        let _ = writeln!(out, "{}", insight_row(insight));
    }
    if list.has_more() {
        let _ = writeln!(out, "  ... `more` loads the next page");
    }
    out
}

pub fn pattern_list(patterns: &[Pattern]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Patterns ({}) ===", patterns.len());
    if patterns.is_empty() {
        let _ = writeln!(out, "  No patterns yet.");
    }
    for p in patterns {
        let _ = writeln!(
            out,
            "  [{}] {:<12} {:.2}  {}",
            p.id,
            p.pattern_type,
            p.strength,
            truncate_chars(&p.summary, SUMMARY_CHARS)
        );
    }
    out
}

pub fn report_list(reports: &[Report], now: Timestamp) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Reports ({}) ===", reports.len());
    if reports.is_empty() {
        let _ = writeln!(out, "  No ReCog reports yet.");
        let _ = writeln!(out, "  Reports are generated after Tier 3 synthesis completes.");
    }
    for r in reports {
        let _ = writeln!(
            out,
            "  [{}] {}  {}",
            r.id,
            capitalize(&r.report_type),
            when(r.created_at, now)
        );
        let _ = writeln!(
            out,
            "      {} insight(s) • {} pattern(s) • {} synthes(es)",
            r.insights_count, r.patterns_count, r.syntheses_count
        );
        if !r.summary.is_empty() {
            let _ = writeln!(out, "      {}", truncate_chars(&r.summary, SUMMARY_CHARS));
        }
    }
    out
}

// ── Detail cards ──

pub fn detail_card(detail: ActiveDetail<'_>, now: Timestamp) -> String {
    match detail {
        ActiveDetail::Insight(insight) => insight_card(insight, now),
        ActiveDetail::Pattern(pattern) => pattern_card(pattern),
        ActiveDetail::Report(report) => report_card(report, now),
    }
}

pub fn insight_card(insight: &Insight, now: Timestamp) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Insight {} ===", insight.id);
    let _ = writeln!(out, "{}", insight.summary);
    let _ = writeln!(out);
    let tier = insight
        .significance_tier
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "  {:<14} {} ({:.2})", "significance", tier, insight.significance);
    if !insight.themes.is_empty() {
        let _ = writeln!(out, "  {:<14} {}", "themes", insight.themes.join(", "));
    }
    let mut state = Vec::new();
    if insight.flagged {
        state.push("flagged".to_string());
    }
    if insight.reviewed {
        state.push(match insight.reviewed_at {
            Some(at) => format!("reviewed {}", relative_time(at, now)),
            None => "reviewed".to_string(),
        });
    }
    if insight.rejected {
        state.push("rejected".to_string());
    }
    if !state.is_empty() {
        let _ = writeln!(out, "  {:<14} {}", "state", state.join(", "));
    }
    let _ = writeln!(out, "  {:<14} {}", "created", when(insight.created_at, now));
    if let Some(context) = &insight.user_context {
        let _ = writeln!(out, "  {:<14} {}", "context", context);
    }

    if !insight.sources.is_empty() {
        let _ = writeln!(out, "  sources ({}):", insight.sources.len());
        for s in insight.sources.iter().take(MAX_LIST_ITEMS) {
            let _ = writeln!(out, "    {:<10} {}", s.source_type, s.title);
            if let Some(excerpt) = &s.excerpt {
                let _ = writeln!(out, "      \"{}\"", truncate_chars(excerpt, 60));
            }
        }
        if insight.sources.len() > MAX_LIST_ITEMS {
            let _ = writeln!(out, "    ... and {} more", insight.sources.len() - MAX_LIST_ITEMS);
        }
    }

    if !insight.linked_patterns.is_empty() {
        let _ = writeln!(out, "  linked patterns:");
        for (n, p) in insight.linked_patterns.iter().enumerate() {
            let label = p.pattern_type.as_deref().unwrap_or("pattern");
            let summary = p.summary.as_deref().unwrap_or("");
            let _ = writeln!(
                out,
                "    {:>2}. → pattern {} ({label}) {}",
                n + 1,
                p.id,
                truncate_chars(summary, 50)
            );
        }
    }
    out
}

pub fn pattern_card(pattern: &Pattern) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Pattern {} ===", pattern.id);
    let _ = writeln!(out, "{}", pattern.summary);
    let _ = writeln!(out);
    let _ = writeln!(out, "  {:<14} {}", "type", pattern.pattern_type);
    let _ = writeln!(out, "  {:<14} {:.2}", "strength", pattern.strength);
    if !pattern.insights.is_empty() {
        let _ = writeln!(out, "  insights:");
        for (n, i) in pattern.insights.iter().enumerate() {
            let _ = writeln!(out, "    {:>2}. → insight {}", n + 1, insight_ref_text(i));
        }
    }
    out
}

pub fn report_card(report: &Report, now: Timestamp) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "=== {} report {} ===",
        capitalize(&report.report_type),
        report.id
    );
    if !report.summary.is_empty() {
        let _ = writeln!(out, "{}", report.summary);
    }
    let _ = writeln!(out, "  {:<14} {}", "created", when(report.created_at, now));

    if !report.conclusions.is_empty() {
        let _ = writeln!(out, "  conclusions:");
        for c in &report.conclusions {
            match c.confidence {
                Some(conf) => {
                    let _ = writeln!(out, "    • {} ({:.0}%)", c.text, conf * 100.0);
                }
                None => {
                    let _ = writeln!(out, "    • {}", c.text);
                }
            }
        }
    }
    if !report.syntheses.is_empty() {
        let _ = writeln!(out, "  syntheses:");
        for s in &report.syntheses {
            let kind = s.synthesis_type.as_deref().unwrap_or("synthesis");
            let _ = writeln!(out, "    • [{kind}] {}", s.summary);
        }
    }

    let mut n = 0;
    if !report.patterns.is_empty() {
        let _ = writeln!(out, "  patterns:");
        for p in &report.patterns {
            n += 1;
            let summary = p.summary.as_deref().unwrap_or("");
            let _ = writeln!(
                out,
                "    {n:>2}. → pattern {} {}",
                p.id,
                truncate_chars(summary, 50)
            );
        }
    }
    if !report.insights.is_empty() {
        let _ = writeln!(out, "  insights:");
        for i in &report.insights {
            n += 1;
            let _ = writeln!(out, "    {n:>2}. → insight {}", insight_ref_text(i));
        }
    }
    out
}

fn insight_ref_text(i: &recog_core::InsightRef) -> String {
    let mut text = i.id.to_string();
    if let Some(tier) = i.significance_tier {
        let _ = write!(text, " [{tier}]");
    }
    if let Some(summary) = &i.summary {
        let _ = write!(text, " {}", truncate_chars(summary, 50));
    }
    text
}

// ── Progression ──

pub fn progression_card(summary: &ProgressionSummary, now: Timestamp) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Progression: {} ===", capitalize(&summary.stage));
    if let Some(at) = summary.stage_entered_at {
        let _ = writeln!(out, "  since {}", at.format("%Y-%m-%d"));
        let _ = writeln!(out, "  ({})", relative_time(at, now));
    }
    let _ = writeln!(out, "  {:<14} {}", "core memories", summary.core_memory_count);
    let _ = writeln!(
        out,
        "  {:<14} {} populated, {} seeded",
        "pillars",
        summary.count(PillarStatus::Populated),
        summary.count(PillarStatus::Seeded)
    );
    for row in &summary.rows {
        let mut line = format!(
            "  {} {:<8} {:<10}",
            pillar_icon(row.status),
            row.name.title(),
            row.status.as_str()
        );
        if let Some(preview) = &row.preview {
            let _ = write!(line, " {preview}");
        }
        if let Some(more) = row.more_suffix() {
            let _ = write!(line, " ({more})");
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

pub fn notice_line(notice: &Notice) -> String {
    let icon = match notice.level {
        NoticeLevel::Success => "✓",
        NoticeLevel::Error => "✗",
    };
    format!("{icon} {}", notice.message)
}
