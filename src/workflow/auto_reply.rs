use chrono::{DateTime, FixedOffset};
use tracing::{info, warn};

use crate::context::AppContext;
use crate::domain::ticket::Ticket;
use crate::error::AppResult;
use crate::watermark::WatermarkStore;
use crate::workflow::reply::generate_reply;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub ignore_window: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    OutsideWindow {
        now: DateTime<FixedOffset>,
    },
    NoCandidates,
    DryRun {
        since: DateTime<FixedOffset>,
        candidates: Vec<String>,
    },
    Processed {
        processed: usize,
        skipped: usize,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub processed: usize,
    pub skipped: usize,
}

/// One polling pass: window check, watermark, search, per-ticket processing, watermark save.
///
/// The watermark is only advanced when the batch runs to completion; an error
/// leaves it untouched so unprocessed candidates are found again next run.
pub async fn run_auto_reply(
    ctx: &AppContext,
    now: DateTime<FixedOffset>,
    options: RunOptions,
) -> AppResult<RunOutcome> {
    if !options.ignore_window && !ctx.config.window.contains_instant(&now) {
        info!(
            now = %now.format("%H:%M"),
            start = %ctx.config.window.start.format("%H:%M"),
            end = %ctx.config.window.end.format("%H:%M"),
            "outside reply window"
        );
        return Ok(RunOutcome::OutsideWindow { now });
    }

    let store = WatermarkStore::new(&ctx.config.last_run_path);
    let since = store.load(now);
    info!(since = %since.to_rfc3339(), "searching for new tickets");

    let tickets = ctx.issue_tracker.search_candidates(since).await?;

    if options.dry_run {
        return Ok(RunOutcome::DryRun {
            since,
            candidates: tickets.into_iter().map(|ticket| ticket.key).collect(),
        });
    }

    if tickets.is_empty() {
        store.save(now)?;
        return Ok(RunOutcome::NoCandidates);
    }

    let summary = process_tickets(ctx, &tickets).await?;
    store.save(now)?;
    info!(path = %store.path().display(), "advanced watermark");

    Ok(RunOutcome::Processed {
        processed: summary.processed,
        skipped: summary.skipped,
    })
}

/// Processes tickets in order, stopping at the first failure.
pub async fn process_tickets(ctx: &AppContext, tickets: &[Ticket]) -> AppResult<ProcessSummary> {
    let mut summary = ProcessSummary::default();
    for ticket in tickets {
        if ticket.key.trim().is_empty() {
            warn!("skipping search result without an issue key");
            summary.skipped += 1;
            continue;
        }
        process_ticket(ctx, ticket).await?;
        summary.processed += 1;
    }
    Ok(summary)
}

async fn process_ticket(ctx: &AppContext, ticket: &Ticket) -> AppResult<()> {
    let key = ticket.key.as_str();
    info!(
        issue = key,
        status = ticket.status.as_deref().unwrap_or("-"),
        status_detail = ticket.status_detail.as_deref().unwrap_or("-"),
        assignee = ticket.assignee.as_deref().unwrap_or("-"),
        "processing ticket"
    );

    let reply = generate_reply(ctx, ticket).await?;
    ctx.issue_tracker.add_comment(key, &reply).await?;
    info!(issue = key, "posted acknowledgement");

    let assignee = ctx.config.jira_assignee_account_id.as_str();
    ctx.issue_tracker.assign_issue(key, assignee).await?;
    info!(issue = key, assignee, "assigned ticket");

    for transition in ctx.config.transition_sequence() {
        ctx.issue_tracker.transition_issue(key, transition).await?;
        info!(issue = key, transition, "applied transition");
    }

    Ok(())
}
