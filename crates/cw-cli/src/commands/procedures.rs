//! Procedures command implementations (PostgreSQL only)

use anyhow::{Context, Result};
use cw_migrate::procedures;

use crate::cli::{CleanupArgs, GlobalArgs, InstallArgs, OutputFormat, ProcessArgs, StatsArgs};
use crate::commands::common::print_json;
use crate::context::CommandContext;

/// Install the basic or enhanced bundle
pub fn install(args: &InstallArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = CommandContext::load(global)?;
    let mut db = ctx.connect()?;

    if args.enhanced {
        procedures::install_enhanced(db.as_mut())
            .context("Failed to install enhanced DLQ procedures")?;
        println!("Installed enhanced DLQ procedures");
    } else {
        procedures::install_basic(db.as_mut()).context("Failed to install DLQ procedures")?;
        println!("Installed basic DLQ procedures");
    }
    Ok(())
}

/// Print queue statistics, plus health figures when the enhanced bundle is
/// installed
pub fn stats(args: &StatsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = CommandContext::load(global)?;
    let mut db = ctx.connect()?;

    let stats = procedures::get_dlq_statistics(db.as_mut())
        .context("Failed to read DLQ statistics (are the procedures installed?)")?;
    let health = if procedures::bundle_status(db.as_mut()).enhanced {
        Some(procedures::get_dlq_health_stats(db.as_mut()).context("Failed to read DLQ health")?)
    } else {
        None
    };

    if args.output == OutputFormat::Json {
        return print_json(&serde_json::json!({ "statistics": stats, "health": health }));
    }

    println!("Dead letter events: {}", stats.total_events);
    println!("  unresolved: {}", stats.unresolved_events);
    println!("  resolved:   {}", stats.resolved_events);
    if let Some(oldest) = &stats.oldest_unresolved {
        println!("  oldest unresolved: {oldest}");
    }
    if let Some(reasons) = stats.top_reasons.as_object().filter(|r| !r.is_empty()) {
        println!("Top reasons:");
        for (reason, count) in reasons {
            println!("  {reason}: {count}");
        }
    }
    if let Some(h) = health {
        println!("Health:");
        println!("  locked:          {}", h.locked_events);
        println!("  high retry:      {}", h.high_retry_events);
        println!("  high priority:   {}", h.high_priority_events);
        if let Some(avg) = h.avg_resolution_time_seconds {
            println!("  avg resolution:  {avg:.1}s");
        }
        println!("  circuit breaker: {}", h.circuit_breaker_state);
    }
    Ok(())
}

/// Run one processing batch
pub fn process(args: &ProcessArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = CommandContext::load(global)?;
    let mut db = ctx.connect()?;

    if args.enhanced {
        let r = procedures::process_dlq_events_enhanced(
            db.as_mut(),
            args.limit,
            args.processor_id.as_deref(),
            args.max_retries,
        )
        .context("Enhanced DLQ processing failed")?;
        println!(
            "Processed {} event(s): {} repaired, {} failed, {} skipped in {} ms",
            r.processed, r.repaired, r.failed, r.skipped, r.duration_ms
        );
        if r.circuit_breaker_triggered {
            println!("Circuit breaker is open; processing paused");
        }
    } else {
        let r = procedures::process_dlq_events(db.as_mut(), args.limit, args.reason.as_deref())
            .context("DLQ processing failed")?;
        println!(
            "Processed {} event(s): {} repaired, {} failed, {} skipped",
            r.processed, r.repaired, r.failed, r.skipped
        );
    }
    Ok(())
}

/// Delete old resolved events
pub fn cleanup(args: &CleanupArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = CommandContext::load(global)?;
    let mut db = ctx.connect()?;

    if args.enhanced {
        let r = procedures::cleanup_resolved_dlq_events_enhanced(
            db.as_mut(),
            args.older_than_days,
            args.batch_size,
        )
        .context("DLQ cleanup failed")?;
        println!(
            "Deleted {} resolved event(s), released {} expired lock(s)",
            r.deleted, r.expired_locks_released
        );
    } else {
        let deleted = procedures::cleanup_resolved_dlq_events(db.as_mut(), args.older_than_days)
            .context("DLQ cleanup failed")?;
        println!("Deleted {deleted} resolved event(s)");
    }
    Ok(())
}
