//! Rollback command implementation

use anyhow::{Context, Result};
use cw_migrate::rollback_to;

use crate::cli::{GlobalArgs, RollbackArgs};
use crate::context::CommandContext;

/// Execute the rollback command
pub fn execute(args: &RollbackArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = CommandContext::load(global)?;
    let mut db = ctx.connect()?;

    let outcome = rollback_to(db.as_mut(), args.to)
        .with_context(|| format!("Rollback to v{} failed", args.to))?;

    if outcome.from_version == outcome.to_version {
        println!("Schema at v{}, nothing to roll back", outcome.from_version);
    } else {
        println!(
            "Schema rolled back: v{} -> v{}",
            outcome.from_version, outcome.to_version
        );
    }
    Ok(())
}
