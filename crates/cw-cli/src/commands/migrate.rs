//! Migrate command implementation

use anyhow::{Context, Result};
use cw_migrate::{migrate_to, CURRENT_SCHEMA_VERSION};

use crate::cli::{GlobalArgs, MigrateArgs, OutputFormat};
use crate::commands::common::{plural, print_json};
use crate::context::CommandContext;

/// Execute the migrate command
pub fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = CommandContext::load(global)?;
    let mut db = ctx.connect()?;
    let target = args.target.unwrap_or(CURRENT_SCHEMA_VERSION);

    let outcome = migrate_to(db.as_mut(), target, &ctx.migration_options())
        .with_context(|| format!("Migration of {} failed", ctx.engine.display_url()))?;

    if args.output == OutputFormat::Json {
        return print_json(&outcome);
    }

    if outcome.applied() == 0 {
        println!("Schema already at v{}, nothing to do", outcome.to_version);
    } else {
        println!(
            "Schema migrated: v{} -> v{} ({} applied, {})",
            outcome.from_version,
            outcome.to_version,
            plural(outcome.applied() as usize, "version"),
            plural(outcome.structural_changes as usize, "structural change"),
        );
    }
    if outcome.advisory_failures > 0 {
        println!(
            "  {} skipped; run with --verbose for details",
            plural(outcome.advisory_failures as usize, "optional step")
        );
    }
    Ok(())
}
