//! Check command implementation

use anyhow::Result;
use cw_migrate::schema_status;

use crate::cli::{CheckArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{plural, print_json, ExitCode};
use crate::context::CommandContext;

/// Execute the check command. Exits 1 when migrations are pending.
pub fn execute(args: &CheckArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = CommandContext::load(global)?;
    let mut db = ctx.connect()?;
    let status = schema_status(db.as_mut());

    if args.output == OutputFormat::Json {
        print_json(&status)?;
    } else if status.is_up_to_date() {
        println!("Schema is up to date (v{})", status.current_version);
    } else {
        println!(
            "Schema at v{}, {} pending (target v{})",
            status.current_version,
            plural(status.pending.len(), "migration"),
            status.target_version
        );
    }

    if status.is_up_to_date() {
        Ok(())
    } else {
        Err(ExitCode(1).into())
    }
}
