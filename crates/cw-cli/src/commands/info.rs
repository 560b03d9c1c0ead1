//! Info command implementation

use anyhow::{Context, Result};
use cw_migrate::procedures::{bundle_status, BundleStatus};
use cw_migrate::{detect_features, schema_status, FeatureReport, SchemaStatus};
use serde::Serialize;

use crate::cli::{GlobalArgs, InfoArgs, OutputFormat};
use crate::commands::common::{plural, print_json};
use crate::context::CommandContext;

#[derive(Serialize)]
struct InfoReport {
    database: String,
    features: FeatureReport,
    schema: SchemaStatus,
    tables: Vec<String>,
    procedures: BundleStatus,
}

/// Execute the info command
pub fn execute(args: &InfoArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = CommandContext::load(global)?;
    let mut db = ctx.connect()?;

    let report = InfoReport {
        database: ctx.engine.display_url(),
        features: detect_features(db.as_mut()),
        schema: schema_status(db.as_mut()),
        tables: db.list_tables().context("Failed to list tables")?,
        procedures: bundle_status(db.as_mut()),
    };

    if args.output == OutputFormat::Json {
        return print_json(&report);
    }

    let f = &report.features;
    println!("Database:        {}", report.database);
    println!("Engine:          {} {}", f.database_type, f.version);
    println!(
        "Schema version:  v{} (latest v{})",
        report.schema.current_version, report.schema.target_version
    );
    if !report.schema.is_up_to_date() {
        println!(
            "  {} pending",
            plural(report.schema.pending.len(), "migration")
        );
    }
    println!(
        "Vector support:  {}",
        match &f.vector_extension_version {
            Some(version) => format!("yes (vector {version}, max {} dims)", f.max_vector_dimensions),
            None => "no".to_string(),
        }
    );
    println!(
        "Advanced DLQ:    {}",
        if f.advanced_dlq_supported { "yes" } else { "no" }
    );
    if f.database_type.is_postgres() {
        println!(
            "Procedures:      basic {}, enhanced {}",
            installed(report.procedures.basic),
            installed(report.procedures.enhanced)
        );
    }
    println!("Tables ({}):", report.tables.len());
    for table in &report.tables {
        println!("  {table}");
    }
    Ok(())
}

fn installed(present: bool) -> &'static str {
    if present {
        "installed"
    } else {
        "missing"
    }
}
