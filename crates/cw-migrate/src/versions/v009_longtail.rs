//! v9: longtail analysis results and, on PostgreSQL with the `vector`
//! extension, embedding tables with approximate nearest neighbour indexes.
//!
//! The only version with a downgrade: `down` drops everything `up` created.

use super::{ensure_indexes, IndexSpec};
use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

/// HNSW (cosine) index on command sequence embeddings.
pub const COMMAND_VECTOR_INDEX: &str = "ix_command_sequence_vectors_hnsw";

/// IVFFlat (L2) index on behavioral embeddings.
pub const BEHAVIORAL_VECTOR_INDEX: &str = "ix_behavioral_vectors_ivfflat";

const INDEXES: &[IndexSpec] = &[
    ("ix_longtail_analysis_time", "longtail_analysis", "analysis_time"),
    ("ix_longtail_analysis_window", "longtail_analysis", "window_start, window_end"),
    ("ix_longtail_detections_analysis", "longtail_detections", "analysis_id"),
    ("ix_longtail_detections_type", "longtail_detections", "detection_type"),
    ("ix_longtail_detections_session", "longtail_detections", "session_id"),
    ("ix_longtail_detections_timestamp", "longtail_detections", "timestamp"),
];

/// Dropped by `down`, dependents first.
const CREATED_TABLES: &[&str] = &[
    "behavioral_vectors",
    "command_sequence_vectors",
    "longtail_detections",
    "longtail_analysis",
];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    let t = ctx.types();
    let analysis = format!(
        "CREATE TABLE IF NOT EXISTS longtail_analysis (
    id {pk},
    analysis_time {ts} NOT NULL,
    window_start {ts} NOT NULL,
    window_end {ts} NOT NULL,
    lookback_days INTEGER NOT NULL,
    confidence_threshold {float} NOT NULL DEFAULT 0.6,
    total_events_analyzed INTEGER NOT NULL DEFAULT 0,
    rare_command_count INTEGER NOT NULL DEFAULT 0,
    anomalous_sequence_count INTEGER NOT NULL DEFAULT 0,
    outlier_session_count INTEGER NOT NULL DEFAULT 0,
    emerging_pattern_count INTEGER NOT NULL DEFAULT 0,
    high_entropy_payload_count INTEGER NOT NULL DEFAULT 0,
    analysis_results {json} NOT NULL DEFAULT {empty_object},
    statistical_summary {json},
    recommendation TEXT,
    analysis_duration_seconds {float},
    memory_usage_mb {float},
    data_quality_score {float},
    enrichment_coverage {float},
    created_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
        pk = t.serial_pk,
        ts = t.timestamp,
        float = t.float,
        json = t.json,
        empty_object = t.empty_json_object,
    );
    let detections = format!(
        "CREATE TABLE IF NOT EXISTS longtail_detections (
    id {pk},
    analysis_id INTEGER NOT NULL REFERENCES longtail_analysis(id) ON DELETE CASCADE,
    detection_type VARCHAR(32) NOT NULL,
    session_id VARCHAR(64),
    event_id INTEGER,
    detection_data {json} NOT NULL,
    confidence_score {float} NOT NULL,
    severity_score {float} NOT NULL,
    timestamp {ts} NOT NULL,
    source_ip VARCHAR(45),
    created_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
        pk = t.serial_pk,
        json = t.json,
        float = t.float,
        ts = t.timestamp,
    );

    ctx.ensure_table(StepKind::Required, "longtail_analysis", &analysis)?;
    ctx.ensure_table(StepKind::Required, "longtail_detections", &detections)?;
    ensure_indexes(ctx, StepKind::BestEffort, INDEXES)?;

    if !ctx.is_postgres() {
        ctx.skip("vector tables", "PostgreSQL-only feature");
        return Ok(());
    }
    if !ctx.features().vector_extension_present {
        ctx.skip("vector tables", "vector extension is not installed");
        return Ok(());
    }
    create_vector_tables(ctx)
}

fn create_vector_tables(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    let options = ctx.options().clone();

    let command_vectors = format!(
        "CREATE TABLE IF NOT EXISTS command_sequence_vectors (
    id SERIAL PRIMARY KEY,
    session_id VARCHAR(64) NOT NULL,
    command_sequence TEXT NOT NULL,
    sequence_vector vector({dims}),
    timestamp TIMESTAMP WITH TIME ZONE NOT NULL,
    source_ip INET,
    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
)",
        dims = options.command_vector_dimensions,
    );
    let behavioral_vectors = format!(
        "CREATE TABLE IF NOT EXISTS behavioral_vectors (
    id SERIAL PRIMARY KEY,
    session_id VARCHAR(64) NOT NULL,
    behavioral_features JSONB NOT NULL,
    behavioral_vector vector({dims}),
    cluster_id INTEGER,
    timestamp TIMESTAMP WITH TIME ZONE NOT NULL,
    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
)",
        dims = options.behavioral_vector_dimensions,
    );

    ctx.ensure_table(StepKind::BestEffort, "command_sequence_vectors", &command_vectors)?;
    if ctx.table_exists("command_sequence_vectors") {
        ctx.ensure_index(
            StepKind::BestEffort,
            COMMAND_VECTOR_INDEX,
            &format!(
                "CREATE INDEX IF NOT EXISTS {COMMAND_VECTOR_INDEX} ON command_sequence_vectors \
                 USING hnsw (sequence_vector vector_cosine_ops)"
            ),
        )?;
        ctx.ensure_simple_index(
            StepKind::BestEffort,
            "ix_command_sequence_vectors_session",
            "command_sequence_vectors",
            "session_id",
        )?;
    }

    ctx.ensure_table(StepKind::BestEffort, "behavioral_vectors", &behavioral_vectors)?;
    if ctx.table_exists("behavioral_vectors") {
        ctx.ensure_index(
            StepKind::BestEffort,
            BEHAVIORAL_VECTOR_INDEX,
            &format!(
                "CREATE INDEX IF NOT EXISTS {BEHAVIORAL_VECTOR_INDEX} ON behavioral_vectors \
                 USING ivfflat (behavioral_vector vector_l2_ops) WITH (lists = {lists})",
                lists = options.ivfflat_lists,
            ),
        )?;
        ctx.ensure_simple_index(
            StepKind::BestEffort,
            "ix_behavioral_vectors_session",
            "behavioral_vectors",
            "session_id",
        )?;
    }
    Ok(())
}

/// Drop the v9 tables; their indexes go with them.
pub fn down(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    let cascade = if ctx.is_postgres() { " CASCADE" } else { "" };
    for table in CREATED_TABLES {
        if !ctx.table_exists(table) {
            continue;
        }
        ctx.alter(
            StepKind::Required,
            &format!("DROP TABLE IF EXISTS {table}{cascade}"),
            &format!("Dropped table {table}"),
        )?;
    }
    Ok(())
}
