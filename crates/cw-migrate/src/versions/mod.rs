//! One module per schema version, each exposing `up` (and `down` where a
//! downgrade exists). Registered in order in [`crate::migration::MIGRATIONS`].

pub mod v001_core;
pub mod v002_source_generation;
pub mod v003_session_enrichment;
pub mod v004_files;
pub mod v005_derived_columns;
pub mod v006_jsonb;
pub mod v007_dlq_hardening;
pub mod v008_snowshoe;
pub mod v009_longtail;
pub mod v010_password_tracking;
pub mod v011_ssh_keys;
pub mod v012_longtail_sessions;
pub mod v013_inventory;
pub mod v014_session_snapshots;
pub mod v015_ip_asn_history;
pub mod v016_ip_classification;

use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

/// `(index name, table, column list)`
pub(crate) type IndexSpec = (&'static str, &'static str, &'static str);

/// Ensure every plain index in `indexes`.
pub(crate) fn ensure_indexes(
    ctx: &mut MigrationContext<'_>,
    kind: StepKind,
    indexes: &[IndexSpec],
) -> MigrateResult<()> {
    for (name, table, columns) in indexes {
        ctx.ensure_simple_index(kind, name, table, columns)?;
    }
    Ok(())
}
