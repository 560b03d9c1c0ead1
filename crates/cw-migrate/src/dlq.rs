//! Dead-letter queue identity helpers.
//!
//! The application and the v7 backfill must agree on how a payload's
//! checksum and idempotency key are derived, so both forms live here: Rust
//! functions for the insert path and SQL expressions for in-database
//! backfills (which need `pgcrypto`).
//!
//! The backfill hashes `payload::text`, and PostgreSQL renders a JSONB value
//! in its own normalized form (key order, spacing). The insert path hashes
//! that same rendering, obtained from the server, never the raw input.

use crate::error::MigrateResult;
use crate::introspect::column_exists;
use cw_db::{Database, DbError, SqlValue};

pub use cw_core::checksum::idempotency_key;

/// SQL computing `payload_checksum` for a `dead_letter_events` row.
pub const PAYLOAD_CHECKSUM_SQL: &str = "encode(digest(payload::text, 'sha256'), 'hex')";

/// SQL computing `idempotency_key` from `source`, `source_offset` and an
/// already filled `payload_checksum`.
pub const IDEMPOTENCY_KEY_SQL: &str = "encode(digest(COALESCE(source, '') || ':' || \
     COALESCE(source_offset::text, '') || ':' || payload_checksum, 'sha256'), 'hex')";

/// SHA-256 hex digest of a payload's text form.
pub fn payload_checksum(payload: &str) -> String {
    cw_core::compute_checksum(payload)
}

/// An event rejected by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetterEvent {
    pub ingest_id: Option<String>,
    pub source: Option<String>,
    pub source_offset: Option<i64>,
    pub reason: String,
    /// Raw payload text as read from the log
    pub payload: String,
    pub metadata: Option<serde_json::Value>,
}

impl DeadLetterEvent {
    pub fn new(reason: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            ingest_id: None,
            source: None,
            source_offset: None,
            reason: reason.into(),
            payload: payload.into(),
            metadata: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>, offset: Option<i64>) -> Self {
        self.source = Some(source.into());
        self.source_offset = offset;
        self
    }

    /// Checksum of the payload as written, for text payload columns. Use
    /// [`stored_identity`] when the column may be JSONB.
    pub fn checksum(&self) -> String {
        payload_checksum(&self.stored_payload())
    }

    pub fn idempotency_key(&self) -> String {
        self.key_for(&self.checksum())
    }

    fn key_for(&self, checksum: &str) -> String {
        idempotency_key(
            self.source.as_deref().unwrap_or_default(),
            self.source_offset,
            checksum,
        )
    }

    /// Payload as written to the `payload` column. Text that is not JSON is
    /// wrapped so it survives a JSONB column.
    fn stored_payload(&self) -> String {
        match serde_json::from_str::<serde_json::Value>(&self.payload) {
            Ok(_) => self.payload.clone(),
            Err(_) => serde_json::json!({ "malformed": self.payload }).to_string(),
        }
    }
}

/// `(payload_checksum, idempotency_key)` for `event` as the database would
/// compute them from the stored row.
pub fn stored_identity(db: &mut dyn Database, event: &DeadLetterEvent) -> MigrateResult<(String, String)> {
    let text = stored_payload_text(db, event)?;
    let checksum = payload_checksum(&text);
    let key = event.key_for(&checksum);
    Ok((checksum, key))
}

/// The payload's text form after a round trip through the `payload` column.
///
/// On PostgreSQL the value is cast to the column's type and rendered back,
/// with the same binding the insert uses, so JSONB normalization applies.
pub fn stored_payload_text(db: &mut dyn Database, event: &DeadLetterEvent) -> MigrateResult<String> {
    let payload = event.stored_payload();
    if !db.db_type().is_postgres() {
        return Ok(payload);
    }

    let column_type = db
        .list_columns("dead_letter_events")?
        .into_iter()
        .find(|c| c.name == "payload")
        .map(|c| c.data_type.to_lowercase())
        .unwrap_or_else(|| "jsonb".to_string());
    let cast = match column_type.as_str() {
        "json" => "json",
        "jsonb" => "jsonb",
        _ => return Ok(payload),
    };

    let row = db
        .query_opt(&format!("SELECT CAST($1 AS {cast})::text"), &[SqlValue::from(payload)])?
        .ok_or_else(|| DbError::NoRows("payload rendering".to_string()))?;
    Ok(row.get_string(0)?)
}

/// Insert `event` into `dead_letter_events`, returning rows written.
///
/// When the table carries the hardened identity columns the checksum and
/// idempotency key are filled too, and a duplicate key writes nothing.
pub fn insert_dead_letter(db: &mut dyn Database, event: &DeadLetterEvent) -> MigrateResult<u64> {
    let dialect = db.dialect();
    let hardened = column_exists(db, "dead_letter_events", "idempotency_key");

    let mut columns = vec!["ingest_id", "source", "source_offset", "reason", "payload", "metadata_json"];
    let mut params = vec![
        SqlValue::from(event.ingest_id.clone()),
        SqlValue::from(event.source.clone()),
        SqlValue::from(event.source_offset),
        SqlValue::from(event.reason.clone()),
        SqlValue::from(event.stored_payload()),
        SqlValue::from(event.metadata.as_ref().map(|m| m.to_string())),
    ];
    let mut key = None;
    if hardened {
        let (checksum, idempotency) = stored_identity(db, event)?;
        columns.extend(["payload_checksum", "idempotency_key"]);
        params.push(SqlValue::from(checksum));
        params.push(SqlValue::from(idempotency.clone()));
        key = Some(idempotency);
    }

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| dialect.placeholder(i)).collect();
    let conflict = if hardened { " ON CONFLICT (idempotency_key) DO NOTHING" } else { "" };
    let sql = format!(
        "INSERT INTO dead_letter_events ({}) VALUES ({}){conflict}",
        columns.join(", "),
        placeholders.join(", ")
    );

    let written = db.execute(&sql, &params)?;
    if let (0, Some(key)) = (written, key) {
        log::debug!("Dead letter event already recorded: {key}");
    }
    Ok(written)
}
