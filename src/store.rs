// 🗄️ Quote Store - SQLite-backed persistence
//
// Two concerns live here:
//   - the `slots` table: string key-value slots holding the serialized
//     quote collection and the last selected category, overwritten whole
//     on every save
//   - the `sync_history` table: one row per completed sync cycle
//
// Loads fail open: absent or unreadable state yields the seed collection,
// never an error.

use crate::quote::{seed_quotes, Quote, CATEGORY_ALL};
use crate::reconcile::CategoryConflict;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SLOT_QUOTES: &str = "quotes";
const SLOT_SELECTED_CATEGORY: &str = "last_selected_category";

// ============================================================================
// SYNC HISTORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncTrigger {
    /// Fired by the periodic timer.
    Interval,
    /// Fired by an explicit user action.
    Manual,
    /// Fired by a CSV import.
    Import,
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::Interval => "interval",
            SyncTrigger::Manual => "manual",
            SyncTrigger::Import => "import",
        }
    }

    fn from_db(value: &str) -> SyncTrigger {
        match value {
            "interval" => SyncTrigger::Interval,
            "import" => SyncTrigger::Import,
            _ => SyncTrigger::Manual,
        }
    }
}

/// One completed sync cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecord {
    pub id: String,
    pub synced_at: DateTime<Utc>,
    pub trigger: SyncTrigger,
    pub incoming: usize,
    pub added: usize,
    pub updated: usize,
    pub conflicts: Vec<CategoryConflict>,
}

impl SyncRecord {
    pub fn new(
        trigger: SyncTrigger,
        incoming: usize,
        added: usize,
        updated: usize,
        conflicts: Vec<CategoryConflict>,
    ) -> Self {
        SyncRecord {
            id: uuid::Uuid::new_v4().to_string(),
            synced_at: Utc::now(),
            trigger,
            incoming,
            added,
            updated,
            conflicts,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} [{}] {} incoming, {} added, {} updated, {} conflict(s)",
            self.synced_at.format("%Y-%m-%d %H:%M:%S"),
            self.trigger.as_str(),
            self.incoming,
            self.added,
            self.updated,
            self.conflicts.len()
        )
    }
}

// ============================================================================
// QUOTE STORE
// ============================================================================

/// Owns the SQLite connection. All mutation of persisted state goes
/// through this object; nothing else holds the canonical collection.
pub struct QuoteStore {
    conn: Connection,
}

impl QuoteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        // WAL for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let store = QuoteStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests. WAL needs a real file, so it is skipped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        let store = QuoteStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS sync_history (
                id TEXT PRIMARY KEY,
                synced_at TEXT NOT NULL,
                trigger_kind TEXT NOT NULL,
                incoming INTEGER NOT NULL,
                added INTEGER NOT NULL,
                updated INTEGER NOT NULL,
                conflicts TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sync_history_synced_at
             ON sync_history(synced_at)",
            [],
        )?;

        Ok(())
    }

    // ========================================================================
    // SLOTS
    // ========================================================================

    fn get_slot(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to read slot '{}'", key))
    }

    fn put_slot(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO slots (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .with_context(|| format!("failed to write slot '{}'", key))?;
        Ok(())
    }

    // ========================================================================
    // QUOTE COLLECTION
    // ========================================================================

    /// Load the persisted collection.
    ///
    /// Fails open: a missing slot, unreadable JSON, or a read error all
    /// yield the two-item seed collection. An explicitly saved empty
    /// collection stays empty.
    pub fn load_quotes(&self) -> Vec<Quote> {
        match self.get_slot(SLOT_QUOTES) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(quotes) => quotes,
                Err(err) => {
                    tracing::warn!("persisted quotes unreadable, using seed data: {err}");
                    seed_quotes()
                }
            },
            Ok(None) => seed_quotes(),
            Err(err) => {
                tracing::warn!("failed to read persisted quotes, using seed data: {err:#}");
                seed_quotes()
            }
        }
    }

    /// Serialize the full collection and overwrite the single quotes slot.
    pub fn save_quotes(&self, quotes: &[Quote]) -> Result<()> {
        let raw = serde_json::to_string(quotes).context("failed to serialize quotes")?;
        self.put_slot(SLOT_QUOTES, &raw)
    }

    /// Last selected category, defaulting to the "all" sentinel.
    pub fn load_selected_category(&self) -> String {
        match self.get_slot(SLOT_SELECTED_CATEGORY) {
            Ok(Some(category)) => category,
            Ok(None) => CATEGORY_ALL.to_string(),
            Err(err) => {
                tracing::warn!("failed to read selected category: {err:#}");
                CATEGORY_ALL.to_string()
            }
        }
    }

    pub fn save_selected_category(&self, category: &str) -> Result<()> {
        self.put_slot(SLOT_SELECTED_CATEGORY, category)
    }

    // ========================================================================
    // SYNC HISTORY
    // ========================================================================

    pub fn record_sync(&self, record: &SyncRecord) -> Result<()> {
        let conflicts_json =
            serde_json::to_string(&record.conflicts).context("failed to serialize conflicts")?;

        self.conn
            .execute(
                "INSERT INTO sync_history
                    (id, synced_at, trigger_kind, incoming, added, updated, conflicts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.synced_at.to_rfc3339(),
                    record.trigger.as_str(),
                    record.incoming as i64,
                    record.added as i64,
                    record.updated as i64,
                    conflicts_json,
                ],
            )
            .context("failed to insert sync record")?;
        Ok(())
    }

    /// Most recent sync records, newest first.
    pub fn recent_syncs(&self, limit: usize) -> Result<Vec<SyncRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, synced_at, trigger_kind, incoming, added, updated, conflicts
             FROM sync_history
             ORDER BY synced_at DESC, rowid DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, synced_at, trigger, incoming, added, updated, conflicts_json) =
                row.context("failed to read sync record")?;

            let synced_at = DateTime::parse_from_rfc3339(&synced_at)
                .context("invalid timestamp in sync history")?
                .with_timezone(&Utc);
            let conflicts: Vec<CategoryConflict> =
                serde_json::from_str(&conflicts_json).unwrap_or_default();

            records.push(SyncRecord {
                id,
                synced_at,
                trigger: SyncTrigger::from_db(&trigger),
                incoming: incoming as usize,
                added: added as usize,
                updated: updated as usize,
                conflicts,
            });
        }

        Ok(records)
    }
}

// ============================================================================
// CSV TRANSFER
// ============================================================================

/// Read `text,category` rows from a CSV file.
pub fn import_csv(path: &Path) -> Result<Vec<Quote>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open CSV file {}", path.display()))?;

    let mut quotes = Vec::new();
    for result in rdr.deserialize() {
        let quote: Quote = result.context("failed to deserialize quote row")?;
        quotes.push(quote);
    }

    Ok(quotes)
}

/// Write the collection as `text,category` rows.
pub fn export_csv(path: &Path, quotes: &[Quote]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create CSV file {}", path.display()))?;

    for quote in quotes {
        wtr.serialize(quote).context("failed to write quote row")?;
    }
    wtr.flush().context("failed to flush CSV file")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
