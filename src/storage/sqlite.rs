//! SQLite store implementation

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Params, Row, Transaction, params};

use crate::mous::{self, MousRecord};
use crate::target::TargetRecord;
use crate::{Error, Result};

/// SQLite-backed store for MOUS processing state.
///
/// Owns a single connection. Every call blocks until the database responds.
/// Callers manage the store's lifetime and must not share one store across
/// threads without external locking.
pub struct MousStore {
    conn: Connection,
}

impl MousStore {
    /// Open the database file at `path`.
    ///
    /// The `mous`/`targets` schema must already exist; opening never creates
    /// or migrates tables.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| Error::Connection {
            path: path.display().to_string(),
            source,
        })?;

        // SQLite validates the file header lazily; probe now so a garbage
        // file fails at open time instead of at the first query.
        conn.query_row("PRAGMA schema_version", [], |_| Ok(()))
            .map_err(|source| Error::Connection {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    // ========== Generic Query Layer ==========

    /// Run a query expected to return zero or one row.
    ///
    /// Zero rows is `None`, never an error.
    pub fn fetch_one<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.conn
            .query_row(sql, params, map)
            .optional()
            .map_err(Into::into)
    }

    /// Run a query and collect every matching row, in database order.
    pub fn fetch_all<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;
        rows.collect::<rusqlite::Result<Vec<T>>>()
            .map_err(Into::into)
    }

    /// Run a single mutating statement, returning the affected-row count.
    ///
    /// With `commit` set and an explicit transaction open on the connection,
    /// the transaction is committed right after the statement. Outside a
    /// transaction the statement autocommits and the flag does nothing.
    pub fn execute<P: Params>(&self, sql: &str, params: P, commit: bool) -> Result<usize> {
        let affected = self.conn.execute(sql, params)?;
        if commit && !self.conn.is_autocommit() {
            self.conn.execute("COMMIT", [])?;
        }
        Ok(affected)
    }

    // ========== Transactions ==========

    /// Run `f` inside a transaction scoped to this call.
    ///
    /// Commits when `f` returns `Ok`; rolls back and propagates the error
    /// unchanged when it returns `Err`. Exactly one of the two happens.
    pub fn with_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // ========== MOUS Read Operations ==========

    /// Get the full MOUS row, or `None` for an unknown id.
    pub fn get_mous(&self, mous_id: &str) -> Result<Option<MousRecord>> {
        self.fetch_one(
            "SELECT mous_id, download_url, num_asdms, split_status, split_date, split_products, split_notes
             FROM mous WHERE mous_id = ?1",
            [mous_id],
            row_to_mous,
        )
    }

    /// Get the archive download URL for a MOUS.
    ///
    /// `None` covers both an unknown id and a row whose URL is NULL; callers
    /// that need to tell them apart must fetch the full record.
    pub fn get_download_url(&self, mous_id: &str) -> Result<Option<String>> {
        let row = self.fetch_one(
            "SELECT download_url FROM mous WHERE mous_id = ?1",
            [mous_id],
            |row| row.get::<_, Option<String>>("download_url"),
        )?;
        if row.is_none() {
            tracing::debug!("download URL requested for unknown MOUS {}", mous_id);
        }
        Ok(row.flatten())
    }

    /// Get all target rows for a MOUS; empty when none.
    pub fn get_targets(&self, mous_id: &str) -> Result<Vec<TargetRecord>> {
        self.fetch_all(
            "SELECT mous_id, alma_source_name, asdm_uid FROM targets WHERE mous_id = ?1",
            [mous_id],
            row_to_target,
        )
    }

    /// Get the distinct source names across a MOUS's targets, each once.
    pub fn unique_target_names(&self, mous_id: &str) -> Result<Vec<String>> {
        self.fetch_all(
            "SELECT DISTINCT alma_source_name FROM targets WHERE mous_id = ?1",
            [mous_id],
            |row| row.get("alma_source_name"),
        )
    }

    /// Get the distinct ASDM uids across a MOUS's targets.
    ///
    /// Targets whose uid is NULL (not yet associated with a raw dataset) are
    /// filtered out.
    pub fn target_asdm_uids(&self, mous_id: &str) -> Result<Vec<String>> {
        let uids = self.fetch_all(
            "SELECT DISTINCT asdm_uid FROM targets WHERE mous_id = ?1",
            [mous_id],
            |row| row.get::<_, Option<String>>("asdm_uid"),
        )?;
        Ok(uids.into_iter().flatten().collect())
    }

    /// Get the expected ASDM count for a MOUS.
    ///
    /// Reads as 0 both when the MOUS is unknown and when `num_asdms` is
    /// NULL: "nothing known about expected ASDMs" is treated uniformly.
    pub fn expected_asdm_count(&self, mous_id: &str) -> Result<i64> {
        let row = self.fetch_one(
            "SELECT num_asdms FROM mous WHERE mous_id = ?1",
            [mous_id],
            |row| row.get::<_, Option<i64>>("num_asdms"),
        )?;
        match row {
            Some(Some(count)) => Ok(count),
            Some(None) | None => {
                tracing::debug!("no expected ASDM count for MOUS {}, defaulting to 0", mous_id);
                Ok(0)
            }
        }
    }

    // ========== MOUS Write Operation ==========

    /// Record the outcome of a split step on a MOUS.
    ///
    /// Sets `split_status`, `split_products` (stored as a JSON list, `[]`
    /// when absent), `split_notes`, and stamps `split_date` with the current
    /// UTC instant, all inside one transaction. On any failure the
    /// transaction rolls back and none of the four fields change.
    ///
    /// An unknown `mous_id` matches zero rows and is not an error.
    pub fn update_split_state(
        &mut self,
        mous_id: &str,
        split_status: &str,
        split_products: Option<&[String]>,
        note: &str,
    ) -> Result<()> {
        let products = mous::encode_products(split_products)?;
        let split_date = Utc::now().to_rfc3339();

        let affected = self.with_transaction(|tx| {
            tx.execute(
                "UPDATE mous
                 SET split_status = ?1,
                     split_date = ?2,
                     split_products = ?3,
                     split_notes = ?4
                 WHERE mous_id = ?5",
                params![split_status, split_date, products, note, mous_id],
            )
            .map_err(Into::into)
        })?;

        if affected == 0 {
            tracing::warn!(
                "split-state update to '{}' matched no MOUS row for {}",
                split_status,
                mous_id
            );
        }
        Ok(())
    }

    // ========== Statistics ==========

    /// Count MOUS rows
    pub fn count_mous(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mous", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Count target rows
    pub fn count_targets(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM targets", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            mous: self.count_mous()?,
            targets: self.count_targets()?,
        })
    }
}

/// Convert a full `mous` row, reading columns by name.
fn row_to_mous(row: &Row<'_>) -> rusqlite::Result<MousRecord> {
    let raw_products: Option<String> = row.get("split_products")?;
    let split_products = mous::decode_products(raw_products.as_deref()).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(MousRecord {
        mous_id: row.get("mous_id")?,
        download_url: row.get("download_url")?,
        num_asdms: row.get("num_asdms")?,
        split_status: row.get("split_status")?,
        split_date: row.get("split_date")?,
        split_products,
        split_notes: row.get("split_notes")?,
    })
}

fn row_to_target(row: &Row<'_>) -> rusqlite::Result<TargetRecord> {
    Ok(TargetRecord {
        mous_id: row.get("mous_id")?,
        alma_source_name: row.get("alma_source_name")?,
        asdm_uid: row.get("asdm_uid")?,
    })
}

/// Row counts for the two tracked tables
#[derive(Debug, Clone)]
pub struct DbStats {
    pub mous: usize,
    pub targets: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  MOUS records: {}", self.mous)?;
        write!(f, "  Targets: {}", self.targets)
    }
}
