//! SQLite implementation of [`TargetStore`]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::error::{StoreError, StoreResult};
use super::TargetStore;
use crate::models::{
    CheckResult, NewCheck, NewTarget, Target, TargetId, TargetStatus, MIN_INTERVAL_SECS,
};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS targets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL,
        interval_seconds INTEGER NOT NULL DEFAULT 60,
        enabled INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS checks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        target_id INTEGER NOT NULL,
        ts_utc TEXT NOT NULL,
        status_code INTEGER,
        latency_ms REAL,
        ok INTEGER NOT NULL,
        error TEXT,
        FOREIGN KEY(target_id) REFERENCES targets(id)
    );

    CREATE INDEX IF NOT EXISTS idx_checks_target_id
        ON checks(target_id, id);
"#;

const TARGET_COLUMNS: &str = "id, url, interval_seconds, enabled";
const CHECK_COLUMNS: &str = "id, target_id, ts_utc, status_code, latency_ms, ok, error";

/// SQLite-backed target store
///
/// Uses a `Mutex` around a single connection; every trait method holds the
/// lock for exactly one statement.
pub struct SqliteTargetStore {
    conn: Mutex<Connection>,
}

impl SqliteTargetStore {
    /// Open or create the database at `path`
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL lets API reads proceed while the recorder appends
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite target store initialized");
        Ok(store)
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> StoreResult<()> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn query_targets(&self, sql: &str) -> StoreResult<Vec<Target>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let targets = stmt
            .query_map([], |row| target_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(targets)
    }
}

impl TargetStore for SqliteTargetStore {
    fn list_enabled_targets(&self) -> StoreResult<Vec<Target>> {
        self.query_targets(&format!(
            "SELECT {TARGET_COLUMNS} FROM targets WHERE enabled = 1 ORDER BY id"
        ))
    }

    fn list_all_targets(&self) -> StoreResult<Vec<Target>> {
        self.query_targets(&format!("SELECT {TARGET_COLUMNS} FROM targets ORDER BY id"))
    }

    fn get_target(&self, id: TargetId) -> StoreResult<Option<Target>> {
        let conn = self.conn()?;
        let target = conn
            .query_row(
                &format!("SELECT {TARGET_COLUMNS} FROM targets WHERE id = ?1"),
                params![id],
                |row| target_from_row(row, 0),
            )
            .optional()?;
        Ok(target)
    }

    fn insert_target(&self, target: &NewTarget) -> StoreResult<TargetId> {
        let conn = self.conn()?;
        let interval = i64::try_from(target.interval_seconds()).unwrap_or(i64::MAX);
        conn.execute(
            "INSERT INTO targets (url, interval_seconds, enabled) VALUES (?1, ?2, ?3)",
            params![target.url(), interval, target.enabled()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn delete_target(&self, id: TargetId) -> StoreResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM targets WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn append_check(&self, check: &NewCheck) -> StoreResult<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
                INSERT INTO checks (target_id, ts_utc, status_code, latency_ms, ok, error)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            params![
                check.target_id,
                check
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
                check.status_code.map(i64::from),
                check.latency_ms,
                check.ok,
                check.error,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn latest_check_per_target(&self) -> StoreResult<Vec<TargetStatus>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
                SELECT t.id, t.url, t.interval_seconds, t.enabled,
                       c.id, c.target_id, c.ts_utc, c.status_code, c.latency_ms, c.ok, c.error
                FROM targets t
                LEFT JOIN checks c
                    ON c.id = (SELECT MAX(id) FROM checks WHERE target_id = t.id)
                ORDER BY t.id
                "#,
        )?;

        let statuses = stmt
            .query_map([], |row| {
                let target = target_from_row(row, 0)?;
                let last_check = match row.get::<_, Option<i64>>(4)? {
                    Some(_) => Some(check_from_row(row, 4)?),
                    None => None,
                };
                Ok(TargetStatus { target, last_check })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(statuses)
    }

    fn recent_checks(&self, target_id: TargetId, limit: usize) -> StoreResult<Vec<CheckResult>> {
        let conn = self.conn()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHECK_COLUMNS} FROM checks WHERE target_id = ?1 ORDER BY id DESC LIMIT ?2"
        ))?;
        let checks = stmt
            .query_map(params![target_id, limit], |row| check_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(checks)
    }
}

fn conversion_error(
    idx: usize,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

/// Intervals below the minimum are clamped per row.
fn target_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Target> {
    let id: TargetId = row.get(offset)?;
    let interval: i64 = row.get(offset + 2)?;
    let interval_seconds = match u64::try_from(interval) {
        Ok(secs) if secs >= MIN_INTERVAL_SECS => secs,
        _ => {
            tracing::warn!(
                target_id = id,
                interval_seconds = interval,
                "Stored interval out of range, clamping to {MIN_INTERVAL_SECS}s"
            );
            MIN_INTERVAL_SECS
        }
    };

    Ok(Target {
        id,
        url: row.get(offset + 1)?,
        interval_seconds,
        enabled: row.get(offset + 3)?,
    })
}

fn check_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<CheckResult> {
    let ts: String = row.get(offset + 2)?;
    let timestamp = DateTime::parse_from_rfc3339(&ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(offset + 2, Type::Text, e))?;

    let status_code = row
        .get::<_, Option<i64>>(offset + 3)?
        .map(u16::try_from)
        .transpose()
        .map_err(|e| conversion_error(offset + 3, Type::Integer, e))?;

    Ok(CheckResult {
        id: row.get(offset)?,
        target_id: row.get(offset + 1)?,
        timestamp,
        status_code,
        latency_ms: row.get(offset + 4)?,
        ok: row.get(offset + 5)?,
        error: row.get(offset + 6)?,
    })
}
