//! Database schema and migrations.

use anyhow::Result;
use rusqlite::Connection;

/// Run all pending migrations.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS verdicts (
            id TEXT PRIMARY KEY,
            anomaly_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            score REAL NOT NULL,
            sample_json TEXT NOT NULL,
            detected_at TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS actions (
            id TEXT PRIMARY KEY,
            action_type TEXT NOT NULL,
            anomaly_type TEXT NOT NULL,
            target TEXT NOT NULL,
            status TEXT NOT NULL,
            triggering_verdict TEXT NOT NULL,
            params_json TEXT NOT NULL,
            decided_at TEXT NOT NULL,
            completed_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_verdicts_created ON verdicts(created_at);
        CREATE INDEX IF NOT EXISTS idx_actions_created ON actions(created_at);
        ",
    )?;
    Ok(())
}
