//! SQLite history for verdicts and actions.
//!
//! Persistence here is best-effort audit history for the API; the detection
//! and remediation loop never reads it back.

pub mod schema;

use anyhow::Result;
use r2d2::Pool as R2D2Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::detect::AnomalyVerdict;
use crate::remediate::RemediationAction;

/// Connection Pool type
pub type Pool = R2D2Pool<SqliteConnectionManager>;

/// Open (or create) the SQLite database and return a connection pool.
pub fn open_pool(path: &str) -> Result<Pool> {
    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA temp_store = MEMORY;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = R2D2Pool::new(manager)?;

    // Run migrations on a single connection
    let conn = pool.get()?;
    schema::migrate(&conn)?;

    Ok(pool)
}

/// Record an anomaly verdict. Only flagged verdicts are persisted; steady
/// state would otherwise fill the table with noise.
pub fn record_verdict(pool: &Pool, verdict: &AnomalyVerdict) -> Result<()> {
    let conn = pool.get()?;
    let severity = verdict
        .severity
        .map(|s| s.to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let anomaly_type = verdict
        .anomaly_type
        .map(|t| t.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    conn.execute(
        "INSERT INTO verdicts (id, anomaly_type, severity, score, sample_json, detected_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            verdict.id.to_string(),
            anomaly_type,
            severity,
            verdict.score,
            serde_json::to_string(&verdict.sample)?,
            verdict.detected_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Record a remediation action in its terminal state.
pub fn record_action(pool: &Pool, action: &RemediationAction) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO actions (id, action_type, anomaly_type, target, status,
                              triggering_verdict, params_json, decided_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            action.id.to_string(),
            action.action_type.to_string(),
            action.anomaly_type.to_string(),
            action.target,
            action.status.to_string(),
            action.triggering_verdict.to_string(),
            serde_json::to_string(&action.params)?,
            action.decided_at.to_rfc3339(),
            action.completed_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

/// Recent flagged verdicts as JSON rows, newest first.
pub fn list_recent_verdicts(pool: &Pool, limit: usize) -> Result<Vec<serde_json::Value>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, anomaly_type, severity, score, sample_json, detected_at
         FROM verdicts ORDER BY created_at DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit], |row| {
        let sample_json: String = row.get(4)?;
        Ok(serde_json::json!({
            "id": row.get::<_, String>(0)?,
            "anomaly_type": row.get::<_, String>(1)?,
            "severity": row.get::<_, String>(2)?,
            "score": row.get::<_, f64>(3)?,
            "sample": serde_json::from_str::<serde_json::Value>(&sample_json)
                .unwrap_or_default(),
            "detected_at": row.get::<_, String>(5)?,
        }))
    })?;

    let mut verdicts = Vec::new();
    for r in rows {
        verdicts.push(r?);
    }
    Ok(verdicts)
}

/// Recent remediation actions as JSON rows, newest first.
pub fn list_recent_actions(pool: &Pool, limit: usize) -> Result<Vec<serde_json::Value>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, action_type, anomaly_type, target, status, triggering_verdict,
                params_json, decided_at, completed_at
         FROM actions ORDER BY created_at DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit], |row| {
        let params_json: String = row.get(6)?;
        Ok(serde_json::json!({
            "id": row.get::<_, String>(0)?,
            "action_type": row.get::<_, String>(1)?,
            "anomaly_type": row.get::<_, String>(2)?,
            "target": row.get::<_, String>(3)?,
            "status": row.get::<_, String>(4)?,
            "triggering_verdict": row.get::<_, String>(5)?,
            "params": serde_json::from_str::<serde_json::Value>(&params_json)
                .unwrap_or_default(),
            "decided_at": row.get::<_, String>(7)?,
            "completed_at": row.get::<_, Option<String>>(8)?,
        }))
    })?;

    let mut actions = Vec::new();
    for r in rows {
        actions.push(r?);
    }
    Ok(actions)
}
