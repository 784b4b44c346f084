// ==========================================
// 公共工程管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（CREATE TABLE IF NOT EXISTS），记录 schema_version
// - 进程内共享一个连接；多步写操作在持锁期间的单个事务内完成
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间存储格式（微秒精度，保证同一秒内的状态历史仍可排序）
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const DATETIME_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 进程内共享连接
pub type SharedConnection = Arc<Mutex<Connection>>;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接、建表并包装为共享连接
pub fn open_shared_connection(db_path: &str) -> RepositoryResult<SharedConnection> {
    let conn = open_sqlite_connection(db_path)
        .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 获取共享连接的锁
pub fn lock_conn(conn: &SharedConnection) -> RepositoryResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> RepositoryResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    match read_schema_version(conn)? {
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                db_version = v,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema 版本高于当前程序"
            );
        }
        Some(v) if v == CURRENT_SCHEMA_VERSION => {}
        _ => {
            conn.execute(
                "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
                params![CURRENT_SCHEMA_VERSION],
            )?;
            tracing::info!(version = CURRENT_SCHEMA_VERSION, "schema_version 已写入");
        }
    }
    Ok(())
}

// ==========================================
// 时间/日期编解码
// ==========================================

pub fn format_datetime(ts: &NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

pub fn parse_datetime(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_PARSE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub fn format_date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

pub fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ==========================================
// Schema
// ==========================================
// 部分唯一索引是业务唯一性的兜底（应用层先做检查并给出 Conflict）
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS department (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    deactivated_at TEXT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS locality (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    deactivated_at TEXT,
    name TEXT NOT NULL,
    department_id TEXT NOT NULL REFERENCES department(id)
);
CREATE INDEX IF NOT EXISTS idx_locality_department ON locality(department_id);

CREATE TABLE IF NOT EXISTS rubro (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    deactivated_at TEXT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS execution_state (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    deactivated_at TEXT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS project_plan (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    deactivated_at TEXT,
    name TEXT NOT NULL,
    description TEXT,
    study_months INTEGER,
    estimated_investment TEXT NOT NULL,
    estimated_duration INTEGER,
    priority TEXT NOT NULL,
    in_execution INTEGER NOT NULL DEFAULT 0,
    rubro_id TEXT NOT NULL REFERENCES rubro(id)
);
CREATE INDEX IF NOT EXISTS idx_project_plan_rubro ON project_plan(rubro_id);

CREATE TABLE IF NOT EXISTS technical_risk (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    deactivated_at TEXT,
    risk_number INTEGER NOT NULL UNIQUE,
    nature TEXT NOT NULL,
    proposed_solution TEXT,
    mitigation_measures TEXT,
    actions_taken TEXT
);

CREATE TABLE IF NOT EXISTS work (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    deactivated_at TEXT,
    work_number INTEGER NOT NULL,
    name TEXT NOT NULL,
    execution_duration INTEGER NOT NULL,
    execution_year INTEGER NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT,
    final_investment TEXT NOT NULL,
    locality_id TEXT NOT NULL REFERENCES locality(id),
    plan_id TEXT REFERENCES project_plan(id)
);
CREATE UNIQUE INDEX IF NOT EXISTS uq_work_number_active
    ON work(work_number) WHERE deactivated_at IS NULL;
CREATE INDEX IF NOT EXISTS idx_work_plan ON work(plan_id);

CREATE TABLE IF NOT EXISTS work_state_entry (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    deactivated_at TEXT,
    work_id TEXT NOT NULL REFERENCES work(id),
    state_id TEXT NOT NULL REFERENCES execution_state(id),
    started_at TEXT NOT NULL,
    ended_at TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS uq_work_state_entry_open
    ON work_state_entry(work_id) WHERE ended_at IS NULL;
CREATE INDEX IF NOT EXISTS idx_work_state_entry_state ON work_state_entry(state_id);

CREATE TABLE IF NOT EXISTS work_risk (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    deactivated_at TEXT,
    work_id TEXT NOT NULL REFERENCES work(id),
    risk_id TEXT NOT NULL REFERENCES technical_risk(id)
);
CREATE UNIQUE INDEX IF NOT EXISTS uq_work_risk_active
    ON work_risk(work_id, risk_id) WHERE deactivated_at IS NULL;
CREATE INDEX IF NOT EXISTS idx_work_risk_risk ON work_risk(risk_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_datetime_round_trip_keeps_micros() {
        let ts = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_micro_opt(10, 20, 30, 123_456)
            .unwrap();
        let raw = format_datetime(&ts);
        assert_eq!(parse_datetime(0, &raw).unwrap(), ts);
        // 兼容无小数部分的旧数据
        let plain = parse_datetime(0, "2025-03-01 10:20:30").unwrap();
        assert_eq!(plain.format("%H:%M:%S").to_string(), "10:20:30");
    }

    #[test]
    fn test_open_entry_index_rejects_second_open_row() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = OFF;
            INSERT INTO work_state_entry (id, created_at, work_id, state_id, started_at)
                VALUES ('e1', '2025-01-01 00:00:00', 'w1', 's1', '2025-01-01 00:00:00');
            "#,
        )
        .unwrap();
        let second = conn.execute(
            "INSERT INTO work_state_entry (id, created_at, work_id, state_id, started_at)
             VALUES ('e2', '2025-01-01 00:00:00', 'w1', 's2', '2025-01-01 00:00:01')",
            [],
        );
        assert!(second.is_err());
    }
}
