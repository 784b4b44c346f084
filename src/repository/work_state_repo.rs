// ==========================================
// 公共工程管理系统 - 工程状态历史仓储
// ==========================================
// 红线: 只追加；除关闭当前记录的 ended_at 外不修改历史
// 兜底: uq_work_state_entry_open 保证每个工程最多一条未关闭记录
// ==========================================

use crate::db::{format_datetime, parse_datetime};
use crate::domain::record::SoftDeleteRecord;
use crate::domain::types::EntityKind;
use crate::domain::work::WorkStateEntry;
use crate::repository::error::RepositoryResult;
use crate::repository::soft_delete::{
    opt_datetime, read_opt_datetime, text, SoftDeleteEntity, SoftDeleteStore,
};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

pub type WorkStateRepository = SoftDeleteStore<WorkStateEntry>;

impl SoftDeleteEntity for WorkStateEntry {
    const TABLE: &'static str = "work_state_entry";
    const KIND: EntityKind = EntityKind::WorkStateEntry;
    const COLUMNS: &'static [&'static str] = &["work_id", "state_id", "started_at", "ended_at"];

    fn record(&self) -> &SoftDeleteRecord {
        &self.record
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            text(&self.work_id),
            text(&self.state_id),
            text(&format_datetime(&self.started_at)),
            opt_datetime(self.ended_at.as_ref()),
        ]
    }

    fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        let started_raw: String = row.get(offset + 2)?;
        Ok(WorkStateEntry {
            record,
            work_id: row.get(offset)?,
            state_id: row.get(offset + 1)?,
            started_at: parse_datetime(offset + 2, &started_raw)?,
            ended_at: read_opt_datetime(row, offset + 3)?,
        })
    }
}

impl SoftDeleteStore<WorkStateEntry> {
    /// 工程当前（未关闭）的状态记录
    pub fn find_open(conn: &Connection, work_id: &str) -> RepositoryResult<Option<WorkStateEntry>> {
        let mut open = Self::find_where(
            conn,
            "work_id = ?1 AND ended_at IS NULL",
            vec![text(work_id)],
        )?;
        Ok(open.pop())
    }

    /// 关闭工程的未关闭记录，返回关闭条数（0 或 1）
    pub fn close_open(conn: &Connection, work_id: &str, at: NaiveDateTime) -> RepositoryResult<usize> {
        let n = conn.execute(
            "UPDATE work_state_entry SET ended_at = ?1 WHERE work_id = ?2 AND ended_at IS NULL",
            params![format_datetime(&at), work_id],
        )?;
        Ok(n)
    }

    /// 打开一条新记录
    pub fn open(
        conn: &Connection,
        work_id: &str,
        state_id: &str,
        at: NaiveDateTime,
    ) -> RepositoryResult<WorkStateEntry> {
        let entry = WorkStateEntry {
            record: SoftDeleteRecord::new_at(at),
            work_id: work_id.to_string(),
            state_id: state_id.to_string(),
            started_at: at,
            ended_at: None,
        };
        Self::create(conn, &entry)?;
        Ok(entry)
    }

    /// 工程的完整状态历史（按写入顺序）
    ///
    /// 只按 rowid 排序：系统时钟回拨时 started_at / created_at 都可能倒序
    pub fn history(conn: &Connection, work_id: &str) -> RepositoryResult<Vec<WorkStateEntry>> {
        Self::find_where_ordered(conn, "work_id = ?1", "rowid", vec![text(work_id)])
    }

    /// 当前处于该状态的有效工程数量
    pub fn count_active_works_open_in_state(
        conn: &Connection,
        state_id: &str,
    ) -> RepositoryResult<i64> {
        let n = conn.query_row(
            r#"
            SELECT COUNT(DISTINCT e.work_id)
            FROM work_state_entry e
            JOIN work w ON w.id = e.work_id
            WHERE e.state_id = ?1
              AND e.ended_at IS NULL
              AND w.deactivated_at IS NULL
            "#,
            params![state_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// 未关闭记录条数（诊断用）
    pub fn count_open(conn: &Connection, work_id: &str) -> RepositoryResult<i64> {
        let n = conn.query_row(
            "SELECT COUNT(*) FROM work_state_entry WHERE work_id = ?1 AND ended_at IS NULL",
            params![work_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
