// ==========================================
// 公共工程管理系统 - 工程风险关联仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 移除关联 = 停用关联行（不物理删除）
// ==========================================

use crate::domain::record::SoftDeleteRecord;
use crate::domain::types::EntityKind;
use crate::domain::work::WorkRisk;
use crate::repository::error::RepositoryResult;
use crate::repository::soft_delete::{text, SoftDeleteEntity, SoftDeleteStore};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

pub type WorkRiskRepository = SoftDeleteStore<WorkRisk>;

impl SoftDeleteEntity for WorkRisk {
    const TABLE: &'static str = "work_risk";
    const KIND: EntityKind = EntityKind::WorkRisk;
    const COLUMNS: &'static [&'static str] = &["work_id", "risk_id"];

    fn record(&self) -> &SoftDeleteRecord {
        &self.record
    }

    fn column_values(&self) -> Vec<Value> {
        vec![text(&self.work_id), text(&self.risk_id)]
    }

    fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(WorkRisk {
            record,
            work_id: row.get(offset)?,
            risk_id: row.get(offset + 1)?,
        })
    }
}

impl SoftDeleteStore<WorkRisk> {
    /// 工程当前的有效关联
    pub fn list_active_for_work(conn: &Connection, work_id: &str) -> RepositoryResult<Vec<WorkRisk>> {
        Self::find_active_where(conn, "work_id = ?1", vec![text(work_id)])
    }

    /// 建立关联
    pub fn link(
        conn: &Connection,
        work_id: &str,
        risk_id: &str,
        at: NaiveDateTime,
    ) -> RepositoryResult<WorkRisk> {
        let link = WorkRisk {
            record: SoftDeleteRecord::new_at(at),
            work_id: work_id.to_string(),
            risk_id: risk_id.to_string(),
        };
        Self::create(conn, &link)?;
        Ok(link)
    }

    /// 与该风险存在有效关联的有效工程数量
    pub fn count_active_works_linked(conn: &Connection, risk_id: &str) -> RepositoryResult<i64> {
        let n = conn.query_row(
            r#"
            SELECT COUNT(DISTINCT l.work_id)
            FROM work_risk l
            JOIN work w ON w.id = l.work_id
            WHERE l.risk_id = ?1
              AND l.deactivated_at IS NULL
              AND w.deactivated_at IS NULL
            "#,
            params![risk_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
