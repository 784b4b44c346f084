// ==========================================
// 公共工程管理系统 - 技术风险数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 注意: risk_number 的唯一性是全局的（包括已停用记录）
// ==========================================

use crate::domain::record::SoftDeleteRecord;
use crate::domain::risk::TechnicalRisk;
use crate::domain::types::EntityKind;
use crate::repository::error::RepositoryResult;
use crate::repository::soft_delete::{int, opt_text, text, SoftDeleteEntity, SoftDeleteStore};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub type RiskRepository = SoftDeleteStore<TechnicalRisk>;

impl SoftDeleteEntity for TechnicalRisk {
    const TABLE: &'static str = "technical_risk";
    const KIND: EntityKind = EntityKind::TechnicalRisk;
    const COLUMNS: &'static [&'static str] = &[
        "risk_number",
        "nature",
        "proposed_solution",
        "mitigation_measures",
        "actions_taken",
    ];

    fn record(&self) -> &SoftDeleteRecord {
        &self.record
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            int(self.risk_number),
            text(&self.nature),
            opt_text(self.proposed_solution.as_deref()),
            opt_text(self.mitigation_measures.as_deref()),
            opt_text(self.actions_taken.as_deref()),
        ]
    }

    fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(TechnicalRisk {
            record,
            risk_number: row.get(offset)?,
            nature: row.get(offset + 1)?,
            proposed_solution: row.get(offset + 2)?,
            mitigation_measures: row.get(offset + 3)?,
            actions_taken: row.get(offset + 4)?,
        })
    }
}

impl SoftDeleteStore<TechnicalRisk> {
    /// 编号是否已被占用（包括已停用记录）
    ///
    /// `exclude_id` 用于更新时排除自身
    pub fn risk_number_taken(
        conn: &Connection,
        risk_number: i64,
        exclude_id: Option<&str>,
    ) -> RepositoryResult<bool> {
        let hit: Option<String> = conn
            .query_row(
                "SELECT id FROM technical_risk WHERE risk_number = ?1 AND id <> COALESCE(?2, '') LIMIT 1",
                params![risk_number, exclude_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    /// 有效风险数量
    pub fn count_active(conn: &Connection) -> RepositoryResult<i64> {
        let n = conn.query_row(
            "SELECT COUNT(*) FROM technical_risk WHERE deactivated_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
