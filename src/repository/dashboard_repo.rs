// ==========================================
// 公共工程管理系统 - 驾驶舱只读查询
// ==========================================
// 红线: 只读；结果是快照，不做强一致保证
// ==========================================

use crate::repository::error::RepositoryResult;
use crate::repository::soft_delete::read_decimal;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 按当前状态统计的有效工程数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateCountRow {
    pub state_id: String,
    pub state_name: String,
    pub work_count: i64,
}

/// 按行业类别汇总的最终投资
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubroInvestmentRow {
    pub rubro_id: String,
    pub rubro_name: String,
    pub total_investment: Decimal,
}

pub struct DashboardRepository;

impl DashboardRepository {
    /// 有效工程按当前未关闭状态分组计数
    pub fn works_by_state(conn: &Connection) -> RepositoryResult<Vec<StateCountRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT s.id, s.name, COUNT(DISTINCT e.work_id)
            FROM work_state_entry e
            JOIN work w ON w.id = e.work_id
            JOIN execution_state s ON s.id = e.state_id
            WHERE e.ended_at IS NULL
              AND w.deactivated_at IS NULL
            GROUP BY s.id, s.name
            ORDER BY s.name
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(StateCountRow {
                state_id: row.get(0)?,
                state_name: row.get(1)?,
                work_count: row.get(2)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// 有效工程的最终投资按计划所属行业类别汇总
    ///
    /// 计划与行业类别不要求有效（历史归属照常计入）
    pub fn investment_by_rubro(conn: &Connection) -> RepositoryResult<Vec<RubroInvestmentRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT r.id, r.name, w.final_investment
            FROM work w
            JOIN project_plan p ON p.id = w.plan_id
            JOIN rubro r ON r.id = p.rubro_id
            WHERE w.deactivated_at IS NULL
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                read_decimal(row, 2)?,
            ))
        })?;

        let mut totals: BTreeMap<String, RubroInvestmentRow> = BTreeMap::new();
        for row in rows {
            let (rubro_id, rubro_name, amount) = row?;
            totals
                .entry(rubro_id.clone())
                .or_insert_with(|| RubroInvestmentRow {
                    rubro_id,
                    rubro_name,
                    total_investment: Decimal::ZERO,
                })
                .total_investment += amount;
        }

        let mut out: Vec<RubroInvestmentRow> = totals.into_values().collect();
        out.sort_by(|a, b| a.rubro_name.cmp(&b.rubro_name));
        Ok(out)
    }
}
