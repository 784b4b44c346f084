// ==========================================
// 公共工程管理系统 - 驾驶舱 API
// ==========================================
// 职责: 只读聚合查询（计数、求和）
// 一致性: 快照读，不保证与并发写入强一致
// ==========================================

use crate::api::error::ApiResult;
use crate::api::support::with_conn;
use crate::db::SharedConnection;
use crate::repository::{
    DashboardRepository, PlanRepository, RiskRepository, RubroInvestmentRow, StateCountRow,
    WorkRepository,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 驾驶舱汇总指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub active_works: i64,
    pub plans_in_execution: i64,
    pub total_final_investment: Decimal,
    pub active_risks: i64,
}

/// 驾驶舱完整快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub works_by_state: Vec<StateCountRow>,
    pub investment_by_rubro: Vec<RubroInvestmentRow>,
}

pub struct DashboardApi {
    conn: SharedConnection,
}

impl DashboardApi {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    pub fn stats(&self) -> ApiResult<DashboardStats> {
        with_conn(&self.conn, |conn| {
            Ok(DashboardStats {
                active_works: WorkRepository::count_active(conn)?,
                plans_in_execution: PlanRepository::count_active_in_execution(conn)?,
                total_final_investment: WorkRepository::sum_active_final_investment(conn)?,
                active_risks: RiskRepository::count_active(conn)?,
            })
        })
    }

    /// 有效工程按当前状态计数
    pub fn works_by_state(&self) -> ApiResult<Vec<StateCountRow>> {
        with_conn(&self.conn, |conn| Ok(DashboardRepository::works_by_state(conn)?))
    }

    /// 有效工程最终投资按行业类别汇总
    pub fn investment_by_rubro(&self) -> ApiResult<Vec<RubroInvestmentRow>> {
        with_conn(&self.conn, |conn| Ok(DashboardRepository::investment_by_rubro(conn)?))
    }

    pub fn snapshot(&self) -> ApiResult<DashboardSnapshot> {
        let snapshot = DashboardSnapshot {
            stats: self.stats()?,
            works_by_state: self.works_by_state()?,
            investment_by_rubro: self.investment_by_rubro()?,
        };
        tracing::debug!(
            active_works = snapshot.stats.active_works,
            states = snapshot.works_by_state.len(),
            "驾驶舱快照已生成"
        );
        Ok(snapshot)
    }
}
