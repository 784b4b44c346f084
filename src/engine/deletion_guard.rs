// ==========================================
// 公共工程管理系统 - 停用前置守卫
// ==========================================
// 红线: Engine 不拼 SQL，依赖计数全部来自仓储层
// ==========================================
// 依赖规则（存在任一有效依赖即拒绝，返回 InUse）:
// - Department     ← 有效 Locality
// - ExecutionState ← 有效 Work 的未关闭状态记录
// - Rubro          ← 有效 ProjectPlan
// - TechnicalRisk  ← 有效 Work 的有效关联
// - ProjectPlan    ← 有效 Work
// - Work / Locality 无守卫
// ==========================================

use crate::domain::types::EntityKind;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{
    LocalityRepository, PlanRepository, WorkRepository, WorkRiskRepository, WorkStateRepository,
};
use rusqlite::Connection;

pub struct DeletionGuard;

impl DeletionGuard {
    /// 检查实体是否可以停用
    pub fn check(conn: &Connection, kind: EntityKind, id: &str) -> EngineResult<()> {
        let (dependents, what) = match kind {
            EntityKind::Department => (
                LocalityRepository::count_active_by_department(conn, id)?,
                "有效地区",
            ),
            EntityKind::ExecutionState => (
                WorkStateRepository::count_active_works_open_in_state(conn, id)?,
                "处于该状态的有效工程",
            ),
            EntityKind::Rubro => (PlanRepository::count_active_by_rubro(conn, id)?, "有效项目计划"),
            EntityKind::TechnicalRisk => (
                WorkRiskRepository::count_active_works_linked(conn, id)?,
                "关联的有效工程",
            ),
            EntityKind::ProjectPlan => (
                WorkRepository::count_active_by_plan(conn, id)?,
                "引用该计划的有效工程",
            ),
            EntityKind::Work
            | EntityKind::Locality
            | EntityKind::WorkStateEntry
            | EntityKind::WorkRisk => (0, ""),
        };

        if dependents > 0 {
            tracing::warn!(
                entity = kind.name(),
                id = id,
                dependents = dependents,
                "停用被拒绝: 存在有效依赖"
            );
            return Err(EngineError::InUse(format!(
                "{}(id={}) 仍有 {} 个{}",
                kind, id, dependents, what
            )));
        }
        Ok(())
    }
}
