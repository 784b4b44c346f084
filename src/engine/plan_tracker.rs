// ==========================================
// 公共工程管理系统 - 计划执行标志维护
// ==========================================
// 不变量: plan.in_execution == (引用该计划的有效工程数 > 0)
// 红线: 本组件是 in_execution 的唯一写入方
// 红线: 必须在调用方持有的事务内执行
// ==========================================

use crate::domain::plan::ProjectPlan;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{PlanRepository, WorkRepository};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// 修复时发现的标志漂移
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFlagDrift {
    pub plan_id: String,
    pub stored: bool,
    pub expected: bool,
}

pub struct PlanExecutionTracker;

impl PlanExecutionTracker {
    /// 校验目标计划有效（否则 InvalidPlan）
    pub fn validate_target(conn: &Connection, plan_id: &str) -> EngineResult<ProjectPlan> {
        PlanRepository::get_active(conn, plan_id)?.ok_or_else(|| {
            EngineError::InvalidPlan(format!("项目计划(id={}) 不存在或已停用", plan_id))
        })
    }

    /// 挂接：至少有一个引用，直接置 true
    pub fn attach(conn: &Connection, plan_id: &str) -> EngineResult<()> {
        PlanRepository::set_in_execution(conn, plan_id, true)?;
        tracing::debug!(plan_id = plan_id, "计划标记为执行中");
        Ok(())
    }

    /// 解除挂接：按当前引用数重算
    pub fn detach(conn: &Connection, plan_id: &str) -> EngineResult<bool> {
        Self::recompute(conn, plan_id)
    }

    /// 按有效工程引用数重算标志，返回新值
    pub fn recompute(conn: &Connection, plan_id: &str) -> EngineResult<bool> {
        let in_execution = WorkRepository::count_active_by_plan(conn, plan_id)? > 0;
        PlanRepository::set_in_execution(conn, plan_id, in_execution)?;
        tracing::debug!(plan_id = plan_id, in_execution = in_execution, "计划标志已重算");
        Ok(in_execution)
    }

    /// 工程的计划引用发生变化（工程行须已写入新引用）
    ///
    /// 先解除旧计划，再挂接新计划
    pub fn on_plan_changed(
        conn: &Connection,
        previous: Option<&str>,
        current: Option<&str>,
    ) -> EngineResult<()> {
        if let Some(old) = previous {
            if Some(old) != current {
                Self::detach(conn, old)?;
            }
        }
        if let Some(new) = current {
            Self::attach(conn, new)?;
        }
        Ok(())
    }

    /// 全量修复：重算所有有效计划的标志，返回被修正的计划
    pub fn reconcile_all(conn: &Connection) -> EngineResult<Vec<PlanFlagDrift>> {
        let mut drifts = Vec::new();
        for plan in PlanRepository::list_active(conn)? {
            let expected = WorkRepository::count_active_by_plan(conn, &plan.record.id)? > 0;
            if expected != plan.in_execution {
                PlanRepository::set_in_execution(conn, &plan.record.id, expected)?;
                drifts.push(PlanFlagDrift {
                    plan_id: plan.record.id.clone(),
                    stored: plan.in_execution,
                    expected,
                });
            }
        }
        if !drifts.is_empty() {
            tracing::warn!(count = drifts.len(), "计划执行标志存在漂移，已修正");
        }
        Ok(drifts)
    }
}
