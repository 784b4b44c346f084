// ==========================================
// 公共工程管理系统 - 工程生命周期管理
// ==========================================
// 状态机: {存在状态为 S 的未关闭记录} ∪ {已停用}
// 红线: 所有方法在调用方持有的同一事务内运行，失败即整体回滚
// 红线: 校验（字段/唯一性/引用）全部先于任何写入
// ==========================================
// 写入顺序:
//   create : 工程行 → 初始状态 → 计划挂接 → 风险关联
//   update : 工程行 → 计划解除/挂接 → 风险关联
//   deactivate : 停用工程行 → 旧计划重算
// ==========================================

use crate::config::WorkRules;
use crate::domain::catalog::ExecutionState;
use crate::domain::record::SoftDeleteRecord;
use crate::domain::types::EntityKind;
use crate::domain::work::{Work, WorkFields, WorkInput, WorkStateEntry};
use crate::engine::deletion_guard::DeletionGuard;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::plan_tracker::PlanExecutionTracker;
use crate::engine::risk_reconciler::AssociationReconciler;
use crate::engine::work_validation::WorkValidator;
use crate::repository::{
    ExecutionStateRepository, LocalityRepository, WorkRepository, WorkStateRepository,
};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::collections::BTreeSet;

/// 写入前已完成的全部校验结果
struct CheckedWrite {
    fields: WorkFields,
    plan_id: Option<String>,
    risk_targets: Option<BTreeSet<String>>,
}

pub struct WorkLifecycleManager {
    rules: WorkRules,
}

impl WorkLifecycleManager {
    pub fn new(rules: WorkRules) -> Self {
        Self { rules }
    }

    // ==========================================
    // 校验
    // ==========================================

    /// 字段 → 编号唯一 → 地区 → 计划 → 风险
    fn check_write(
        &self,
        conn: &Connection,
        input: &WorkInput,
        self_id: Option<&str>,
    ) -> EngineResult<CheckedWrite> {
        let fields = WorkValidator::validate(input, &self.rules)?;

        if WorkRepository::work_number_taken(conn, fields.work_number, self_id)? {
            return Err(EngineError::Conflict(format!(
                "工程编号 {} 已被有效工程使用",
                fields.work_number
            )));
        }

        LocalityRepository::get_active(conn, &fields.locality_id)?.ok_or_else(|| {
            EngineError::NotFound(format!("地区(id={}) 不存在或已停用", fields.locality_id))
        })?;

        let plan_id = match input.plan_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                PlanExecutionTracker::validate_target(conn, id)?;
                Some(id.to_string())
            }
            _ => None,
        };

        let risk_targets = match &input.risk_ids {
            Some(ids) => Some(AssociationReconciler::validate_targets(conn, ids)?),
            None => None,
        };

        Ok(CheckedWrite {
            fields,
            plan_id,
            risk_targets,
        })
    }

    /// 读取工程；不存在 → NotFound，已停用 → Deactivated
    pub fn load_live(&self, conn: &Connection, work_id: &str) -> EngineResult<Work> {
        let work = WorkRepository::get_any(conn, work_id)?
            .ok_or_else(|| EngineError::NotFound(format!("工程(id={})", work_id)))?;
        if !work.record.is_active() {
            return Err(EngineError::Deactivated(format!(
                "工程(id={}, 编号={})",
                work.record.id, work.work_number
            )));
        }
        Ok(work)
    }

    /// 工程当前状态（未关闭记录及其状态定义）
    pub fn current_state(
        &self,
        conn: &Connection,
        work_id: &str,
    ) -> EngineResult<Option<(WorkStateEntry, ExecutionState)>> {
        let entry = match WorkStateRepository::find_open(conn, work_id)? {
            Some(entry) => entry,
            None => return Ok(None),
        };
        // 状态定义可能已被停用，历史仍按原名称解释
        let state = ExecutionStateRepository::get_any(conn, &entry.state_id)?
            .ok_or_else(|| EngineError::NotFound(format!("执行状态(id={})", entry.state_id)))?;
        Ok(Some((entry, state)))
    }

    /// 已完工（当前状态为终态）的工程不可修改
    pub fn ensure_mutable(&self, conn: &Connection, work: &Work) -> EngineResult<()> {
        if let Some((_, state)) = self.current_state(conn, &work.record.id)? {
            if state.is_named(&self.rules.finalized_state_name) {
                tracing::warn!(
                    work_id = %work.record.id,
                    state = %state.name,
                    "工程已处于终态，拒绝修改"
                );
                return Err(EngineError::Finalized(format!(
                    "工程(编号={}) 当前状态为 {}",
                    work.work_number, state.name
                )));
            }
        }
        Ok(())
    }

    // ==========================================
    // 变更
    // ==========================================

    /// 创建工程
    pub fn create(&self, conn: &Connection, input: &WorkInput, now: NaiveDateTime) -> EngineResult<Work> {
        let checked = self.check_write(conn, input, None)?;

        let work = checked
            .fields
            .into_work(SoftDeleteRecord::new_at(now), checked.plan_id);
        WorkRepository::create(conn, &work)?;

        match ExecutionStateRepository::find_active_by_name(conn, &self.rules.initial_state_name)? {
            Some(initial) => {
                WorkStateRepository::open(conn, &work.record.id, &initial.record.id, now)?;
            }
            None => {
                tracing::debug!(
                    work_id = %work.record.id,
                    initial_state = %self.rules.initial_state_name,
                    "初始状态不存在，工程无当前状态"
                );
            }
        }

        PlanExecutionTracker::on_plan_changed(conn, None, work.plan_id.as_deref())?;

        if let Some(targets) = &checked.risk_targets {
            AssociationReconciler::apply(conn, &work.record.id, targets, now)?;
        }

        Ok(work)
    }

    /// 更新工程
    ///
    /// `input.plan_id == None` 解除计划；`input.risk_ids == None` 不修改风险关联
    pub fn update(
        &self,
        conn: &Connection,
        work_id: &str,
        input: &WorkInput,
        now: NaiveDateTime,
    ) -> EngineResult<Work> {
        let mut work = self.load_live(conn, work_id)?;
        self.ensure_mutable(conn, &work)?;
        let checked = self.check_write(conn, input, Some(work_id))?;

        let previous_plan = work.plan_id.take();
        checked.fields.apply_to(&mut work);
        work.plan_id = checked.plan_id;
        WorkRepository::update(conn, &work)?;

        PlanExecutionTracker::on_plan_changed(
            conn,
            previous_plan.as_deref(),
            work.plan_id.as_deref(),
        )?;

        if let Some(targets) = &checked.risk_targets {
            AssociationReconciler::apply(conn, &work.record.id, targets, now)?;
        }

        Ok(work)
    }

    /// 状态迁移：关闭当前记录并打开新记录
    pub fn change_state(
        &self,
        conn: &Connection,
        work_id: &str,
        state_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<WorkStateEntry> {
        let work = self.load_live(conn, work_id)?;
        let target = ExecutionStateRepository::get_active(conn, state_id)?.ok_or_else(|| {
            EngineError::NotFound(format!("执行状态(id={}) 不存在或已停用", state_id))
        })?;
        self.ensure_mutable(conn, &work)?;

        let closed = WorkStateRepository::close_open(conn, work_id, now)?;
        let entry = WorkStateRepository::open(conn, work_id, &target.record.id, now)?;

        tracing::info!(
            work_id = work_id,
            state = %target.name,
            closed_entries = closed,
            "工程状态已变更"
        );
        Ok(entry)
    }

    /// 停用工程，并重算原计划的执行标志
    pub fn deactivate(&self, conn: &Connection, work_id: &str, now: NaiveDateTime) -> EngineResult<Work> {
        let work = self.load_live(conn, work_id)?;
        DeletionGuard::check(conn, EntityKind::Work, work_id)?;

        WorkRepository::deactivate(conn, work_id, now)?;
        PlanExecutionTracker::on_plan_changed(conn, work.plan_id.as_deref(), None)?;

        Ok(work)
    }
}
