// ==========================================
// 公共工程管理系统 - 工程 API
// ==========================================
// 职责: 工程增改查、状态迁移、停用、详情视图
// 事务: 每个写操作持锁并在单个事务内调用 WorkLifecycleManager，
//       同一工程的并发状态迁移因此串行执行
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::support::{now, with_conn, with_tx};
use crate::config::WorkRules;
use crate::db::SharedConnection;
use crate::domain::work::{Work, WorkInput, WorkStateEntry};
use crate::engine::WorkLifecycleManager;
use crate::perf::PerfGuard;
use crate::repository::{ExecutionStateRepository, WorkRepository, WorkRiskRepository, WorkStateRepository};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

// ==========================================
// WorkApi - 工程 API
// ==========================================

/// 工程API
///
/// 职责：
/// 1. 工程创建/更新（字段校验、编号唯一、计划标志、风险关联）
/// 2. 状态迁移（关闭当前记录 + 打开新记录，原子）
/// 3. 停用（重算原计划标志）
/// 4. 详情与状态历史查询
pub struct WorkApi {
    conn: SharedConnection,
    lifecycle: WorkLifecycleManager,
}

impl WorkApi {
    pub fn new(conn: SharedConnection, rules: WorkRules) -> Self {
        Self {
            conn,
            lifecycle: WorkLifecycleManager::new(rules),
        }
    }

    /// 创建工程
    ///
    /// # 返回
    /// - Ok(Work): 新工程；若存在初始状态则已打开初始状态记录
    /// - Err(ValidationError): 字段校验失败（第一条违反的规则）
    /// - Err(Conflict): 工程编号已被有效工程使用
    /// - Err(NotFound): 地区不存在或已停用
    /// - Err(InvalidPlan / InvalidRisk): 关联对象不存在或已停用
    pub fn create(&self, input: WorkInput) -> ApiResult<Work> {
        let _perf = PerfGuard::new("work.create");
        let work = with_tx(&self.conn, |conn| {
            Ok(self.lifecycle.create(conn, &input, now())?)
        })?;
        tracing::info!(
            work_id = %work.record.id,
            work_number = work.work_number,
            plan_id = work.plan_id.as_deref().unwrap_or("-"),
            "工程已创建"
        );
        Ok(work)
    }

    /// 更新工程
    ///
    /// 载荷中 plan_id 为空表示解除计划；risk_ids 为空表示不修改风险关联
    pub fn update(&self, id: &str, input: WorkInput) -> ApiResult<Work> {
        let _perf = PerfGuard::new("work.update").entity(id);
        let work = with_tx(&self.conn, |conn| {
            Ok(self.lifecycle.update(conn, id, &input, now())?)
        })?;
        tracing::info!(work_id = id, work_number = work.work_number, "工程已更新");
        Ok(work)
    }

    /// 状态迁移
    ///
    /// # 返回
    /// - Ok(WorkStateEntry): 新打开的状态记录
    /// - Err(NotFound): 工程或目标状态不存在/已停用
    /// - Err(Deactivated): 工程已停用
    /// - Err(Finalized): 工程当前处于终态
    pub fn change_state(&self, work_id: &str, state_id: &str) -> ApiResult<WorkStateEntry> {
        let _perf = PerfGuard::new("work.change_state").entity(work_id);
        with_tx(&self.conn, |conn| {
            Ok(self.lifecycle.change_state(conn, work_id, state_id, now())?)
        })
    }

    /// 停用工程（无依赖守卫；同时重算原计划的执行标志）
    pub fn deactivate(&self, id: &str) -> ApiResult<()> {
        let _perf = PerfGuard::new("work.deactivate").entity(id);
        let work = with_tx(&self.conn, |conn| {
            Ok(self.lifecycle.deactivate(conn, id, now())?)
        })?;
        tracing::info!(
            work_id = id,
            plan_id = work.plan_id.as_deref().unwrap_or("-"),
            "工程已停用"
        );
        Ok(())
    }

    pub fn get_active(&self, id: &str) -> ApiResult<Work> {
        with_conn(&self.conn, |conn| Ok(WorkRepository::require_active(conn, id)?))
    }

    pub fn get_any(&self, id: &str) -> ApiResult<Work> {
        with_conn(&self.conn, |conn| load_any(conn, id))
    }

    pub fn list_active(&self) -> ApiResult<Vec<Work>> {
        with_conn(&self.conn, |conn| Ok(WorkRepository::list_active(conn)?))
    }

    pub fn list_all(&self) -> ApiResult<Vec<Work>> {
        with_conn(&self.conn, |conn| Ok(WorkRepository::list_all(conn)?))
    }

    /// 当前状态名称（无未关闭记录时为 None）
    pub fn current_state_name(&self, work_id: &str) -> ApiResult<Option<String>> {
        with_conn(&self.conn, |conn| {
            load_any(conn, work_id)?;
            let current = self.lifecycle.current_state(conn, work_id)?;
            Ok(current.map(|(_, state)| state.name))
        })
    }

    /// 状态历史（按开始时间排序，包括已关闭记录）
    pub fn list_history(&self, work_id: &str) -> ApiResult<Vec<StateHistoryItem>> {
        with_conn(&self.conn, |conn| {
            load_any(conn, work_id)?;
            history_items(conn, work_id)
        })
    }

    /// 工程的有效风险关联（风险 id）
    pub fn list_risk_ids(&self, work_id: &str) -> ApiResult<Vec<String>> {
        with_conn(&self.conn, |conn| {
            load_any(conn, work_id)?;
            risk_ids(conn, work_id)
        })
    }

    /// 工程详情：工程 + 当前状态 + 历史 + 风险关联
    pub fn get_detail(&self, work_id: &str) -> ApiResult<WorkDetail> {
        with_conn(&self.conn, |conn| {
            let work = load_any(conn, work_id)?;
            let history = history_items(conn, work_id)?;
            let current_state = history
                .iter()
                .find(|h| h.ended_at.is_none())
                .map(|h| h.state_name.clone());
            Ok(WorkDetail {
                work,
                current_state,
                history,
                risk_ids: risk_ids(conn, work_id)?,
            })
        })
    }
}

fn load_any(conn: &Connection, id: &str) -> ApiResult<Work> {
    WorkRepository::get_any(conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("工程(id={})不存在", id)))
}

fn history_items(conn: &Connection, work_id: &str) -> ApiResult<Vec<StateHistoryItem>> {
    let entries = WorkStateRepository::history(conn, work_id)?;
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let state_name = ExecutionStateRepository::get_any(conn, &entry.state_id)?
            .map(|s| s.name)
            .unwrap_or_default();
        items.push(StateHistoryItem {
            entry_id: entry.record.id,
            state_id: entry.state_id,
            state_name,
            started_at: entry.started_at,
            ended_at: entry.ended_at,
        });
    }
    Ok(items)
}

fn risk_ids(conn: &Connection, work_id: &str) -> ApiResult<Vec<String>> {
    Ok(WorkRiskRepository::list_active_for_work(conn, work_id)?
        .into_iter()
        .map(|l| l.risk_id)
        .collect())
}

// ==========================================
// 视图
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateHistoryItem {
    pub entry_id: String,
    pub state_id: String,
    pub state_name: String,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkDetail {
    pub work: Work,
    pub current_state: Option<String>,
    pub history: Vec<StateHistoryItem>,
    pub risk_ids: Vec<String>,
}
