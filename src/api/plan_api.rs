// ==========================================
// 公共工程管理系统 - 项目计划 API
// ==========================================
// 职责: 项目计划的增改查、停用
// 规则: 新建计划 in_execution = false（忽略载荷）
// 规则: 执行中的计划禁止编辑/停用 (InUse)
// 规则: in_execution 只由 PlanExecutionTracker 维护；停用时清零
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::support::{deactivate_guarded, now, require_name, with_conn, with_tx};
use crate::db::SharedConnection;
use crate::domain::plan::ProjectPlan;
use crate::domain::record::SoftDeleteRecord;
use crate::domain::types::Priority;
use crate::repository::{PlanRepository, RubroRepository};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// PlanApi - 项目计划 API
// ==========================================
pub struct PlanApi {
    conn: SharedConnection,
}

impl PlanApi {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// 创建项目计划
    ///
    /// # 返回
    /// - Ok(ProjectPlan): 新计划（in_execution = false）
    /// - Err(ValidationError): 名称为空 / 投资缺失或为负 / 优先级缺失
    /// - Err(NotFound): 行业类别不存在或已停用
    pub fn create(&self, input: PlanInput) -> ApiResult<ProjectPlan> {
        let checked = input.validate()?;
        let plan = with_tx(&self.conn, |conn| {
            require_rubro(conn, &checked.rubro_id)?;
            let plan = ProjectPlan {
                record: SoftDeleteRecord::new_at(now()),
                name: checked.name,
                description: checked.description,
                study_months: checked.study_months,
                estimated_investment: checked.estimated_investment,
                estimated_duration: checked.estimated_duration,
                priority: checked.priority,
                in_execution: false,
                rubro_id: checked.rubro_id,
            };
            PlanRepository::create(conn, &plan)?;
            Ok(plan)
        })?;
        tracing::info!(plan_id = %plan.record.id, name = %plan.name, "项目计划已创建");
        Ok(plan)
    }

    /// 更新项目计划（执行中的计划拒绝修改）
    pub fn update(&self, id: &str, input: PlanInput) -> ApiResult<ProjectPlan> {
        let checked = input.validate()?;
        let plan = with_tx(&self.conn, |conn| {
            let mut plan = PlanRepository::require_active(conn, id)?;
            if plan.is_locked_by_execution() {
                tracing::warn!(plan_id = id, "计划执行中，拒绝修改");
                return Err(ApiError::InUse(format!(
                    "项目计划 '{}' 正在执行中，不能修改",
                    plan.name
                )));
            }
            require_rubro(conn, &checked.rubro_id)?;

            plan.name = checked.name;
            plan.description = checked.description;
            plan.study_months = checked.study_months;
            plan.estimated_investment = checked.estimated_investment;
            plan.estimated_duration = checked.estimated_duration;
            plan.priority = checked.priority;
            plan.rubro_id = checked.rubro_id;
            PlanRepository::update(conn, &plan)?;
            Ok(plan)
        })?;
        tracing::info!(plan_id = id, "项目计划已更新");
        Ok(plan)
    }

    pub fn get_active(&self, id: &str) -> ApiResult<ProjectPlan> {
        with_conn(&self.conn, |conn| Ok(PlanRepository::require_active(conn, id)?))
    }

    pub fn get_any(&self, id: &str) -> ApiResult<ProjectPlan> {
        with_conn(&self.conn, |conn| {
            PlanRepository::get_any(conn, id)?
                .ok_or_else(|| ApiError::NotFound(format!("项目计划(id={})不存在", id)))
        })
    }

    pub fn list_active(&self) -> ApiResult<Vec<ProjectPlan>> {
        with_conn(&self.conn, |conn| Ok(PlanRepository::list_active(conn)?))
    }

    pub fn list_all(&self) -> ApiResult<Vec<ProjectPlan>> {
        with_conn(&self.conn, |conn| Ok(PlanRepository::list_all(conn)?))
    }

    /// 停用项目计划
    ///
    /// 执行中或仍被有效工程引用时拒绝；通过守卫即说明执行标志为 false
    pub fn deactivate(&self, id: &str) -> ApiResult<()> {
        with_tx(&self.conn, |conn| {
            if let Some(plan) = PlanRepository::get_active(conn, id)? {
                if plan.is_locked_by_execution() {
                    return Err(ApiError::InUse(format!(
                        "项目计划 '{}' 正在执行中，不能停用",
                        plan.name
                    )));
                }
            }
            deactivate_guarded::<ProjectPlan>(conn, id)?;
            Ok(())
        })?;
        tracing::info!(plan_id = id, "项目计划已停用");
        Ok(())
    }
}

fn require_rubro(conn: &Connection, rubro_id: &str) -> ApiResult<()> {
    RubroRepository::get_active(conn, rubro_id)?
        .ok_or_else(|| ApiError::NotFound(format!("行业类别(id={})不存在或已停用", rubro_id)))?;
    Ok(())
}

// ==========================================
// 请求载荷
// ==========================================

/// 项目计划写入载荷（in_execution 不可由调用方设置）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanInput {
    pub name: String,
    pub description: Option<String>,
    pub study_months: Option<i32>,
    pub estimated_investment: Option<Decimal>,
    pub estimated_duration: Option<i32>,
    pub priority: Option<Priority>,
    pub rubro_id: String,
}

struct CheckedPlan {
    name: String,
    description: Option<String>,
    study_months: Option<i32>,
    estimated_investment: Decimal,
    estimated_duration: Option<i32>,
    priority: Priority,
    rubro_id: String,
}

impl PlanInput {
    fn validate(self) -> ApiResult<CheckedPlan> {
        let name = require_name(&self.name, "项目计划")?;

        let estimated_investment = match self.estimated_investment {
            Some(v) if v >= Decimal::ZERO => v,
            Some(_) => {
                return Err(ApiError::ValidationError("预计投资不能为负数".to_string()))
            }
            None => return Err(ApiError::ValidationError("预计投资为必填项".to_string())),
        };

        let priority = self
            .priority
            .ok_or_else(|| ApiError::ValidationError("优先级为必填项".to_string()))?;

        let rubro_id = self.rubro_id.trim().to_string();
        if rubro_id.is_empty() {
            return Err(ApiError::ValidationError("项目计划必须指定行业类别".to_string()));
        }

        Ok(CheckedPlan {
            name,
            description: self.description,
            study_months: self.study_months,
            estimated_investment,
            estimated_duration: self.estimated_duration,
            priority,
            rubro_id,
        })
    }
}
