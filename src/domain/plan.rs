// ==========================================
// 公共工程管理系统 - 项目计划领域模型
// ==========================================
// 红线: in_execution 为派生字段，只能由 PlanExecutionTracker 写入
// ==========================================

use crate::domain::record::SoftDeleteRecord;
use crate::domain::types::Priority;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// ProjectPlan - 项目计划
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPlan {
    #[serde(flatten)]
    pub record: SoftDeleteRecord,
    pub name: String,                       // 计划名称
    pub description: Option<String>,        // 描述
    pub study_months: Option<i32>,          // 研究月数
    pub estimated_investment: Decimal,      // 预计投资 (>= 0)
    pub estimated_duration: Option<i32>,    // 预计工期
    pub priority: Priority,                 // 优先级
    pub in_execution: bool,                 // 是否执行中 (派生)
    pub rubro_id: String,                   // 所属行业类别
}

impl ProjectPlan {
    /// 是否允许编辑/停用（执行中的计划被有效工程占用）
    pub fn is_locked_by_execution(&self) -> bool {
        self.in_execution
    }
}
