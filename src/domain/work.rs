// ==========================================
// 公共工程管理系统 - 工程领域模型
// ==========================================
// 聚合根: Work
// - 独占状态历史 (WorkStateEntry) 与风险关联 (WorkRisk)
// - 引用但不拥有 ProjectPlan / TechnicalRisk
// 红线: 每个工程最多一条 ended_at 为空的状态记录（当前状态）
// ==========================================

use crate::domain::record::SoftDeleteRecord;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Work - 工程
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    #[serde(flatten)]
    pub record: SoftDeleteRecord,
    pub work_number: i64,            // 外部工程编号 (有效工程中唯一)
    pub name: String,                // 工程名称
    pub execution_duration: i32,     // 执行工期 (> 0)
    pub execution_year: i32,         // 执行年份 (>= 2000)
    pub start_date: NaiveDate,       // 开工日期
    pub end_date: Option<NaiveDate>, // 完工日期
    pub final_investment: Decimal,   // 最终投资 (> 0)
    pub locality_id: String,         // 所在地区
    pub plan_id: Option<String>,     // 执行的项目计划
}

// ==========================================
// WorkStateEntry - 工程状态历史
// ==========================================
// 只追加: 除关闭当前记录的 ended_at 外不做任何修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkStateEntry {
    #[serde(flatten)]
    pub record: SoftDeleteRecord,
    pub work_id: String,
    pub state_id: String,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
}

impl WorkStateEntry {
    /// 是否为当前（未关闭）记录
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

// ==========================================
// WorkRisk - 工程与技术风险的关联
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRisk {
    #[serde(flatten)]
    pub record: SoftDeleteRecord,
    pub work_id: String,
    pub risk_id: String,
}

// ==========================================
// WorkInput - 工程写入载荷（创建/更新共用）
// ==========================================
// 所有必填字段以 Option 表示“缺失”，由校验规则逐条检查
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkInput {
    pub work_number: Option<i64>,
    pub name: Option<String>,
    pub execution_duration: Option<i32>,
    pub execution_year: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub final_investment: Option<Decimal>,
    pub locality_id: Option<String>,
    /// 更新时 None 表示解除计划关联
    pub plan_id: Option<String>,
    /// 更新时 None 表示不修改风险关联；Some(vec![]) 表示清空
    pub risk_ids: Option<Vec<String>>,
}

/// 通过字段级校验后的工程字段
#[derive(Debug, Clone, PartialEq)]
pub struct WorkFields {
    pub work_number: i64,
    pub name: String,
    pub execution_duration: i32,
    pub execution_year: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub final_investment: Decimal,
    pub locality_id: String,
}

impl WorkFields {
    /// 用校验后的字段构造新工程
    pub fn into_work(self, record: SoftDeleteRecord, plan_id: Option<String>) -> Work {
        Work {
            record,
            work_number: self.work_number,
            name: self.name,
            execution_duration: self.execution_duration,
            execution_year: self.execution_year,
            start_date: self.start_date,
            end_date: self.end_date,
            final_investment: self.final_investment,
            locality_id: self.locality_id,
            plan_id,
        }
    }

    /// 覆盖已有工程的可编辑字段（标识与时间戳保持不变）
    pub fn apply_to(self, work: &mut Work) {
        work.work_number = self.work_number;
        work.name = self.name;
        work.execution_duration = self.execution_duration;
        work.execution_year = self.execution_year;
        work.start_date = self.start_date;
        work.end_date = self.end_date;
        work.final_investment = self.final_investment;
        work.locality_id = self.locality_id;
    }
}
