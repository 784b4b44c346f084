// ==========================================
// 公共工程管理系统 - 技术风险领域模型
// ==========================================
// 注意: risk_number 全局唯一（包括已停用记录），与其他实体不同
// ==========================================

use crate::domain::record::SoftDeleteRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalRisk {
    #[serde(flatten)]
    pub record: SoftDeleteRecord,
    pub risk_number: i64,                    // 风险编号
    pub nature: String,                      // 风险性质
    pub proposed_solution: Option<String>,   // 建议方案
    pub mitigation_measures: Option<String>, // 缓解措施
    pub actions_taken: Option<String>,       // 已执行动作
}
