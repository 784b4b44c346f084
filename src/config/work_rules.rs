// ==========================================
// 公共工程管理系统 - 工程生命周期规则参数
// ==========================================
// 来源: config_kv（缺省时使用 Default）
// ==========================================

use serde::{Deserialize, Serialize};

/// 初始状态名（工程创建时自动打开）
pub const DEFAULT_INITIAL_STATE_NAME: &str = "Planificacion";
/// 终态名（处于该状态的工程不可再修改）
pub const DEFAULT_FINALIZED_STATE_NAME: &str = "finalizada";
/// 执行年份下限
pub const DEFAULT_MIN_EXECUTION_YEAR: i32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRules {
    pub initial_state_name: String,
    pub finalized_state_name: String,
    pub min_execution_year: i32,
}

impl Default for WorkRules {
    fn default() -> Self {
        Self {
            initial_state_name: DEFAULT_INITIAL_STATE_NAME.to_string(),
            finalized_state_name: DEFAULT_FINALIZED_STATE_NAME.to_string(),
            min_execution_year: DEFAULT_MIN_EXECUTION_YEAR,
        }
    }
}
