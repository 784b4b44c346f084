// ==========================================
// 公共工程管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、写入载荷
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================
// 所有关系均为外键式引用 (id)，反向查询由仓储层按需计算，
// 实体之间不持有可变回指针
// ==========================================

pub mod catalog;
pub mod plan;
pub mod record;
pub mod risk;
pub mod types;
pub mod work;

// 重导出核心类型
pub use catalog::{names_match, Department, ExecutionState, Locality, Rubro};
pub use plan::ProjectPlan;
pub use record::SoftDeleteRecord;
pub use risk::TechnicalRisk;
pub use types::{EntityKind, Priority};
pub use work::{Work, WorkFields, WorkInput, WorkRisk, WorkStateEntry};
