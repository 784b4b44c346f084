// ==========================================
// 公共工程管理系统 - API 层
// ==========================================
// 职责: 提供按实体划分的业务 API，持有事务边界
// 红线: 所有写操作在持锁的单个事务内完成；失败即回滚
// ==========================================

pub mod catalog_api;
pub mod dashboard_api;
pub mod error;
pub mod plan_api;
pub mod risk_api;
mod support;
pub mod territory_api;
pub mod work_api;

// 重导出核心类型
pub use catalog_api::{CatalogNameInput, ExecutionStateApi, RubroApi};
pub use dashboard_api::{DashboardApi, DashboardSnapshot, DashboardStats};
pub use error::{ApiError, ApiResult};
pub use plan_api::{PlanApi, PlanInput};
pub use risk_api::{RiskApi, RiskInput};
pub use territory_api::{DepartmentApi, DepartmentInput, LocalityApi, LocalityInput};
pub use work_api::{StateHistoryItem, WorkApi, WorkDetail};
