// ==========================================
// 公共工程管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化；表名/列名只来自编译期常量
// 约束: 方法接收 &Connection，事务边界由 API 层持有
// ==========================================

pub mod catalog_repo;
pub mod dashboard_repo;
pub mod error;
pub mod plan_repo;
pub mod risk_repo;
pub mod soft_delete;
pub mod work_repo;
pub mod work_risk_repo;
pub mod work_state_repo;

// 重导出核心仓储
pub use catalog_repo::{
    DepartmentRepository, ExecutionStateRepository, LocalityRepository, RubroRepository,
};
pub use dashboard_repo::{DashboardRepository, RubroInvestmentRow, StateCountRow};
pub use error::{RepositoryError, RepositoryResult};
pub use plan_repo::PlanRepository;
pub use risk_repo::RiskRepository;
pub use soft_delete::{SoftDeleteEntity, SoftDeleteStore};
pub use work_repo::WorkRepository;
pub use work_risk_repo::WorkRiskRepository;
pub use work_state_repo::WorkStateRepository;
