// ==========================================
// 公共工程管理系统 - 引擎层
// ==========================================
// 职责: 实现生命周期与引用完整性规则
// 红线: Engine 不拼 SQL，只通过仓储层访问数据
// 红线: Engine 不开启事务；所有方法接收调用方的 &Connection（通常是 Transaction）
// ==========================================

pub mod deletion_guard;
pub mod error;
pub mod lifecycle;
pub mod plan_tracker;
pub mod risk_reconciler;
pub mod work_validation;

// 重导出核心引擎
pub use deletion_guard::DeletionGuard;
pub use error::{EngineError, EngineResult};
pub use lifecycle::WorkLifecycleManager;
pub use plan_tracker::{PlanExecutionTracker, PlanFlagDrift};
pub use risk_reconciler::{AssociationReconciler, LinkDiff, ReconcileOutcome};
pub use work_validation::WorkValidator;
