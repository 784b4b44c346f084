// ==========================================
// 公共工程管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 工程生命周期与引用完整性引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 生命周期与引用完整性规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// SQL 性能统计
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装与响应封装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EntityKind, Priority};

// 领域实体
pub use domain::{
    Department, ExecutionState, Locality, ProjectPlan, Rubro, SoftDeleteRecord, TechnicalRisk,
    Work, WorkInput, WorkRisk, WorkStateEntry,
};

// 引擎
pub use engine::{
    AssociationReconciler, DeletionGuard, EngineError, PlanExecutionTracker, WorkLifecycleManager,
};

// API
pub use api::{
    ApiError, ApiResult, DashboardApi, DepartmentApi, ExecutionStateApi, LocalityApi, PlanApi,
    RiskApi, RubroApi, WorkApi,
};

// 应用
pub use app::{AppState, ResponseEnvelope};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "公共工程管理系统";
