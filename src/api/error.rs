// ==========================================
// 公共工程管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把仓储/引擎错误转换为调用方可理解的错误
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("唯一性冲突: {0}")]
    Conflict(String),

    #[error("资源被占用: {0}")]
    InUse(String),

    #[error("工程已完工: {0}")]
    Finalized(String),

    #[error("记录已停用: {0}")]
    Deactivated(String),

    #[error("无效的技术风险: {0}")]
    InvalidRisk(String),

    #[error("无效的项目计划: {0}")]
    InvalidPlan(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),
}

impl ApiError {
    /// 细粒度错误类别（传输层 error_kind）
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InUse(_) => "IN_USE",
            ApiError::Finalized(_) => "FINALIZED",
            ApiError::Deactivated(_) => "DEACTIVATED",
            ApiError::InvalidRisk(_) => "INVALID_RISK",
            ApiError::InvalidPlan(_) => "INVALID_PLAN",
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_) => "DATABASE",
        }
    }

    /// 是否为业务规则错误（可由调用方修正请求后重试）
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            ApiError::ValidationError(_)
                | ApiError::Conflict(_)
                | ApiError::InUse(_)
                | ApiError::Finalized(_)
                | ApiError::Deactivated(_)
                | ApiError::InvalidRisk(_)
                | ApiError::InvalidPlan(_)
        )
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::AlreadyDeactivated { entity, id } => {
                ApiError::Deactivated(format!("{}(id={})已停用", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            // 应用层检查之后仍触发的约束属于并发兜底
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::NotFound(format!("外键约束违反: {}", msg))
            }
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::ValidationError(msg),
            EngineError::NotFound(msg) => ApiError::NotFound(msg),
            EngineError::Conflict(msg) => ApiError::Conflict(msg),
            EngineError::InUse(msg) => ApiError::InUse(msg),
            EngineError::Finalized(msg) => ApiError::Finalized(msg),
            EngineError::Deactivated(msg) => ApiError::Deactivated(msg),
            EngineError::InvalidRisk(msg) => ApiError::InvalidRisk(msg),
            EngineError::InvalidPlan(msg) => ApiError::InvalidPlan(msg),
            EngineError::Repository(inner) => ApiError::from(inner),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
