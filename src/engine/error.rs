// ==========================================
// 公共工程管理系统 - 引擎层错误类型
// ==========================================
// 所有错误均可在请求边界恢复：校验与依赖检查先于任何写入
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// 缺失或非法的必填字段（报告第一条违反的规则）
    #[error("校验失败: {0}")]
    Validation(String),

    /// 引用的 id 不存在或已停用
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 有效记录中的唯一性冲突
    #[error("唯一性冲突: {0}")]
    Conflict(String),

    /// 存在有效依赖，禁止停用/编辑
    #[error("资源被占用: {0}")]
    InUse(String),

    /// 工程已处于终态
    #[error("工程已完工，禁止修改: {0}")]
    Finalized(String),

    /// 工程已停用
    #[error("工程已停用: {0}")]
    Deactivated(String),

    #[error("无效的技术风险: {0}")]
    InvalidRisk(String),

    #[error("无效的项目计划: {0}")]
    InvalidPlan(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

// 仓储层的“未找到/已停用”属于业务语义，其余保持为技术错误
impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                EngineError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::AlreadyDeactivated { entity, id } => {
                EngineError::Deactivated(format!("{}(id={}) 已停用", entity, id))
            }
            other => EngineError::Repository(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_not_found_becomes_business_error() {
        let err: EngineError = RepositoryError::not_found("Locality", "L1").into();
        assert!(matches!(err, EngineError::NotFound(ref m) if m.contains("L1")));

        let err: EngineError = RepositoryError::AlreadyDeactivated {
            entity: "Work".to_string(),
            id: "W1".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Deactivated(_)));

        let err: EngineError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(err, EngineError::Repository(_)));
    }
}
