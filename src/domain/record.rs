// ==========================================
// 公共工程管理系统 - 逻辑删除记录
// ==========================================
// 所有实体内嵌同一个 SoftDeleteRecord（组合，不是继承）
// 红线: 记录永不物理删除，deactivated_at 非空即视为已删除
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 逻辑删除基础字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDeleteRecord {
    pub id: String,                            // 主键 (UUID v4)
    pub created_at: NaiveDateTime,             // 创建时间，只写一次
    pub deactivated_at: Option<NaiveDateTime>, // 停用时间 (null = 有效)
}

impl SoftDeleteRecord {
    /// 为新实体分配标识与创建时间
    pub fn new_at(created_at: NaiveDateTime) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at,
            deactivated_at: None,
        }
    }

    /// 是否有效（未停用）
    pub fn is_active(&self) -> bool {
        self.deactivated_at.is_none()
    }
}
