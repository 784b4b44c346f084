// ==========================================
// 公共工程管理系统 - 基础目录领域模型
// ==========================================
// 包含: 部门 / 地区 / 行业类别 / 执行状态
// 红线: 不含数据访问逻辑
// ==========================================

use crate::domain::record::SoftDeleteRecord;
use serde::{Deserialize, Serialize};

// ==========================================
// Department - 部门
// ==========================================
// 名称在有效部门中唯一（忽略大小写）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    #[serde(flatten)]
    pub record: SoftDeleteRecord,
    pub name: String,
}

// ==========================================
// Locality - 地区
// ==========================================
// 归属一个部门，分配时部门必须有效
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locality {
    #[serde(flatten)]
    pub record: SoftDeleteRecord,
    pub name: String,
    pub department_id: String,
}

// ==========================================
// Rubro - 行业类别
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubro {
    #[serde(flatten)]
    pub record: SoftDeleteRecord,
    pub name: String,
}

// ==========================================
// ExecutionState - 工程执行状态
// ==========================================
// 例如 "Planificacion" / "Ejecucion" / "Finalizada"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionState {
    #[serde(flatten)]
    pub record: SoftDeleteRecord,
    pub name: String,
}

impl ExecutionState {
    /// 名称是否与给定标签相同（忽略大小写与首尾空白）
    pub fn is_named(&self, label: &str) -> bool {
        names_match(&self.name, label)
    }
}

/// 名称比较规则：去掉首尾空白后按 Unicode 小写比较
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
