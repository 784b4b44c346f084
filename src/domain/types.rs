// ==========================================
// 公共工程管理系统 - 领域类型定义
// ==========================================
// 职责: 枚举与基础值类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 实体种类 (Entity Kind)
// ==========================================
// 用途: 错误信息、删除守卫、日志字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Department,
    Locality,
    Rubro,
    ExecutionState,
    ProjectPlan,
    Work,
    WorkStateEntry,
    WorkRisk,
    TechnicalRisk,
}

impl EntityKind {
    /// 实体名（与表名无关，用于错误信息）
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Department => "Department",
            EntityKind::Locality => "Locality",
            EntityKind::Rubro => "Rubro",
            EntityKind::ExecutionState => "ExecutionState",
            EntityKind::ProjectPlan => "ProjectPlan",
            EntityKind::Work => "Work",
            EntityKind::WorkStateEntry => "WorkStateEntry",
            EntityKind::WorkRisk => "WorkRisk",
            EntityKind::TechnicalRisk => "TechnicalRisk",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ==========================================
// 项目计划优先级 (Priority)
// ==========================================
// 固定有序枚举: UNO 最高, CUATRO 最低
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Uno,    // 一级
    Dos,    // 二级
    Tres,   // 三级
    Cuatro, // 四级
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl Priority {
    /// 全部优先级（按顺序）
    pub const ALL: [Priority; 4] = [Priority::Uno, Priority::Dos, Priority::Tres, Priority::Cuatro];

    /// 从数据库字符串解析，未知值返回 None
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "UNO" => Some(Priority::Uno),
            "DOS" => Some(Priority::Dos),
            "TRES" => Some(Priority::Tres),
            "CUATRO" => Some(Priority::Cuatro),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Priority::Uno => "UNO",
            Priority::Dos => "DOS",
            Priority::Tres => "TRES",
            Priority::Cuatro => "CUATRO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(Priority::Uno < Priority::Dos);
        assert!(Priority::Tres < Priority::Cuatro);
        let mut shuffled = vec![Priority::Cuatro, Priority::Uno, Priority::Tres, Priority::Dos];
        shuffled.sort();
        assert_eq!(shuffled, Priority::ALL.to_vec());
    }

    #[test]
    fn test_priority_db_round_trip() {
        for p in Priority::ALL {
            assert_eq!(Priority::from_db_str(p.to_db_str()), Some(p));
        }
        assert_eq!(Priority::from_db_str("dos"), Some(Priority::Dos));
        assert_eq!(Priority::from_db_str("CINCO"), None);
    }

    #[test]
    fn test_priority_serde_format() {
        let json = serde_json::to_string(&Priority::Tres).unwrap();
        assert_eq!(json, "\"TRES\"");
    }
}
