// ==========================================
// 公共工程管理系统 - 工程↔风险关联同步
// ==========================================
// 流程: 校验全部目标 → 计算差集 → 停用多余关联 → 建立缺失关联
// 红线: 校验先于任何写入；结果与目标列表顺序/重复无关
// ==========================================

use crate::domain::work::WorkRisk;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{RiskRepository, WorkRiskRepository};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 差集计算结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDiff {
    /// 需要停用的关联行 id
    pub to_remove: Vec<String>,
    /// 需要新建关联的风险 id
    pub to_add: Vec<String>,
}

/// 同步结果（风险 id）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

pub struct AssociationReconciler;

impl AssociationReconciler {
    /// 校验目标风险全部有效，返回去重后的集合
    pub fn validate_targets(conn: &Connection, risk_ids: &[String]) -> EngineResult<BTreeSet<String>> {
        let targets: BTreeSet<String> = risk_ids.iter().map(|id| id.trim().to_string()).collect();
        for risk_id in &targets {
            if RiskRepository::get_active(conn, risk_id)?.is_none() {
                return Err(EngineError::InvalidRisk(format!(
                    "技术风险(id={}) 不存在或已停用",
                    risk_id
                )));
            }
        }
        Ok(targets)
    }

    /// 计算当前关联与目标集合的差
    pub fn diff_links(current: &[WorkRisk], targets: &BTreeSet<String>) -> LinkDiff {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut to_remove = Vec::new();

        for link in current {
            // 同一风险的重复关联只保留第一条
            if targets.contains(&link.risk_id) && seen.insert(link.risk_id.as_str()) {
                continue;
            }
            to_remove.push(link.record.id.clone());
        }

        let to_add = targets
            .iter()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();

        LinkDiff { to_remove, to_add }
    }

    /// 将已校验的目标集合同步到工程
    pub fn apply(
        conn: &Connection,
        work_id: &str,
        targets: &BTreeSet<String>,
        at: NaiveDateTime,
    ) -> EngineResult<ReconcileOutcome> {
        let current = WorkRiskRepository::list_active_for_work(conn, work_id)?;
        let diff = Self::diff_links(&current, targets);

        let mut removed = Vec::new();
        for link_id in &diff.to_remove {
            WorkRiskRepository::deactivate(conn, link_id, at)?;
            if let Some(link) = current.iter().find(|l| &l.record.id == link_id) {
                removed.push(link.risk_id.clone());
            }
        }
        for risk_id in &diff.to_add {
            WorkRiskRepository::link(conn, work_id, risk_id, at)?;
        }

        if !diff.to_add.is_empty() || !removed.is_empty() {
            tracing::info!(
                work_id = work_id,
                added = diff.to_add.len(),
                removed = removed.len(),
                "工程风险关联已同步"
            );
        }

        Ok(ReconcileOutcome {
            added: diff.to_add,
            removed,
        })
    }
}
