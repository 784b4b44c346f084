// ==========================================
// 公共工程管理系统 - 技术风险 API
// ==========================================
// 规则: 风险编号全局唯一（包括已停用记录）
// 守卫: 仍关联有效工程的风险禁止停用
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::support::{deactivate_guarded, now, with_conn, with_tx};
use crate::db::SharedConnection;
use crate::domain::record::SoftDeleteRecord;
use crate::domain::risk::TechnicalRisk;
use crate::repository::RiskRepository;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub struct RiskApi {
    conn: SharedConnection,
}

impl RiskApi {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn ensure_number_free(conn: &Connection, number: i64, exclude_id: Option<&str>) -> ApiResult<()> {
        if RiskRepository::risk_number_taken(conn, number, exclude_id)? {
            tracing::warn!(risk_number = number, "风险编号重复");
            return Err(ApiError::Conflict(format!("风险编号 {} 已存在", number)));
        }
        Ok(())
    }

    pub fn create(&self, input: RiskInput) -> ApiResult<TechnicalRisk> {
        let checked = input.validate()?;
        let risk = with_tx(&self.conn, |conn| {
            Self::ensure_number_free(conn, checked.risk_number, None)?;
            let risk = TechnicalRisk {
                record: SoftDeleteRecord::new_at(now()),
                risk_number: checked.risk_number,
                nature: checked.nature,
                proposed_solution: checked.proposed_solution,
                mitigation_measures: checked.mitigation_measures,
                actions_taken: checked.actions_taken,
            };
            RiskRepository::create(conn, &risk)?;
            Ok(risk)
        })?;
        tracing::info!(risk_id = %risk.record.id, risk_number = risk.risk_number, "技术风险已创建");
        Ok(risk)
    }

    pub fn update(&self, id: &str, input: RiskInput) -> ApiResult<TechnicalRisk> {
        let checked = input.validate()?;
        let risk = with_tx(&self.conn, |conn| {
            let mut risk = RiskRepository::require_active(conn, id)?;
            Self::ensure_number_free(conn, checked.risk_number, Some(id))?;
            risk.risk_number = checked.risk_number;
            risk.nature = checked.nature;
            risk.proposed_solution = checked.proposed_solution;
            risk.mitigation_measures = checked.mitigation_measures;
            risk.actions_taken = checked.actions_taken;
            RiskRepository::update(conn, &risk)?;
            Ok(risk)
        })?;
        tracing::info!(risk_id = id, "技术风险已更新");
        Ok(risk)
    }

    pub fn get_active(&self, id: &str) -> ApiResult<TechnicalRisk> {
        with_conn(&self.conn, |conn| Ok(RiskRepository::require_active(conn, id)?))
    }

    pub fn get_any(&self, id: &str) -> ApiResult<TechnicalRisk> {
        with_conn(&self.conn, |conn| {
            RiskRepository::get_any(conn, id)?
                .ok_or_else(|| ApiError::NotFound(format!("技术风险(id={})不存在", id)))
        })
    }

    pub fn list_active(&self) -> ApiResult<Vec<TechnicalRisk>> {
        with_conn(&self.conn, |conn| Ok(RiskRepository::list_active(conn)?))
    }

    pub fn list_all(&self) -> ApiResult<Vec<TechnicalRisk>> {
        with_conn(&self.conn, |conn| Ok(RiskRepository::list_all(conn)?))
    }

    /// 编号是否已存在（包括已停用记录）
    pub fn risk_number_exists(&self, risk_number: i64) -> ApiResult<bool> {
        with_conn(&self.conn, |conn| {
            Ok(RiskRepository::risk_number_taken(conn, risk_number, None)?)
        })
    }

    pub fn deactivate(&self, id: &str) -> ApiResult<()> {
        with_tx(&self.conn, |conn| deactivate_guarded::<TechnicalRisk>(conn, id))?;
        tracing::info!(risk_id = id, "技术风险已停用");
        Ok(())
    }
}

// ==========================================
// 请求载荷
// ==========================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskInput {
    pub risk_number: Option<i64>,
    pub nature: String,
    pub proposed_solution: Option<String>,
    pub mitigation_measures: Option<String>,
    pub actions_taken: Option<String>,
}

struct CheckedRisk {
    risk_number: i64,
    nature: String,
    proposed_solution: Option<String>,
    mitigation_measures: Option<String>,
    actions_taken: Option<String>,
}

impl RiskInput {
    fn validate(self) -> ApiResult<CheckedRisk> {
        let risk_number = self
            .risk_number
            .ok_or_else(|| ApiError::ValidationError("风险编号为必填项".to_string()))?;
        let nature = self.nature.trim().to_string();
        if nature.is_empty() {
            return Err(ApiError::ValidationError("风险性质不能为空".to_string()));
        }
        Ok(CheckedRisk {
            risk_number,
            nature,
            proposed_solution: self.proposed_solution,
            mitigation_measures: self.mitigation_measures,
            actions_taken: self.actions_taken,
        })
    }
}
