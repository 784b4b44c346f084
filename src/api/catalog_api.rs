// ==========================================
// 公共工程管理系统 - 行业类别 / 执行状态 API
// ==========================================
// 规则: 名称在有效记录中唯一（忽略大小写）
// 守卫: 行业类别 ← 有效计划；执行状态 ← 有效工程的当前状态
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::support::{
    deactivate_guarded, ensure_name_free, now, require_name, with_conn, with_tx,
};
use crate::db::SharedConnection;
use crate::domain::catalog::{ExecutionState, Rubro};
use crate::domain::record::SoftDeleteRecord;
use crate::repository::{ExecutionStateRepository, RubroRepository};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

// ==========================================
// RubroApi - 行业类别 API
// ==========================================
pub struct RubroApi {
    conn: SharedConnection,
}

impl RubroApi {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn ensure_unique(conn: &Connection, name: &str, exclude_id: Option<&str>) -> ApiResult<()> {
        let existing = RubroRepository::list_active(conn)?;
        ensure_name_free(
            existing.iter().map(|r| (r.record.id.as_str(), r.name.as_str())),
            name,
            exclude_id,
            "行业类别",
        )
    }

    pub fn create(&self, input: CatalogNameInput) -> ApiResult<Rubro> {
        let name = require_name(&input.name, "行业类别")?;
        let rubro = with_tx(&self.conn, |conn| {
            Self::ensure_unique(conn, &name, None)?;
            let rubro = Rubro {
                record: SoftDeleteRecord::new_at(now()),
                name,
            };
            RubroRepository::create(conn, &rubro)?;
            Ok(rubro)
        })?;
        tracing::info!(rubro_id = %rubro.record.id, name = %rubro.name, "行业类别已创建");
        Ok(rubro)
    }

    pub fn update(&self, id: &str, input: CatalogNameInput) -> ApiResult<Rubro> {
        let name = require_name(&input.name, "行业类别")?;
        let rubro = with_tx(&self.conn, |conn| {
            let mut rubro = RubroRepository::require_active(conn, id)?;
            Self::ensure_unique(conn, &name, Some(id))?;
            rubro.name = name;
            RubroRepository::update(conn, &rubro)?;
            Ok(rubro)
        })?;
        tracing::info!(rubro_id = id, "行业类别已更新");
        Ok(rubro)
    }

    pub fn get_active(&self, id: &str) -> ApiResult<Rubro> {
        with_conn(&self.conn, |conn| Ok(RubroRepository::require_active(conn, id)?))
    }

    pub fn get_any(&self, id: &str) -> ApiResult<Rubro> {
        with_conn(&self.conn, |conn| {
            RubroRepository::get_any(conn, id)?
                .ok_or_else(|| ApiError::NotFound(format!("行业类别(id={})不存在", id)))
        })
    }

    pub fn list_active(&self) -> ApiResult<Vec<Rubro>> {
        with_conn(&self.conn, |conn| Ok(RubroRepository::list_active(conn)?))
    }

    pub fn list_all(&self) -> ApiResult<Vec<Rubro>> {
        with_conn(&self.conn, |conn| Ok(RubroRepository::list_all(conn)?))
    }

    /// 停用行业类别（存在有效计划时拒绝）
    pub fn deactivate(&self, id: &str) -> ApiResult<()> {
        with_tx(&self.conn, |conn| deactivate_guarded::<Rubro>(conn, id))?;
        tracing::info!(rubro_id = id, "行业类别已停用");
        Ok(())
    }
}

// ==========================================
// ExecutionStateApi - 执行状态 API
// ==========================================
pub struct ExecutionStateApi {
    conn: SharedConnection,
}

impl ExecutionStateApi {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn ensure_unique(conn: &Connection, name: &str, exclude_id: Option<&str>) -> ApiResult<()> {
        let existing = ExecutionStateRepository::list_active(conn)?;
        ensure_name_free(
            existing.iter().map(|s| (s.record.id.as_str(), s.name.as_str())),
            name,
            exclude_id,
            "执行状态",
        )
    }

    pub fn create(&self, input: CatalogNameInput) -> ApiResult<ExecutionState> {
        let name = require_name(&input.name, "执行状态")?;
        let state = with_tx(&self.conn, |conn| {
            Self::ensure_unique(conn, &name, None)?;
            let state = ExecutionState {
                record: SoftDeleteRecord::new_at(now()),
                name,
            };
            ExecutionStateRepository::create(conn, &state)?;
            Ok(state)
        })?;
        tracing::info!(state_id = %state.record.id, name = %state.name, "执行状态已创建");
        Ok(state)
    }

    pub fn update(&self, id: &str, input: CatalogNameInput) -> ApiResult<ExecutionState> {
        let name = require_name(&input.name, "执行状态")?;
        let state = with_tx(&self.conn, |conn| {
            let mut state = ExecutionStateRepository::require_active(conn, id)?;
            Self::ensure_unique(conn, &name, Some(id))?;
            state.name = name;
            ExecutionStateRepository::update(conn, &state)?;
            Ok(state)
        })?;
        tracing::info!(state_id = id, "执行状态已更新");
        Ok(state)
    }

    pub fn get_active(&self, id: &str) -> ApiResult<ExecutionState> {
        with_conn(&self.conn, |conn| {
            Ok(ExecutionStateRepository::require_active(conn, id)?)
        })
    }

    pub fn get_any(&self, id: &str) -> ApiResult<ExecutionState> {
        with_conn(&self.conn, |conn| {
            ExecutionStateRepository::get_any(conn, id)?
                .ok_or_else(|| ApiError::NotFound(format!("执行状态(id={})不存在", id)))
        })
    }

    pub fn list_active(&self) -> ApiResult<Vec<ExecutionState>> {
        with_conn(&self.conn, |conn| Ok(ExecutionStateRepository::list_active(conn)?))
    }

    pub fn list_all(&self) -> ApiResult<Vec<ExecutionState>> {
        with_conn(&self.conn, |conn| Ok(ExecutionStateRepository::list_all(conn)?))
    }

    /// 按名称查找有效状态（忽略大小写）
    pub fn find_by_name(&self, name: &str) -> ApiResult<ExecutionState> {
        with_conn(&self.conn, |conn| {
            ExecutionStateRepository::find_active_by_name(conn, name)?
                .ok_or_else(|| ApiError::NotFound(format!("执行状态 '{}' 不存在", name)))
        })
    }

    /// 停用执行状态（仍是某个有效工程的当前状态时拒绝）
    pub fn deactivate(&self, id: &str) -> ApiResult<()> {
        with_tx(&self.conn, |conn| deactivate_guarded::<ExecutionState>(conn, id))?;
        tracing::info!(state_id = id, "执行状态已停用");
        Ok(())
    }
}

// ==========================================
// 请求载荷
// ==========================================

/// 仅含名称的目录载荷（行业类别 / 执行状态）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogNameInput {
    pub name: String,
}

impl CatalogNameInput {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}
