// ==========================================
// 公共工程管理系统 - 部门 / 地区 API
// ==========================================
// 职责: 部门与地区的增改查、停用
// 规则: 部门名称在有效部门中唯一（忽略大小写）
// 规则: 地区必须归属有效部门；部门停用受有效地区守卫
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::support::{
    deactivate_guarded, ensure_name_free, now, require_name, with_conn, with_tx,
};
use crate::db::SharedConnection;
use crate::domain::catalog::{Department, Locality};
use crate::domain::record::SoftDeleteRecord;
use crate::repository::{DepartmentRepository, LocalityRepository};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

// ==========================================
// DepartmentApi - 部门 API
// ==========================================
pub struct DepartmentApi {
    conn: SharedConnection,
}

impl DepartmentApi {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn ensure_unique(conn: &Connection, name: &str, exclude_id: Option<&str>) -> ApiResult<()> {
        let existing = DepartmentRepository::list_active(conn)?;
        ensure_name_free(
            existing.iter().map(|d| (d.record.id.as_str(), d.name.as_str())),
            name,
            exclude_id,
            "部门",
        )
    }

    /// 创建部门
    pub fn create(&self, input: DepartmentInput) -> ApiResult<Department> {
        let name = require_name(&input.name, "部门")?;
        let dept = with_tx(&self.conn, |conn| {
            Self::ensure_unique(conn, &name, None)?;
            let dept = Department {
                record: SoftDeleteRecord::new_at(now()),
                name,
            };
            DepartmentRepository::create(conn, &dept)?;
            Ok(dept)
        })?;
        tracing::info!(department_id = %dept.record.id, name = %dept.name, "部门已创建");
        Ok(dept)
    }

    /// 更新部门名称
    pub fn update(&self, id: &str, input: DepartmentInput) -> ApiResult<Department> {
        let name = require_name(&input.name, "部门")?;
        let dept = with_tx(&self.conn, |conn| {
            let mut dept = DepartmentRepository::require_active(conn, id)?;
            Self::ensure_unique(conn, &name, Some(id))?;
            dept.name = name;
            DepartmentRepository::update(conn, &dept)?;
            Ok(dept)
        })?;
        tracing::info!(department_id = id, "部门已更新");
        Ok(dept)
    }

    pub fn get_active(&self, id: &str) -> ApiResult<Department> {
        with_conn(&self.conn, |conn| Ok(DepartmentRepository::require_active(conn, id)?))
    }

    pub fn get_any(&self, id: &str) -> ApiResult<Department> {
        with_conn(&self.conn, |conn| {
            DepartmentRepository::get_any(conn, id)?
                .ok_or_else(|| ApiError::NotFound(format!("部门(id={})不存在", id)))
        })
    }

    pub fn list_active(&self) -> ApiResult<Vec<Department>> {
        with_conn(&self.conn, |conn| Ok(DepartmentRepository::list_active(conn)?))
    }

    pub fn list_all(&self) -> ApiResult<Vec<Department>> {
        with_conn(&self.conn, |conn| Ok(DepartmentRepository::list_all(conn)?))
    }

    /// 停用部门（存在有效地区时拒绝）
    pub fn deactivate(&self, id: &str) -> ApiResult<()> {
        with_tx(&self.conn, |conn| deactivate_guarded::<Department>(conn, id))?;
        tracing::info!(department_id = id, "部门已停用");
        Ok(())
    }
}

// ==========================================
// LocalityApi - 地区 API
// ==========================================
pub struct LocalityApi {
    conn: SharedConnection,
}

impl LocalityApi {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn require_department(conn: &Connection, department_id: &str) -> ApiResult<()> {
        if department_id.trim().is_empty() {
            return Err(ApiError::ValidationError("地区必须指定所属部门".to_string()));
        }
        DepartmentRepository::get_active(conn, department_id)?.ok_or_else(|| {
            ApiError::NotFound(format!("部门(id={})不存在或已停用", department_id))
        })?;
        Ok(())
    }

    /// 创建地区
    pub fn create(&self, input: LocalityInput) -> ApiResult<Locality> {
        let name = require_name(&input.name, "地区")?;
        let locality = with_tx(&self.conn, |conn| {
            Self::require_department(conn, &input.department_id)?;
            let locality = Locality {
                record: SoftDeleteRecord::new_at(now()),
                name,
                department_id: input.department_id.trim().to_string(),
            };
            LocalityRepository::create(conn, &locality)?;
            Ok(locality)
        })?;
        tracing::info!(
            locality_id = %locality.record.id,
            department_id = %locality.department_id,
            "地区已创建"
        );
        Ok(locality)
    }

    /// 更新地区（可改名、可换部门）
    pub fn update(&self, id: &str, input: LocalityInput) -> ApiResult<Locality> {
        let name = require_name(&input.name, "地区")?;
        let locality = with_tx(&self.conn, |conn| {
            let mut locality = LocalityRepository::require_active(conn, id)?;
            Self::require_department(conn, &input.department_id)?;
            locality.name = name;
            locality.department_id = input.department_id.trim().to_string();
            LocalityRepository::update(conn, &locality)?;
            Ok(locality)
        })?;
        tracing::info!(locality_id = id, "地区已更新");
        Ok(locality)
    }

    pub fn get_active(&self, id: &str) -> ApiResult<Locality> {
        with_conn(&self.conn, |conn| Ok(LocalityRepository::require_active(conn, id)?))
    }

    pub fn get_any(&self, id: &str) -> ApiResult<Locality> {
        with_conn(&self.conn, |conn| {
            LocalityRepository::get_any(conn, id)?
                .ok_or_else(|| ApiError::NotFound(format!("地区(id={})不存在", id)))
        })
    }

    pub fn list_active(&self) -> ApiResult<Vec<Locality>> {
        with_conn(&self.conn, |conn| Ok(LocalityRepository::list_active(conn)?))
    }

    pub fn list_all(&self) -> ApiResult<Vec<Locality>> {
        with_conn(&self.conn, |conn| Ok(LocalityRepository::list_all(conn)?))
    }

    /// 部门下的有效地区
    pub fn list_by_department(&self, department_id: &str) -> ApiResult<Vec<Locality>> {
        with_conn(&self.conn, |conn| {
            Ok(LocalityRepository::list_active_by_department(conn, department_id)?)
        })
    }

    /// 停用地区（无依赖守卫）
    pub fn deactivate(&self, id: &str) -> ApiResult<()> {
        with_tx(&self.conn, |conn| deactivate_guarded::<Locality>(conn, id))?;
        tracing::info!(locality_id = id, "地区已停用");
        Ok(())
    }
}

// ==========================================
// 请求载荷
// ==========================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepartmentInput {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalityInput {
    pub name: String,
    pub department_id: String,
}
