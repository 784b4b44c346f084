// ==========================================
// 公共工程管理系统 - 基础目录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 包含: department / locality / rubro / execution_state
// ==========================================

use crate::domain::catalog::{names_match, Department, ExecutionState, Locality, Rubro};
use crate::domain::record::SoftDeleteRecord;
use crate::domain::types::EntityKind;
use crate::repository::error::RepositoryResult;
use crate::repository::soft_delete::{text, SoftDeleteEntity, SoftDeleteStore};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

pub type DepartmentRepository = SoftDeleteStore<Department>;
pub type LocalityRepository = SoftDeleteStore<Locality>;
pub type RubroRepository = SoftDeleteStore<Rubro>;
pub type ExecutionStateRepository = SoftDeleteStore<ExecutionState>;

// ==========================================
// Department
// ==========================================
impl SoftDeleteEntity for Department {
    const TABLE: &'static str = "department";
    const KIND: EntityKind = EntityKind::Department;
    const COLUMNS: &'static [&'static str] = &["name"];

    fn record(&self) -> &SoftDeleteRecord {
        &self.record
    }

    fn column_values(&self) -> Vec<Value> {
        vec![text(&self.name)]
    }

    fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Department {
            record,
            name: row.get(offset)?,
        })
    }
}

// ==========================================
// Locality
// ==========================================
impl SoftDeleteEntity for Locality {
    const TABLE: &'static str = "locality";
    const KIND: EntityKind = EntityKind::Locality;
    const COLUMNS: &'static [&'static str] = &["name", "department_id"];

    fn record(&self) -> &SoftDeleteRecord {
        &self.record
    }

    fn column_values(&self) -> Vec<Value> {
        vec![text(&self.name), text(&self.department_id)]
    }

    fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Locality {
            record,
            name: row.get(offset)?,
            department_id: row.get(offset + 1)?,
        })
    }
}

impl SoftDeleteStore<Locality> {
    /// 部门下的有效地区
    pub fn list_active_by_department(
        conn: &Connection,
        department_id: &str,
    ) -> RepositoryResult<Vec<Locality>> {
        Self::find_active_where(conn, "department_id = ?1", vec![text(department_id)])
    }

    /// 引用该部门的有效地区数量
    pub fn count_active_by_department(
        conn: &Connection,
        department_id: &str,
    ) -> RepositoryResult<i64> {
        let n = conn.query_row(
            "SELECT COUNT(*) FROM locality WHERE department_id = ?1 AND deactivated_at IS NULL",
            params![department_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

// ==========================================
// Rubro
// ==========================================
impl SoftDeleteEntity for Rubro {
    const TABLE: &'static str = "rubro";
    const KIND: EntityKind = EntityKind::Rubro;
    const COLUMNS: &'static [&'static str] = &["name"];

    fn record(&self) -> &SoftDeleteRecord {
        &self.record
    }

    fn column_values(&self) -> Vec<Value> {
        vec![text(&self.name)]
    }

    fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Rubro {
            record,
            name: row.get(offset)?,
        })
    }
}

// ==========================================
// ExecutionState
// ==========================================
impl SoftDeleteEntity for ExecutionState {
    const TABLE: &'static str = "execution_state";
    const KIND: EntityKind = EntityKind::ExecutionState;
    const COLUMNS: &'static [&'static str] = &["name"];

    fn record(&self) -> &SoftDeleteRecord {
        &self.record
    }

    fn column_values(&self) -> Vec<Value> {
        vec![text(&self.name)]
    }

    fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(ExecutionState {
            record,
            name: row.get(offset)?,
        })
    }
}

impl SoftDeleteStore<ExecutionState> {
    /// 按名称查找有效状态（忽略大小写）
    ///
    /// 名称比较在 Rust 侧完成：SQLite 的 lower() 只处理 ASCII
    pub fn find_active_by_name(
        conn: &Connection,
        name: &str,
    ) -> RepositoryResult<Option<ExecutionState>> {
        let states = Self::list_active(conn)?;
        Ok(states.into_iter().find(|s| names_match(&s.name, name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn now() -> chrono::NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    #[test]
    fn test_localities_by_department() {
        let conn = setup();
        let dept = Department {
            record: SoftDeleteRecord::new_at(now()),
            name: "Nevada".to_string(),
        };
        DepartmentRepository::create(&conn, &dept).unwrap();

        for name in ["Las Vegas", "Reno"] {
            let loc = Locality {
                record: SoftDeleteRecord::new_at(now()),
                name: name.to_string(),
                department_id: dept.record.id.clone(),
            };
            LocalityRepository::create(&conn, &loc).unwrap();
        }

        let all = LocalityRepository::list_active_by_department(&conn, &dept.record.id).unwrap();
        assert_eq!(all.len(), 2);
        LocalityRepository::deactivate(&conn, &all[0].record.id, now()).unwrap();
        assert_eq!(
            LocalityRepository::count_active_by_department(&conn, &dept.record.id).unwrap(),
            1
        );
    }

    #[test]
    fn test_find_state_by_name_is_case_insensitive() {
        let conn = setup();
        let state = ExecutionState {
            record: SoftDeleteRecord::new_at(now()),
            name: "Planificacion".to_string(),
        };
        ExecutionStateRepository::create(&conn, &state).unwrap();

        let hit = ExecutionStateRepository::find_active_by_name(&conn, "PLANIFICACION").unwrap();
        assert_eq!(hit.map(|s| s.record.id), Some(state.record.id.clone()));

        ExecutionStateRepository::deactivate(&conn, &state.record.id, now()).unwrap();
        assert!(ExecutionStateRepository::find_active_by_name(&conn, "planificacion")
            .unwrap()
            .is_none());
    }
}
