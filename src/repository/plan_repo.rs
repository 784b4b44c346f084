// ==========================================
// 公共工程管理系统 - 项目计划数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: in_execution 只通过 set_in_execution 写入，调用方仅限 PlanExecutionTracker
// ==========================================

use crate::domain::plan::ProjectPlan;
use crate::domain::record::SoftDeleteRecord;
use crate::domain::types::{EntityKind, Priority};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::soft_delete::{
    decimal, opt_int, opt_text, read_decimal, text, SoftDeleteEntity, SoftDeleteStore,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

pub type PlanRepository = SoftDeleteStore<ProjectPlan>;

impl SoftDeleteEntity for ProjectPlan {
    const TABLE: &'static str = "project_plan";
    const KIND: EntityKind = EntityKind::ProjectPlan;
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "description",
        "study_months",
        "estimated_investment",
        "estimated_duration",
        "priority",
        "in_execution",
        "rubro_id",
    ];

    fn record(&self) -> &SoftDeleteRecord {
        &self.record
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            opt_text(self.description.as_deref()),
            opt_int(self.study_months.map(i64::from)),
            decimal(&self.estimated_investment),
            opt_int(self.estimated_duration.map(i64::from)),
            text(self.priority.to_db_str()),
            Value::Integer(i64::from(self.in_execution)),
            text(&self.rubro_id),
        ]
    }

    fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        let priority_raw: String = row.get(offset + 5)?;
        let priority = Priority::from_db_str(&priority_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 5,
                rusqlite::types::Type::Text,
                format!("未知优先级: {}", priority_raw).into(),
            )
        })?;

        Ok(ProjectPlan {
            record,
            name: row.get(offset)?,
            description: row.get(offset + 1)?,
            study_months: row.get(offset + 2)?,
            estimated_investment: read_decimal(row, offset + 3)?,
            estimated_duration: row.get(offset + 4)?,
            priority,
            in_execution: row.get::<_, i64>(offset + 6)? != 0,
            rubro_id: row.get(offset + 7)?,
        })
    }
}

impl SoftDeleteStore<ProjectPlan> {
    /// 写入执行中标志
    pub fn set_in_execution(conn: &Connection, plan_id: &str, flag: bool) -> RepositoryResult<()> {
        let affected = conn.execute(
            "UPDATE project_plan SET in_execution = ?1 WHERE id = ?2",
            params![flag, plan_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found(EntityKind::ProjectPlan.name(), plan_id));
        }
        Ok(())
    }

    /// 引用该行业类别的有效计划数量
    pub fn count_active_by_rubro(conn: &Connection, rubro_id: &str) -> RepositoryResult<i64> {
        let n = conn.query_row(
            "SELECT COUNT(*) FROM project_plan WHERE rubro_id = ?1 AND deactivated_at IS NULL",
            params![rubro_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// 执行中的有效计划数量
    pub fn count_active_in_execution(conn: &Connection) -> RepositoryResult<i64> {
        let n = conn.query_row(
            "SELECT COUNT(*) FROM project_plan WHERE in_execution = 1 AND deactivated_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::catalog::Rubro;
    use crate::repository::catalog_repo::RubroRepository;
    use rust_decimal::Decimal;

    #[test]
    fn test_plan_columns_and_flag() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let now = chrono::Local::now().naive_local();

        let rubro = Rubro {
            record: SoftDeleteRecord::new_at(now),
            name: "Turismo".to_string(),
        };
        RubroRepository::create(&conn, &rubro).unwrap();

        let plan = ProjectPlan {
            record: SoftDeleteRecord::new_at(now),
            name: "City Park Improvement".to_string(),
            description: None,
            study_months: Some(3),
            estimated_investment: Decimal::new(150_000, 0),
            estimated_duration: Some(7),
            priority: Priority::Tres,
            in_execution: false,
            rubro_id: rubro.record.id.clone(),
        };
        PlanRepository::create(&conn, &plan).unwrap();

        PlanRepository::set_in_execution(&conn, &plan.record.id, true).unwrap();
        let loaded = PlanRepository::require_active(&conn, &plan.record.id).unwrap();
        assert!(loaded.in_execution);
        assert_eq!(loaded.priority, Priority::Tres);
        assert_eq!(loaded.study_months, Some(3));
        assert_eq!(PlanRepository::count_active_in_execution(&conn).unwrap(), 1);
        assert_eq!(PlanRepository::count_active_by_rubro(&conn, &rubro.record.id).unwrap(), 1);

        assert!(matches!(
            PlanRepository::set_in_execution(&conn, "missing", false),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
