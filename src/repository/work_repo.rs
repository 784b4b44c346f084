// ==========================================
// 公共工程管理系统 - 工程数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::{format_date, parse_date};
use crate::domain::record::SoftDeleteRecord;
use crate::domain::types::EntityKind;
use crate::domain::work::Work;
use crate::repository::error::RepositoryResult;
use crate::repository::soft_delete::{
    decimal, int, opt_text, read_decimal, text, SoftDeleteEntity, SoftDeleteStore,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

pub type WorkRepository = SoftDeleteStore<Work>;

impl SoftDeleteEntity for Work {
    const TABLE: &'static str = "work";
    const KIND: EntityKind = EntityKind::Work;
    const COLUMNS: &'static [&'static str] = &[
        "work_number",
        "name",
        "execution_duration",
        "execution_year",
        "start_date",
        "end_date",
        "final_investment",
        "locality_id",
        "plan_id",
    ];

    fn record(&self) -> &SoftDeleteRecord {
        &self.record
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            int(self.work_number),
            text(&self.name),
            int(i64::from(self.execution_duration)),
            int(i64::from(self.execution_year)),
            text(&format_date(&self.start_date)),
            opt_text(self.end_date.map(|d| format_date(&d)).as_deref()),
            decimal(&self.final_investment),
            text(&self.locality_id),
            opt_text(self.plan_id.as_deref()),
        ]
    }

    fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        let start_raw: String = row.get(offset + 4)?;
        let end_raw: Option<String> = row.get(offset + 5)?;

        Ok(Work {
            record,
            work_number: row.get(offset)?,
            name: row.get(offset + 1)?,
            execution_duration: row.get(offset + 2)?,
            execution_year: row.get(offset + 3)?,
            start_date: parse_date(offset + 4, &start_raw)?,
            end_date: match end_raw {
                Some(raw) => Some(parse_date(offset + 5, &raw)?),
                None => None,
            },
            final_investment: read_decimal(row, offset + 6)?,
            locality_id: row.get(offset + 7)?,
            plan_id: row.get(offset + 8)?,
        })
    }
}

impl SoftDeleteStore<Work> {
    /// 工程编号是否已被有效工程占用
    ///
    /// `exclude_id` 用于更新时排除自身
    pub fn work_number_taken(
        conn: &Connection,
        work_number: i64,
        exclude_id: Option<&str>,
    ) -> RepositoryResult<bool> {
        let hit: Option<String> = conn
            .query_row(
                r#"
                SELECT id FROM work
                WHERE work_number = ?1
                  AND deactivated_at IS NULL
                  AND id <> COALESCE(?2, '')
                LIMIT 1
                "#,
                params![work_number, exclude_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    /// 引用该计划的有效工程数量
    pub fn count_active_by_plan(conn: &Connection, plan_id: &str) -> RepositoryResult<i64> {
        let n = conn.query_row(
            "SELECT COUNT(*) FROM work WHERE plan_id = ?1 AND deactivated_at IS NULL",
            params![plan_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// 有效工程数量
    pub fn count_active(conn: &Connection) -> RepositoryResult<i64> {
        let n = conn.query_row(
            "SELECT COUNT(*) FROM work WHERE deactivated_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// 有效工程的最终投资合计
    ///
    /// 金额以文本存储，求和在 Rust 侧用 Decimal 完成
    pub fn sum_active_final_investment(conn: &Connection) -> RepositoryResult<Decimal> {
        let mut stmt =
            conn.prepare("SELECT final_investment FROM work WHERE deactivated_at IS NULL")?;
        let rows = stmt.query_map([], |row| read_decimal(row, 0))?;

        let mut total = Decimal::ZERO;
        for amount in rows {
            total += amount?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::catalog::{Department, Locality};
    use crate::repository::catalog_repo::{DepartmentRepository, LocalityRepository};
    use chrono::NaiveDate;

    fn setup() -> (Connection, String) {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let now = chrono::Local::now().naive_local();
        let dept = Department {
            record: SoftDeleteRecord::new_at(now),
            name: "New York State".to_string(),
        };
        DepartmentRepository::create(&conn, &dept).unwrap();
        let loc = Locality {
            record: SoftDeleteRecord::new_at(now),
            name: "NYC".to_string(),
            department_id: dept.record.id.clone(),
        };
        LocalityRepository::create(&conn, &loc).unwrap();
        (conn, loc.record.id)
    }

    fn work(locality_id: &str, number: i64, amount: i64) -> Work {
        Work {
            record: SoftDeleteRecord::new_at(chrono::Local::now().naive_local()),
            work_number: number,
            name: format!("Obra {}", number),
            execution_duration: 6,
            execution_year: 2024,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            end_date: None,
            final_investment: Decimal::new(amount, 0),
            locality_id: locality_id.to_string(),
            plan_id: None,
        }
    }

    #[test]
    fn test_work_number_taken_only_among_active() {
        let (conn, loc) = setup();
        let w = work(&loc, 2001, 300_000);
        WorkRepository::create(&conn, &w).unwrap();

        assert!(WorkRepository::work_number_taken(&conn, 2001, None).unwrap());
        assert!(!WorkRepository::work_number_taken(&conn, 2001, Some(&w.record.id)).unwrap());

        let now = chrono::Local::now().naive_local();
        WorkRepository::deactivate(&conn, &w.record.id, now).unwrap();
        assert!(!WorkRepository::work_number_taken(&conn, 2001, None).unwrap());

        // 停用后可复用编号
        WorkRepository::create(&conn, &work(&loc, 2001, 10)).unwrap();
    }

    #[test]
    fn test_sum_uses_exact_decimal() {
        let (conn, loc) = setup();
        let mut a = work(&loc, 1, 0);
        a.final_investment = Decimal::new(10, 1); // 1.0
        let mut b = work(&loc, 2, 0);
        b.final_investment = Decimal::new(2, 1); // 0.2
        WorkRepository::create(&conn, &a).unwrap();
        WorkRepository::create(&conn, &b).unwrap();

        assert_eq!(
            WorkRepository::sum_active_final_investment(&conn).unwrap(),
            Decimal::new(12, 1)
        );
        assert_eq!(WorkRepository::count_active(&conn).unwrap(), 2);
    }
}
