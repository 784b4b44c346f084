// ==========================================
// 公共工程管理系统 - 逻辑删除通用仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 不提供物理删除；停用 = 写入 deactivated_at
// ==========================================
// 每张实体表的前三列固定为 id / created_at / deactivated_at，
// 业务列由 SoftDeleteEntity::COLUMNS 声明
// ==========================================

use crate::db::{format_datetime, parse_datetime};
use crate::domain::record::SoftDeleteRecord;
use crate::domain::types::EntityKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::marker::PhantomData;
use std::str::FromStr;

/// 基础列数（id, created_at, deactivated_at）
pub const BASE_COLUMN_COUNT: usize = 3;

/// 可逻辑删除的实体
pub trait SoftDeleteEntity: Sized {
    const TABLE: &'static str;
    const KIND: EntityKind;
    /// 业务列（不含基础列），顺序与 column_values / from_row 一致
    const COLUMNS: &'static [&'static str];

    fn record(&self) -> &SoftDeleteRecord;

    fn column_values(&self) -> Vec<Value>;

    /// 从查询行构造实体；业务列从 offset 开始
    fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self>;
}

// ==========================================
// SoftDeleteStore - 通用存取
// ==========================================
// 无状态；所有方法接收 &Connection，
// 调用方可以传入 Transaction（Deref 到 Connection）
pub struct SoftDeleteStore<T> {
    _marker: PhantomData<T>,
}

impl<T: SoftDeleteEntity> SoftDeleteStore<T> {
    fn select_sql() -> String {
        format!(
            "SELECT id, created_at, deactivated_at, {} FROM {}",
            T::COLUMNS.join(", "),
            T::TABLE
        )
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<T> {
        let created_raw: String = row.get(1)?;
        let deactivated_raw: Option<String> = row.get(2)?;
        let record = SoftDeleteRecord {
            id: row.get(0)?,
            created_at: parse_datetime(1, &created_raw)?,
            deactivated_at: match deactivated_raw {
                Some(raw) => Some(parse_datetime(2, &raw)?),
                None => None,
            },
        };
        T::from_row(record, row, BASE_COLUMN_COUNT)
    }

    /// 插入新实体
    pub fn create(conn: &Connection, entity: &T) -> RepositoryResult<()> {
        let record = entity.record();
        let placeholders: Vec<String> = (1..=T::COLUMNS.len() + BASE_COLUMN_COUNT)
            .map(|i| format!("?{}", i))
            .collect();
        let sql = format!(
            "INSERT INTO {} (id, created_at, deactivated_at, {}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders.join(", ")
        );

        let mut values = vec![
            Value::Text(record.id.clone()),
            Value::Text(format_datetime(&record.created_at)),
            opt_datetime(record.deactivated_at.as_ref()),
        ];
        values.extend(entity.column_values());

        conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    /// 按 id 查询（包括已停用）
    pub fn get_any(conn: &Connection, id: &str) -> RepositoryResult<Option<T>> {
        let sql = format!("{} WHERE id = ?1", Self::select_sql());
        let found = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(found)
    }

    /// 按 id 查询有效实体
    pub fn get_active(conn: &Connection, id: &str) -> RepositoryResult<Option<T>> {
        let sql = format!(
            "{} WHERE id = ?1 AND deactivated_at IS NULL",
            Self::select_sql()
        );
        let found = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(found)
    }

    /// 查询有效实体；不存在或已停用均返回 NotFound
    pub fn require_active(conn: &Connection, id: &str) -> RepositoryResult<T> {
        Self::get_active(conn, id)?.ok_or_else(|| RepositoryError::not_found(T::KIND.name(), id))
    }

    /// 全部有效实体（按创建顺序）
    pub fn list_active(conn: &Connection) -> RepositoryResult<Vec<T>> {
        Self::find_where(conn, "deactivated_at IS NULL", Vec::new())
    }

    /// 全部实体（包括已停用）
    pub fn list_all(conn: &Connection) -> RepositoryResult<Vec<T>> {
        Self::find_where(conn, "1 = 1", Vec::new())
    }

    /// 带附加条件查询有效实体
    pub fn find_active_where(
        conn: &Connection,
        clause: &str,
        values: Vec<Value>,
    ) -> RepositoryResult<Vec<T>> {
        Self::find_where(conn, &format!("deactivated_at IS NULL AND ({})", clause), values)
    }

    /// 带条件查询（条件使用 ?1.. 占位符），按创建时间排序
    pub fn find_where(
        conn: &Connection,
        clause: &str,
        values: Vec<Value>,
    ) -> RepositoryResult<Vec<T>> {
        Self::find_where_ordered(conn, clause, "created_at, rowid", values)
    }

    /// 带条件查询，指定排序列
    pub fn find_where_ordered(
        conn: &Connection,
        clause: &str,
        order_by: &str,
        values: Vec<Value>,
    ) -> RepositoryResult<Vec<T>> {
        let sql = format!(
            "{} WHERE {} ORDER BY {}",
            Self::select_sql(),
            clause,
            order_by
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), Self::map_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// 覆盖业务列（基础列不变）
    pub fn update(conn: &Connection, entity: &T) -> RepositoryResult<()> {
        let assignments: Vec<String> = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ?{}", col, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            T::TABLE,
            assignments.join(", "),
            T::COLUMNS.len() + 1
        );

        let mut values = entity.column_values();
        values.push(Value::Text(entity.record().id.clone()));

        let affected = conn.execute(&sql, params_from_iter(values))?;
        if affected == 0 {
            return Err(RepositoryError::not_found(T::KIND.name(), &entity.record().id));
        }
        Ok(())
    }

    /// 停用实体
    ///
    /// # 返回
    /// - Ok(()): 已写入 deactivated_at
    /// - Err(NotFound): id 不存在
    /// - Err(AlreadyDeactivated): 已经停用过
    pub fn deactivate(conn: &Connection, id: &str, at: NaiveDateTime) -> RepositoryResult<()> {
        let sql = format!(
            "UPDATE {} SET deactivated_at = ?1 WHERE id = ?2 AND deactivated_at IS NULL",
            T::TABLE
        );
        let affected = conn.execute(&sql, params![format_datetime(&at), id])?;
        if affected == 1 {
            return Ok(());
        }

        let exists_sql = format!("SELECT 1 FROM {} WHERE id = ?1", T::TABLE);
        let exists = conn
            .query_row(&exists_sql, params![id], |_row| Ok(()))
            .optional()?
            .is_some();
        if exists {
            Err(RepositoryError::AlreadyDeactivated {
                entity: T::KIND.name().to_string(),
                id: id.to_string(),
            })
        } else {
            Err(RepositoryError::not_found(T::KIND.name(), id))
        }
    }
}

// ==========================================
// 列值编解码辅助
// ==========================================

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub fn opt_text(s: Option<&str>) -> Value {
    s.map(text).unwrap_or(Value::Null)
}

pub fn int(v: i64) -> Value {
    Value::Integer(v)
}

pub fn opt_int(v: Option<i64>) -> Value {
    v.map(Value::Integer).unwrap_or(Value::Null)
}

pub fn opt_datetime(ts: Option<&NaiveDateTime>) -> Value {
    ts.map(|t| Value::Text(format_datetime(t))).unwrap_or(Value::Null)
}

/// 金额按文本存储，避免浮点误差
pub fn decimal(d: &Decimal) -> Value {
    Value::Text(d.to_string())
}

pub fn read_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(raw.trim()).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub fn read_opt_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(raw) => Ok(Some(parse_datetime(idx, &raw)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Tag {
        record: SoftDeleteRecord,
        label: String,
        weight: Decimal,
    }

    impl SoftDeleteEntity for Tag {
        const TABLE: &'static str = "tag";
        const KIND: EntityKind = EntityKind::Rubro;
        const COLUMNS: &'static [&'static str] = &["label", "weight"];

        fn record(&self) -> &SoftDeleteRecord {
            &self.record
        }

        fn column_values(&self) -> Vec<Value> {
            vec![text(&self.label), decimal(&self.weight)]
        }

        fn from_row(record: SoftDeleteRecord, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
            Ok(Tag {
                record,
                label: row.get(offset)?,
                weight: read_decimal(row, offset + 1)?,
            })
        }
    }

    type TagStore = SoftDeleteStore<Tag>;

    fn setup() -> (Connection, NaiveDateTime) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE tag (id TEXT PRIMARY KEY, created_at TEXT NOT NULL, deactivated_at TEXT, label TEXT NOT NULL, weight TEXT NOT NULL);",
        )
        .unwrap();
        (conn, chrono::Local::now().naive_local())
    }

    fn tag(now: NaiveDateTime, label: &str) -> Tag {
        Tag {
            record: SoftDeleteRecord::new_at(now),
            label: label.to_string(),
            weight: Decimal::new(1250, 2),
        }
    }

    #[test]
    fn test_create_and_read_back() {
        let (conn, now) = setup();
        let t = tag(now, "alpha");
        TagStore::create(&conn, &t).unwrap();

        let loaded = TagStore::require_active(&conn, &t.record.id).unwrap();
        assert_eq!(loaded.label, "alpha");
        assert_eq!(loaded.weight, Decimal::new(1250, 2));
        assert_eq!(loaded.record, t.record);
    }

    #[test]
    fn test_deactivate_hides_from_active_queries() {
        let (conn, now) = setup();
        let a = tag(now, "a");
        let b = tag(now, "b");
        TagStore::create(&conn, &a).unwrap();
        TagStore::create(&conn, &b).unwrap();

        TagStore::deactivate(&conn, &a.record.id, now).unwrap();

        assert!(TagStore::get_active(&conn, &a.record.id).unwrap().is_none());
        assert!(TagStore::get_any(&conn, &a.record.id).unwrap().is_some());
        assert_eq!(TagStore::list_active(&conn).unwrap().len(), 1);
        assert_eq!(TagStore::list_all(&conn).unwrap().len(), 2);
        assert!(matches!(
            TagStore::require_active(&conn, &a.record.id),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_deactivate_twice_and_unknown_id() {
        let (conn, now) = setup();
        let a = tag(now, "a");
        TagStore::create(&conn, &a).unwrap();
        TagStore::deactivate(&conn, &a.record.id, now).unwrap();

        assert!(matches!(
            TagStore::deactivate(&conn, &a.record.id, now),
            Err(RepositoryError::AlreadyDeactivated { .. })
        ));
        assert!(matches!(
            TagStore::deactivate(&conn, "missing", now),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_and_filtered_query() {
        let (conn, now) = setup();
        let mut a = tag(now, "a");
        TagStore::create(&conn, &a).unwrap();
        a.label = "renamed".to_string();
        TagStore::update(&conn, &a).unwrap();

        let hits = TagStore::find_active_where(&conn, "label = ?1", vec![text("renamed")]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.id, a.record.id);

        let ghost = tag(now, "ghost");
        assert!(matches!(
            TagStore::update(&conn, &ghost),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
