// ==========================================
// 公共工程管理系统 - API 层公共辅助
// ==========================================
// 事务边界: 每个写操作持有连接锁，在单个事务内完成，
//           闭包返回 Err 时事务随 drop 回滚
// 粒度: 全部读写共用一把连接锁，不相关实体的操作同样串行
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::db::{lock_conn, SharedConnection};
use crate::domain::catalog::names_match;
use crate::engine::DeletionGuard;
use crate::repository::{SoftDeleteEntity, SoftDeleteStore};
use chrono::NaiveDateTime;
use rusqlite::Connection;

/// 当前时间（本地时区，无时区信息）
pub(crate) fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// 在事务内执行写操作
pub(crate) fn with_tx<T>(
    conn: &SharedConnection,
    f: impl FnOnce(&Connection) -> ApiResult<T>,
) -> ApiResult<T> {
    let mut guard = lock_conn(conn)?;
    let tx = guard
        .transaction()
        .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;
    let out = f(&tx)?;
    tx.commit()
        .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;
    Ok(out)
}

/// 只读操作
pub(crate) fn with_conn<T>(
    conn: &SharedConnection,
    f: impl FnOnce(&Connection) -> ApiResult<T>,
) -> ApiResult<T> {
    let guard = lock_conn(conn)?;
    f(&guard)
}

/// 停用流程：存在性 → 未停用 → 依赖守卫 → 写入 deactivated_at
///
/// 返回停用前的实体
pub(crate) fn deactivate_guarded<T: SoftDeleteEntity>(conn: &Connection, id: &str) -> ApiResult<T> {
    let entity = SoftDeleteStore::<T>::get_any(conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("{}(id={})不存在", T::KIND, id)))?;
    if !entity.record().is_active() {
        return Err(ApiError::Deactivated(format!("{}(id={})已停用", T::KIND, id)));
    }
    DeletionGuard::check(conn, T::KIND, id)?;
    SoftDeleteStore::<T>::deactivate(conn, id, now())?;
    Ok(entity)
}

/// 名称必填，返回去掉首尾空白后的值
pub(crate) fn require_name(raw: &str, label: &str) -> ApiResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::ValidationError(format!("{}名称不能为空", label)));
    }
    Ok(name.to_string())
}

/// 名称在有效记录中唯一（忽略大小写），`exclude_id` 为更新时的自身 id
pub(crate) fn ensure_name_free<'a>(
    existing: impl IntoIterator<Item = (&'a str, &'a str)>,
    candidate: &str,
    exclude_id: Option<&str>,
    label: &str,
) -> ApiResult<()> {
    let taken = existing
        .into_iter()
        .any(|(id, name)| Some(id) != exclude_id && names_match(name, candidate));
    if taken {
        tracing::warn!(label = label, name = candidate, "名称重复");
        return Err(ApiError::Conflict(format!("{}名称 '{}' 已存在", label, candidate)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_rules() {
        assert!(matches!(require_name("  ", "部门"), Err(ApiError::ValidationError(_))));
        assert_eq!(require_name(" Nevada ", "部门").unwrap(), "Nevada");

        let existing = vec![("d1", "Nevada"), ("d2", "Ohio")];
        let it = || existing.iter().map(|(a, b)| (*a, *b));
        assert!(matches!(
            ensure_name_free(it(), "NEVADA", None, "部门"),
            Err(ApiError::Conflict(_))
        ));
        assert!(ensure_name_free(it(), "nevada", Some("d1"), "部门").is_ok());
        assert!(ensure_name_free(it(), "Texas", None, "部门").is_ok());
    }
}
