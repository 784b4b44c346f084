// ==========================================
// 公共工程管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value)
// ==========================================
// 注意: ConfigManager 与 API 共享同一连接；
//       调用方不得在持有连接锁时调用本模块方法
// ==========================================

use crate::config::work_rules::{
    WorkRules, DEFAULT_FINALIZED_STATE_NAME, DEFAULT_INITIAL_STATE_NAME,
    DEFAULT_MIN_EXECUTION_YEAR,
};
use crate::db::{open_shared_connection, SharedConnection};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: SharedConnection,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（独立连接）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            conn: open_shared_connection(db_path)?,
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, Box<dyn Error>> {
        Ok(self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?)
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        tracing::info!(config_key = key, config_value = value, "配置已更新");
        Ok(())
    }

    fn get_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 加载工程生命周期规则
    ///
    /// 非法的年份配置回退到默认值并记录告警
    pub fn load_work_rules(&self) -> Result<WorkRules, Box<dyn Error>> {
        let initial_state_name =
            self.get_or_default(config_keys::INITIAL_STATE_NAME, DEFAULT_INITIAL_STATE_NAME)?;
        let finalized_state_name = self.get_or_default(
            config_keys::FINALIZED_STATE_NAME,
            DEFAULT_FINALIZED_STATE_NAME,
        )?;

        let min_execution_year = match self.get_value(config_keys::MIN_EXECUTION_YEAR)? {
            Some(raw) => raw.trim().parse::<i32>().unwrap_or_else(|_| {
                tracing::warn!(
                    config_key = config_keys::MIN_EXECUTION_YEAR,
                    raw = %raw,
                    "配置值无法解析，使用默认值"
                );
                DEFAULT_MIN_EXECUTION_YEAR
            }),
            None => DEFAULT_MIN_EXECUTION_YEAR,
        };

        Ok(WorkRules {
            initial_state_name,
            finalized_state_name,
            min_execution_year,
        })
    }

    /// 获取所有配置的快照（JSON格式，按 key 排序）
    pub fn snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 工程生命周期
    pub const INITIAL_STATE_NAME: &str = "work.initial_state_name";
    pub const FINALIZED_STATE_NAME: &str = "work.finalized_state_name";
    pub const MIN_EXECUTION_YEAR: &str = "work.min_execution_year";
}
