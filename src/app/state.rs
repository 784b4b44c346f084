// ==========================================
// 公共工程管理系统 - 应用状态
// ==========================================
// 职责: 打开数据库、加载配置、修复派生标志、组装 API 实例
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{
    DashboardApi, DepartmentApi, ExecutionStateApi, LocalityApi, PlanApi, RiskApi, RubroApi,
    WorkApi,
};
use crate::config::ConfigManager;
use crate::db::{init_schema, lock_conn, open_sqlite_connection, SharedConnection};
use crate::engine::PlanExecutionTracker;
use crate::perf::install_sqlite_tracing;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "GESTION_OBRAS_DB_PATH";

/// 应用状态
///
/// 所有 API 共享同一个连接；写操作经连接锁串行化
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub conn: SharedConnection,

    pub config: Arc<ConfigManager>,

    pub department_api: Arc<DepartmentApi>,
    pub locality_api: Arc<LocalityApi>,
    pub rubro_api: Arc<RubroApi>,
    pub execution_state_api: Arc<ExecutionStateApi>,
    pub plan_api: Arc<PlanApi>,
    pub risk_api: Arc<RiskApi>,
    pub work_api: Arc<WorkApi>,
    pub dashboard_api: Arc<DashboardApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开连接、安装 SQL 统计、建表
    /// 2. 读取工程生命周期配置
    /// 3. 重算所有计划的执行标志（修复历史漂移）
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let mut conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        install_sqlite_tracing(&mut conn);
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn: SharedConnection = Arc::new(std::sync::Mutex::new(conn));

        // 配置读取会自行加锁，必须在持有连接锁之前完成
        let config = Arc::new(ConfigManager::from_connection(conn.clone()));
        let rules = config
            .load_work_rules()
            .map_err(|e| format!("无法加载配置: {}", e))?;
        tracing::info!(
            initial_state = %rules.initial_state_name,
            finalized_state = %rules.finalized_state_name,
            min_execution_year = rules.min_execution_year,
            "工程生命周期配置已加载"
        );

        {
            let mut guard = lock_conn(&conn).map_err(|e| e.to_string())?;
            let tx = guard
                .transaction()
                .map_err(|e| format!("无法开启事务: {}", e))?;
            let drifts = PlanExecutionTracker::reconcile_all(&tx)
                .map_err(|e| format!("计划执行标志修复失败: {}", e))?;
            tx.commit().map_err(|e| format!("提交事务失败: {}", e))?;
            for drift in &drifts {
                tracing::warn!(
                    plan_id = %drift.plan_id,
                    stored = drift.stored,
                    expected = drift.expected,
                    "计划执行标志已修正"
                );
            }
        }

        Ok(Self {
            db_path,
            department_api: Arc::new(DepartmentApi::new(conn.clone())),
            locality_api: Arc::new(LocalityApi::new(conn.clone())),
            rubro_api: Arc::new(RubroApi::new(conn.clone())),
            execution_state_api: Arc::new(ExecutionStateApi::new(conn.clone())),
            plan_api: Arc::new(PlanApi::new(conn.clone())),
            risk_api: Arc::new(RiskApi::new(conn.clone())),
            work_api: Arc::new(WorkApi::new(conn.clone(), rules)),
            dashboard_api: Arc::new(DashboardApi::new(conn.clone())),
            config,
            conn,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级：
/// 1. 环境变量 GESTION_OBRAS_DB_PATH
/// 2. 用户数据目录（开发构建使用独立目录，避免污染正式数据）
/// 3. 当前目录 ./gestion_obras.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./gestion_obras.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        let dir = data_dir.join("gestion-obras-dev");
        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("gestion-obras");

        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("gestion_obras.db");
        }
    }

    path.to_string_lossy().to_string()
}
