// ==========================================
// 公共工程管理系统 - 命令行入口
// ==========================================
// 打开数据库并以 JSON 输出驾驶舱快照
// 用法: gestion-obras [数据库路径]
// ==========================================

use gestion_obras::app::{get_default_db_path, AppState, ResponseEnvelope};

fn main() -> anyhow::Result<()> {
    gestion_obras::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 版本 {}", gestion_obras::APP_NAME, gestion_obras::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args()
        .nth(1)
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    let envelope = ResponseEnvelope::from_result(state.dashboard_api.snapshot());
    println!("{}", envelope.to_json());

    if !envelope.success {
        anyhow::bail!("驾驶舱查询失败: {}", envelope.message);
    }
    Ok(())
}
