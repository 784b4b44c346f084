// ==========================================
// 公共工程管理系统 - 应用层
// ==========================================
// 职责: 组装共享状态，提供传输层响应封装
// ==========================================

pub mod response;
pub mod state;

// 重导出
pub use response::ResponseEnvelope;
pub use state::{get_default_db_path, AppState};
