// ==========================================
// 考务监考排班系统 - 应用层
// ==========================================
// 职责: 装配应用状态，提供带认证与时限的异步命令入口
// ==========================================

pub mod commands;
pub mod state;

// 重导出
pub use commands::ErrorResponse;
pub use state::{get_default_db_path, AppState};
