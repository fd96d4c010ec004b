// ==========================================
// 考务监考排班系统 - 操作日志数据仓储
// ==========================================
// 依据: action_log 表
// 红线: 所有监考写入必须记录
// ==========================================

mod core;
mod queries;


pub use self::core::ActionLogRepository;
