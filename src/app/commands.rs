// ==========================================
// 考务监考排班系统 - 异步命令入口（按域拆分）
// ==========================================
// 职责: 认证令牌 → 在阻塞线程池执行 API 调用 → 调用方给定的时限内返回
// 说明: 结果为类型化值或可序列化的 ErrorResponse，由外部传输层包装
// ==========================================

mod assignment;
mod common;
mod dashboard;
mod registration;
mod scheduling;

pub use assignment::*;
pub use common::{parse_date, ErrorResponse};
pub use dashboard::*;
pub use registration::*;
pub use scheduling::*;
