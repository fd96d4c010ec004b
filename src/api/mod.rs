// ==========================================
// 考务监考排班系统 - API 层
// ==========================================
// 职责: 角色门控、参数校验、引擎错误 → 对外错误分类
// 说明: 不构造传输层报文，由 app::commands 或外部传输层包装
// ==========================================

pub mod assignment_api;
pub mod auth;
pub mod dashboard_api;
pub mod error;
pub mod registration_api;
pub mod scheduling_api;
pub mod validator;

// 重导出核心类型
pub use assignment_api::AssignmentApi;
pub use auth::{
    require_examiner, require_role, ActorRole, Authorizer, CallerIdentity, StaticTokenAuthorizer,
};
pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult};
pub use registration_api::RegistrationApi;
pub use scheduling_api::SchedulingApi;
