// ==========================================
// 考务监考排班系统 - 数据仓储层（排考层级存储）
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod examiner_repo;
pub mod phase_repo;
pub mod room_repo;
pub mod semester_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use examiner_repo::{ExaminerRepository, LogTimeInsertOutcome};
pub use phase_repo::ScheduleHierarchyRepository;
pub use room_repo::{PhaseSnapshot, RoomAssignmentRepository};
pub use semester_repo::SemesterRepository;
