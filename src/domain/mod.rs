// ==========================================
// 考务监考排班系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod examiner;
pub mod schedule;
pub mod semester;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use examiner::{Examiner, ExaminerLogTime, NewExaminer};
pub use schedule::{ExamPhase, ExamRoomAssignment, ExamSlot, RoomPlacement, SubInSlot, TimeWindow};
pub use semester::{ExamType, Semester};
pub use types::{ExaminerRole, ExaminerStatus, Season};
