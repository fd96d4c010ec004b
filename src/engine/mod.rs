// ==========================================
// 考务监考排班系统 - 引擎层
// ==========================================
// 职责: 实现监考分配与统计的业务规则
// 红线: Engine 不拼 SQL，数据访问一律经由 Repository
// ==========================================

pub mod aggregation;
pub mod assignment;
pub mod auto_fill;
pub mod availability;
pub mod eligibility;
pub mod error;
pub mod hierarchy;
pub mod registration;
pub mod repositories;

// 重导出核心引擎
pub use aggregation::{
    AggregationEngine, AvailableExaminers, DistinctExaminers, ExaminerLoad, SlotUsage,
    SlotUtilization,
};
pub use assignment::{AssignmentEngine, EligibleExaminer};
pub use auto_fill::{AutoFillEngine, AutoFillError, AutoFillSummary};
pub use availability::{AvailabilityIndex, ExaminerAvailability};
pub use eligibility::{ProfileRejection, StaffingEligibility};
pub use error::{EngineError, EngineResult};
pub use hierarchy::{HierarchyEngine, PhaseOverview};
pub use registration::{RegistrationOutcome, RegistrationWorkflow};
pub use repositories::SchedulingRepositories;
