// ==========================================
// 考务监考排班系统 - 导入层
// ==========================================
// 职责: 外部数据导入（监考员可用日登记）
// 支持: CSV
// ==========================================

pub mod availability_importer;
pub mod error;

// 重导出核心类型
pub use availability_importer::{AvailabilityImporter, ImportSummary, RejectedRow};
pub use error::{ImportError, ImportResult};
