// ==========================================
// 考务监考排班系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 监考分配、自助报名与阶段统计（人工最终控制权）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计（SQL 计数 / 慢查询）
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配与异步命令
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ExaminerRole, ExaminerStatus, Season};

// 领域实体
pub use domain::{
    ActionLog, ActionType, ExamPhase, ExamRoomAssignment, ExamSlot, ExamType, Examiner, Semester,
    SubInSlot,
};

// 引擎
pub use engine::{
    AggregationEngine, AssignmentEngine, AutoFillEngine, EngineError, HierarchyEngine,
    RegistrationWorkflow,
};

// API
pub use api::{ApiError, AssignmentApi, CallerIdentity, DashboardApi, RegistrationApi, SchedulingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "考务监考排班系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
