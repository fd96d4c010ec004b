// ==========================================
// 考务监考排班系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合排班引擎所需的所有 Repository
// 目标: 各引擎共享同一组仓储，减少构造参数
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

use crate::domain::action_log::ActionLog;
use crate::repository::{
    ActionLogRepository, ExaminerRepository, RoomAssignmentRepository,
    ScheduleHierarchyRepository, SemesterRepository,
};

/// 排班引擎仓储集合
///
/// # 包含的仓储
/// - `semester_repo`: 学期与考试类型
/// - `hierarchy_repo`: 阶段 / 考试日 / 场次
/// - `room_repo`: 考场监考单元（含条件写入）
/// - `examiner_repo`: 监考员与可用日登记
/// - `action_log_repo`: 操作日志
#[derive(Clone)]
pub struct SchedulingRepositories {
    pub semester_repo: Arc<SemesterRepository>,
    pub hierarchy_repo: Arc<ScheduleHierarchyRepository>,
    pub room_repo: Arc<RoomAssignmentRepository>,
    pub examiner_repo: Arc<ExaminerRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl SchedulingRepositories {
    /// 基于同一连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>, lock_timeout: Duration) -> Self {
        Self {
            semester_repo: Arc::new(SemesterRepository::with_lock_timeout(conn.clone(), lock_timeout)),
            hierarchy_repo: Arc::new(ScheduleHierarchyRepository::with_lock_timeout(
                conn.clone(),
                lock_timeout,
            )),
            room_repo: Arc::new(RoomAssignmentRepository::with_lock_timeout(conn.clone(), lock_timeout)),
            examiner_repo: Arc::new(ExaminerRepository::with_lock_timeout(conn.clone(), lock_timeout)),
            action_log_repo: Arc::new(ActionLogRepository::with_lock_timeout(conn, lock_timeout)),
        }
    }
}

impl SchedulingRepositories {
    /// 写入操作日志（尽力而为：失败只记录告警，不影响已提交的业务变更）
    pub fn record_action(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!(
                action_type = %log.action_type,
                error = %e,
                "操作日志写入失败"
            );
        }
    }
}
