// ==========================================
// 考务监考排班系统 - 驾驶舱 API
// ==========================================
// 职责: 封装 AggregationEngine，提供阶段统计与操作日志查询
// 门控: staff 及以上
// ==========================================

use std::sync::Arc;

use crate::api::auth::{require_role, ActorRole, CallerIdentity};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::require_id;
use crate::domain::action_log::ActionLog;
use crate::engine::{
    AggregationEngine, AvailableExaminers, DistinctExaminers, ExaminerLoad, SlotUtilization,
};
use crate::repository::action_log_repo::ActionLogRepository;

/// 操作日志单次查询上限
const MAX_ACTION_LOG_LIMIT: i64 = 500;

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================
pub struct DashboardApi {
    aggregation: Arc<AggregationEngine>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl DashboardApi {
    pub fn new(aggregation: Arc<AggregationEngine>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            aggregation,
            action_log_repo,
        }
    }

    pub fn count_distinct_examiners(
        &self,
        caller: &CallerIdentity,
        phase_id: i64,
    ) -> ApiResult<DistinctExaminers> {
        require_role(caller, ActorRole::Staff)?;
        require_id("phase_id", phase_id)?;
        Ok(self.aggregation.count_distinct_examiners(phase_id)?)
    }

    pub fn count_staffed_rooms(&self, caller: &CallerIdentity, phase_id: i64) -> ApiResult<usize> {
        require_role(caller, ActorRole::Staff)?;
        require_id("phase_id", phase_id)?;
        Ok(self.aggregation.count_staffed_rooms(phase_id)?)
    }

    pub fn slot_utilization(&self, caller: &CallerIdentity, phase_id: i64) -> ApiResult<SlotUtilization> {
        require_role(caller, ActorRole::Staff)?;
        require_id("phase_id", phase_id)?;
        Ok(self.aggregation.slot_utilization(phase_id)?)
    }

    pub fn count_available_examiners(
        &self,
        caller: &CallerIdentity,
        phase_id: i64,
    ) -> ApiResult<AvailableExaminers> {
        require_role(caller, ActorRole::Staff)?;
        require_id("phase_id", phase_id)?;
        Ok(self.aggregation.count_available_examiners(phase_id)?)
    }

    /// 负载 Top-N（None 使用配置默认值）
    pub fn top_examiners_by_load(
        &self,
        caller: &CallerIdentity,
        phase_id: i64,
        top_n: Option<usize>,
    ) -> ApiResult<Vec<ExaminerLoad>> {
        require_role(caller, ActorRole::Staff)?;
        require_id("phase_id", phase_id)?;
        Ok(self.aggregation.top_examiners_by_load(phase_id, top_n)?)
    }

    // ==========================================
    // 操作日志查询
    // ==========================================

    pub fn list_recent_actions(&self, caller: &CallerIdentity, limit: i64) -> ApiResult<Vec<ActionLog>> {
        require_role(caller, ActorRole::Staff)?;
        if limit <= 0 || limit > MAX_ACTION_LOG_LIMIT {
            return Err(ApiError::InvalidInput(format!(
                "limit 必须在 1..={} 之间: {}",
                MAX_ACTION_LOG_LIMIT, limit
            )));
        }
        Ok(self.action_log_repo.find_recent(limit)?)
    }

    pub fn list_room_actions(&self, caller: &CallerIdentity, room_id: i64) -> ApiResult<Vec<ActionLog>> {
        require_role(caller, ActorRole::Staff)?;
        require_id("room_id", room_id)?;
        Ok(self.action_log_repo.find_by_room(room_id)?)
    }
}
