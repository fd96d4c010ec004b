// ==========================================
// 考务监考排班系统 - 驾驶舱命令
// ==========================================
// 职责: 阶段统计与最近操作日志
// ==========================================

use std::time::Duration;

use crate::app::state::AppState;
use crate::domain::action_log::ActionLog;
use crate::engine::{AvailableExaminers, DistinctExaminers, ExaminerLoad, SlotUtilization};

use super::common::{run_command, ErrorResponse};

// ==========================================
// 驾驶舱相关命令
// ==========================================

pub async fn count_distinct_examiners(
    state: &AppState,
    token: &str,
    phase_id: i64,
    deadline: Duration,
) -> Result<DistinctExaminers, ErrorResponse> {
    let api = state.dashboard_api.clone();
    run_command(state, token, deadline, "count_distinct_examiners", move |caller| {
        api.count_distinct_examiners(&caller, phase_id)
    })
    .await
}

pub async fn count_staffed_rooms(
    state: &AppState,
    token: &str,
    phase_id: i64,
    deadline: Duration,
) -> Result<usize, ErrorResponse> {
    let api = state.dashboard_api.clone();
    run_command(state, token, deadline, "count_staffed_rooms", move |caller| {
        api.count_staffed_rooms(&caller, phase_id)
    })
    .await
}

pub async fn get_slot_utilization(
    state: &AppState,
    token: &str,
    phase_id: i64,
    deadline: Duration,
) -> Result<SlotUtilization, ErrorResponse> {
    let api = state.dashboard_api.clone();
    run_command(state, token, deadline, "get_slot_utilization", move |caller| {
        api.slot_utilization(&caller, phase_id)
    })
    .await
}

pub async fn count_available_examiners(
    state: &AppState,
    token: &str,
    phase_id: i64,
    deadline: Duration,
) -> Result<AvailableExaminers, ErrorResponse> {
    let api = state.dashboard_api.clone();
    run_command(state, token, deadline, "count_available_examiners", move |caller| {
        api.count_available_examiners(&caller, phase_id)
    })
    .await
}

pub async fn top_examiners_by_load(
    state: &AppState,
    token: &str,
    phase_id: i64,
    top_n: Option<usize>,
    deadline: Duration,
) -> Result<Vec<ExaminerLoad>, ErrorResponse> {
    let api = state.dashboard_api.clone();
    run_command(state, token, deadline, "top_examiners_by_load", move |caller| {
        api.top_examiners_by_load(&caller, phase_id, top_n)
    })
    .await
}

pub async fn list_recent_actions(
    state: &AppState,
    token: &str,
    limit: i64,
    deadline: Duration,
) -> Result<Vec<ActionLog>, ErrorResponse> {
    let api = state.dashboard_api.clone();
    run_command(state, token, deadline, "list_recent_actions", move |caller| {
        api.list_recent_actions(&caller, limit)
    })
    .await
}
