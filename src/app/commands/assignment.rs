// ==========================================
// 考务监考排班系统 - 监考指派命令
// ==========================================
// 职责: 指派 / 释放 / 自动补位 / 考场维护 / 候选查询
// ==========================================

use std::time::Duration;

use crate::app::state::AppState;
use crate::domain::schedule::ExamRoomAssignment;
use crate::engine::{AutoFillSummary, EligibleExaminer};

use super::common::{run_command, ErrorResponse};

// ==========================================
// 监考指派相关命令
// ==========================================

pub async fn assign_examiner(
    state: &AppState,
    token: &str,
    room_id: i64,
    examiner_id: i64,
    deadline: Duration,
) -> Result<ExamRoomAssignment, ErrorResponse> {
    let api = state.assignment_api.clone();
    run_command(state, token, deadline, "assign_examiner", move |caller| {
        api.assign_examiner(&caller, room_id, examiner_id)
    })
    .await
}

pub async fn release_examiner(
    state: &AppState,
    token: &str,
    room_id: i64,
    deadline: Duration,
) -> Result<ExamRoomAssignment, ErrorResponse> {
    let api = state.assignment_api.clone();
    run_command(state, token, deadline, "release_examiner", move |caller| {
        api.release_examiner(&caller, room_id)
    })
    .await
}

pub async fn auto_fill_slot(
    state: &AppState,
    token: &str,
    exam_slot_id: i64,
    deadline: Duration,
) -> Result<AutoFillSummary, ErrorResponse> {
    let api = state.assignment_api.clone();
    run_command(state, token, deadline, "auto_fill_slot", move |caller| {
        api.auto_fill_slot(&caller, exam_slot_id)
    })
    .await
}

pub async fn add_room(
    state: &AppState,
    token: &str,
    sub_in_slot_id: i64,
    room_ref: String,
    course_id: i64,
    deadline: Duration,
) -> Result<ExamRoomAssignment, ErrorResponse> {
    let api = state.assignment_api.clone();
    run_command(state, token, deadline, "add_room", move |caller| {
        api.add_room(&caller, sub_in_slot_id, &room_ref, course_id)
    })
    .await
}

pub async fn remove_room(
    state: &AppState,
    token: &str,
    room_id: i64,
    force: bool,
    deadline: Duration,
) -> Result<ExamRoomAssignment, ErrorResponse> {
    let api = state.assignment_api.clone();
    run_command(state, token, deadline, "remove_room", move |caller| {
        api.remove_room(&caller, room_id, force)
    })
    .await
}

pub async fn list_eligible_examiners(
    state: &AppState,
    token: &str,
    room_id: i64,
    deadline: Duration,
) -> Result<Vec<EligibleExaminer>, ErrorResponse> {
    let api = state.assignment_api.clone();
    run_command(state, token, deadline, "list_eligible_examiners", move |caller| {
        api.list_eligible_examiners(&caller, room_id)
    })
    .await
}
