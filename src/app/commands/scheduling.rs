// ==========================================
// 考务监考排班系统 - 排考层级命令
// ==========================================
// 职责: 学期 / 阶段 / 考试日维护与可用日导入
// ==========================================

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use crate::app::state::AppState;
use crate::domain::schedule::{ExamPhase, ExamSlot};
use crate::domain::semester::Semester;
use crate::engine::PhaseOverview;
use crate::importer::ImportSummary;

use super::common::{run_command, ErrorResponse};

// ==========================================
// 排考层级维护相关命令
// ==========================================

pub async fn provision_semester(
    state: &AppState,
    token: &str,
    today: NaiveDate,
    deadline: Duration,
) -> Result<Semester, ErrorResponse> {
    let api = state.scheduling_api.clone();
    run_command(state, token, deadline, "provision_semester", move |caller| {
        api.provision_semester(&caller, today)
    })
    .await
}

pub async fn delete_semester(
    state: &AppState,
    token: &str,
    semester_id: i64,
    today: NaiveDate,
    deadline: Duration,
) -> Result<Semester, ErrorResponse> {
    let api = state.scheduling_api.clone();
    run_command(state, token, deadline, "delete_semester", move |caller| {
        api.delete_semester(&caller, semester_id, today)
    })
    .await
}

pub async fn create_phase(
    state: &AppState,
    token: &str,
    semester_id: i64,
    exam_type_id: i64,
    start_day: NaiveDate,
    end_day: NaiveDate,
    deadline: Duration,
) -> Result<ExamPhase, ErrorResponse> {
    let api = state.scheduling_api.clone();
    run_command(state, token, deadline, "create_phase", move |caller| {
        api.create_phase(&caller, semester_id, exam_type_id, start_day, end_day)
    })
    .await
}

pub async fn delete_phase(
    state: &AppState,
    token: &str,
    phase_id: i64,
    deadline: Duration,
) -> Result<(), ErrorResponse> {
    let api = state.scheduling_api.clone();
    run_command(state, token, deadline, "delete_phase", move |caller| {
        api.delete_phase(&caller, phase_id)
    })
    .await
}

pub async fn list_phases(
    state: &AppState,
    token: &str,
    deadline: Duration,
) -> Result<Vec<PhaseOverview>, ErrorResponse> {
    let api = state.scheduling_api.clone();
    run_command(state, token, deadline, "list_phases", move |caller| api.list_phases(&caller)).await
}

pub async fn create_slot(
    state: &AppState,
    token: &str,
    phase_id: i64,
    day: NaiveDate,
    deadline: Duration,
) -> Result<ExamSlot, ErrorResponse> {
    let api = state.scheduling_api.clone();
    run_command(state, token, deadline, "create_slot", move |caller| {
        api.create_slot(&caller, phase_id, day)
    })
    .await
}

pub async fn import_availability(
    state: &AppState,
    token: &str,
    file_path: PathBuf,
    deadline: Duration,
) -> Result<ImportSummary, ErrorResponse> {
    let api = state.scheduling_api.clone();
    run_command(state, token, deadline, "import_availability", move |caller| {
        api.import_availability(&caller, &file_path)
    })
    .await
}
