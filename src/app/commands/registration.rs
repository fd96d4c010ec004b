// ==========================================
// 考务监考排班系统 - 自助报名命令
// ==========================================
// 职责: 监考员报名与取消报名
// ==========================================

use std::time::Duration;

use crate::app::state::AppState;
use crate::engine::RegistrationOutcome;

use super::common::{run_command, ErrorResponse};

// ==========================================
// 自助报名相关命令
// ==========================================

pub async fn register_for_room(
    state: &AppState,
    token: &str,
    room_id: i64,
    deadline: Duration,
) -> Result<RegistrationOutcome, ErrorResponse> {
    let api = state.registration_api.clone();
    run_command(state, token, deadline, "register_for_room", move |caller| {
        api.register(&caller, room_id)
    })
    .await
}

pub async fn unregister_from_room(
    state: &AppState,
    token: &str,
    room_id: i64,
    deadline: Duration,
) -> Result<RegistrationOutcome, ErrorResponse> {
    let api = state.registration_api.clone();
    run_command(state, token, deadline, "unregister_from_room", move |caller| {
        api.unregister(&caller, room_id)
    })
    .await
}
