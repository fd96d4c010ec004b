// ==========================================
// 考务监考排班系统 - 监考员自助报名
// ==========================================
// 职责: 监考员为空闲考场报名 / 取消报名
// 规则:
// - 报名只能占用空闲考场，不顶替他人；重复报名为幂等成功
// - 取消报名只能取消自己的；他人持有 → Forbidden；空闲 → 幂等成功
// ==========================================

use crate::config::AssignmentPolicy;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::schedule::ExamRoomAssignment;
use crate::engine::eligibility::StaffingEligibility;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::SchedulingRepositories;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// 报名 / 取消结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub room: ExamRoomAssignment,
    /// false 表示本次调用未改变考场状态（幂等重入）
    pub changed: bool,
}

// ==========================================
// RegistrationWorkflow - 报名流程
// ==========================================
#[derive(Clone)]
pub struct RegistrationWorkflow {
    repos: SchedulingRepositories,
    eligibility: StaffingEligibility,
}

impl RegistrationWorkflow {
    pub fn new(repos: SchedulingRepositories, policy: AssignmentPolicy) -> Self {
        let eligibility = StaffingEligibility::new(repos.clone(), policy);
        Self { repos, eligibility }
    }

    #[instrument(skip(self), fields(examiner_id = %examiner_id, room_id = %room_id))]
    pub fn register(&self, examiner_id: i64, room_id: i64) -> EngineResult<RegistrationOutcome> {
        let placement = self.eligibility.load_placement(room_id)?;
        match placement.room.examiner_id {
            Some(current) if current == examiner_id => {
                tracing::debug!("重复报名，保持不变");
                return Ok(RegistrationOutcome {
                    room: placement.room,
                    changed: false,
                });
            }
            Some(current) => {
                tracing::warn!(current_examiner_id = current, "考场已被他人报名");
                return Err(EngineError::Conflict(format!("考场 {} 已有监考员", room_id)));
            }
            None => {}
        }

        let examiner = self.eligibility.load_examiner(examiner_id)?;
        let index = self.eligibility.availability_for(&placement)?;
        self.eligibility.check_all(&examiner, &placement, &index)?;

        if !self
            .repos
            .room_repo
            .compare_and_set_examiner(room_id, None, Some(examiner_id))?
        {
            let current = self
                .repos
                .room_repo
                .find_by_id(room_id)?
                .ok_or_else(|| EngineError::not_found("ExamRoomAssignment", room_id))?;
            return match current.examiner_id {
                // 并发的同人重复报名
                Some(id) if id == examiner_id => Ok(RegistrationOutcome {
                    room: current,
                    changed: false,
                }),
                Some(_) => Err(EngineError::Conflict(format!("考场 {} 已有监考员", room_id))),
                None => Err(EngineError::Conflict(format!(
                    "监考员 {} 在 {} 已有时间冲突的考场",
                    examiner_id, placement.day
                ))),
            };
        }

        tracing::info!("报名成功");
        self.repos.record_action(
            ActionLog::now(ActionType::Register, &format!("examiner:{}", examiner_id))
                .with_room(room_id)
                .with_examiner(Some(examiner_id)),
        );
        let mut room = placement.room;
        room.examiner_id = Some(examiner_id);
        Ok(RegistrationOutcome { room, changed: true })
    }

    #[instrument(skip(self), fields(examiner_id = %examiner_id, room_id = %room_id))]
    pub fn unregister(&self, examiner_id: i64, room_id: i64) -> EngineResult<RegistrationOutcome> {
        let room = self
            .repos
            .room_repo
            .find_by_id(room_id)?
            .ok_or_else(|| EngineError::not_found("ExamRoomAssignment", room_id))?;

        match room.examiner_id {
            None => {
                return Ok(RegistrationOutcome { room, changed: false });
            }
            Some(current) if current != examiner_id => {
                tracing::warn!(current_examiner_id = current, "尝试取消他人报名");
                return Err(EngineError::Forbidden(format!(
                    "考场 {} 不是监考员 {} 的报名",
                    room_id, examiner_id
                )));
            }
            Some(_) => {}
        }

        if !self
            .repos
            .room_repo
            .compare_and_set_examiner(room_id, Some(examiner_id), None)?
        {
            let current = self
                .repos
                .room_repo
                .find_by_id(room_id)?
                .ok_or_else(|| EngineError::not_found("ExamRoomAssignment", room_id))?;
            return match current.examiner_id {
                None => Ok(RegistrationOutcome {
                    room: current,
                    changed: false,
                }),
                Some(_) => Err(EngineError::Forbidden(format!(
                    "考场 {} 不是监考员 {} 的报名",
                    room_id, examiner_id
                ))),
            };
        }

        tracing::info!("已取消报名");
        self.repos.record_action(
            ActionLog::now(ActionType::Unregister, &format!("examiner:{}", examiner_id))
                .with_room(room_id)
                .with_examiner(Some(examiner_id)),
        );
        let mut room = room;
        room.examiner_id = None;
        Ok(RegistrationOutcome { room, changed: true })
    }
}
