// ==========================================
// 考务监考排班系统 - 监考指派 API
// ==========================================
// 职责: 封装 AssignmentEngine / AutoFillEngine，角色门控 + 参数校验 + 错误映射
// 门控: 全部操作需要 staff 及以上
// ==========================================

use std::sync::Arc;

use crate::api::auth::{require_role, ActorRole, CallerIdentity};
use crate::api::error::ApiResult;
use crate::api::validator::{require_id, require_text};
use crate::domain::schedule::ExamRoomAssignment;
use crate::engine::{AssignmentEngine, AutoFillEngine, AutoFillSummary, EligibleExaminer};

// ==========================================
// AssignmentApi - 监考指派 API
// ==========================================
pub struct AssignmentApi {
    assignment: Arc<AssignmentEngine>,
    auto_fill: Arc<AutoFillEngine>,
}

impl AssignmentApi {
    pub fn new(assignment: Arc<AssignmentEngine>, auto_fill: Arc<AutoFillEngine>) -> Self {
        Self {
            assignment,
            auto_fill,
        }
    }

    /// 指派监考员（其他监考员持有时替换）
    pub fn assign_examiner(
        &self,
        caller: &CallerIdentity,
        room_id: i64,
        examiner_id: i64,
    ) -> ApiResult<ExamRoomAssignment> {
        require_role(caller, ActorRole::Staff)?;
        require_id("room_id", room_id)?;
        require_id("examiner_id", examiner_id)?;
        Ok(self
            .assignment
            .assign_examiner(room_id, examiner_id, &caller.subject)?)
    }

    pub fn release_examiner(&self, caller: &CallerIdentity, room_id: i64) -> ApiResult<ExamRoomAssignment> {
        require_role(caller, ActorRole::Staff)?;
        require_id("room_id", room_id)?;
        Ok(self.assignment.release_examiner(room_id, &caller.subject)?)
    }

    pub fn auto_fill_slot(&self, caller: &CallerIdentity, exam_slot_id: i64) -> ApiResult<AutoFillSummary> {
        require_role(caller, ActorRole::Staff)?;
        require_id("exam_slot_id", exam_slot_id)?;
        Ok(self.auto_fill.fill_slot(exam_slot_id, &caller.subject)?)
    }

    pub fn add_room(
        &self,
        caller: &CallerIdentity,
        sub_in_slot_id: i64,
        room_ref: &str,
        course_id: i64,
    ) -> ApiResult<ExamRoomAssignment> {
        require_role(caller, ActorRole::Staff)?;
        require_id("sub_in_slot_id", sub_in_slot_id)?;
        require_id("course_id", course_id)?;
        let room_ref = require_text("room_ref", room_ref)?;
        Ok(self
            .assignment
            .add_room(sub_in_slot_id, room_ref, course_id, &caller.subject)?)
    }

    pub fn remove_room(
        &self,
        caller: &CallerIdentity,
        room_id: i64,
        force: bool,
    ) -> ApiResult<ExamRoomAssignment> {
        require_role(caller, ActorRole::Staff)?;
        require_id("room_id", room_id)?;
        Ok(self.assignment.remove_room(room_id, force, &caller.subject)?)
    }

    pub fn list_eligible_examiners(
        &self,
        caller: &CallerIdentity,
        room_id: i64,
    ) -> ApiResult<Vec<EligibleExaminer>> {
        require_role(caller, ActorRole::Staff)?;
        require_id("room_id", room_id)?;
        Ok(self.assignment.list_eligible_examiners(room_id)?)
    }
}
