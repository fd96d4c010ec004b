// ==========================================
// 考务监考排班系统 - 监考指派引擎
// ==========================================
// 职责: 教务指派 / 撤销监考员，新增 / 删除考场，候选监考员查询
// 并发: 写入一律走条件更新（以当前 examiner_id 为条件），
//       冲突复核在同一条 SQL 内完成；条件不满足 → Conflict
// 红线: Engine 不拼 SQL
// ==========================================

use crate::config::AssignmentPolicy;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::examiner::Examiner;
use crate::domain::schedule::{ExamRoomAssignment, RoomPlacement};
use crate::engine::eligibility::{profile_rejection, StaffingEligibility};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::SchedulingRepositories;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

/// 候选监考员（附阶段内当前负载）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleExaminer {
    pub examiner: Examiner,
    pub phase_load: usize,
}

// ==========================================
// AssignmentEngine - 监考指派引擎
// ==========================================
#[derive(Clone)]
pub struct AssignmentEngine {
    repos: SchedulingRepositories,
    eligibility: StaffingEligibility,
}

impl AssignmentEngine {
    pub fn new(repos: SchedulingRepositories, policy: AssignmentPolicy) -> Self {
        let eligibility = StaffingEligibility::new(repos.clone(), policy);
        Self { repos, eligibility }
    }

    pub fn eligibility(&self) -> &StaffingEligibility {
        &self.eligibility
    }

    // ==========================================
    // 指派 / 撤销
    // ==========================================

    /// 指派监考员到考场
    ///
    /// 检查顺序:
    /// 1) 考场存在；已由同一监考员持有 → Conflict（其他监考员持有视为替换）
    /// 2) 监考员存在、学期归属、在岗、角色策略
    /// 3) 考试日可用
    /// 4) 无同日时间冲突
    ///
    /// # 返回
    /// 更新后的考场记录
    #[instrument(skip(self), fields(room_id = %room_id, examiner_id = %examiner_id))]
    pub fn assign_examiner(
        &self,
        room_id: i64,
        examiner_id: i64,
        actor: &str,
    ) -> EngineResult<ExamRoomAssignment> {
        let placement = self.eligibility.load_placement(room_id)?;
        if placement.room.examiner_id == Some(examiner_id) {
            return Err(EngineError::Conflict(format!(
                "考场 {} 已由监考员 {} 监考",
                room_id, examiner_id
            )));
        }

        let examiner = self.eligibility.load_examiner(examiner_id)?;
        let index = self.eligibility.availability_for(&placement)?;
        self.eligibility.check_all(&examiner, &placement, &index)?;

        let previous = placement.room.examiner_id;
        let room = self.commit_staffing(&placement, examiner_id)?;

        tracing::info!(previous_examiner_id = ?previous, "监考指派成功");
        self.repos.record_action(
            ActionLog::now(ActionType::AssignExaminer, actor)
                .with_room(room_id)
                .with_examiner(Some(examiner_id))
                .with_payload(json!({
                    "previous_examiner_id": previous,
                    "day": placement.day,
                    "phase_id": placement.phase_id,
                })),
        );
        Ok(room)
    }

    /// 撤销考场监考员（幂等：未配置时静默成功）
    #[instrument(skip(self), fields(room_id = %room_id))]
    pub fn release_examiner(&self, room_id: i64, actor: &str) -> EngineResult<ExamRoomAssignment> {
        let mut room = self
            .repos
            .room_repo
            .find_by_id(room_id)?
            .ok_or_else(|| EngineError::not_found("ExamRoomAssignment", room_id))?;

        if self.repos.room_repo.clear_examiner(room_id)? == 0 {
            return Err(EngineError::not_found("ExamRoomAssignment", room_id));
        }

        if let Some(previous) = room.examiner_id.take() {
            tracing::info!(previous_examiner_id = previous, "监考员已撤销");
            self.repos.record_action(
                ActionLog::now(ActionType::ReleaseExaminer, actor)
                    .with_room(room_id)
                    .with_examiner(Some(previous)),
            );
        }
        Ok(room)
    }

    /// 条件提交：期望当前值仍为快照中的 examiner_id
    ///
    /// 写入失败时重新读取考场以给出具体冲突原因。
    pub(crate) fn commit_staffing(
        &self,
        placement: &RoomPlacement,
        examiner_id: i64,
    ) -> EngineResult<ExamRoomAssignment> {
        let room_id = placement.room.id;
        let expected = placement.room.examiner_id;
        if self
            .repos
            .room_repo
            .compare_and_set_examiner(room_id, expected, Some(examiner_id))?
        {
            let mut room = placement.room.clone();
            room.examiner_id = Some(examiner_id);
            return Ok(room);
        }

        let current = self.repos.room_repo.find_by_id(room_id)?;
        let err = match current {
            None => EngineError::not_found("ExamRoomAssignment", room_id),
            Some(room) if room.examiner_id == Some(examiner_id) => EngineError::Conflict(format!(
                "考场 {} 已由监考员 {} 监考",
                room_id, examiner_id
            )),
            Some(room) if room.examiner_id != expected => {
                EngineError::Conflict(format!("考场 {} 已被并发修改", room_id))
            }
            Some(_) => EngineError::Conflict(format!(
                "监考员 {} 在 {} 已有时间冲突的考场",
                examiner_id, placement.day
            )),
        };
        tracing::warn!(error = %err, "条件写入未生效");
        Err(err)
    }

    // ==========================================
    // 考场维护
    // ==========================================

    /// 在场次下新增考场
    #[instrument(skip(self), fields(sub_in_slot_id = %sub_in_slot_id))]
    pub fn add_room(
        &self,
        sub_in_slot_id: i64,
        room_ref: &str,
        course_id: i64,
        actor: &str,
    ) -> EngineResult<ExamRoomAssignment> {
        let room_ref = room_ref.trim();
        if room_ref.is_empty() {
            return Err(EngineError::InvalidInput("考场编号不能为空".to_string()));
        }
        self.repos
            .hierarchy_repo
            .find_sub_slot(sub_in_slot_id)?
            .ok_or_else(|| EngineError::not_found("SubInSlot", sub_in_slot_id))?;

        let room = self.repos.room_repo.create(sub_in_slot_id, room_ref, course_id)?;
        tracing::info!(room_id = room.id, room_ref = %room.room_ref, "考场已新增");
        self.repos.record_action(
            ActionLog::now(ActionType::AddRoom, actor)
                .with_room(room.id)
                .with_payload(json!({ "room_ref": room.room_ref, "course_id": course_id })),
        );
        Ok(room)
    }

    /// 删除考场
    ///
    /// # 返回
    /// - Err(Conflict): 已配置监考员且 force = false
    #[instrument(skip(self), fields(room_id = %room_id, force = %force))]
    pub fn remove_room(&self, room_id: i64, force: bool, actor: &str) -> EngineResult<ExamRoomAssignment> {
        let Some(room) = self.repos.room_repo.delete(room_id, force)? else {
            // 未删除：区分考场不存在与已配置监考员
            let current = self
                .repos
                .room_repo
                .find_by_id(room_id)?
                .ok_or_else(|| EngineError::not_found("ExamRoomAssignment", room_id))?;
            let err = match current.examiner_id {
                Some(examiner_id) => EngineError::Conflict(format!(
                    "考场 {} 已由监考员 {} 监考，需强制删除",
                    room_id, examiner_id
                )),
                None => EngineError::Conflict(format!("考场 {} 已被并发修改", room_id)),
            };
            tracing::warn!(error = %err, "考场删除未生效");
            return Err(err);
        };

        tracing::info!("考场已删除");
        self.repos.record_action(
            ActionLog::now(ActionType::RemoveRoom, actor)
                .with_room(room_id)
                .with_examiner(room.examiner_id)
                .with_payload(json!({ "room_ref": room.room_ref, "force": force })),
        );
        Ok(room)
    }

    // ==========================================
    // 候选查询
    // ==========================================

    /// 可指派到考场的监考员（按阶段负载升序，负载相同按 id 升序）
    ///
    /// 已持有该考场的监考员不在列表中。
    #[instrument(skip(self), fields(room_id = %room_id))]
    pub fn list_eligible_examiners(&self, room_id: i64) -> EngineResult<Vec<EligibleExaminer>> {
        let placement = self.eligibility.load_placement(room_id)?;
        let index = self.eligibility.availability_for(&placement)?;
        let loads = self.repos.room_repo.count_by_examiner_in_phase(placement.phase_id)?;

        let pool = self
            .repos
            .examiner_repo
            .find_by_ids(&index.available_on(placement.day))?;

        let mut eligible = Vec::new();
        for examiner in pool {
            if placement.room.examiner_id == Some(examiner.id) {
                continue;
            }
            if profile_rejection(self.eligibility.policy(), &examiner, placement.semester_id).is_some() {
                continue;
            }
            if self.eligibility.find_overlap(examiner.id, &placement)?.is_some() {
                continue;
            }
            let phase_load = loads.get(&examiner.id).copied().unwrap_or(0);
            eligible.push(EligibleExaminer { examiner, phase_load });
        }
        eligible.sort_by_key(|e| (e.phase_load, e.examiner.id));
        Ok(eligible)
    }
}
