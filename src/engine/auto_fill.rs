// ==========================================
// 考务监考排班系统 - 自动补位引擎
// ==========================================
// 职责: 为考试日下所有未配置监考员的考场自动指派
// 顺序: 考场按 (场次 id, 考场 id)；候选按 (阶段负载, 监考员 id)
// 约束:
// - 同一轮补位中已用过的监考员不再作为候选
// - 每个考场独立提交（条件更新），不持有跨考场的锁
// - 单个考场出错记录到汇总中（同时计入 unstaffed），整批继续
// ==========================================

use crate::config::AssignmentPolicy;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::examiner::Examiner;
use crate::domain::schedule::{ExamRoomAssignment, RoomPlacement};
use crate::engine::assignment::AssignmentEngine;
use crate::engine::availability::AvailabilityIndex;
use crate::engine::eligibility::profile_rejection;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::SchedulingRepositories;
use crate::perf::PerfGuard;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// 单个考场补位失败记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFillError {
    pub room_id: i64,
    pub message: String,
}

/// 补位汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFillSummary {
    pub exam_slot_id: i64,
    /// 本轮新指派的考场数
    pub assigned: usize,
    /// 本轮结束后仍未配置的考场数（无合格候选，或补位出错并记入 errors）
    pub unstaffed: usize,
    /// 开始时已配置或补位过程中被并发占用的考场数
    pub skipped: usize,
    pub assignments: Vec<ExamRoomAssignment>,
    pub errors: Vec<AutoFillError>,
}

/// 单个考场的补位结果
enum RoomFill {
    Assigned(ExamRoomAssignment),
    NoCandidate,
    ClaimedElsewhere,
}

// ==========================================
// AutoFillEngine - 自动补位引擎
// ==========================================
#[derive(Clone)]
pub struct AutoFillEngine {
    repos: SchedulingRepositories,
    assignment: AssignmentEngine,
}

impl AutoFillEngine {
    pub fn new(repos: SchedulingRepositories, policy: AssignmentPolicy) -> Self {
        let assignment = AssignmentEngine::new(repos.clone(), policy);
        Self { repos, assignment }
    }

    /// 自动补位
    ///
    /// # 返回
    /// - Err(NotFound): 考试日不存在（仅顶层读取失败会使整次调用失败）
    #[instrument(skip(self), fields(exam_slot_id = %exam_slot_id))]
    pub fn fill_slot(&self, exam_slot_id: i64, actor: &str) -> EngineResult<AutoFillSummary> {
        let _perf = PerfGuard::new("auto_fill_slot");

        let slot = self
            .repos
            .hierarchy_repo
            .find_slot(exam_slot_id)?
            .ok_or_else(|| EngineError::not_found("ExamSlot", exam_slot_id))?;
        let phase = self
            .repos
            .hierarchy_repo
            .find_phase(slot.phase_id)?
            .ok_or_else(|| EngineError::not_found("ExamPhase", slot.phase_id))?;

        let placements = self.repos.room_repo.list_placements_by_slot(exam_slot_id)?;
        let index = AvailabilityIndex::build(
            &self.repos.hierarchy_repo,
            &self.repos.examiner_repo,
            phase.id,
        )?;
        let mut loads = self.repos.room_repo.count_by_examiner_in_phase(phase.id)?;

        let policy = self.assignment.eligibility().policy();
        let pool: Vec<Examiner> = self
            .repos
            .examiner_repo
            .find_by_ids(&index.available_on(slot.day))?
            .into_iter()
            .filter(|e| profile_rejection(policy, e, phase.semester_id).is_none())
            .collect();

        let mut summary = AutoFillSummary {
            exam_slot_id,
            ..AutoFillSummary::default()
        };
        let mut used: HashSet<i64> = HashSet::new();

        for placement in &placements {
            if placement.room.is_staffed() {
                summary.skipped += 1;
                continue;
            }
            match self.fill_room(placement, &pool, &loads, &used) {
                Ok(RoomFill::Assigned(room)) => {
                    if let Some(examiner_id) = room.examiner_id {
                        used.insert(examiner_id);
                        *loads.entry(examiner_id).or_insert(0) += 1;
                    }
                    summary.assigned += 1;
                    summary.assignments.push(room);
                }
                Ok(RoomFill::NoCandidate) => summary.unstaffed += 1,
                Ok(RoomFill::ClaimedElsewhere) => summary.skipped += 1,
                Err(e) => {
                    tracing::warn!(room_id = placement.room.id, error = %e, "考场补位失败，继续处理");
                    summary.unstaffed += 1;
                    summary.errors.push(AutoFillError {
                        room_id: placement.room.id,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            assigned = summary.assigned,
            unstaffed = summary.unstaffed,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "自动补位完成"
        );
        if summary.assigned > 0 {
            self.repos.record_action(
                ActionLog::now(ActionType::AutoFill, actor).with_payload(json!({
                    "exam_slot_id": exam_slot_id,
                    "assigned_rooms": summary
                        .assignments
                        .iter()
                        .map(|r| json!({ "room_id": r.id, "examiner_id": r.examiner_id }))
                        .collect::<Vec<_>>(),
                    "unstaffed": summary.unstaffed,
                })),
            );
        }
        Ok(summary)
    }

    /// 为单个考场依次尝试候选，条件写入冲突时换下一位
    fn fill_room(
        &self,
        placement: &RoomPlacement,
        pool: &[Examiner],
        loads: &HashMap<i64, usize>,
        used: &HashSet<i64>,
    ) -> EngineResult<RoomFill> {
        let mut candidates: Vec<&Examiner> = pool.iter().filter(|e| !used.contains(&e.id)).collect();
        candidates.sort_by_key(|e| (loads.get(&e.id).copied().unwrap_or(0), e.id));

        for candidate in candidates {
            if self
                .assignment
                .eligibility()
                .find_overlap(candidate.id, placement)?
                .is_some()
            {
                continue;
            }
            match self.assignment.commit_staffing(placement, candidate.id) {
                Ok(room) => {
                    tracing::debug!(room_id = room.id, examiner_id = candidate.id, "考场已补位");
                    return Ok(RoomFill::Assigned(room));
                }
                Err(EngineError::Conflict(_)) => {
                    // 考场已被他人占用则放弃该考场，否则换下一位候选
                    let current = self.repos.room_repo.find_by_id(placement.room.id)?;
                    match current {
                        None => return Err(EngineError::not_found("ExamRoomAssignment", placement.room.id)),
                        Some(room) if room.is_staffed() => return Ok(RoomFill::ClaimedElsewhere),
                        Some(_) => continue,
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(RoomFill::NoCandidate)
    }
}
