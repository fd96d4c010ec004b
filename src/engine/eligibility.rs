// ==========================================
// 考务监考排班系统 - 监考资格判定
// ==========================================
// 职责: 指派 / 报名 / 自动补位共用的资格检查
// 检查顺序:
//   (2) 学期归属 + 在岗状态 + 角色策略 → Conflict
//   (3) 考试日可用登记 → Unavailable
//   (4) 同日时间冲突 → Conflict
// 红线: 只读判定，不写库
// ==========================================

use crate::config::AssignmentPolicy;
use crate::domain::examiner::Examiner;
use crate::domain::schedule::RoomPlacement;
use crate::domain::types::ExaminerStatus;
use crate::engine::availability::AvailabilityIndex;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::SchedulingRepositories;

/// 档案层面（检查 2）不合格原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileRejection {
    WrongSemester,
    Inactive,
    RoleNotAllowed,
}

impl ProfileRejection {
    pub fn message(&self, examiner: &Examiner) -> String {
        match self {
            ProfileRejection::WrongSemester => {
                format!("监考员 {} 不属于该阶段所在学期", examiner.id)
            }
            ProfileRejection::Inactive => format!("监考员 {} 未在岗", examiner.id),
            ProfileRejection::RoleNotAllowed => {
                format!("监考员角色 {} 不允许承担监考", examiner.role)
            }
        }
    }
}

/// 检查 2：档案资格（纯函数）
pub fn profile_rejection(
    policy: &AssignmentPolicy,
    examiner: &Examiner,
    semester_id: i64,
) -> Option<ProfileRejection> {
    if examiner.semester_id != semester_id {
        return Some(ProfileRejection::WrongSemester);
    }
    if policy.require_active && examiner.status != ExaminerStatus::Active {
        return Some(ProfileRejection::Inactive);
    }
    if !policy.allows_role(examiner.role) {
        return Some(ProfileRejection::RoleNotAllowed);
    }
    None
}

// ==========================================
// StaffingEligibility - 资格检查器
// ==========================================
#[derive(Clone)]
pub struct StaffingEligibility {
    repos: SchedulingRepositories,
    policy: AssignmentPolicy,
}

impl StaffingEligibility {
    pub fn new(repos: SchedulingRepositories, policy: AssignmentPolicy) -> Self {
        Self { repos, policy }
    }

    pub fn policy(&self) -> &AssignmentPolicy {
        &self.policy
    }

    /// 读取考场定位；不存在返回 NotFound
    pub fn load_placement(&self, room_id: i64) -> EngineResult<RoomPlacement> {
        self.repos
            .room_repo
            .find_placement(room_id)?
            .ok_or_else(|| EngineError::not_found("ExamRoomAssignment", room_id))
    }

    /// 读取监考员；不存在返回 NotFound
    pub fn load_examiner(&self, examiner_id: i64) -> EngineResult<Examiner> {
        self.repos
            .examiner_repo
            .find_by_id(examiner_id)?
            .ok_or_else(|| EngineError::not_found("Examiner", examiner_id))
    }

    /// 构建考场所在阶段的可用日索引
    pub fn availability_for(&self, placement: &RoomPlacement) -> EngineResult<AvailabilityIndex> {
        AvailabilityIndex::build(
            &self.repos.hierarchy_repo,
            &self.repos.examiner_repo,
            placement.phase_id,
        )
    }

    pub fn check_profile(&self, examiner: &Examiner, placement: &RoomPlacement) -> EngineResult<()> {
        match profile_rejection(&self.policy, examiner, placement.semester_id) {
            Some(reason) => {
                tracing::warn!(examiner_id = examiner.id, ?reason, "监考员档案不满足条件");
                Err(EngineError::Conflict(reason.message(examiner)))
            }
            None => Ok(()),
        }
    }

    pub fn check_available(
        &self,
        index: &AvailabilityIndex,
        examiner_id: i64,
        placement: &RoomPlacement,
    ) -> EngineResult<()> {
        if index.is_available(examiner_id, placement.day) {
            Ok(())
        } else {
            tracing::warn!(examiner_id, day = %placement.day, "监考员当日无可用登记");
            Err(EngineError::Unavailable {
                examiner_id,
                day: placement.day,
            })
        }
    }

    /// 检查 4：同日已持有考场是否与目标冲突（目标考场自身除外）
    pub fn find_overlap(
        &self,
        examiner_id: i64,
        placement: &RoomPlacement,
    ) -> EngineResult<Option<RoomPlacement>> {
        let held = self
            .repos
            .room_repo
            .list_placements_for_examiner_on_day(examiner_id, placement.day)?;
        Ok(held
            .into_iter()
            .find(|p| p.room.id != placement.room.id && p.conflicts_with(placement)))
    }

    pub fn check_no_overlap(&self, examiner_id: i64, placement: &RoomPlacement) -> EngineResult<()> {
        match self.find_overlap(examiner_id, placement)? {
            Some(held) => {
                tracing::warn!(
                    examiner_id,
                    held_room_id = held.room.id,
                    target_room_id = placement.room.id,
                    "同日时间冲突"
                );
                Err(EngineError::Conflict(format!(
                    "监考员 {} 已在 {} 持有时间冲突的考场 {}",
                    examiner_id, held.day, held.room.id
                )))
            }
            None => Ok(()),
        }
    }

    /// 依次执行检查 2、3、4
    pub fn check_all(
        &self,
        examiner: &Examiner,
        placement: &RoomPlacement,
        index: &AvailabilityIndex,
    ) -> EngineResult<()> {
        self.check_profile(examiner, placement)?;
        self.check_available(index, examiner.id, placement)?;
        self.check_no_overlap(examiner.id, placement)
    }
}
