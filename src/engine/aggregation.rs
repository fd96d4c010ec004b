// ==========================================
// 考务监考排班系统 - 阶段统计引擎
// ==========================================
// 职责: 阶段维度的驾驶舱统计
// - 去重监考员（按角色）
// - 已配置考场数 / 考试日利用率
// - 有可用登记的监考员
// - 负载 Top-N（并列全部纳入）
// 约束: 每次调用重新遍历当前记录，不使用缓存计数
// ==========================================

use crate::config::AssignmentPolicy;
use crate::domain::examiner::Examiner;
use crate::domain::types::ExaminerRole;
use crate::engine::availability::AvailabilityIndex;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::SchedulingRepositories;
use crate::perf::PerfGuard;
use crate::repository::PhaseSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::instrument;

/// 去重监考员统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistinctExaminers {
    /// 阶段下没有考试日
    NoSlots,
    /// 有考试日但没有任何考场配置了监考员
    NoAssignedExaminers,
    Examiners {
        total: usize,
        by_role: BTreeMap<ExaminerRole, usize>,
        /// 按首次出现顺序
        examiners: Vec<Examiner>,
    },
}

impl DistinctExaminers {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DistinctExaminers::NoSlots => Some("该阶段尚未安排考试日"),
            DistinctExaminers::NoAssignedExaminers => Some("该阶段尚无监考员"),
            DistinctExaminers::Examiners { .. } => None,
        }
    }
}

/// 有可用登记的监考员统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailableExaminers {
    NoExaminers,
    Examiners { total: usize, examiner_ids: Vec<i64> },
}

/// 单个考试日的考场使用情况
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUsage {
    pub exam_slot_id: i64,
    pub day: NaiveDate,
    pub total_rooms: usize,
    pub staffed_rooms: usize,
}

/// 阶段考场利用率
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUtilization {
    pub phase_id: i64,
    pub slot_count: usize,
    pub total_rooms: usize,
    pub staffed_rooms: usize,
    pub unstaffed_rooms: usize,
    pub per_slot: Vec<SlotUsage>,
}

/// 监考员负载
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExaminerLoad {
    pub examiner_id: i64,
    pub assignment_count: usize,
}

/// 并列纳入的 Top-N：取前 top_n 个不同计数值，计数落在其中的监考员全部返回
///
/// 结果按计数降序、id 升序；top_n = 0 按 1 处理。
pub fn tie_inclusive_top(counts: &HashMap<i64, usize>, top_n: usize) -> Vec<ExaminerLoad> {
    let top_n = top_n.max(1);
    let distinct: BTreeSet<usize> = counts.values().copied().collect();
    let kept: HashSet<usize> = distinct.into_iter().rev().take(top_n).collect();

    let mut result: Vec<ExaminerLoad> = counts
        .iter()
        .filter(|(_, c)| kept.contains(c))
        .map(|(id, c)| ExaminerLoad {
            examiner_id: *id,
            assignment_count: *c,
        })
        .collect();
    result.sort_by(|a, b| {
        b.assignment_count
            .cmp(&a.assignment_count)
            .then(a.examiner_id.cmp(&b.examiner_id))
    });
    result
}

// ==========================================
// AggregationEngine - 阶段统计引擎
// ==========================================
#[derive(Clone)]
pub struct AggregationEngine {
    repos: SchedulingRepositories,
    policy: AssignmentPolicy,
}

impl AggregationEngine {
    pub fn new(repos: SchedulingRepositories, policy: AssignmentPolicy) -> Self {
        Self { repos, policy }
    }

    /// 阶段存在性校验后读取快照
    fn snapshot(&self, phase_id: i64) -> EngineResult<PhaseSnapshot> {
        self.repos
            .hierarchy_repo
            .find_phase(phase_id)?
            .ok_or_else(|| EngineError::not_found("ExamPhase", phase_id))?;
        Ok(self.repos.room_repo.load_phase_snapshot(phase_id)?)
    }

    #[instrument(skip(self), fields(phase_id = %phase_id))]
    pub fn count_distinct_examiners(&self, phase_id: i64) -> EngineResult<DistinctExaminers> {
        let _perf = PerfGuard::new("count_distinct_examiners");
        let snapshot = self.snapshot(phase_id)?;
        if snapshot.slots.is_empty() {
            return Ok(DistinctExaminers::NoSlots);
        }

        let mut seen = HashSet::new();
        let ordered: Vec<i64> = snapshot
            .placements
            .iter()
            .filter_map(|p| p.room.examiner_id)
            .filter(|id| seen.insert(*id))
            .collect();
        if ordered.is_empty() {
            return Ok(DistinctExaminers::NoAssignedExaminers);
        }

        let mut by_id: HashMap<i64, Examiner> = self
            .repos
            .examiner_repo
            .find_by_ids(&ordered)?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let mut examiners = Vec::with_capacity(ordered.len());
        let mut by_role: BTreeMap<ExaminerRole, usize> = BTreeMap::new();
        for id in ordered {
            match by_id.remove(&id) {
                Some(examiner) => {
                    *by_role.entry(examiner.role).or_insert(0) += 1;
                    examiners.push(examiner);
                }
                // 单条缺失不影响整体统计
                None => tracing::warn!(examiner_id = id, "考场引用的监考员记录缺失"),
            }
        }

        Ok(DistinctExaminers::Examiners {
            total: examiners.len(),
            by_role,
            examiners,
        })
    }

    /// 已配置监考员的考场数（无考试日返回 0）
    #[instrument(skip(self), fields(phase_id = %phase_id))]
    pub fn count_staffed_rooms(&self, phase_id: i64) -> EngineResult<usize> {
        let _perf = PerfGuard::new("count_staffed_rooms");
        let snapshot = self.snapshot(phase_id)?;
        Ok(snapshot.placements.iter().filter(|p| p.room.is_staffed()).count())
    }

    #[instrument(skip(self), fields(phase_id = %phase_id))]
    pub fn slot_utilization(&self, phase_id: i64) -> EngineResult<SlotUtilization> {
        let _perf = PerfGuard::new("slot_utilization");
        let snapshot = self.snapshot(phase_id)?;

        let mut per_slot: Vec<SlotUsage> = snapshot
            .slots
            .iter()
            .map(|s| SlotUsage {
                exam_slot_id: s.id,
                day: s.day,
                total_rooms: 0,
                staffed_rooms: 0,
            })
            .collect();
        let position: HashMap<i64, usize> = per_slot
            .iter()
            .enumerate()
            .map(|(i, s)| (s.exam_slot_id, i))
            .collect();

        for placement in &snapshot.placements {
            if let Some(&i) = position.get(&placement.exam_slot_id) {
                per_slot[i].total_rooms += 1;
                if placement.room.is_staffed() {
                    per_slot[i].staffed_rooms += 1;
                }
            }
        }

        let total_rooms: usize = per_slot.iter().map(|s| s.total_rooms).sum();
        let staffed_rooms: usize = per_slot.iter().map(|s| s.staffed_rooms).sum();
        Ok(SlotUtilization {
            phase_id,
            slot_count: per_slot.len(),
            total_rooms,
            staffed_rooms,
            unstaffed_rooms: total_rooms - staffed_rooms,
            per_slot,
        })
    }

    /// 阶段窗口内有可用登记的监考员
    #[instrument(skip(self), fields(phase_id = %phase_id))]
    pub fn count_available_examiners(&self, phase_id: i64) -> EngineResult<AvailableExaminers> {
        let _perf = PerfGuard::new("count_available_examiners");
        let index = AvailabilityIndex::build(
            &self.repos.hierarchy_repo,
            &self.repos.examiner_repo,
            phase_id,
        )?;
        if index.is_empty() {
            return Ok(AvailableExaminers::NoExaminers);
        }
        let examiner_ids = index.examiner_ids();
        Ok(AvailableExaminers::Examiners {
            total: examiner_ids.len(),
            examiner_ids,
        })
    }

    /// 负载 Top-N（并列纳入）
    ///
    /// # 参数
    /// - `top_n`: None 时使用策略默认值
    ///
    /// # 返回
    /// - Err(NotFound): 阶段不存在，或阶段内没有任何监考员持有考场
    #[instrument(skip(self), fields(phase_id = %phase_id, top_n = ?top_n))]
    pub fn top_examiners_by_load(
        &self,
        phase_id: i64,
        top_n: Option<usize>,
    ) -> EngineResult<Vec<ExaminerLoad>> {
        let _perf = PerfGuard::new("top_examiners_by_load");
        let snapshot = self.snapshot(phase_id)?;

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for examiner_id in snapshot.placements.iter().filter_map(|p| p.room.examiner_id) {
            *counts.entry(examiner_id).or_insert(0) += 1;
        }
        if counts.is_empty() {
            return Err(EngineError::not_found("ExaminerAssignment", format!("phase {}", phase_id)));
        }

        let top_n = top_n.unwrap_or(self.policy.default_top_n);
        Ok(tie_inclusive_top(&counts, top_n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(i64, usize)]) -> HashMap<i64, usize> {
        pairs.iter().copied().collect()
    }

    fn ids(loads: &[ExaminerLoad]) -> Vec<i64> {
        loads.iter().map(|l| l.examiner_id).collect()
    }

    #[test]
    fn test_top_tier_includes_ties() {
        // A(3), B(3), C(1) → {A, B}
        let loads = tie_inclusive_top(&counts(&[(3, 1), (1, 3), (2, 3)]), 1);
        assert_eq!(ids(&loads), vec![1, 2]);
    }

    #[test]
    fn test_top_n_counts_distinct_values() {
        let c = counts(&[(1, 5), (2, 4), (3, 4), (4, 2), (5, 1)]);
        assert_eq!(ids(&tie_inclusive_top(&c, 2)), vec![1, 2, 3]);
        // 超出不同计数值个数时全部返回
        assert_eq!(tie_inclusive_top(&c, 10).len(), 5);
    }

    #[test]
    fn test_zero_top_n_behaves_as_one() {
        let c = counts(&[(1, 2), (2, 1)]);
        assert_eq!(tie_inclusive_top(&c, 0), tie_inclusive_top(&c, 1));
    }
}
