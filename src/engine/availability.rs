// ==========================================
// 考务监考排班系统 - 可用日索引
// ==========================================
// 职责: 监考员 → 阶段窗口内可用日集合
// 输入: examiner_log_time 中 day ∈ [start_day, end_day] 的行
// 约束: 每次调用重新构建，不落库
// ==========================================

use crate::domain::examiner::ExaminerLogTime;
use crate::domain::schedule::ExamPhase;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{ExaminerRepository, ScheduleHierarchyRepository};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::instrument;

/// 单个监考员的可用登记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExaminerAvailability {
    /// 首次出现的学期归属
    pub semester_id: i64,
    pub days: BTreeSet<NaiveDate>,
}

// ==========================================
// AvailabilityIndex - 可用日索引
// ==========================================
#[derive(Debug, Clone)]
pub struct AvailabilityIndex {
    phase: ExamPhase,
    entries: BTreeMap<i64, ExaminerAvailability>,
}

impl AvailabilityIndex {
    /// 按阶段窗口构建索引
    ///
    /// # 返回
    /// - Err(NotFound): 阶段不存在
    #[instrument(skip(hierarchy_repo, examiner_repo), fields(phase_id = %phase_id))]
    pub fn build(
        hierarchy_repo: &ScheduleHierarchyRepository,
        examiner_repo: &ExaminerRepository,
        phase_id: i64,
    ) -> EngineResult<Self> {
        let phase = hierarchy_repo
            .find_phase(phase_id)?
            .ok_or_else(|| EngineError::not_found("ExamPhase", phase_id))?;
        let rows = examiner_repo.list_log_times_in_range(phase.start_day, phase.end_day)?;
        let index = Self::from_log_times(phase, &rows);
        tracing::debug!(examiners = index.len(), rows = rows.len(), "可用日索引已构建");
        Ok(index)
    }

    /// 由登记行直接构建（行按 id 顺序给出，窗口外的行被忽略）
    pub fn from_log_times(phase: ExamPhase, rows: &[ExaminerLogTime]) -> Self {
        let mut entries: BTreeMap<i64, ExaminerAvailability> = BTreeMap::new();
        for row in rows.iter().filter(|r| phase.contains(r.day)) {
            entries
                .entry(row.examiner_id)
                .or_insert_with(|| ExaminerAvailability {
                    semester_id: row.semester_id,
                    days: BTreeSet::new(),
                })
                .days
                .insert(row.day);
        }
        Self { phase, entries }
    }

    pub fn phase(&self) -> &ExamPhase {
        &self.phase
    }

    pub fn is_available(&self, examiner_id: i64, day: NaiveDate) -> bool {
        self.entries
            .get(&examiner_id)
            .map(|a| a.days.contains(&day))
            .unwrap_or(false)
    }

    pub fn get(&self, examiner_id: i64) -> Option<&ExaminerAvailability> {
        self.entries.get(&examiner_id)
    }

    /// 索引内全部监考员（升序）
    pub fn examiner_ids(&self) -> Vec<i64> {
        self.entries.keys().copied().collect()
    }

    /// 指定日期可用的监考员（升序）
    pub fn available_on(&self, day: NaiveDate) -> Vec<i64> {
        self.entries
            .iter()
            .filter(|(_, a)| a.days.contains(&day))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn phase() -> ExamPhase {
        ExamPhase {
            id: 1,
            semester_id: 1,
            exam_type_id: 1,
            start_day: d(1),
            end_day: d(3),
        }
    }

    fn row(id: i64, examiner_id: i64, semester_id: i64, day: NaiveDate) -> ExaminerLogTime {
        ExaminerLogTime {
            id,
            examiner_id,
            semester_id,
            day,
        }
    }

    #[test]
    fn test_groups_days_and_keeps_first_semester() {
        let rows = vec![
            row(1, 7, 1, d(2)),
            row(2, 7, 9, d(3)),
            row(3, 8, 1, d(2)),
            row(4, 9, 1, d(20)),
        ];
        let index = AvailabilityIndex::from_log_times(phase(), &rows);

        assert_eq!(index.examiner_ids(), vec![7, 8]);
        assert_eq!(index.get(7).unwrap().semester_id, 1);
        assert_eq!(index.get(7).unwrap().days.len(), 2);
        assert!(index.is_available(7, d(3)));
        assert!(!index.is_available(8, d(3)));
        // 窗口外登记不构成可用
        assert!(!index.is_available(9, d(20)));
        assert_eq!(index.available_on(d(2)), vec![7, 8]);
    }

    #[test]
    fn test_empty_rows_give_empty_index() {
        let index = AvailabilityIndex::from_log_times(phase(), &[]);
        assert!(index.is_empty());
        assert!(index.available_on(d(1)).is_empty());
    }
}
