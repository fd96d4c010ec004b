// ==========================================
// 考务监考排班系统 - 排考层级维护
// ==========================================
// 职责: 学期 / 阶段 / 考试日 / 场次 / 监考员档案的校验式维护
// 规则:
// - 学期只能在其自然年内删除
// - 阶段窗口 start_day <= end_day；已有考试日必须仍落在窗口内
// - 考试日必须落在阶段窗口内
// - 场次时间窗 start < end
// 级联: 删除由存储层 ON DELETE CASCADE 完成
// ==========================================

use crate::domain::examiner::{Examiner, NewExaminer};
use crate::domain::schedule::{ExamPhase, ExamSlot, SubInSlot, TimeWindow};
use crate::domain::semester::{ExamType, Semester};
use crate::domain::types::{ExaminerStatus, Season};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::SchedulingRepositories;
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

/// 阶段概览（含学期与考试类型）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOverview {
    pub phase: ExamPhase,
    pub season: Season,
    pub year: i32,
    pub exam_type: String,
    pub block: i32,
    pub des: i32,
}

// ==========================================
// HierarchyEngine - 排考层级维护
// ==========================================
#[derive(Clone)]
pub struct HierarchyEngine {
    repos: SchedulingRepositories,
}

impl HierarchyEngine {
    pub fn new(repos: SchedulingRepositories) -> Self {
        Self { repos }
    }

    // ==========================================
    // 学期
    // ==========================================

    pub fn create_semester(&self, season: Season, year: i32) -> EngineResult<Semester> {
        Ok(self.repos.semester_repo.create(season, year)?)
    }

    /// 按当前日期开设学期（季节由月份推导）；已存在则直接返回
    #[instrument(skip(self), fields(today = %today))]
    pub fn provision_semester(&self, today: NaiveDate) -> EngineResult<Semester> {
        let season = Season::for_month(today.month())
            .ok_or_else(|| EngineError::InvalidInput(format!("无效月份: {}", today.month())))?;
        if let Some(existing) = self.repos.semester_repo.find_by_season_year(season, today.year())? {
            return Ok(existing);
        }
        let semester = self.repos.semester_repo.create(season, today.year())?;
        tracing::info!(semester_id = semester.id, season = %season, "学期已开设");
        Ok(semester)
    }

    /// 删除学期（级联）
    ///
    /// # 返回
    /// - Err(Conflict): 不在学期所属自然年内
    #[instrument(skip(self), fields(semester_id = %semester_id, today = %today))]
    pub fn delete_semester(&self, semester_id: i64, today: NaiveDate) -> EngineResult<Semester> {
        let semester = self
            .repos
            .semester_repo
            .find_by_id(semester_id)?
            .ok_or_else(|| EngineError::not_found("Semester", semester_id))?;
        if semester.year != today.year() {
            tracing::warn!(year = semester.year, "非本年度学期，拒绝删除");
            return Err(EngineError::Conflict(format!(
                "学期 {} 属于 {} 年，只能在当年删除",
                semester_id, semester.year
            )));
        }
        self.repos.semester_repo.delete(semester_id)?;
        tracing::info!("学期已删除");
        Ok(semester)
    }

    pub fn create_exam_type(&self, exam_type: &str, block: i32, des: i32) -> EngineResult<ExamType> {
        if exam_type.trim().is_empty() {
            return Err(EngineError::InvalidInput("考试类型代码不能为空".to_string()));
        }
        if des != 0 && des != 1 {
            return Err(EngineError::InvalidInput(format!("des 只能为 0 或 1: {}", des)));
        }
        Ok(self.repos.semester_repo.create_exam_type(exam_type.trim(), block, des)?)
    }

    // ==========================================
    // 考试阶段
    // ==========================================

    #[instrument(skip(self), fields(semester_id = %semester_id, exam_type_id = %exam_type_id))]
    pub fn create_phase(
        &self,
        semester_id: i64,
        exam_type_id: i64,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> EngineResult<ExamPhase> {
        if start_day > end_day {
            return Err(EngineError::InvalidInput(format!(
                "阶段开始日 {} 晚于结束日 {}",
                start_day, end_day
            )));
        }
        self.repos
            .semester_repo
            .find_by_id(semester_id)?
            .ok_or_else(|| EngineError::not_found("Semester", semester_id))?;
        self.repos
            .semester_repo
            .find_exam_type(exam_type_id)?
            .ok_or_else(|| EngineError::not_found("ExamType", exam_type_id))?;

        let phase = self
            .repos
            .hierarchy_repo
            .create_phase(semester_id, exam_type_id, start_day, end_day)?;
        tracing::info!(phase_id = phase.id, "考试阶段已创建");
        Ok(phase)
    }

    /// 调整阶段窗口，已有考试日必须仍在窗口内
    #[instrument(skip(self), fields(phase_id = %phase_id))]
    pub fn update_phase_window(
        &self,
        phase_id: i64,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> EngineResult<ExamPhase> {
        if start_day > end_day {
            return Err(EngineError::InvalidInput(format!(
                "阶段开始日 {} 晚于结束日 {}",
                start_day, end_day
            )));
        }
        let mut phase = self
            .repos
            .hierarchy_repo
            .find_phase(phase_id)?
            .ok_or_else(|| EngineError::not_found("ExamPhase", phase_id))?;

        if let Some((min_day, max_day)) = self.repos.hierarchy_repo.slot_day_bounds(phase_id)? {
            if min_day < start_day || max_day > end_day {
                return Err(EngineError::Conflict(format!(
                    "已有考试日 {}..{} 超出新窗口",
                    min_day, max_day
                )));
            }
        }

        self.repos
            .hierarchy_repo
            .update_phase_window(phase_id, start_day, end_day)?;
        phase.start_day = start_day;
        phase.end_day = end_day;
        Ok(phase)
    }

    /// 删除阶段（级联考试日、场次、考场）
    #[instrument(skip(self), fields(phase_id = %phase_id))]
    pub fn delete_phase(&self, phase_id: i64) -> EngineResult<()> {
        if self.repos.hierarchy_repo.delete_phase(phase_id)? == 0 {
            return Err(EngineError::not_found("ExamPhase", phase_id));
        }
        tracing::info!("考试阶段已删除");
        Ok(())
    }

    /// 全部阶段概览（按开始日期排序）
    pub fn list_phases(&self) -> EngineResult<Vec<PhaseOverview>> {
        let semesters: HashMap<i64, Semester> = self
            .repos
            .semester_repo
            .list_all()?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let exam_types: HashMap<i64, ExamType> = self
            .repos
            .semester_repo
            .list_exam_types()?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut result = Vec::new();
        for phase in self.repos.hierarchy_repo.list_phases()? {
            let (Some(semester), Some(exam_type)) =
                (semesters.get(&phase.semester_id), exam_types.get(&phase.exam_type_id))
            else {
                tracing::warn!(phase_id = phase.id, "阶段关联记录缺失，跳过");
                continue;
            };
            result.push(PhaseOverview {
                season: semester.season,
                year: semester.year,
                exam_type: exam_type.exam_type.clone(),
                block: exam_type.block,
                des: exam_type.des,
                phase,
            });
        }
        Ok(result)
    }

    // ==========================================
    // 考试日 / 场次
    // ==========================================

    #[instrument(skip(self), fields(phase_id = %phase_id, day = %day))]
    pub fn create_slot(&self, phase_id: i64, day: NaiveDate) -> EngineResult<ExamSlot> {
        let phase = self
            .repos
            .hierarchy_repo
            .find_phase(phase_id)?
            .ok_or_else(|| EngineError::not_found("ExamPhase", phase_id))?;
        if !phase.contains(day) {
            return Err(EngineError::InvalidInput(format!(
                "考试日 {} 不在阶段窗口 {}..{} 内",
                day, phase.start_day, phase.end_day
            )));
        }
        Ok(self.repos.hierarchy_repo.create_slot(phase_id, day)?)
    }

    pub fn delete_slot(&self, slot_id: i64) -> EngineResult<()> {
        if self.repos.hierarchy_repo.delete_slot(slot_id)? == 0 {
            return Err(EngineError::not_found("ExamSlot", slot_id));
        }
        Ok(())
    }

    /// 新增场次；window 为 None 表示不声明时间窗
    pub fn create_sub_slot(
        &self,
        exam_slot_id: i64,
        window: Option<(NaiveTime, NaiveTime)>,
    ) -> EngineResult<SubInSlot> {
        let window = match window {
            Some((start, end)) => Some(TimeWindow::new(start, end).ok_or_else(|| {
                EngineError::InvalidInput(format!("场次开始 {} 必须早于结束 {}", start, end))
            })?),
            None => None,
        };
        self.repos
            .hierarchy_repo
            .find_slot(exam_slot_id)?
            .ok_or_else(|| EngineError::not_found("ExamSlot", exam_slot_id))?;
        Ok(self.repos.hierarchy_repo.create_sub_slot(exam_slot_id, window)?)
    }

    pub fn delete_sub_slot(&self, sub_slot_id: i64) -> EngineResult<()> {
        if self.repos.hierarchy_repo.delete_sub_slot(sub_slot_id)? == 0 {
            return Err(EngineError::not_found("SubInSlot", sub_slot_id));
        }
        Ok(())
    }

    // ==========================================
    // 监考员档案
    // ==========================================

    #[instrument(skip(self, examiner), fields(semester_id = %examiner.semester_id))]
    pub fn create_examiner(&self, examiner: &NewExaminer) -> EngineResult<Examiner> {
        if !examiner.email.contains('@') {
            return Err(EngineError::InvalidInput(format!("邮箱格式无效: {}", examiner.email)));
        }
        if examiner.name.trim().is_empty() {
            return Err(EngineError::InvalidInput("监考员姓名不能为空".to_string()));
        }
        self.repos
            .semester_repo
            .find_by_id(examiner.semester_id)?
            .ok_or_else(|| EngineError::not_found("Semester", examiner.semester_id))?;
        Ok(self.repos.examiner_repo.create(examiner)?)
    }

    pub fn set_examiner_status(&self, examiner_id: i64, status: ExaminerStatus) -> EngineResult<()> {
        if self.repos.examiner_repo.update_status(examiner_id, status)? == 0 {
            return Err(EngineError::not_found("Examiner", examiner_id));
        }
        Ok(())
    }

    /// 登记单日可用（重复登记返回 false）
    pub fn declare_availability(&self, examiner_id: i64, day: NaiveDate) -> EngineResult<bool> {
        let examiner = self
            .repos
            .examiner_repo
            .find_by_id(examiner_id)?
            .ok_or_else(|| EngineError::not_found("Examiner", examiner_id))?;
        Ok(self
            .repos
            .examiner_repo
            .add_log_time(examiner.id, examiner.semester_id, day)?)
    }
}
