// ==========================================
// 考务监考排班系统 - 排考层级维护 API
// ==========================================
// 职责: 学期 / 阶段 / 考试日 / 场次 / 监考员档案维护，可用日导入
// 门控: staff 及以上
// ==========================================

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use crate::api::auth::{require_role, ActorRole, CallerIdentity};
use crate::api::error::ApiResult;
use crate::api::validator::{require_id, require_text};
use crate::domain::examiner::{Examiner, NewExaminer};
use crate::domain::schedule::{ExamPhase, ExamSlot, SubInSlot};
use crate::domain::semester::{ExamType, Semester};
use crate::domain::types::{ExaminerStatus, Season};
use crate::engine::{HierarchyEngine, PhaseOverview};
use crate::importer::{AvailabilityImporter, ImportSummary};

// ==========================================
// SchedulingApi - 排考层级维护 API
// ==========================================
pub struct SchedulingApi {
    hierarchy: Arc<HierarchyEngine>,
    importer: Arc<AvailabilityImporter>,
}

impl SchedulingApi {
    pub fn new(hierarchy: Arc<HierarchyEngine>, importer: Arc<AvailabilityImporter>) -> Self {
        Self { hierarchy, importer }
    }

    // ==========================================
    // 学期
    // ==========================================

    pub fn create_semester(&self, caller: &CallerIdentity, season: Season, year: i32) -> ApiResult<Semester> {
        require_role(caller, ActorRole::Staff)?;
        Ok(self.hierarchy.create_semester(season, year)?)
    }

    pub fn provision_semester(&self, caller: &CallerIdentity, today: NaiveDate) -> ApiResult<Semester> {
        require_role(caller, ActorRole::Staff)?;
        Ok(self.hierarchy.provision_semester(today)?)
    }

    pub fn delete_semester(
        &self,
        caller: &CallerIdentity,
        semester_id: i64,
        today: NaiveDate,
    ) -> ApiResult<Semester> {
        require_role(caller, ActorRole::Staff)?;
        require_id("semester_id", semester_id)?;
        Ok(self.hierarchy.delete_semester(semester_id, today)?)
    }

    pub fn create_exam_type(
        &self,
        caller: &CallerIdentity,
        exam_type: &str,
        block: i32,
        des: i32,
    ) -> ApiResult<ExamType> {
        require_role(caller, ActorRole::Staff)?;
        let exam_type = require_text("exam_type", exam_type)?;
        Ok(self.hierarchy.create_exam_type(exam_type, block, des)?)
    }

    // ==========================================
    // 阶段 / 考试日 / 场次
    // ==========================================

    pub fn create_phase(
        &self,
        caller: &CallerIdentity,
        semester_id: i64,
        exam_type_id: i64,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> ApiResult<ExamPhase> {
        require_role(caller, ActorRole::Staff)?;
        require_id("semester_id", semester_id)?;
        require_id("exam_type_id", exam_type_id)?;
        Ok(self
            .hierarchy
            .create_phase(semester_id, exam_type_id, start_day, end_day)?)
    }

    pub fn update_phase_window(
        &self,
        caller: &CallerIdentity,
        phase_id: i64,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> ApiResult<ExamPhase> {
        require_role(caller, ActorRole::Staff)?;
        require_id("phase_id", phase_id)?;
        Ok(self.hierarchy.update_phase_window(phase_id, start_day, end_day)?)
    }

    pub fn delete_phase(&self, caller: &CallerIdentity, phase_id: i64) -> ApiResult<()> {
        require_role(caller, ActorRole::Staff)?;
        require_id("phase_id", phase_id)?;
        Ok(self.hierarchy.delete_phase(phase_id)?)
    }

    pub fn list_phases(&self, caller: &CallerIdentity) -> ApiResult<Vec<PhaseOverview>> {
        require_role(caller, ActorRole::Staff)?;
        Ok(self.hierarchy.list_phases()?)
    }

    pub fn create_slot(&self, caller: &CallerIdentity, phase_id: i64, day: NaiveDate) -> ApiResult<ExamSlot> {
        require_role(caller, ActorRole::Staff)?;
        require_id("phase_id", phase_id)?;
        Ok(self.hierarchy.create_slot(phase_id, day)?)
    }

    pub fn delete_slot(&self, caller: &CallerIdentity, slot_id: i64) -> ApiResult<()> {
        require_role(caller, ActorRole::Staff)?;
        require_id("slot_id", slot_id)?;
        Ok(self.hierarchy.delete_slot(slot_id)?)
    }

    pub fn create_sub_slot(
        &self,
        caller: &CallerIdentity,
        exam_slot_id: i64,
        window: Option<(NaiveTime, NaiveTime)>,
    ) -> ApiResult<SubInSlot> {
        require_role(caller, ActorRole::Staff)?;
        require_id("exam_slot_id", exam_slot_id)?;
        Ok(self.hierarchy.create_sub_slot(exam_slot_id, window)?)
    }

    pub fn delete_sub_slot(&self, caller: &CallerIdentity, sub_slot_id: i64) -> ApiResult<()> {
        require_role(caller, ActorRole::Staff)?;
        require_id("sub_slot_id", sub_slot_id)?;
        Ok(self.hierarchy.delete_sub_slot(sub_slot_id)?)
    }

    // ==========================================
    // 监考员档案 / 可用日
    // ==========================================

    pub fn create_examiner(&self, caller: &CallerIdentity, examiner: &NewExaminer) -> ApiResult<Examiner> {
        require_role(caller, ActorRole::Staff)?;
        require_id("semester_id", examiner.semester_id)?;
        Ok(self.hierarchy.create_examiner(examiner)?)
    }

    pub fn set_examiner_status(
        &self,
        caller: &CallerIdentity,
        examiner_id: i64,
        status: ExaminerStatus,
    ) -> ApiResult<()> {
        require_role(caller, ActorRole::Staff)?;
        require_id("examiner_id", examiner_id)?;
        Ok(self.hierarchy.set_examiner_status(examiner_id, status)?)
    }

    pub fn declare_availability(
        &self,
        caller: &CallerIdentity,
        examiner_id: i64,
        day: NaiveDate,
    ) -> ApiResult<bool> {
        require_role(caller, ActorRole::Staff)?;
        require_id("examiner_id", examiner_id)?;
        Ok(self.hierarchy.declare_availability(examiner_id, day)?)
    }

    pub fn import_availability(&self, caller: &CallerIdentity, file_path: &Path) -> ApiResult<ImportSummary> {
        require_role(caller, ActorRole::Staff)?;
        Ok(self.importer.import_file(file_path, &caller.subject)?)
    }
}
