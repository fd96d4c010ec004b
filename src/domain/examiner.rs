// ==========================================
// 考务监考排班系统 - 监考员领域模型
// ==========================================
// 对齐: examiner / examiner_log_time 表
// 说明: 监考员按学期建档，每学期重新登记
// ==========================================

use crate::domain::types::{ExaminerRole, ExaminerStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Examiner - 监考员
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Examiner {
    pub id: i64,
    pub semester_id: i64,
    pub email: String,
    pub name: String,
    pub role: ExaminerRole,
    pub status: ExaminerStatus,
}

// ==========================================
// ExaminerLogTime - 监考员可用日登记
// ==========================================
// 每个 (监考员, 学期, 日期) 一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExaminerLogTime {
    pub id: i64,
    pub examiner_id: i64,
    pub semester_id: i64,
    pub day: NaiveDate,
}

/// 新建监考员（无 id）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExaminer {
    pub semester_id: i64,
    pub email: String,
    pub name: String,
    pub role: ExaminerRole,
    pub status: ExaminerStatus,
}
