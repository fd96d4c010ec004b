// ==========================================
// 考务监考排班系统 - 学期与考试类型领域模型
// ==========================================
// 对齐: semester / exam_type 表
// ==========================================

use crate::domain::types::Season;
use serde::{Deserialize, Serialize};

// ==========================================
// Semester - 学期
// ==========================================
// 层级根节点；删除时级联删除考试阶段及其下属记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
    pub id: i64,
    pub season: Season,
    pub year: i32,
}

// ==========================================
// ExamType - 考试类型（静态参考数据）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamType {
    pub id: i64,
    pub exam_type: String, // 课程类别代码 (FE / PE ...)
    pub block: i32,        // 考试时长档位 (10 / 5)
    pub des: i32,          // 0=正常, 1=补考
}

impl ExamType {
    /// 是否为补考类型
    pub fn is_make_up(&self) -> bool {
        self.des == 1
    }
}
