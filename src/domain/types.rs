// ==========================================
// 考务监考排班系统 - 领域类型定义
// ==========================================
// 职责: 学期季节、监考员角色、监考员状态等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 学期季节 (Season)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Season {
    Spring, // 1-4 月
    Summer, // 5-8 月
    Fall,   // 9-12 月
}

impl Season {
    /// 按月份推导学期季节
    ///
    /// # 返回
    /// - Some(Season): month ∈ [1, 12]
    /// - None: 非法月份
    pub fn for_month(month: u32) -> Option<Self> {
        match month {
            1..=4 => Some(Season::Spring),
            5..=8 => Some(Season::Summer),
            9..=12 => Some(Season::Fall),
            _ => None,
        }
    }

    /// 数据库存储字符串
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Season::Spring => "SPRING",
            Season::Summer => "SUMMER",
            Season::Fall => "FALL",
        }
    }

    /// 从数据库字符串解析（大小写不敏感）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SPRING" => Some(Season::Spring),
            "SUMMER" => Some(Season::Summer),
            "FALL" => Some(Season::Fall),
            _ => None,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

// ==========================================
// 监考员角色 (typeExaminer)
// ==========================================
// 数据库存储为整数: 0=讲师, 1=教务员, 2=志愿者
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExaminerRole {
    Lecturer,
    Staff,
    Volunteer,
}

impl ExaminerRole {
    pub fn code(&self) -> i32 {
        match self {
            ExaminerRole::Lecturer => 0,
            ExaminerRole::Staff => 1,
            ExaminerRole::Volunteer => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExaminerRole::Lecturer),
            1 => Some(ExaminerRole::Staff),
            2 => Some(ExaminerRole::Volunteer),
            _ => None,
        }
    }

    /// 配置项中的角色名（小写）
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lecturer" => Some(ExaminerRole::Lecturer),
            "staff" => Some(ExaminerRole::Staff),
            "volunteer" => Some(ExaminerRole::Volunteer),
            _ => None,
        }
    }

    pub fn all() -> [ExaminerRole; 3] {
        [
            ExaminerRole::Lecturer,
            ExaminerRole::Staff,
            ExaminerRole::Volunteer,
        ]
    }
}

impl fmt::Display for ExaminerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExaminerRole::Lecturer => write!(f, "lecturer"),
            ExaminerRole::Staff => write!(f, "staff"),
            ExaminerRole::Volunteer => write!(f, "volunteer"),
        }
    }
}

// ==========================================
// 监考员状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExaminerStatus {
    Inactive, // 0
    Active,   // 1
}

impl ExaminerStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExaminerStatus::Inactive => 0,
            ExaminerStatus::Active => 1,
        }
    }

    /// 非 0 均视为在岗
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            ExaminerStatus::Inactive
        } else {
            ExaminerStatus::Active
        }
    }
}

impl fmt::Display for ExaminerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExaminerStatus::Inactive => write!(f, "INACTIVE"),
            ExaminerStatus::Active => write!(f, "ACTIVE"),
        }
    }
}
