// ==========================================
// 考务监考排班系统 - 操作日志领域模型
// ==========================================
// 用途: 监考分配写操作的审计追踪
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,             // 日志ID (uuid v4)
    pub action_type: String,           // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,      // 操作时间戳
    pub actor: String,                 // 操作人
    pub room_assignment_id: Option<i64>,
    pub examiner_id: Option<i64>,
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

impl ActionLog {
    /// 以当前时间构造一条日志
    pub fn now(action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            room_assignment_id: None,
            examiner_id: None,
            payload_json: None,
            detail: None,
        }
    }

    pub fn with_room(mut self, room_assignment_id: i64) -> Self {
        self.room_assignment_id = Some(room_assignment_id);
        self
    }

    pub fn with_examiner(mut self, examiner_id: Option<i64>) -> Self {
        self.examiner_id = examiner_id;
        self
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    AssignExaminer,   // 教务指派
    ReleaseExaminer,  // 教务撤销
    AutoFill,         // 自动补位
    Register,         // 监考员自助报名
    Unregister,       // 监考员取消报名
    AddRoom,          // 新增考场
    RemoveRoom,       // 删除考场
    ImportAvailability, // 导入可用日
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionType::AssignExaminer => "ASSIGN_EXAMINER",
            ActionType::ReleaseExaminer => "RELEASE_EXAMINER",
            ActionType::AutoFill => "AUTO_FILL",
            ActionType::Register => "REGISTER",
            ActionType::Unregister => "UNREGISTER",
            ActionType::AddRoom => "ADD_ROOM",
            ActionType::RemoveRoom => "REMOVE_ROOM",
            ActionType::ImportAvailability => "IMPORT_AVAILABILITY",
        };
        write!(f, "{}", s)
    }
}
