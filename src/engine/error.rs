// ==========================================
// 考务监考排班系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 存储失败在引擎边界记录日志，对外只暴露通用描述
// ==========================================

use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: String, id: String },

    /// 约束冲突：重复排班、考场已被占用、前置记录缺失
    #[error("冲突: {0}")]
    Conflict(String),

    #[error("监考员 {examiner_id} 在 {day} 无可用登记")]
    Unavailable { examiner_id: i64, day: NaiveDate },

    /// 调用方对具体资源无权操作（区别于角色门控）
    #[error("无权操作: {0}")]
    Forbidden(String),

    #[error("参数无效: {0}")]
    InvalidInput(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            RepositoryError::UniqueConstraintViolation(msg) => {
                tracing::warn!(detail = %msg, "唯一约束冲突");
                EngineError::Conflict("记录已存在".to_string())
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                tracing::warn!(detail = %msg, "外键约束冲突");
                EngineError::Conflict("关联记录不存在".to_string())
            }
            other => {
                tracing::error!(error = %other, "存储访问失败");
                EngineError::Internal("存储访问失败".to_string())
            }
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
