// ==========================================
// 考务监考排班系统 - API层错误类型
// ==========================================
// 职责: 定义对外错误分类，转换引擎错误为调用方可理解的消息
// 约束: 存储细节不外泄（引擎层已转换为通用描述）
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("操作冲突: {0}")]
    Conflict(String),

    #[error("监考员不可用: {0}")]
    Unavailable(String),

    /// 对具体资源无权操作
    #[error("无权操作: {0}")]
    Forbidden(String),

    /// 身份无效或角色等级不足
    #[error("未授权: {0}")]
    Unauthorized(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 稳定的错误码（供传输层映射）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unavailable(_) => "UNAVAILABLE",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::Conflict(msg) => ApiError::Conflict(msg),
            EngineError::Unavailable { examiner_id, day } => {
                ApiError::Unavailable(format!("监考员 {} 在 {} 无可用登记", examiner_id, day))
            }
            EngineError::Forbidden(msg) => ApiError::Forbidden(msg),
            EngineError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            EngineError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

// 直接访问仓储的查询接口沿用引擎的转换规则
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        EngineError::from(err).into()
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件 {}", path)),
            ImportError::UnsupportedFormat(_)
            | ImportError::CsvParseError(_)
            | ImportError::MissingColumn(_) => ApiError::InvalidInput(err.to_string()),
            other => {
                tracing::error!(error = %other, "导入失败");
                ApiError::InternalError("导入失败".to_string())
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_engine_errors_keep_their_category() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let err: ApiError = EngineError::Unavailable { examiner_id: 3, day }.into();
        assert_eq!(err.code(), "UNAVAILABLE");
        assert!(err.to_string().contains("2024-05-02"));

        let err: ApiError = EngineError::not_found("ExamPhase", 9).into();
        assert_eq!(err, ApiError::NotFound("ExamPhase(id=9)不存在".to_string()));
    }
}
