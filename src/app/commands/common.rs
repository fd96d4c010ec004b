// ==========================================
// 考务监考排班系统 - 通用命令工具
// ==========================================
// 职责: 认证令牌后限时执行命令，并把 ApiError 包装为 ErrorResponse
// ==========================================

use crate::api::auth::CallerIdentity;
use crate::api::error::{ApiError, ApiResult};
use crate::app::state::AppState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

// ==========================================
// 公共工具：错误映射、认证、时限执行
// ==========================================

/// 错误响应（返回给传输层）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// 解析日期字符串
pub fn parse_date(date_str: &str) -> Result<NaiveDate, ErrorResponse> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
        ApiError::InvalidInput(format!("日期格式错误（应为YYYY-MM-DD）: {}", e)).into()
    })
}

/// 认证后在阻塞线程池中执行调用，整体受 deadline 约束
///
/// 超时后返回 InternalError；已开始的阻塞任务由存储层锁等待上限兜底结束。
pub(super) async fn run_command<T, F>(
    state: &AppState,
    token: &str,
    deadline: Duration,
    op: &'static str,
    f: F,
) -> Result<T, ErrorResponse>
where
    T: Send + 'static,
    F: FnOnce(CallerIdentity) -> ApiResult<T> + Send + 'static,
{
    let started = Instant::now();

    let caller = match tokio::time::timeout(deadline, state.authorizer.authorize(token)).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!(op, "认证超时");
            return Err(ApiError::InternalError("认证超时".to_string()).into());
        }
    };

    let remaining = deadline.saturating_sub(started.elapsed());
    match tokio::time::timeout(remaining, tokio::task::spawn_blocking(move || f(caller))).await {
        Ok(Ok(result)) => result.map_err(ErrorResponse::from),
        Ok(Err(join_err)) => {
            tracing::error!(op, error = %join_err, "命令执行任务异常");
            Err(ApiError::InternalError("命令执行失败".to_string()).into())
        }
        Err(_) => {
            tracing::warn!(op, deadline_ms = deadline.as_millis() as u64, "命令执行超时");
            Err(ApiError::InternalError(format!("操作超时（{}ms）", deadline.as_millis())).into())
        }
    }
}
