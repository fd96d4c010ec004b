// ==========================================
// 考务监考排班系统 - 请求参数校验
// ==========================================
// 职责: API 入口处的标识符与数值校验
// ==========================================

use crate::api::error::{ApiError, ApiResult};

/// 标识符必须为正整数
pub fn require_id(field: &str, id: i64) -> ApiResult<i64> {
    if id <= 0 {
        return Err(ApiError::InvalidInput(format!("{} 必须为正整数: {}", field, id)));
    }
    Ok(id)
}

/// 非空文本（去除首尾空白后）
pub fn require_text<'a>(field: &str, value: &'a str) -> ApiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{} 不能为空", field)));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id() {
        assert_eq!(require_id("room_id", 3), Ok(3));
        assert!(matches!(require_id("room_id", 0), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("room_ref", "  A-101 "), Ok("A-101"));
        assert!(require_text("room_ref", "   ").is_err());
    }
}
