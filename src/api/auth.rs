// ==========================================
// 考务监考排班系统 - 调用方身份与角色门控
// ==========================================
// 职责: 令牌 → 调用方身份（外部协作方接口）；角色等级校验
// 角色等级: student 0 < lecturer 1 < staff 2 < admin 3
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ==========================================
// ActorRole - 调用方角色
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Student,
    Lecturer,
    Staff,
    Admin,
}

impl ActorRole {
    pub fn level(&self) -> u8 {
        match self {
            ActorRole::Student => 0,
            ActorRole::Lecturer => 1,
            ActorRole::Staff => 2,
            ActorRole::Admin => 3,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "student" => Some(ActorRole::Student),
            "lecturer" => Some(ActorRole::Lecturer),
            "staff" => Some(ActorRole::Staff),
            "admin" => Some(ActorRole::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Student => write!(f, "student"),
            ActorRole::Lecturer => write!(f, "lecturer"),
            ActorRole::Staff => write!(f, "staff"),
            ActorRole::Admin => write!(f, "admin"),
        }
    }
}

/// 已认证的调用方
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// 操作日志中的操作人
    pub subject: String,
    pub role: ActorRole,
    /// 调用方本人的监考员档案（自助报名使用）
    pub examiner_id: Option<i64>,
}

impl CallerIdentity {
    pub fn new(subject: impl Into<String>, role: ActorRole, examiner_id: Option<i64>) -> Self {
        Self {
            subject: subject.into(),
            role,
            examiner_id,
        }
    }

    /// 本地运维身份（命令行工具使用）
    pub fn system(subject: impl Into<String>) -> Self {
        Self::new(subject, ActorRole::Admin, None)
    }
}

/// 角色门控：level >= min 时通过
pub fn require_role(caller: &CallerIdentity, min: ActorRole) -> ApiResult<()> {
    if caller.role.level() >= min.level() {
        Ok(())
    } else {
        tracing::warn!(subject = %caller.subject, role = %caller.role, required = %min, "角色等级不足");
        Err(ApiError::Unauthorized(format!(
            "需要 {} 及以上角色，当前为 {}",
            min, caller.role
        )))
    }
}

/// 取调用方本人的监考员 id
pub fn require_examiner(caller: &CallerIdentity) -> ApiResult<i64> {
    caller.examiner_id.ok_or_else(|| {
        ApiError::Unauthorized(format!("调用方 {} 未关联监考员档案", caller.subject))
    })
}

// ==========================================
// Authorizer Trait
// ==========================================
// 实现者: 外部认证服务适配器；StaticTokenAuthorizer（开发 / 测试）
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, token: &str) -> ApiResult<CallerIdentity>;
}

/// 静态令牌表
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthorizer {
    tokens: HashMap<String, CallerIdentity>,
}

impl StaticTokenAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: CallerIdentity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl Authorizer for StaticTokenAuthorizer {
    async fn authorize(&self, token: &str) -> ApiResult<CallerIdentity> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("令牌无效".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ladder() {
        let staff = CallerIdentity::new("s", ActorRole::Staff, None);
        assert!(require_role(&staff, ActorRole::Lecturer).is_ok());
        assert!(require_role(&staff, ActorRole::Staff).is_ok());
        assert!(matches!(
            require_role(&staff, ActorRole::Admin),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_static_token_authorizer() {
        let auth = StaticTokenAuthorizer::new()
            .with_token("t-lect", CallerIdentity::new("l1", ActorRole::Lecturer, Some(4)));
        let caller = auth.authorize("t-lect").await.unwrap();
        assert_eq!(require_examiner(&caller), Ok(4));
        assert!(matches!(auth.authorize("nope").await, Err(ApiError::Unauthorized(_))));
    }
}
