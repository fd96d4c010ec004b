// ==========================================
// 考务监考排班系统 - 分配策略配置
// ==========================================
// 职责: 定义引擎所需的策略配置读取接口与策略值对象
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::ExaminerRole;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;

// ==========================================
// AssignmentPolicy - 分配策略
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPolicy {
    /// 允许承担监考的角色
    pub allowed_roles: Vec<ExaminerRole>,
    /// 是否要求监考员状态为在岗
    pub require_active: bool,
    /// 驾驶舱 Top-N 默认档位数
    pub default_top_n: usize,
    /// 存储访问等待上限
    pub lock_timeout: Duration,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            allowed_roles: ExaminerRole::all().to_vec(),
            require_active: true,
            default_top_n: 1,
            lock_timeout: Duration::from_millis(crate::db::DEFAULT_LOCK_TIMEOUT_MS),
        }
    }
}

impl AssignmentPolicy {
    pub fn allows_role(&self, role: ExaminerRole) -> bool {
        self.allowed_roles.contains(&role)
    }
}

// ==========================================
// PolicyConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait PolicyConfigReader: Send + Sync {
    /// 允许的监考员角色（默认全部）
    fn get_allowed_roles(&self) -> Result<Vec<ExaminerRole>, Box<dyn Error>>;

    /// 是否要求在岗状态（默认 true）
    fn get_require_active(&self) -> Result<bool, Box<dyn Error>>;

    /// Top-N 默认档位数（默认 1）
    fn get_default_top_n(&self) -> Result<usize, Box<dyn Error>>;

    /// 存储访问等待上限（毫秒，默认 5000）
    fn get_lock_timeout_ms(&self) -> Result<u64, Box<dyn Error>>;

    /// 汇总为策略值对象
    fn load_policy(&self) -> Result<AssignmentPolicy, Box<dyn Error>> {
        Ok(AssignmentPolicy {
            allowed_roles: self.get_allowed_roles()?,
            require_active: self.get_require_active()?,
            default_top_n: self.get_default_top_n()?.max(1),
            lock_timeout: Duration::from_millis(self.get_lock_timeout_ms()?),
        })
    }
}

/// 解析逗号分隔的角色列表；无有效项时返回全部角色
pub fn parse_role_list(raw: &str) -> Vec<ExaminerRole> {
    let mut roles: Vec<ExaminerRole> = raw
        .split(',')
        .filter_map(ExaminerRole::from_name)
        .collect();
    roles.sort();
    roles.dedup();
    if roles.is_empty() {
        tracing::warn!(raw_value = %raw, "角色配置无有效项，使用全部角色");
        ExaminerRole::all().to_vec()
    } else {
        roles
    }
}
