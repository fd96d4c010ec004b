// ==========================================
// 考务监考排班系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::policy::{parse_role_list, PolicyConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::types::ExaminerRole;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// PolicyConfigReader Trait 实现
// ==========================================
impl PolicyConfigReader for ConfigManager {
    fn get_allowed_roles(&self) -> Result<Vec<ExaminerRole>, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::ALLOWED_ROLES,
            "lecturer,staff,volunteer",
        )?;
        Ok(parse_role_list(&value))
    }

    fn get_require_active(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::REQUIRE_ACTIVE, "true")?;
        Ok(matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ))
    }

    fn get_default_top_n(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DASHBOARD_TOP_N, "1")?;
        Ok(value.trim().parse::<usize>().unwrap_or(1))
    }

    fn get_lock_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::STORE_LOCK_TIMEOUT_MS, "5000")?;
        Ok(value
            .trim()
            .parse::<u64>()
            .unwrap_or(crate::db::DEFAULT_LOCK_TIMEOUT_MS))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分配策略
    pub const ALLOWED_ROLES: &str = "assignment.allowed_roles";
    pub const REQUIRE_ACTIVE: &str = "assignment.require_active";

    // 驾驶舱
    pub const DASHBOARD_TOP_N: &str = "dashboard.top_n";

    // 存储
    pub const STORE_LOCK_TIMEOUT_MS: &str = "store.lock_timeout_ms";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::policy::AssignmentPolicy;

    fn setup() -> ConfigManager {
        let conn = crate::db::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_table_is_empty() {
        let config = setup();
        assert_eq!(config.load_policy().unwrap(), AssignmentPolicy::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = setup();
        config
            .set_global_config_value(config_keys::ALLOWED_ROLES, "lecturer")
            .unwrap();
        config
            .set_global_config_value(config_keys::REQUIRE_ACTIVE, "false")
            .unwrap();
        config
            .set_global_config_value(config_keys::DASHBOARD_TOP_N, "0")
            .unwrap();

        let policy = config.load_policy().unwrap();
        assert_eq!(policy.allowed_roles, vec![ExaminerRole::Lecturer]);
        assert!(!policy.require_active);
        // 0 被规整为 1
        assert_eq!(policy.default_top_n, 1);

        let snapshot = config.get_config_snapshot().unwrap();
        assert!(snapshot.contains(config_keys::ALLOWED_ROLES));
    }
}
