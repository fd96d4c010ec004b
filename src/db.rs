// ==========================================
// 考务监考排班系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键级联依赖 foreign_keys）
// - 统一 busy_timeout，所有存储访问在有限时间内完成或失败
// - 内嵌 schema 迁移，记录 schema_version
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 默认连接锁等待上限（毫秒）
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version（与 `migrations/v0.*.sql` 对齐）
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = include_str!("../migrations/v0.1_exam_schema.sql");

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    configure_sqlite_connection_with_timeout(conn, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
}

/// 配置 SQLite 连接（调用方指定 busy_timeout）
pub fn configure_sqlite_connection_with_timeout(
    conn: &Connection,
    busy_timeout: Duration,
) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存数据库（测试/演示），并完成迁移
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    migrate(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 执行迁移（幂等）
///
/// # 返回
/// - Ok(version): 迁移后的 schema_version
pub fn migrate(conn: &Connection) -> rusqlite::Result<i64> {
    let current = read_schema_version(conn)?.unwrap_or(0);
    if current > CURRENT_SCHEMA_VERSION {
        tracing::warn!(
            found = current,
            supported = CURRENT_SCHEMA_VERSION,
            "数据库 schema_version 高于当前程序支持版本"
        );
        return Ok(current);
    }

    if current < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.execute("INSERT OR IGNORE INTO schema_version (version) VALUES (1)", [])?;
        tracing::info!(version = 1, "schema 迁移完成");
    }

    Ok(CURRENT_SCHEMA_VERSION)
}

/// 在限定时间内获取共享连接
///
/// 连接被其他调用方占用时短暂退避重试；超时返回 `LockError`。
pub fn lock_connection(
    conn: &Mutex<Connection>,
    timeout: Duration,
) -> RepositoryResult<MutexGuard<'_, Connection>> {
    let deadline = Instant::now() + timeout;
    loop {
        match conn.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::Poisoned(e)) => {
                return Err(RepositoryError::LockError(e.to_string()));
            }
            Err(TryLockError::WouldBlock) => {
                if Instant::now() >= deadline {
                    return Err(RepositoryError::LockError(format!(
                        "等待数据库连接超时（{}ms）",
                        timeout.as_millis()
                    )));
                }
                std::thread::sleep(Duration::from_millis(2));
            }
        }
    }
}
