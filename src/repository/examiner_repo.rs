// ==========================================
// 考务监考排班系统 - 监考员仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: examiner / examiner_log_time 表的 CRUD 与日期范围查询
// ==========================================

use crate::db::{lock_connection, DEFAULT_LOCK_TIMEOUT_MS};
use crate::domain::examiner::{Examiner, ExaminerLogTime, NewExaminer};
use crate::domain::types::{ExaminerRole, ExaminerStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const EXAMINER_COLUMNS: &str = "id, semester_id, email, name, type_examiner, status";

/// 批量写入可用日的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogTimeInsertOutcome {
    pub inserted: usize,
    pub duplicates: usize,
}

// ==========================================
// ExaminerRepository - 监考员仓储
// ==========================================
pub struct ExaminerRepository {
    conn: Arc<Mutex<Connection>>,
    lock_timeout: Duration,
}

impl ExaminerRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self::with_lock_timeout(conn, Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS))
    }

    pub fn with_lock_timeout(conn: Arc<Mutex<Connection>>, lock_timeout: Duration) -> Self {
        Self { conn, lock_timeout }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        lock_connection(&self.conn, self.lock_timeout)
    }

    // ==========================================
    // 监考员
    // ==========================================

    pub fn create(&self, examiner: &NewExaminer) -> RepositoryResult<Examiner> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO examiner (semester_id, email, name, type_examiner, status) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                examiner.semester_id,
                examiner.email,
                examiner.name,
                examiner.role.code(),
                examiner.status.code(),
            ],
        )?;
        Ok(Examiner {
            id: conn.last_insert_rowid(),
            semester_id: examiner.semester_id,
            email: examiner.email.clone(),
            name: examiner.name.clone(),
            role: examiner.role,
            status: examiner.status,
        })
    }

    pub fn find_by_id(&self, examiner_id: i64) -> RepositoryResult<Option<Examiner>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM examiner WHERE id = ?1", EXAMINER_COLUMNS);
        let examiner = conn
            .query_row(&sql, params![examiner_id], map_examiner)
            .optional()?;
        Ok(examiner)
    }

    pub fn list_by_semester(&self, semester_id: i64) -> RepositoryResult<Vec<Examiner>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM examiner WHERE semester_id = ?1 ORDER BY id",
            EXAMINER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![semester_id], map_examiner)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按 id 列表批量查询（结果按 id 升序，缺失的 id 被忽略）
    pub fn find_by_ids(&self, ids: &[i64]) -> RepositoryResult<Vec<Examiner>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM examiner WHERE id IN ({}) ORDER BY id",
            EXAMINER_COLUMNS, placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(ids.iter()), map_examiner)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn update_status(&self, examiner_id: i64, status: ExaminerStatus) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE examiner SET status = ?2 WHERE id = ?1",
            params![examiner_id, status.code()],
        )?;
        Ok(rows)
    }

    // ==========================================
    // 可用日登记
    // ==========================================

    /// 登记一条可用日（重复登记忽略）
    ///
    /// # 返回
    /// - Ok(true): 新增
    /// - Ok(false): 已存在
    pub fn add_log_time(&self, examiner_id: i64, semester_id: i64, day: NaiveDate) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "INSERT OR IGNORE INTO examiner_log_time (examiner_id, semester_id, day) VALUES (?1, ?2, ?3)",
            params![examiner_id, semester_id, day],
        )?;
        Ok(rows == 1)
    }

    /// 事务内批量登记可用日
    pub fn batch_add_log_times(
        &self,
        rows: &[(i64, i64, NaiveDate)],
    ) -> RepositoryResult<LogTimeInsertOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut outcome = LogTimeInsertOutcome::default();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO examiner_log_time (examiner_id, semester_id, day) VALUES (?1, ?2, ?3)",
            )?;
            for (examiner_id, semester_id, day) in rows {
                if stmt.execute(params![examiner_id, semester_id, day])? == 1 {
                    outcome.inserted += 1;
                } else {
                    outcome.duplicates += 1;
                }
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(outcome)
    }

    /// 查询日期范围内的可用日登记（闭区间，按 id 升序）
    pub fn list_log_times_in_range(
        &self,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> RepositoryResult<Vec<ExaminerLogTime>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, examiner_id, semester_id, day
            FROM examiner_log_time
            WHERE day >= ?1 AND day <= ?2
            ORDER BY id
            "#,
        )?;
        let rows = stmt
            .query_map(params![start_day, end_day], |row| {
                Ok(ExaminerLogTime {
                    id: row.get(0)?,
                    examiner_id: row.get(1)?,
                    semester_id: row.get(2)?,
                    day: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_examiner(row: &Row<'_>) -> rusqlite::Result<Examiner> {
    let role_code: i32 = row.get(4)?;
    let role = ExaminerRole::from_code(role_code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Integer,
            Box::new(RepositoryError::FieldValueError {
                field: "type_examiner".to_string(),
                message: role_code.to_string(),
            }),
        )
    })?;
    Ok(Examiner {
        id: row.get(0)?,
        semester_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        role,
        status: ExaminerStatus::from_code(row.get(5)?),
    })
}
