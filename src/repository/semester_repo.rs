// ==========================================
// 考务监考排班系统 - 学期/考试类型仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: semester / exam_type 表的 CRUD
// ==========================================

use crate::db::{lock_connection, DEFAULT_LOCK_TIMEOUT_MS};
use crate::domain::semester::{ExamType, Semester};
use crate::domain::types::Season;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// ==========================================
// SemesterRepository - 学期仓储
// ==========================================
pub struct SemesterRepository {
    conn: Arc<Mutex<Connection>>,
    lock_timeout: Duration,
}

impl SemesterRepository {
    /// 从已有连接创建仓储实例
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
    // 学期
    // ==========================================

    /// 创建学期
    pub fn create(&self, season: Season, year: i32) -> RepositoryResult<Semester> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO semester (season, year) VALUES (?1, ?2)",
            params![season.as_db_str(), year],
        )?;
        Ok(Semester {
            id: conn.last_insert_rowid(),
            season,
            year,
        })
    }

    /// 按主键查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Semester>> {
        let conn = self.get_conn()?;
        let semester = conn
            .query_row(
                "SELECT id, season, year FROM semester WHERE id = ?1",
                params![id],
                map_semester,
            )
            .optional()?;
        Ok(semester)
    }

    /// 查询全部学期（按年份、id 排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Semester>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, season, year FROM semester ORDER BY year, id")?;
        let rows = stmt
            .query_map([], map_semester)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询指定季节+年份的学期
    pub fn find_by_season_year(&self, season: Season, year: i32) -> RepositoryResult<Option<Semester>> {
        let conn = self.get_conn()?;
        let semester = conn
            .query_row(
                "SELECT id, season, year FROM semester WHERE season = ?1 AND year = ?2 ORDER BY id LIMIT 1",
                params![season.as_db_str(), year],
                map_semester,
            )
            .optional()?;
        Ok(semester)
    }

    /// 删除学期（级联删除阶段/考试日/场次/考场/监考员）
    ///
    /// # 返回
    /// - Ok(rows): 被删除的行数（0 表示不存在）
    pub fn delete(&self, id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM semester WHERE id = ?1", params![id])?;
        Ok(rows)
    }

    // ==========================================
    // 考试类型
    // ==========================================

    /// 创建考试类型
    pub fn create_exam_type(&self, exam_type: &str, block: i32, des: i32) -> RepositoryResult<ExamType> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO exam_type (type, block, des) VALUES (?1, ?2, ?3)",
            params![exam_type, block, des],
        )?;
        Ok(ExamType {
            id: conn.last_insert_rowid(),
            exam_type: exam_type.to_string(),
            block,
            des,
        })
    }

    pub fn find_exam_type(&self, id: i64) -> RepositoryResult<Option<ExamType>> {
        let conn = self.get_conn()?;
        let exam_type = conn
            .query_row(
                "SELECT id, type, block, des FROM exam_type WHERE id = ?1",
                params![id],
                map_exam_type,
            )
            .optional()?;
        Ok(exam_type)
    }

    /// 按 (type, block, des) 查询考试类型
    pub fn find_exam_type_by_key(
        &self,
        exam_type: &str,
        block: i32,
        des: i32,
    ) -> RepositoryResult<Option<ExamType>> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT id, type, block, des FROM exam_type WHERE type = ?1 AND block = ?2 AND des = ?3",
                params![exam_type, block, des],
                map_exam_type,
            )
            .optional()?;
        Ok(found)
    }

    pub fn list_exam_types(&self) -> RepositoryResult<Vec<ExamType>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, type, block, des FROM exam_type ORDER BY id")?;
        let rows = stmt
            .query_map([], map_exam_type)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_semester(row: &Row<'_>) -> rusqlite::Result<Semester> {
    let season_raw: String = row.get(1)?;
    let season = Season::from_db_str(&season_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            Box::new(RepositoryError::FieldValueError {
                field: "season".to_string(),
                message: season_raw.clone(),
            }),
        )
    })?;
    Ok(Semester {
        id: row.get(0)?,
        season,
        year: row.get(2)?,
    })
}

fn map_exam_type(row: &Row<'_>) -> rusqlite::Result<ExamType> {
    Ok(ExamType {
        id: row.get(0)?,
        exam_type: row.get(1)?,
        block: row.get(2)?,
        des: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn setup() -> SemesterRepository {
        SemesterRepository::new(Arc::new(Mutex::new(open_in_memory().unwrap())))
    }

    #[test]
    fn test_create_find_delete_semester() {
        let repo = setup();
        let sem = repo.create(Season::Summer, 2024).unwrap();
        assert_eq!(repo.find_by_id(sem.id).unwrap(), Some(sem.clone()));
        assert_eq!(
            repo.find_by_season_year(Season::Summer, 2024).unwrap().map(|s| s.id),
            Some(sem.id)
        );
        assert_eq!(repo.delete(sem.id).unwrap(), 1);
        assert_eq!(repo.delete(sem.id).unwrap(), 0);
        assert!(repo.find_by_id(sem.id).unwrap().is_none());
    }

    #[test]
    fn test_exam_type_key_is_unique() {
        let repo = setup();
        let fe = repo.create_exam_type("FE", 10, 0).unwrap();
        assert_eq!(repo.find_exam_type_by_key("FE", 10, 0).unwrap(), Some(fe));
        assert!(matches!(
            repo.create_exam_type("FE", 10, 0),
            Err(RepositoryError::UniqueConstraintViolation(_))
        ));
        assert_eq!(repo.list_exam_types().unwrap().len(), 1);
    }
}
