// ==========================================
// 考务监考排班系统 - 排考层级仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: exam_phase / exam_slot / sub_in_slot 表的 CRUD 与范围查询
// 级联: 删除父记录由外键 ON DELETE CASCADE 清理下属记录
// ==========================================

use crate::db::{lock_connection, DEFAULT_LOCK_TIMEOUT_MS};
use crate::domain::schedule::{ExamPhase, ExamSlot, SubInSlot, TimeWindow};
use crate::repository::error::RepositoryResult;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const PHASE_COLUMNS: &str = "id, semester_id, exam_type_id, start_day, end_day";

// ==========================================
// ScheduleHierarchyRepository - 排考层级仓储
// ==========================================
pub struct ScheduleHierarchyRepository {
    conn: Arc<Mutex<Connection>>,
    lock_timeout: Duration,
}

impl ScheduleHierarchyRepository {
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
    // 考试阶段
    // ==========================================

    /// 创建考试阶段
    pub fn create_phase(
        &self,
        semester_id: i64,
        exam_type_id: i64,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> RepositoryResult<ExamPhase> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO exam_phase (semester_id, exam_type_id, start_day, end_day) VALUES (?1, ?2, ?3, ?4)",
            params![semester_id, exam_type_id, start_day, end_day],
        )?;
        Ok(ExamPhase {
            id: conn.last_insert_rowid(),
            semester_id,
            exam_type_id,
            start_day,
            end_day,
        })
    }

    pub fn find_phase(&self, phase_id: i64) -> RepositoryResult<Option<ExamPhase>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM exam_phase WHERE id = ?1", PHASE_COLUMNS);
        let phase = conn.query_row(&sql, params![phase_id], map_phase).optional()?;
        Ok(phase)
    }

    /// 查询全部考试阶段（按开始日期排序）
    pub fn list_phases(&self) -> RepositoryResult<Vec<ExamPhase>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM exam_phase ORDER BY start_day, id", PHASE_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_phase)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_phases_by_semester(&self, semester_id: i64) -> RepositoryResult<Vec<ExamPhase>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM exam_phase WHERE semester_id = ?1 ORDER BY start_day, id",
            PHASE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![semester_id], map_phase)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 更新阶段日期窗口
    ///
    /// # 返回
    /// - Ok(rows): 更新行数（0 表示不存在）
    pub fn update_phase_window(
        &self,
        phase_id: i64,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE exam_phase SET start_day = ?2, end_day = ?3 WHERE id = ?1",
            params![phase_id, start_day, end_day],
        )?;
        Ok(rows)
    }

    /// 删除考试阶段（级联）
    pub fn delete_phase(&self, phase_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM exam_phase WHERE id = ?1", params![phase_id])?;
        Ok(rows)
    }

    // ==========================================
    // 考试日
    // ==========================================

    pub fn create_slot(&self, phase_id: i64, day: NaiveDate) -> RepositoryResult<ExamSlot> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO exam_slot (phase_id, day) VALUES (?1, ?2)",
            params![phase_id, day],
        )?;
        Ok(ExamSlot {
            id: conn.last_insert_rowid(),
            phase_id,
            day,
        })
    }

    pub fn find_slot(&self, slot_id: i64) -> RepositoryResult<Option<ExamSlot>> {
        let conn = self.get_conn()?;
        let slot = conn
            .query_row(
                "SELECT id, phase_id, day FROM exam_slot WHERE id = ?1",
                params![slot_id],
                map_slot,
            )
            .optional()?;
        Ok(slot)
    }

    pub fn list_slots_by_phase(&self, phase_id: i64) -> RepositoryResult<Vec<ExamSlot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, phase_id, day FROM exam_slot WHERE phase_id = ?1 ORDER BY day, id",
        )?;
        let rows = stmt
            .query_map(params![phase_id], map_slot)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按日期范围查询考试日（闭区间）
    pub fn list_slots_in_range(
        &self,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> RepositoryResult<Vec<ExamSlot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, phase_id, day FROM exam_slot WHERE day >= ?1 AND day <= ?2 ORDER BY day, id",
        )?;
        let rows = stmt
            .query_map(params![start_day, end_day], map_slot)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 阶段内考试日的最早/最晚日期
    pub fn slot_day_bounds(&self, phase_id: i64) -> RepositoryResult<Option<(NaiveDate, NaiveDate)>> {
        let conn = self.get_conn()?;
        let bounds: (Option<NaiveDate>, Option<NaiveDate>) = conn.query_row(
            "SELECT MIN(day), MAX(day) FROM exam_slot WHERE phase_id = ?1",
            params![phase_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(match bounds {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        })
    }

    pub fn delete_slot(&self, slot_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM exam_slot WHERE id = ?1", params![slot_id])?;
        Ok(rows)
    }

    // ==========================================
    // 场次
    // ==========================================

    pub fn create_sub_slot(
        &self,
        exam_slot_id: i64,
        window: Option<TimeWindow>,
    ) -> RepositoryResult<SubInSlot> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO sub_in_slot (exam_slot_id, start_time, end_time) VALUES (?1, ?2, ?3)",
            params![exam_slot_id, window.map(|w| w.start), window.map(|w| w.end)],
        )?;
        Ok(SubInSlot {
            id: conn.last_insert_rowid(),
            exam_slot_id,
            window,
        })
    }

    pub fn find_sub_slot(&self, sub_slot_id: i64) -> RepositoryResult<Option<SubInSlot>> {
        let conn = self.get_conn()?;
        let sub = conn
            .query_row(
                "SELECT id, exam_slot_id, start_time, end_time FROM sub_in_slot WHERE id = ?1",
                params![sub_slot_id],
                map_sub_slot,
            )
            .optional()?;
        Ok(sub)
    }

    pub fn list_sub_slots_by_slot(&self, exam_slot_id: i64) -> RepositoryResult<Vec<SubInSlot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, exam_slot_id, start_time, end_time FROM sub_in_slot WHERE exam_slot_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![exam_slot_id], map_sub_slot)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn delete_sub_slot(&self, sub_slot_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM sub_in_slot WHERE id = ?1", params![sub_slot_id])?;
        Ok(rows)
    }
}

pub(crate) fn map_phase(row: &Row<'_>) -> rusqlite::Result<ExamPhase> {
    Ok(ExamPhase {
        id: row.get(0)?,
        semester_id: row.get(1)?,
        exam_type_id: row.get(2)?,
        start_day: row.get(3)?,
        end_day: row.get(4)?,
    })
}

fn map_slot(row: &Row<'_>) -> rusqlite::Result<ExamSlot> {
    Ok(ExamSlot {
        id: row.get(0)?,
        phase_id: row.get(1)?,
        day: row.get(2)?,
    })
}

fn map_sub_slot(row: &Row<'_>) -> rusqlite::Result<SubInSlot> {
    let start: Option<NaiveTime> = row.get(2)?;
    let end: Option<NaiveTime> = row.get(3)?;
    Ok(SubInSlot {
        id: row.get(0)?,
        exam_slot_id: row.get(1)?,
        window: window_from_columns(start, end),
    })
}

/// 由两列时间还原时间窗（任一为空即视为未声明）
pub(crate) fn window_from_columns(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Option<TimeWindow> {
    match (start, end) {
        (Some(s), Some(e)) => TimeWindow::new(s, e),
        _ => None,
    }
}
