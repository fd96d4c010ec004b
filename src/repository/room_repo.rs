// ==========================================
// 考务监考排班系统 - 考场监考单元仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: exam_room 表的 CRUD、层级联表查询、条件更新（CAS）
// 并发: 监考员写入一律走 compare_and_set_examiner，
//       以当前 examiner_id 为条件，并在同一条 UPDATE 内复核同日冲突
// ==========================================

use crate::db::{lock_connection, DEFAULT_LOCK_TIMEOUT_MS};
use crate::domain::schedule::{ExamRoomAssignment, ExamSlot, RoomPlacement};
use crate::repository::error::RepositoryResult;
use crate::repository::phase_repo::window_from_columns;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// 联表查询考场定位的公共 SELECT 片段
const PLACEMENT_SELECT: &str = r#"
    SELECT
        r.id, r.sub_in_slot_id, r.room_ref, r.examiner_id, r.course_id,
        es.id, es.day, s.start_time, s.end_time,
        p.id, p.semester_id
    FROM exam_room r
    JOIN sub_in_slot s ON s.id = r.sub_in_slot_id
    JOIN exam_slot es ON es.id = s.exam_slot_id
    JOIN exam_phase p ON p.id = es.phase_id
"#;

/// 条件写入监考员：当前值匹配且无同日冲突时才更新
///
/// 参数: ?1 = room_id, ?2 = 期望的当前 examiner_id（可为 NULL）, ?3 = 新 examiner_id
const ASSIGN_IF_FREE_SQL: &str = r#"
    UPDATE exam_room
    SET examiner_id = ?3
    WHERE id = ?1
      AND examiner_id IS ?2
      AND NOT EXISTS (
          SELECT 1
          FROM exam_room other
          JOIN sub_in_slot os ON os.id = other.sub_in_slot_id
          JOIN exam_slot oe ON oe.id = os.exam_slot_id
          JOIN exam_room target ON target.id = ?1
          JOIN sub_in_slot ts ON ts.id = target.sub_in_slot_id
          JOIN exam_slot te ON te.id = ts.exam_slot_id
          WHERE other.examiner_id = ?3
            AND other.id <> ?1
            AND oe.day = te.day
            AND (
                os.id = ts.id
                OR os.start_time IS NULL OR os.end_time IS NULL
                OR ts.start_time IS NULL OR ts.end_time IS NULL
                OR (os.start_time < ts.end_time AND ts.start_time < os.end_time)
            )
      )
"#;

/// 阶段快照：一次连接获取内读取的考试日与考场
#[derive(Debug, Clone, Default)]
pub struct PhaseSnapshot {
    pub slots: Vec<ExamSlot>,
    pub placements: Vec<RoomPlacement>,
}

// ==========================================
// RoomAssignmentRepository - 考场监考单元仓储
// ==========================================
pub struct RoomAssignmentRepository {
    conn: Arc<Mutex<Connection>>,
    lock_timeout: Duration,
}

impl RoomAssignmentRepository {
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
    // 基础 CRUD
    // ==========================================

    /// 在场次下新增考场（未配置监考员）
    pub fn create(
        &self,
        sub_in_slot_id: i64,
        room_ref: &str,
        course_id: i64,
    ) -> RepositoryResult<ExamRoomAssignment> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO exam_room (sub_in_slot_id, room_ref, examiner_id, course_id) VALUES (?1, ?2, NULL, ?3)",
            params![sub_in_slot_id, room_ref, course_id],
        )?;
        Ok(ExamRoomAssignment {
            id: conn.last_insert_rowid(),
            sub_in_slot_id,
            room_ref: room_ref.to_string(),
            examiner_id: None,
            course_id,
        })
    }

    pub fn find_by_id(&self, room_id: i64) -> RepositoryResult<Option<ExamRoomAssignment>> {
        let conn = self.get_conn()?;
        let room = conn
            .query_row(
                "SELECT id, sub_in_slot_id, room_ref, examiner_id, course_id FROM exam_room WHERE id = ?1",
                params![room_id],
                map_room,
            )
            .optional()?;
        Ok(room)
    }

    pub fn list_by_sub_slot(&self, sub_in_slot_id: i64) -> RepositoryResult<Vec<ExamRoomAssignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, sub_in_slot_id, room_ref, examiner_id, course_id FROM exam_room WHERE sub_in_slot_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![sub_in_slot_id], map_room)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 条件删除考场
    ///
    /// # 参数
    /// - `force`: false 时仅删除未配置监考员的考场（判断与删除在同一语句内）
    ///
    /// # 返回
    /// - Ok(Some(room)): 被删除的考场（删除时刻的值）
    /// - Ok(None): 考场不存在，或已配置监考员且 force = false
    pub fn delete(&self, room_id: i64, force: bool) -> RepositoryResult<Option<ExamRoomAssignment>> {
        let conn = self.get_conn()?;
        let room = conn
            .query_row(
                "DELETE FROM exam_room WHERE id = ?1 AND (?2 OR examiner_id IS NULL) \
                 RETURNING id, sub_in_slot_id, room_ref, examiner_id, course_id",
                params![room_id, force],
                map_room,
            )
            .optional()?;
        Ok(room)
    }

    // ==========================================
    // 层级定位查询
    // ==========================================

    /// 查询考场及其考试日/场次/阶段定位
    pub fn find_placement(&self, room_id: i64) -> RepositoryResult<Option<RoomPlacement>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE r.id = ?1", PLACEMENT_SELECT);
        let placement = conn.query_row(&sql, params![room_id], map_placement).optional()?;
        Ok(placement)
    }

    /// 考试日下全部考场（按场次、考场排序）
    pub fn list_placements_by_slot(&self, exam_slot_id: i64) -> RepositoryResult<Vec<RoomPlacement>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE es.id = ?1 ORDER BY s.id, r.id", PLACEMENT_SELECT);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![exam_slot_id], map_placement)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 监考员在指定日期持有的全部考场（跨阶段）
    pub fn list_placements_for_examiner_on_day(
        &self,
        examiner_id: i64,
        day: NaiveDate,
    ) -> RepositoryResult<Vec<RoomPlacement>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE r.examiner_id = ?1 AND es.day = ?2 ORDER BY s.id, r.id",
            PLACEMENT_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![examiner_id, day], map_placement)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 阶段内各监考员持有考场数
    pub fn count_by_examiner_in_phase(&self, phase_id: i64) -> RepositoryResult<HashMap<i64, usize>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.examiner_id, COUNT(*)
            FROM exam_room r
            JOIN sub_in_slot s ON s.id = r.sub_in_slot_id
            JOIN exam_slot es ON es.id = s.exam_slot_id
            WHERE es.phase_id = ?1 AND r.examiner_id IS NOT NULL
            GROUP BY r.examiner_id
            "#,
        )?;
        let mut counts = HashMap::new();
        let rows = stmt.query_map(params![phase_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (examiner_id, count) = row?;
            counts.insert(examiner_id, count.max(0) as usize);
        }
        Ok(counts)
    }

    /// 读取阶段快照（同一读事务内，保证考试日与考场一致）
    pub fn load_phase_snapshot(&self, phase_id: i64) -> RepositoryResult<PhaseSnapshot> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let slots = {
            let mut stmt = tx.prepare(
                "SELECT id, phase_id, day FROM exam_slot WHERE phase_id = ?1 ORDER BY day, id",
            )?;
            let rows = stmt
                .query_map(params![phase_id], |row| {
                    Ok(ExamSlot {
                        id: row.get(0)?,
                        phase_id: row.get(1)?,
                        day: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let placements = {
            let sql = format!("{} WHERE p.id = ?1 ORDER BY es.day, es.id, s.id, r.id", PLACEMENT_SELECT);
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map(params![phase_id], map_placement)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        tx.commit()?;
        Ok(PhaseSnapshot { slots, placements })
    }

    // ==========================================
    // 条件写入（并发控制）
    // ==========================================

    /// 条件设置/清除监考员
    ///
    /// # 参数
    /// - `expected`: 期望的当前 examiner_id（None 表示期望未配置）
    /// - `new_examiner`: 新值；Some 时同时复核同日冲突，None 表示清除
    ///
    /// # 返回
    /// - Ok(true): 写入成功
    /// - Ok(false): 当前值已变化、考场不存在或存在同日冲突
    pub fn compare_and_set_examiner(
        &self,
        room_id: i64,
        expected: Option<i64>,
        new_examiner: Option<i64>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = match new_examiner {
            Some(examiner_id) => conn.execute(ASSIGN_IF_FREE_SQL, params![room_id, expected, examiner_id])?,
            None => conn.execute(
                "UPDATE exam_room SET examiner_id = NULL WHERE id = ?1 AND examiner_id IS ?2",
                params![room_id, expected],
            )?,
        };
        Ok(rows == 1)
    }

    /// 无条件清除监考员
    ///
    /// # 返回
    /// - Ok(rows): 0 表示考场不存在
    pub fn clear_examiner(&self, room_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE exam_room SET examiner_id = NULL WHERE id = ?1",
            params![room_id],
        )?;
        Ok(rows)
    }
}

fn map_room(row: &Row<'_>) -> rusqlite::Result<ExamRoomAssignment> {
    Ok(ExamRoomAssignment {
        id: row.get(0)?,
        sub_in_slot_id: row.get(1)?,
        room_ref: row.get(2)?,
        examiner_id: row.get(3)?,
        course_id: row.get(4)?,
    })
}

fn map_placement(row: &Row<'_>) -> rusqlite::Result<RoomPlacement> {
    Ok(RoomPlacement {
        room: map_room(row)?,
        exam_slot_id: row.get(5)?,
        day: row.get(6)?,
        window: window_from_columns(row.get(7)?, row.get(8)?),
        phase_id: row.get(9)?,
        semester_id: row.get(10)?,
    })
}
