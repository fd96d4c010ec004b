// ==========================================
// 考务监考排班系统 - 排考层级领域模型
// ==========================================
// 层级: ExamPhase → ExamSlot → SubInSlot → ExamRoomAssignment
// 对齐: exam_phase / exam_slot / sub_in_slot / exam_room 表
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ExamPhase - 考试阶段
// ==========================================
// 不变量: start_day <= end_day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamPhase {
    pub id: i64,
    pub semester_id: i64,
    pub exam_type_id: i64,
    pub start_day: NaiveDate,
    pub end_day: NaiveDate,
}

impl ExamPhase {
    /// 日期是否落在阶段窗口内（闭区间）
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_day <= day && day <= self.end_day
    }
}

// ==========================================
// ExamSlot - 考试日
// ==========================================
// 不变量: phase.start_day <= day <= phase.end_day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSlot {
    pub id: i64,
    pub phase_id: i64,
    pub day: NaiveDate,
}

// ==========================================
// TimeWindow - 场次时间窗 [start, end)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// 构造时间窗，要求 start < end
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// 半开区间重叠判定（首尾相接不算重叠）
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// ==========================================
// SubInSlot - 考试日内场次
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubInSlot {
    pub id: i64,
    pub exam_slot_id: i64,
    /// 场次时间窗；None 表示未声明，视为与同日任何场次冲突
    pub window: Option<TimeWindow>,
}

// ==========================================
// ExamRoomAssignment - 考场监考单元
// ==========================================
// examiner_id = None 表示尚未配置监考员
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRoomAssignment {
    pub id: i64,
    pub sub_in_slot_id: i64,
    pub room_ref: String,
    pub examiner_id: Option<i64>,
    pub course_id: i64,
}

impl ExamRoomAssignment {
    pub fn is_staffed(&self) -> bool {
        self.examiner_id.is_some()
    }
}

// ==========================================
// RoomPlacement - 考场在层级中的定位（只读投影）
// ==========================================
// 由仓储联表查询得到，供引擎做可用性与冲突判定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPlacement {
    pub room: ExamRoomAssignment,
    pub exam_slot_id: i64,
    pub day: NaiveDate,
    pub window: Option<TimeWindow>,
    pub phase_id: i64,
    pub semester_id: i64,
}

impl RoomPlacement {
    /// 判定两个已定位考场是否时间冲突
    ///
    /// 规则:
    /// 1) 不同日期 → 不冲突
    /// 2) 同一场次 → 冲突
    /// 3) 任一场次未声明时间窗 → 冲突
    /// 4) 双方时间窗重叠 → 冲突
    pub fn conflicts_with(&self, other: &RoomPlacement) -> bool {
        if self.day != other.day {
            return false;
        }
        if self.room.sub_in_slot_id == other.room.sub_in_slot_id {
            return true;
        }
        match (self.window, other.window) {
            (Some(a), Some(b)) => a.overlaps(&b),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn placement(room_id: i64, sub_id: i64, day: u32, window: Option<TimeWindow>) -> RoomPlacement {
        RoomPlacement {
            room: ExamRoomAssignment {
                id: room_id,
                sub_in_slot_id: sub_id,
                room_ref: format!("R{}", room_id),
                examiner_id: None,
                course_id: 1,
            },
            exam_slot_id: 1,
            day: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            window,
            phase_id: 1,
            semester_id: 1,
        }
    }

    #[test]
    fn test_time_window_requires_ordered_bounds() {
        assert!(TimeWindow::new(t(8, 0), t(10, 0)).is_some());
        assert!(TimeWindow::new(t(10, 0), t(10, 0)).is_none());
        assert!(TimeWindow::new(t(11, 0), t(10, 0)).is_none());
    }

    #[test]
    fn test_time_window_adjacent_does_not_overlap() {
        let morning = TimeWindow::new(t(8, 0), t(10, 0)).unwrap();
        let late_morning = TimeWindow::new(t(10, 0), t(12, 0)).unwrap();
        let mid = TimeWindow::new(t(9, 0), t(11, 0)).unwrap();
        assert!(!morning.overlaps(&late_morning));
        assert!(morning.overlaps(&mid));
        assert!(mid.overlaps(&late_morning));
    }

    #[test]
    fn test_conflicts_with_rules() {
        let morning = TimeWindow::new(t(8, 0), t(10, 0));
        let afternoon = TimeWindow::new(t(13, 0), t(15, 0));

        // 不同日期
        assert!(!placement(1, 1, 2, None).conflicts_with(&placement(2, 2, 3, None)));
        // 同一场次
        assert!(placement(1, 1, 2, morning).conflicts_with(&placement(2, 1, 2, morning)));
        // 未声明时间窗
        assert!(placement(1, 1, 2, None).conflicts_with(&placement(2, 2, 2, afternoon)));
        // 不重叠时间窗
        assert!(!placement(1, 1, 2, morning).conflicts_with(&placement(2, 2, 2, afternoon)));
    }

    #[test]
    fn test_phase_contains_is_inclusive() {
        let phase = ExamPhase {
            id: 1,
            semester_id: 1,
            exam_type_id: 1,
            start_day: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end_day: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        };
        assert!(phase.contains(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
        assert!(phase.contains(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()));
        assert!(!phase.contains(NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()));
    }
}
