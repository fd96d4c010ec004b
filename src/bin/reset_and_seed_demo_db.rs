// Dev utility: back up the target DB, recreate it and seed a small exam-phase scenario.
//
// Usage:
//   cargo run --bin reset_and_seed_demo_db -- [db_path]
//
// Seeds one phase with three exam days, two sittings per day, two rooms per sitting,
// a handful of examiners with availability, then auto-fills the first day.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use exam_staffing::app::get_default_db_path;
use exam_staffing::config::AssignmentPolicy;
use exam_staffing::db::{migrate, open_sqlite_connection};
use exam_staffing::domain::examiner::NewExaminer;
use exam_staffing::domain::types::{ExaminerRole, ExaminerStatus};
use exam_staffing::engine::{
    AggregationEngine, AssignmentEngine, AutoFillEngine, HierarchyEngine, SchedulingRepositories,
};

const ACTOR: &str = "seed";
const EXAM_DAYS: i64 = 3;
const ROOMS_PER_SITTING: usize = 2;

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    migrate(&conn)?;

    let policy = AssignmentPolicy::default();
    let repos = SchedulingRepositories::from_connection(Arc::new(Mutex::new(conn)), policy.lock_timeout);
    let hierarchy = HierarchyEngine::new(repos.clone());
    let assignment = AssignmentEngine::new(repos.clone(), policy.clone());

    let today = Local::now().date_naive();
    let semester = hierarchy.provision_semester(today)?;
    let exam_type = hierarchy.create_exam_type("FE", 10, 0)?;

    let start_day = today + Duration::days(7);
    let end_day = start_day + Duration::days(EXAM_DAYS - 1);
    let phase = hierarchy.create_phase(semester.id, exam_type.id, start_day, end_day)?;

    let morning = (time(9, 0)?, time(11, 0)?);
    let afternoon = (time(14, 0)?, time(16, 0)?);

    let mut slot_ids = Vec::new();
    let mut course_id = 1000;
    for offset in 0..EXAM_DAYS {
        let day = start_day + Duration::days(offset);
        let slot = hierarchy.create_slot(phase.id, day)?;
        slot_ids.push(slot.id);
        for window in [morning, afternoon] {
            let sub = hierarchy.create_sub_slot(slot.id, Some(window))?;
            for n in 0..ROOMS_PER_SITTING {
                course_id += 1;
                let room_ref = format!("R{}{:02}", day.day(), sub.id * 10 + n as i64);
                assignment.add_room(sub.id, &room_ref, course_id, ACTOR)?;
            }
        }
    }

    let roster = [
        ("alice", ExaminerRole::Lecturer, ExaminerStatus::Active),
        ("bob", ExaminerRole::Lecturer, ExaminerStatus::Active),
        ("carol", ExaminerRole::Staff, ExaminerStatus::Active),
        ("dave", ExaminerRole::Volunteer, ExaminerStatus::Active),
        ("erin", ExaminerRole::Lecturer, ExaminerStatus::Inactive),
    ];
    for (i, (name, role, status)) in roster.iter().enumerate() {
        let examiner = hierarchy.create_examiner(&NewExaminer {
            semester_id: semester.id,
            email: format!("{}@exam.local", name),
            name: name.to_string(),
            role: *role,
            status: *status,
        })?;
        // 错开登记，保证部分考场无人可排
        for offset in 0..EXAM_DAYS {
            if (offset as usize + i) % 3 != 2 {
                hierarchy.declare_availability(examiner.id, day_at(start_day, offset))?;
            }
        }
    }

    let auto_fill = AutoFillEngine::new(repos.clone(), policy.clone());
    if let Some(first_slot) = slot_ids.first() {
        let summary = auto_fill.fill_slot(*first_slot, ACTOR)?;
        eprintln!(
            "auto-fill slot {}: assigned={} unstaffed={} skipped={}",
            first_slot, summary.assigned, summary.unstaffed, summary.skipped
        );
    }

    print_quick_counts(&AggregationEngine::new(repos, policy), phase.id)?;
    Ok(())
}

fn time(h: u32, m: u32) -> Result<NaiveTime, Box<dyn Error>> {
    NaiveTime::from_hms_opt(h, m, 0).ok_or_else(|| format!("invalid time {}:{}", h, m).into())
}

fn day_at(start: NaiveDate, offset: i64) -> NaiveDate {
    start + Duration::days(offset)
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn print_quick_counts(aggregation: &AggregationEngine, phase_id: i64) -> Result<(), Box<dyn Error>> {
    let utilization = aggregation.slot_utilization(phase_id)?;
    eprintln!(
        "phase {}: slots={} rooms={} staffed={} unstaffed={}",
        phase_id,
        utilization.slot_count,
        utilization.total_rooms,
        utilization.staffed_rooms,
        utilization.unstaffed_rooms
    );
    Ok(())
}
