// ==========================================
// 阶段统计（驾驶舱）测试
// ==========================================


#[cfg(test)]
mod dashboard_aggregation_test {
    use crate::test_helpers::{d, seed_phase, t, TestEnv, ACTOR};
    use exam_staffing::domain::types::{ExaminerRole, ExaminerStatus};
    use exam_staffing::engine::{AvailableExaminers, DistinctExaminers, EngineError};

    /// 额外的考试日，每个场次各 n 个考场
    fn add_day_with_rooms(env: &TestEnv, phase_id: i64, day: u32, rooms: usize) -> Vec<i64> {
        let slot = env.hierarchy.create_slot(phase_id, d(2024, 5, day)).unwrap();
        let mut ids = Vec::new();
        for n in 0..rooms {
            // 每个考场独立场次，时间错开
            let start = 8 + n as u32;
            let sub = env
                .hierarchy
                .create_sub_slot(slot.id, Some((t(start, 0), t(start, 50))))
                .unwrap();
            ids.push(
                env.assignment
                    .add_room(sub.id, &format!("D{}-{}", day, n), 1, ACTOR)
                    .unwrap()
                    .id,
            );
        }
        ids
    }

    #[test]
    fn test_phase_without_slots() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let exam_type = env.hierarchy.create_exam_type("PE", 5, 0).unwrap();
        let empty = env
            .hierarchy
            .create_phase(fx.semester_id, exam_type.id, d(2024, 6, 1), d(2024, 6, 2))
            .unwrap();

        let result = env.aggregation.count_distinct_examiners(empty.id).unwrap();
        assert_eq!(result, DistinctExaminers::NoSlots);
        assert!(result.message().is_some());
        assert_eq!(env.aggregation.count_staffed_rooms(empty.id).unwrap(), 0);
        assert_eq!(env.aggregation.slot_utilization(empty.id).unwrap().slot_count, 0);
    }

    #[test]
    fn test_slots_without_examiners() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        assert_eq!(
            env.aggregation.count_distinct_examiners(fx.phase_id).unwrap(),
            DistinctExaminers::NoAssignedExaminers
        );
        assert!(matches!(
            env.aggregation.top_examiners_by_load(fx.phase_id, None),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_distinct_examiners_by_role() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let lecturer = env.active_lecturer(fx.semester_id, "lect");
        let staff = env.add_examiner(fx.semester_id, "staff", ExaminerRole::Staff, ExaminerStatus::Active);
        env.available(lecturer.id, fx.day);
        env.available(staff.id, fx.day);
        env.available(lecturer.id, d(2024, 5, 3));

        env.assignment.assign_examiner(fx.room_ids[0], lecturer.id, ACTOR).unwrap();
        env.assignment.assign_examiner(fx.room_ids[1], staff.id, ACTOR).unwrap();
        let extra = add_day_with_rooms(&env, fx.phase_id, 3, 1);
        env.assignment.assign_examiner(extra[0], lecturer.id, ACTOR).unwrap();

        match env.aggregation.count_distinct_examiners(fx.phase_id).unwrap() {
            DistinctExaminers::Examiners {
                total,
                by_role,
                examiners,
            } => {
                assert_eq!(total, 2);
                assert_eq!(by_role.get(&ExaminerRole::Lecturer), Some(&1));
                assert_eq!(by_role.get(&ExaminerRole::Staff), Some(&1));
                assert_eq!(examiners.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_staffed_rooms_bounded_by_total() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        env.available(e1.id, fx.day);
        env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR).unwrap();
        add_day_with_rooms(&env, fx.phase_id, 3, 2);

        let staffed = env.aggregation.count_staffed_rooms(fx.phase_id).unwrap();
        let utilization = env.aggregation.slot_utilization(fx.phase_id).unwrap();
        assert_eq!(staffed, 1);
        assert_eq!(utilization.total_rooms, 4);
        assert!(staffed <= utilization.total_rooms);
        assert_eq!(utilization.staffed_rooms, staffed);
        assert_eq!(utilization.unstaffed_rooms, 3);
        assert_eq!(utilization.per_slot.len(), 2);
        assert_eq!(utilization.per_slot[0].staffed_rooms, 1);
    }

    #[test]
    fn test_top_examiners_include_ties() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let a = env.active_lecturer(fx.semester_id, "a");
        let b = env.active_lecturer(fx.semester_id, "b");
        let c = env.active_lecturer(fx.semester_id, "c");
        for e in [&a, &b, &c] {
            env.available(e.id, d(2024, 5, 3));
        }
        let rooms = add_day_with_rooms(&env, fx.phase_id, 3, 7);
        // A(3), B(3), C(1)
        for room in &rooms[0..3] {
            env.assignment.assign_examiner(*room, a.id, ACTOR).unwrap();
        }
        for room in &rooms[3..6] {
            env.assignment.assign_examiner(*room, b.id, ACTOR).unwrap();
        }
        env.assignment.assign_examiner(rooms[6], c.id, ACTOR).unwrap();

        let top = env.aggregation.top_examiners_by_load(fx.phase_id, None).unwrap();
        let ids: Vec<i64> = top.iter().map(|l| l.examiner_id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        assert!(top.iter().all(|l| l.assignment_count == 3));

        let top_two = env.aggregation.top_examiners_by_load(fx.phase_id, Some(2)).unwrap();
        assert_eq!(top_two.len(), 3);
    }

    #[test]
    fn test_available_examiners_in_window() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        assert_eq!(
            env.aggregation.count_available_examiners(fx.phase_id).unwrap(),
            AvailableExaminers::NoExaminers
        );

        let inside = env.active_lecturer(fx.semester_id, "inside");
        let outside = env.active_lecturer(fx.semester_id, "outside");
        env.available(inside.id, d(2024, 5, 1));
        env.available(outside.id, d(2024, 5, 20));

        assert_eq!(
            env.aggregation.count_available_examiners(fx.phase_id).unwrap(),
            AvailableExaminers::Examiners {
                total: 1,
                examiner_ids: vec![inside.id]
            }
        );
    }

    #[test]
    fn test_unknown_phase_is_not_found() {
        let env = TestEnv::new();
        seed_phase(&env);
        assert!(matches!(
            env.aggregation.count_staffed_rooms(9999),
            Err(EngineError::NotFound { .. })
        ));
        assert!(matches!(
            env.aggregation.count_available_examiners(9999),
            Err(EngineError::NotFound { .. })
        ));
    }
}
