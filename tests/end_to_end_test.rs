// ==========================================
// 端到端流程测试
// ==========================================
// 流程: 开设阶段 → 登记可用日 → 自动补位 → 统计 → 删除阶段
// ==========================================


#[cfg(test)]
mod end_to_end_test {
    use crate::test_helpers::{d, seed_phase, TestEnv, ACTOR};
    use exam_staffing::engine::{DistinctExaminers, EngineError};

    #[test]
    fn test_auto_fill_single_examiner_two_rooms() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        env.available(e1.id, d(2024, 5, 2));

        let summary = env.auto_fill.fill_slot(fx.slot_id, ACTOR).unwrap();
        assert_eq!(summary.assigned, 1);
        assert_eq!(summary.unstaffed, 1);
        assert_eq!(summary.skipped, 0);
        assert!(summary.errors.is_empty());

        let holders: Vec<Option<i64>> = fx.room_ids.iter().map(|&id| env.room_examiner(id)).collect();
        assert_eq!(holders.iter().filter(|h| **h == Some(e1.id)).count(), 1);
        assert_eq!(holders.iter().filter(|h| h.is_none()).count(), 1);

        // 按 (场次, 考场) 顺序，先补第一个考场
        assert_eq!(summary.assignments[0].id, fx.room_ids[0]);

        let recent = env.repos.action_log_repo.find_recent(10).unwrap();
        assert!(recent.iter().any(|l| l.action_type == "AUTO_FILL"));
    }

    #[test]
    fn test_auto_fill_prefers_lower_load_and_skips_staffed() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let busy = env.active_lecturer(fx.semester_id, "busy");
        let fresh = env.active_lecturer(fx.semester_id, "fresh");
        env.available(busy.id, fx.day);
        env.available(fresh.id, fx.day);
        env.available(busy.id, d(2024, 5, 3));

        // busy 在阶段内另一天已有一个考场
        let slot = env.hierarchy.create_slot(fx.phase_id, d(2024, 5, 3)).unwrap();
        let sub = env.hierarchy.create_sub_slot(slot.id, None).unwrap();
        let other = env.assignment.add_room(sub.id, "Z001", 9, ACTOR).unwrap();
        env.assignment.assign_examiner(other.id, busy.id, ACTOR).unwrap();

        let summary = env.auto_fill.fill_slot(fx.slot_id, ACTOR).unwrap();
        assert_eq!(summary.assigned, 2);
        assert_eq!(env.room_examiner(fx.room_ids[0]), Some(fresh.id));
        assert_eq!(env.room_examiner(fx.room_ids[1]), Some(busy.id));

        // 再次补位：全部已配置
        let again = env.auto_fill.fill_slot(fx.slot_id, ACTOR).unwrap();
        assert_eq!(again.assigned, 0);
        assert_eq!(again.skipped, 2);
    }

    #[test]
    fn test_auto_fill_reports_failed_room_and_continues() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        // 与第一个考场同场次的第三个考场，排序位于第二个考场之前
        let extra = env.assignment.add_room(fx.sub_ids[0], "C303", 42, ACTOR).unwrap();
        let examiners: Vec<i64> = ["e1", "e2", "e3"]
            .iter()
            .map(|name| {
                let e = env.active_lecturer(fx.semester_id, name);
                env.available(e.id, fx.day);
                e.id
            })
            .collect();

        // 第一个考场补位成功后，第二个考场在轮到它之前被删除
        env.conn
            .lock()
            .unwrap()
            .execute_batch(&format!(
                "CREATE TEMP TRIGGER drop_room_mid_fill AFTER UPDATE OF examiner_id ON exam_room \
                 WHEN NEW.id = {} AND NEW.examiner_id IS NOT NULL \
                 BEGIN DELETE FROM exam_room WHERE id = {}; END;",
                fx.room_ids[0], fx.room_ids[1]
            ))
            .unwrap();

        let summary = env.auto_fill.fill_slot(fx.slot_id, ACTOR).unwrap();
        assert_eq!(summary.assigned, 2);
        assert_eq!(summary.unstaffed, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].room_id, fx.room_ids[1]);

        assert_eq!(env.room_examiner(fx.room_ids[0]), Some(examiners[0]));
        assert_eq!(env.room_examiner(extra.id), Some(examiners[1]));
        assert!(env.repos.room_repo.find_by_id(fx.room_ids[1]).unwrap().is_none());
    }

    #[test]
    fn test_auto_fill_unknown_slot_is_not_found() {
        let env = TestEnv::new();
        assert!(matches!(
            env.auto_fill.fill_slot(9999, ACTOR),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_phase_cascades() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        env.available(e1.id, fx.day);
        env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR).unwrap();
        assert_eq!(env.aggregation.count_staffed_rooms(fx.phase_id).unwrap(), 1);

        env.hierarchy.delete_phase(fx.phase_id).unwrap();

        assert!(matches!(
            env.aggregation.count_staffed_rooms(fx.phase_id),
            Err(EngineError::NotFound { .. })
        ));
        assert!(env.repos.hierarchy_repo.find_slot(fx.slot_id).unwrap().is_none());
        assert!(env.repos.hierarchy_repo.find_sub_slot(fx.sub_ids[0]).unwrap().is_none());
        for room_id in fx.room_ids {
            assert!(env.repos.room_repo.find_by_id(room_id).unwrap().is_none());
        }
        // 监考员档案与可用日不受影响
        assert!(env.repos.examiner_repo.find_by_id(e1.id).unwrap().is_some());

        assert!(matches!(
            env.hierarchy.delete_phase(fx.phase_id),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_hierarchy_window_rules() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);

        assert!(matches!(
            env.hierarchy.create_slot(fx.phase_id, d(2024, 5, 10)),
            Err(EngineError::InvalidInput(_))
        ));
        // 已有考试日 05-02 不能被挤出窗口
        assert!(matches!(
            env.hierarchy.update_phase_window(fx.phase_id, d(2024, 5, 3), d(2024, 5, 5)),
            Err(EngineError::Conflict(_))
        ));
        let widened = env
            .hierarchy
            .update_phase_window(fx.phase_id, d(2024, 4, 28), d(2024, 5, 10))
            .unwrap();
        assert_eq!(widened.end_day, d(2024, 5, 10));
        env.hierarchy.create_slot(fx.phase_id, d(2024, 5, 10)).unwrap();

        let overview = env.hierarchy.list_phases().unwrap();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].exam_type, "FE");
        assert_eq!(overview[0].year, 2024);
    }

    #[test]
    fn test_semester_deletion_only_within_its_year() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);

        assert!(matches!(
            env.hierarchy.delete_semester(fx.semester_id, d(2025, 1, 10)),
            Err(EngineError::Conflict(_))
        ));
        env.hierarchy.delete_semester(fx.semester_id, d(2024, 11, 1)).unwrap();
        assert!(matches!(
            env.aggregation.count_distinct_examiners(fx.phase_id),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_full_cycle_counts() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        let e2 = env.active_lecturer(fx.semester_id, "e2");
        env.available(e1.id, fx.day);
        env.available(e2.id, fx.day);

        env.registration.register(e2.id, fx.room_ids[1]).unwrap();
        let summary = env.auto_fill.fill_slot(fx.slot_id, ACTOR).unwrap();
        assert_eq!(summary.assigned, 1);
        assert_eq!(summary.skipped, 1);

        assert_eq!(env.aggregation.count_staffed_rooms(fx.phase_id).unwrap(), 2);
        match env.aggregation.count_distinct_examiners(fx.phase_id).unwrap() {
            DistinctExaminers::Examiners { total, .. } => assert_eq!(total, 2),
            other => panic!("unexpected {:?}", other),
        }
    }
}
