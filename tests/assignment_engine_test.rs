// ==========================================
// 监考指派引擎集成测试
// ==========================================
// 覆盖: 指派检查顺序、替换、时间冲突、撤销、考场维护、候选排序
// ==========================================


#[cfg(test)]
mod assignment_engine_test {
    use crate::test_helpers::{d, seed_phase, seed_phase_with_windows, t, TestEnv, ACTOR};
    use exam_staffing::config::AssignmentPolicy;
    use exam_staffing::domain::types::{ExaminerRole, ExaminerStatus, Season};
    use exam_staffing::engine::{AvailabilityIndex, EngineError};

    #[test]
    fn test_assign_available_examiner_records_action() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        env.available(e1.id, fx.day);

        let room = env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR).unwrap();
        assert_eq!(room.examiner_id, Some(e1.id));
        assert_eq!(env.room_examiner(fx.room_ids[0]), Some(e1.id));

        // 成功指派意味着当日可用
        let index =
            AvailabilityIndex::build(&env.repos.hierarchy_repo, &env.repos.examiner_repo, fx.phase_id)
                .unwrap();
        assert!(index.is_available(e1.id, fx.day));

        let logs = env.repos.action_log_repo.find_by_room(fx.room_ids[0]).unwrap();
        assert!(logs.iter().any(|l| l.action_type == "ASSIGN_EXAMINER"
            && l.examiner_id == Some(e1.id)
            && l.actor == ACTOR));
    }

    #[test]
    fn test_assign_without_log_time_is_unavailable() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        // 登记在阶段内但不是考试日
        env.available(e1.id, d(2024, 5, 3));

        let err = env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR).unwrap_err();
        assert_eq!(
            err,
            EngineError::Unavailable {
                examiner_id: e1.id,
                day: fx.day
            }
        );
        assert_eq!(env.room_examiner(fx.room_ids[0]), None);
    }

    #[test]
    fn test_profile_checks_run_before_availability() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);

        // 停用且无登记：报告档案问题而不是不可用
        let inactive = env.add_examiner(
            fx.semester_id,
            "inactive",
            ExaminerRole::Lecturer,
            ExaminerStatus::Inactive,
        );
        let err = env
            .assignment
            .assign_examiner(fx.room_ids[0], inactive.id, ACTOR)
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)), "got {:?}", err);

        // 其他学期的监考员
        let other = env.hierarchy.create_semester(Season::Fall, 2024).unwrap();
        let outsider = env.active_lecturer(other.id, "outsider");
        env.available(outsider.id, fx.day);
        let err = env
            .assignment
            .assign_examiner(fx.room_ids[0], outsider.id, ACTOR)
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)), "got {:?}", err);
    }

    #[test]
    fn test_role_policy_rejects_disallowed_roles() {
        let env = TestEnv::with_policy(AssignmentPolicy {
            allowed_roles: vec![ExaminerRole::Lecturer, ExaminerRole::Staff],
            ..AssignmentPolicy::default()
        });
        let fx = seed_phase(&env);
        let volunteer = env.add_examiner(
            fx.semester_id,
            "vol",
            ExaminerRole::Volunteer,
            ExaminerStatus::Active,
        );
        env.available(volunteer.id, fx.day);

        let err = env
            .assignment
            .assign_examiner(fx.room_ids[0], volunteer.id, ACTOR)
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
        assert!(env
            .assignment
            .list_eligible_examiners(fx.room_ids[0])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_missing_room_and_examiner_are_not_found() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");

        assert!(matches!(
            env.assignment.assign_examiner(9999, e1.id, ACTOR),
            Err(EngineError::NotFound { .. })
        ));
        assert!(matches!(
            env.assignment.assign_examiner(fx.room_ids[0], 9999, ACTOR),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reassigning_same_examiner_conflicts_other_examiner_replaces() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        let e2 = env.active_lecturer(fx.semester_id, "e2");
        env.available(e1.id, fx.day);
        env.available(e2.id, fx.day);

        env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR).unwrap();
        assert!(matches!(
            env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR),
            Err(EngineError::Conflict(_))
        ));

        let room = env.assignment.assign_examiner(fx.room_ids[0], e2.id, ACTOR).unwrap();
        assert_eq!(room.examiner_id, Some(e2.id));
        assert_eq!(env.room_examiner(fx.room_ids[0]), Some(e2.id));
    }

    #[test]
    fn test_overlapping_sittings_conflict() {
        let env = TestEnv::new();
        let fx = seed_phase_with_windows(
            &env,
            Some((t(9, 0), t(11, 0))),
            Some((t(10, 30), t(12, 0))),
        );
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        env.available(e1.id, fx.day);

        env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR).unwrap();
        let err = env.assignment.assign_examiner(fx.room_ids[1], e1.id, ACTOR).unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)), "got {:?}", err);
        assert_eq!(env.room_examiner(fx.room_ids[1]), None);
    }

    #[test]
    fn test_disjoint_sittings_can_share_examiner() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        env.available(e1.id, fx.day);

        env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR).unwrap();
        env.assignment.assign_examiner(fx.room_ids[1], e1.id, ACTOR).unwrap();
        assert_eq!(env.room_examiner(fx.room_ids[1]), Some(e1.id));
    }

    #[test]
    fn test_sitting_without_window_blocks_same_day() {
        let env = TestEnv::new();
        let fx = seed_phase_with_windows(&env, None, Some((t(14, 0), t(16, 0))));
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        env.available(e1.id, fx.day);

        env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR).unwrap();
        assert!(matches!(
            env.assignment.assign_examiner(fx.room_ids[1], e1.id, ACTOR),
            Err(EngineError::Conflict(_))
        ));
    }

    #[test]
    fn test_release_is_idempotent() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        env.available(e1.id, fx.day);
        env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR).unwrap();

        let room = env.assignment.release_examiner(fx.room_ids[0], ACTOR).unwrap();
        assert_eq!(room.examiner_id, None);
        let again = env.assignment.release_examiner(fx.room_ids[0], ACTOR).unwrap();
        assert_eq!(again.examiner_id, None);

        assert!(matches!(
            env.assignment.release_examiner(9999, ACTOR),
            Err(EngineError::NotFound { .. })
        ));

        let releases = env
            .repos
            .action_log_repo
            .find_by_room(fx.room_ids[0])
            .unwrap()
            .into_iter()
            .filter(|l| l.action_type == "RELEASE_EXAMINER")
            .count();
        assert_eq!(releases, 1);
    }

    #[test]
    fn test_remove_staffed_room_requires_force() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        env.available(e1.id, fx.day);
        env.assignment.assign_examiner(fx.room_ids[0], e1.id, ACTOR).unwrap();

        assert!(matches!(
            env.assignment.remove_room(fx.room_ids[0], false, ACTOR),
            Err(EngineError::Conflict(_))
        ));
        let removed = env.assignment.remove_room(fx.room_ids[0], true, ACTOR).unwrap();
        assert_eq!(removed.examiner_id, Some(e1.id));
        assert!(env.repos.room_repo.find_by_id(fx.room_ids[0]).unwrap().is_none());

        // 空闲考场无需强制
        env.assignment.remove_room(fx.room_ids[1], false, ACTOR).unwrap();
        assert!(matches!(
            env.assignment.remove_room(fx.room_ids[1], true, ACTOR),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_add_room_validates_input() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);

        assert!(matches!(
            env.assignment.add_room(fx.sub_ids[0], "   ", 7, ACTOR),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            env.assignment.add_room(9999, "C303", 7, ACTOR),
            Err(EngineError::NotFound { .. })
        ));

        let room = env.assignment.add_room(fx.sub_ids[0], " C303 ", 7, ACTOR).unwrap();
        assert_eq!(room.room_ref, "C303");
        assert_eq!(room.examiner_id, None);
    }

    #[test]
    fn test_eligible_examiners_are_sorted_by_phase_load() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let busy = env.active_lecturer(fx.semester_id, "busy");
        let idle = env.active_lecturer(fx.semester_id, "idle");
        let absent = env.active_lecturer(fx.semester_id, "absent");
        env.available(busy.id, fx.day);
        env.available(idle.id, fx.day);
        env.available(absent.id, d(2024, 5, 1));

        // busy 持有下午考场，上午考场仍可报（时间不冲突）
        env.assignment.assign_examiner(fx.room_ids[1], busy.id, ACTOR).unwrap();

        let eligible = env.assignment.list_eligible_examiners(fx.room_ids[0]).unwrap();
        let ids: Vec<i64> = eligible.iter().map(|e| e.examiner.id).collect();
        assert_eq!(ids, vec![idle.id, busy.id]);
        assert_eq!(eligible[1].phase_load, 1);
    }
}
