// ==========================================
// 异步命令层测试
// ==========================================
// 覆盖: 令牌认证、角色门槛、错误码映射、调用时限
// ==========================================


#[cfg(test)]
mod commands_test {
    use crate::test_helpers::{seed_phase, PhaseFixture, TestEnv};
    use exam_staffing::api::{ActorRole, CallerIdentity, StaticTokenAuthorizer};
    use exam_staffing::app::{commands, AppState};
    use exam_staffing::domain::examiner::Examiner;
    use exam_staffing::engine::DistinctExaminers;
    use std::sync::Arc;
    use std::time::Duration;

    const DEADLINE: Duration = Duration::from_secs(10);

    struct CommandEnv {
        env: TestEnv,
        fx: PhaseFixture,
        e1: Examiner,
        state: AppState,
    }

    fn setup() -> CommandEnv {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        env.available(e1.id, fx.day);

        let authorizer = StaticTokenAuthorizer::new()
            .with_token("staff", CallerIdentity::new("staff-1", ActorRole::Staff, None))
            .with_token("lecturer", CallerIdentity::new("e1", ActorRole::Lecturer, Some(e1.id)))
            .with_token("student", CallerIdentity::new("stu", ActorRole::Student, None));
        let state =
            AppState::from_connection(env.db_path.clone(), env.conn.clone(), Arc::new(authorizer))
                .unwrap();

        CommandEnv { env, fx, e1, state }
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let ctx = setup();
        let err = commands::count_staffed_rooms(&ctx.state, "nope", ctx.fx.phase_id, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.code, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_role_gates() {
        let ctx = setup();
        let err = commands::assign_examiner(&ctx.state, "student", ctx.fx.room_ids[0], ctx.e1.id, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.code, "UNAUTHORIZED");

        // 讲师不能查看驾驶舱
        let err = commands::count_distinct_examiners(&ctx.state, "lecturer", ctx.fx.phase_id, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.code, "UNAUTHORIZED");

        // 教务员没有监考员身份，不能自助报名
        let err = commands::register_for_room(&ctx.state, "staff", ctx.fx.room_ids[0], DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.code, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_register_and_dashboard_flow() {
        let ctx = setup();
        let outcome = commands::register_for_room(&ctx.state, "lecturer", ctx.fx.room_ids[0], DEADLINE)
            .await
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(ctx.env.room_examiner(ctx.fx.room_ids[0]), Some(ctx.e1.id));

        let staffed = commands::count_staffed_rooms(&ctx.state, "staff", ctx.fx.phase_id, DEADLINE)
            .await
            .unwrap();
        assert_eq!(staffed, 1);

        let distinct = commands::count_distinct_examiners(&ctx.state, "staff", ctx.fx.phase_id, DEADLINE)
            .await
            .unwrap();
        assert!(matches!(distinct, DistinctExaminers::Examiners { total: 1, .. }));

        let top = commands::top_examiners_by_load(&ctx.state, "staff", ctx.fx.phase_id, None, DEADLINE)
            .await
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].examiner_id, ctx.e1.id);

        let outcome = commands::unregister_from_room(&ctx.state, "lecturer", ctx.fx.room_ids[0], DEADLINE)
            .await
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(ctx.env.room_examiner(ctx.fx.room_ids[0]), None);
    }

    #[tokio::test]
    async fn test_auto_fill_and_error_codes() {
        let ctx = setup();
        let summary = commands::auto_fill_slot(&ctx.state, "staff", ctx.fx.slot_id, DEADLINE)
            .await
            .unwrap();
        assert_eq!(summary.assigned, 1);
        assert_eq!(summary.unstaffed, 1);

        let err = commands::auto_fill_slot(&ctx.state, "staff", 9999, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");

        let err = commands::remove_room(&ctx.state, "staff", summary.assignments[0].id, false, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.code, "CONFLICT");

        let err = commands::list_recent_actions(&ctx.state, "staff", 0, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.code, "INVALID_INPUT");

        let logs = commands::list_recent_actions(&ctx.state, "staff", 20, DEADLINE)
            .await
            .unwrap();
        assert!(logs.iter().any(|l| l.action_type == "AUTO_FILL" && l.actor == "staff-1"));
    }

    #[tokio::test]
    async fn test_unavailable_maps_to_code() {
        let ctx = setup();
        let e2 = ctx.env.active_lecturer(ctx.fx.semester_id, "e2");
        let err = commands::assign_examiner(&ctx.state, "staff", ctx.fx.room_ids[0], e2.id, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err.code, "UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_internal_error() {
        let ctx = setup();

        // 占住共享连接，使阻塞任务无法在时限内完成
        let guard = ctx.env.conn.lock().unwrap();
        let err = commands::count_staffed_rooms(
            &ctx.state,
            "staff",
            ctx.fx.phase_id,
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        drop(guard);

        assert_eq!(err.code, "INTERNAL_ERROR");

        // 连接释放后恢复正常
        let staffed = commands::count_staffed_rooms(&ctx.state, "staff", ctx.fx.phase_id, DEADLINE)
            .await
            .unwrap();
        assert_eq!(staffed, 0);
    }

    #[test]
    fn test_parse_date() {
        assert!(commands::parse_date("2024-05-02").is_ok());
        let err = commands::parse_date("02/05/2024").unwrap_err();
        assert_eq!(err.code, "INVALID_INPUT");
    }
}
