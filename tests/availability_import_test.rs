// ==========================================
// 可用日导入测试（文件路径入口）
// ==========================================


#[cfg(test)]
mod availability_import_test {
    use crate::test_helpers::{d, seed_phase, TestEnv};
    use exam_staffing::engine::AvailableExaminers;
    use exam_staffing::importer::{AvailabilityImporter, ImportError};
    use std::io::Write;
    use std::path::Path;
    use tempfile::Builder;

    fn importer(env: &TestEnv) -> AvailabilityImporter {
        AvailabilityImporter::new(env.repos.examiner_repo.clone(), env.repos.action_log_repo.clone())
    }

    #[test]
    fn test_import_csv_file_feeds_availability() {
        let env = TestEnv::new();
        let fx = seed_phase(&env);
        let e1 = env.active_lecturer(fx.semester_id, "e1");
        let e2 = env.active_lecturer(fx.semester_id, "e2");

        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "examiner_id,semester_id,day").unwrap();
        writeln!(file, "{},{},2024-05-02", e1.id, fx.semester_id).unwrap();
        writeln!(file, " {} , {} , 2024-05-03 ", e2.id, fx.semester_id).unwrap();
        writeln!(file, "{},{},2024-07-01", e2.id, fx.semester_id).unwrap();
        file.flush().unwrap();

        let summary = importer(&env).import_file(file.path(), "staff").unwrap();
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.inserted, 3);
        assert!(summary.rejected.is_empty());

        // 窗口外的登记不计入阶段
        assert_eq!(
            env.aggregation.count_available_examiners(fx.phase_id).unwrap(),
            AvailableExaminers::Examiners {
                total: 2,
                examiner_ids: vec![e1.id, e2.id]
            }
        );
        assert!(env
            .assignment
            .list_eligible_examiners(fx.room_ids[0])
            .unwrap()
            .iter()
            .any(|e| e.examiner.id == e1.id));

        // 重复导入全部计为重复
        let again = importer(&env).import_file(file.path(), "staff").unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.duplicates, 3);

        let rows = env
            .repos
            .examiner_repo
            .list_log_times_in_range(d(2024, 5, 1), d(2024, 7, 31))
            .unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_import_rejects_bad_paths() {
        let env = TestEnv::new();
        let err = importer(&env)
            .import_file(Path::new("/nonexistent/availability.csv"), "staff")
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));

        let file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = importer(&env).import_file(file.path(), "staff").unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }
}
