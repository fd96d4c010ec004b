// ==========================================
// 考务监考排班系统 - 可用日登记导入
// ==========================================
// 输入: CSV（表头 examiner_id,semester_id,day；day 格式 YYYY-MM-DD）
// 流程: 逐行反序列化 → 校验（日期 / 监考员存在 / 学期一致）→ 事务内批量写入
// 规则: 重复登记忽略（计入 duplicates）；问题行记入 rejected，不中断整批
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::examiner::Examiner;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::{ActionLogRepository, ExaminerRepository};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

const REQUIRED_COLUMNS: [&str; 3] = ["examiner_id", "semester_id", "day"];

/// CSV 行
#[derive(Debug, Deserialize)]
struct AvailabilityCsvRecord {
    examiner_id: i64,
    semester_id: i64,
    day: String,
}

/// 被拒绝的行（row 为数据行序号，从 1 开始，不含表头）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub row: usize,
    pub reason: String,
}

/// 导入汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub rejected: Vec<RejectedRow>,
}

// ==========================================
// AvailabilityImporter - 可用日导入器
// ==========================================
pub struct AvailabilityImporter {
    examiner_repo: Arc<ExaminerRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl AvailabilityImporter {
    pub fn new(examiner_repo: Arc<ExaminerRepository>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            examiner_repo,
            action_log_repo,
        }
    }

    /// 从文件导入
    #[instrument(skip(self), fields(path = %file_path.display()))]
    pub fn import_file(&self, file_path: &Path, actor: &str) -> ImportResult<ImportSummary> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }
        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(ext.to_string_lossy().to_string()));
            }
        }
        let file = File::open(file_path)?;
        self.import_reader(file, actor)
    }

    /// 从任意读取源导入
    pub fn import_reader<R: Read>(&self, reader: R, actor: &str) -> ImportResult<ImportSummary> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(ImportError::MissingColumn(column.to_string()));
            }
        }

        let mut summary = ImportSummary::default();
        let mut parsed: Vec<(usize, i64, i64, NaiveDate)> = Vec::new();
        for (idx, result) in reader.deserialize::<AvailabilityCsvRecord>().enumerate() {
            let row = idx + 1;
            summary.total_rows += 1;
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    summary.rejected.push(RejectedRow {
                        row,
                        reason: format!("行解析失败: {}", e),
                    });
                    continue;
                }
            };
            match NaiveDate::parse_from_str(&record.day, "%Y-%m-%d") {
                Ok(day) => parsed.push((row, record.examiner_id, record.semester_id, day)),
                Err(_) => summary.rejected.push(RejectedRow {
                    row,
                    reason: format!("日期格式错误: 期望 YYYY-MM-DD，实际 {}", record.day),
                }),
            }
        }

        let examiner_ids: Vec<i64> = parsed
            .iter()
            .map(|(_, id, _, _)| *id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let examiners: HashMap<i64, Examiner> = self
            .examiner_repo
            .find_by_ids(&examiner_ids)?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let mut rows = Vec::with_capacity(parsed.len());
        for (row, examiner_id, semester_id, day) in parsed {
            match examiners.get(&examiner_id) {
                None => summary.rejected.push(RejectedRow {
                    row,
                    reason: format!("监考员不存在: {}", examiner_id),
                }),
                Some(e) if e.semester_id != semester_id => summary.rejected.push(RejectedRow {
                    row,
                    reason: format!(
                        "学期不一致: 监考员 {} 属于学期 {}，行内为 {}",
                        examiner_id, e.semester_id, semester_id
                    ),
                }),
                Some(_) => rows.push((examiner_id, semester_id, day)),
            }
        }

        let outcome = self.examiner_repo.batch_add_log_times(&rows)?;
        summary.inserted = outcome.inserted;
        summary.duplicates = outcome.duplicates;
        summary.rejected.sort_by_key(|r| r.row);

        tracing::info!(
            total_rows = summary.total_rows,
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            rejected = summary.rejected.len(),
            "可用日导入完成"
        );

        let log = ActionLog::now(ActionType::ImportAvailability, actor).with_payload(json!({
            "total_rows": summary.total_rows,
            "inserted": summary.inserted,
            "duplicates": summary.duplicates,
            "rejected": summary.rejected.len(),
        }));
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!(error = %e, "操作日志写入失败");
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::examiner::NewExaminer;
    use crate::domain::types::{ExaminerRole, ExaminerStatus};
    use std::sync::Mutex;

    fn setup() -> (AvailabilityImporter, Arc<ExaminerRepository>) {
        let conn = open_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO semester (season, year) VALUES ('SUMMER', 2024);
             INSERT INTO semester (season, year) VALUES ('FALL', 2024);",
        )
        .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let examiner_repo = Arc::new(ExaminerRepository::new(conn.clone()));
        examiner_repo
            .create(&NewExaminer {
                semester_id: 1,
                email: "e1@uni.edu".to_string(),
                name: "E1".to_string(),
                role: ExaminerRole::Lecturer,
                status: ExaminerStatus::Active,
            })
            .unwrap();
        let importer = AvailabilityImporter::new(
            examiner_repo.clone(),
            Arc::new(ActionLogRepository::new(conn)),
        );
        (importer, examiner_repo)
    }

    #[test]
    fn test_mixed_rows_are_reported_per_row() {
        let (importer, examiner_repo) = setup();
        let csv = "examiner_id,semester_id,day\n\
                   1,1,2024-05-02\n\
                   1,1,2024-05-02\n\
                   1,1,02/05/2024\n\
                   99,1,2024-05-03\n\
                   1,2,2024-05-03\n\
                   x,1,2024-05-03\n\
                   1,1,2024-05-03\n";
        let summary = importer.import_reader(csv.as_bytes(), "staff").unwrap();

        assert_eq!(summary.total_rows, 7);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(
            summary.rejected.iter().map(|r| r.row).collect::<Vec<_>>(),
            vec![3, 4, 5, 6]
        );

        let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        assert_eq!(examiner_repo.list_log_times_in_range(d(1), d(31)).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_column_fails_whole_import() {
        let (importer, _) = setup();
        let err = importer
            .import_reader("examiner_id,day\n1,2024-05-02\n".as_bytes(), "staff")
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(c) if c == "semester_id"));
    }
}
