// ==========================================
// 考务监考排班系统 - 命令行入口
// ==========================================
// 用法:
//   exam-staffing phases
//   exam-staffing dashboard <phase_id> [top_n]
//   exam-staffing autofill <exam_slot_id>
//   exam-staffing import-availability <csv_path>
// 数据库: EXAM_STAFFING_DB 或用户数据目录下默认路径
// ==========================================

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use exam_staffing::api::{CallerIdentity, StaticTokenAuthorizer};
use exam_staffing::app::{commands, get_default_db_path, AppState, ErrorResponse};
use serde::Serialize;

const CLI_TOKEN: &str = "cli";
const COMMAND_DEADLINE: Duration = Duration::from_secs(30);

fn usage() -> &'static str {
    "用法: exam-staffing <phases | dashboard <phase_id> [top_n] | autofill <exam_slot_id> | import-availability <csv_path>>"
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn command_error(err: ErrorResponse) -> Box<dyn Error> {
    format!("[{}] {}", err.code, err.message).into()
}

fn parse_id(raw: Option<String>, field: &str) -> Result<i64, Box<dyn Error>> {
    let raw = raw.ok_or_else(|| format!("缺少参数 {}\n{}", field, usage()))?;
    Ok(raw.trim().parse::<i64>().map_err(|e| format!("{} 无效: {}", field, e))?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    exam_staffing::logging::init();

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        eprintln!("{}", usage());
        return Ok(());
    };

    let db_path = get_default_db_path();
    tracing::info!(version = exam_staffing::VERSION, db_path = %db_path, "{}", exam_staffing::APP_NAME);

    let authorizer = StaticTokenAuthorizer::new().with_token(CLI_TOKEN, CallerIdentity::system("cli"));
    let state = AppState::new(db_path, Arc::new(authorizer))?;

    match command.as_str() {
        "phases" => {
            let phases = commands::list_phases(&state, CLI_TOKEN, COMMAND_DEADLINE)
                .await
                .map_err(command_error)?;
            print_json(&phases)?;
        }
        "dashboard" => {
            let phase_id = parse_id(args.next(), "phase_id")?;
            let top_n = args.next().and_then(|s| s.trim().parse::<usize>().ok());

            // 各项统计相互独立，并发执行
            let (distinct, staffed, utilization, available, top) = futures::join!(
                commands::count_distinct_examiners(&state, CLI_TOKEN, phase_id, COMMAND_DEADLINE),
                commands::count_staffed_rooms(&state, CLI_TOKEN, phase_id, COMMAND_DEADLINE),
                commands::get_slot_utilization(&state, CLI_TOKEN, phase_id, COMMAND_DEADLINE),
                commands::count_available_examiners(&state, CLI_TOKEN, phase_id, COMMAND_DEADLINE),
                commands::top_examiners_by_load(&state, CLI_TOKEN, phase_id, top_n, COMMAND_DEADLINE),
            );

            print_json(&serde_json::json!({
                "phase_id": phase_id,
                "distinct_examiners": distinct.map_err(command_error)?,
                "staffed_rooms": staffed.map_err(command_error)?,
                "utilization": utilization.map_err(command_error)?,
                "available_examiners": available.map_err(command_error)?,
                // 无人持有考场时 Top-N 为空
                "top_examiners": top.ok(),
            }))?;
        }
        "autofill" => {
            let slot_id = parse_id(args.next(), "exam_slot_id")?;
            let summary = commands::auto_fill_slot(&state, CLI_TOKEN, slot_id, COMMAND_DEADLINE)
                .await
                .map_err(command_error)?;
            print_json(&summary)?;
        }
        "import-availability" => {
            let path = args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| format!("缺少参数 csv_path\n{}", usage()))?;
            let summary = commands::import_availability(&state, CLI_TOKEN, path, COMMAND_DEADLINE)
                .await
                .map_err(command_error)?;
            print_json(&summary)?;
        }
        other => {
            eprintln!("未知命令: {}\n{}", other, usage());
        }
    }

    Ok(())
}
