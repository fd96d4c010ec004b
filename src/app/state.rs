// ==========================================
// 考务监考排班系统 - 应用状态
// ==========================================
// 职责: 由单个 SQLite 文件装配全部仓储、引擎与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{AssignmentApi, Authorizer, DashboardApi, RegistrationApi, SchedulingApi};
use crate::config::{AssignmentPolicy, ConfigManager, PolicyConfigReader};
use crate::engine::{
    AggregationEngine, AssignmentEngine, AutoFillEngine, HierarchyEngine, RegistrationWorkflow,
    SchedulingRepositories,
};
use crate::importer::AvailabilityImporter;

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 调用方认证
    pub authorizer: Arc<dyn Authorizer>,

    /// 启动时加载的分配策略
    pub policy: AssignmentPolicy,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 监考指派API
    pub assignment_api: Arc<AssignmentApi>,

    /// 自助报名API
    pub registration_api: Arc<RegistrationApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,

    /// 排考层级维护API
    pub scheduling_api: Arc<SchedulingApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并执行迁移
    /// 2. 从 config_kv 加载分配策略
    /// 3. 初始化所有Repository / Engine / API
    pub fn new(db_path: String, authorizer: Arc<dyn Authorizer>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let mut conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::perf::install_sqlite_tracing(&mut conn);
        crate::db::migrate(&conn).map_err(|e| format!("数据库迁移失败: {}", e))?;

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)), authorizer)
    }

    /// 基于已迁移的共享连接装配
    pub fn from_connection(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Result<Self, String> {
        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let policy = match config_manager.load_policy() {
            Ok(policy) => policy,
            Err(e) => {
                tracing::warn!("加载分配策略失败: {}, 使用默认值", e);
                AssignmentPolicy::default()
            }
        };
        tracing::info!(
            allowed_roles = ?policy.allowed_roles,
            require_active = policy.require_active,
            default_top_n = policy.default_top_n,
            "分配策略已加载"
        );

        // ==========================================
        // Repository / Engine
        // ==========================================
        let repos = SchedulingRepositories::from_connection(conn, policy.lock_timeout);

        let assignment_engine = Arc::new(AssignmentEngine::new(repos.clone(), policy.clone()));
        let auto_fill_engine = Arc::new(AutoFillEngine::new(repos.clone(), policy.clone()));
        let registration_workflow = Arc::new(RegistrationWorkflow::new(repos.clone(), policy.clone()));
        let aggregation_engine = Arc::new(AggregationEngine::new(repos.clone(), policy.clone()));
        let hierarchy_engine = Arc::new(HierarchyEngine::new(repos.clone()));
        let importer = Arc::new(AvailabilityImporter::new(
            repos.examiner_repo.clone(),
            repos.action_log_repo.clone(),
        ));

        // ==========================================
        // API
        // ==========================================
        let assignment_api = Arc::new(AssignmentApi::new(assignment_engine, auto_fill_engine));
        let registration_api = Arc::new(RegistrationApi::new(registration_workflow));
        let dashboard_api = Arc::new(DashboardApi::new(
            aggregation_engine,
            repos.action_log_repo.clone(),
        ));
        let scheduling_api = Arc::new(SchedulingApi::new(hierarchy_engine, importer));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            authorizer,
            policy,
            config_manager,
            assignment_api,
            registration_api,
            dashboard_api,
            scheduling_api,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 EXAM_STAFFING_DB → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("EXAM_STAFFING_DB") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./exam_staffing.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        let dir = data_dir.join("exam-staffing-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("exam-staffing");

        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("exam_staffing.db");
        }
    }

    path.to_string_lossy().to_string()
}
