// ==========================================
// 销售库存分析系统 - 应用状态
// ==========================================
// 职责: 组装数据源、缓存、刷新服务与 API 实例
// 启动约束: 所有数据源都不可达时拒绝启动
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::DashboardApi;
use crate::cache::payload::DashboardCache;
use crate::cache::ttl_cache::TtlCache;
use crate::config::{ConfigManager, DashboardConfig, DashboardConfigReader};
use crate::domain::types::DataSource;
use crate::repository::product_repo::ProductRepository;
use crate::repository::source_adapter::SourceAdapter;
use crate::repository::sqlite_source::SqliteSourceAdapter;
use crate::services::refresh_service::DashboardRefreshService;

/// 环境变量: 数据目录 / 各数据库路径 / 监听地址
pub const ENV_DATA_DIR: &str = "SALES_STOCK_VISTA_DATA_DIR";
pub const ENV_POS_DB: &str = "SALES_STOCK_VISTA_POS_DB";
pub const ENV_ERP_DB: &str = "SALES_STOCK_VISTA_ERP_DB";
pub const ENV_SETTINGS_DB: &str = "SALES_STOCK_VISTA_SETTINGS_DB";
pub const ENV_BIND_ADDR: &str = "SALES_STOCK_VISTA_BIND";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5004";

/// 数据库文件位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// POS 库（零售门店）
    pub pos_db: PathBuf,
    /// ERP 库（批发订单）
    pub erp_db: PathBuf,
    /// 本地配置库（config_kv）
    pub settings_db: PathBuf,
}

impl DataPaths {
    /// 同一目录下的默认文件名
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            pos_db: dir.join("pos.db"),
            erp_db: dir.join("erp.db"),
            settings_db: dir.join("settings.db"),
        }
    }

    /// 按环境变量解析，未设置的项落到默认数据目录
    pub fn from_env() -> Self {
        let defaults = Self::in_dir(&get_default_data_dir());
        Self {
            pos_db: env_path(ENV_POS_DB).unwrap_or(defaults.pos_db),
            erp_db: env_path(ENV_ERP_DB).unwrap_or(defaults.erp_db),
            settings_db: env_path(ENV_SETTINGS_DB).unwrap_or(defaults.settings_db),
        }
    }

    pub fn source_db(&self, source: DataSource) -> &Path {
        match source {
            DataSource::Pos => &self.pos_db,
            DataSource::Erp => &self.erp_db,
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// 获取默认数据目录
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_data_dir() -> PathBuf {
    if let Some(dir) = env_path(ENV_DATA_DIR) {
        return dir;
    }

    match dirs::data_dir() {
        Some(data_dir) => {
            // 开发环境使用独立目录，避免污染生产数据
            #[cfg(debug_assertions)]
            let dir = data_dir.join("sales-stock-vista-dev");
            #[cfg(not(debug_assertions))]
            let dir = data_dir.join("sales-stock-vista");

            // 目录创建失败不阻塞启动，后续打开数据库时会给出明确错误
            if let Err(e) = std::fs::create_dir_all(&dir) {
                tracing::warn!(path = %dir.display(), error = %e, "数据目录创建失败");
            }
            dir
        }
        None => PathBuf::from("."),
    }
}

/// HTTP 监听地址
pub fn get_bind_addr() -> String {
    std::env::var(ENV_BIND_ADDR)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
}

/// 应用状态
///
/// 路由处理器与后台调度器共享同一份实例
pub struct AppState {
    pub paths: DataPaths,
    pub config: DashboardConfig,
    pub repository: Arc<ProductRepository>,
    pub refresh_service: Arc<DashboardRefreshService>,
    pub dashboard_api: Arc<DashboardApi>,
}

impl AppState {
    /// 读取配置库并组装应用状态
    ///
    /// 配置库打不开时使用默认配置继续启动
    pub async fn new(paths: DataPaths) -> Result<Self, String> {
        tracing::info!(
            settings_db = %paths.settings_db.display(),
            "初始化AppState"
        );

        let config_manager = match ConfigManager::new(&paths.settings_db.to_string_lossy()) {
            Ok(manager) => manager,
            Err(e) => {
                tracing::warn!(error = %e, "配置库不可用，使用默认配置");
                ConfigManager::with_defaults()
            }
        };

        match config_manager.get_config_snapshot() {
            Ok(overrides) if !overrides.is_empty() => {
                tracing::info!(overrides = ?overrides, "已读取配置覆写");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "读取配置覆写失败"),
        }

        let config = config_manager
            .load_dashboard_config()
            .await
            .map_err(|e| format!("加载配置失败: {}", e))?;

        Self::with_config(paths, config)
    }

    /// 使用给定配置组装应用状态
    ///
    /// # 返回
    /// - Err: 没有任何可达的数据源
    pub fn with_config(paths: DataPaths, config: DashboardConfig) -> Result<Self, String> {
        let config = config.normalized();

        // ==========================================
        // 数据源适配器
        // ==========================================
        let adapters: Vec<Arc<dyn SourceAdapter>> = DataSource::ALL
            .iter()
            .map(|source| {
                Arc::new(SqliteSourceAdapter::new(
                    *source,
                    paths.source_db(*source),
                    config.query_timeout(),
                )) as Arc<dyn SourceAdapter>
            })
            .collect();
        let repository = Arc::new(ProductRepository::new(adapters));

        let reachable = repository.reachable_sources();
        if reachable.is_empty() {
            return Err(format!(
                "没有可用的数据源: POS={} ERP={}",
                paths.pos_db.display(),
                paths.erp_db.display()
            ));
        }
        tracing::info!(sources = ?reachable, "可用数据源");

        // ==========================================
        // 缓存与服务
        // ==========================================
        let cache: Arc<DashboardCache> = Arc::new(TtlCache::new(config.cache_ttl()));
        let refresh_service = Arc::new(DashboardRefreshService::new(
            repository.clone(),
            cache,
            config.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(refresh_service.clone()));

        tracing::info!(
            cache_ttl_secs = config.cache_ttl_secs,
            restock_policy = %config.restock_policy,
            "AppState初始化完成"
        );

        Ok(Self {
            paths,
            config,
            repository,
            refresh_service,
            dashboard_api,
        })
    }
}
