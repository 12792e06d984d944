//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，环境变量（含 .env 文件）优先级更高

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// Polygon 行情接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonConfig {
    /// API Key（必填）
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_polygon_base_url")]
    pub base_url: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_polygon_timeout")]
    pub timeout_secs: u64,
}

/// MarketWatch 页面抓取配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketWatchConfig {
    /// 浏览器会话 Cookie，用于绕过反爬检测（可为空）
    #[serde(default)]
    pub cookie: String,
    #[serde(default = "default_marketwatch_base_url")]
    pub base_url: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_marketwatch_timeout")]
    pub timeout_secs: u64,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 缓存有效期（秒）
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    /// 行情日期相对今天往前推的天数
    #[serde(default = "default_quote_date_offset")]
    pub quote_date_offset_days: u32,
}

/// 数据库配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL 连接串，为空时购买记录只保存在内存
    #[serde(default)]
    pub url: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polygon: PolygonConfig,
    #[serde(default)]
    pub marketwatch: MarketWatchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_polygon_base_url() -> String { "https://api.polygon.io".to_string() }
fn default_polygon_timeout() -> u64 { 10 }
fn default_marketwatch_base_url() -> String { "https://www.marketwatch.com".to_string() }
fn default_marketwatch_timeout() -> u64 { 15 }
fn default_cache_ttl() -> u64 { crate::cache::DEFAULT_TTL_SECS }
fn default_quote_date_offset() -> u32 { 2 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for PolygonConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_polygon_base_url(),
            timeout_secs: default_polygon_timeout(),
        }
    }
}

impl Default for MarketWatchConfig {
    fn default() -> Self {
        Self {
            cookie: String::new(),
            base_url: default_marketwatch_base_url(),
            timeout_secs: default_marketwatch_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            quote_date_offset_days: default_quote_date_offset(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值，最后应用环境变量
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.apply_env(|key| env::var(key).ok());
        config
    }

    fn load_file() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("使用默认配置");
        Self::default()
    }

    /// 用环境变量覆盖配置项，`lookup` 便于测试时替换
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(port) = get("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(v) = get("POLYGON_API_KEY") {
            self.polygon.api_key = v;
        }
        if let Some(v) = get("POLYGON_BASE_URL") {
            self.polygon.base_url = v;
        }
        if let Some(v) = get("MARKETWATCH_COOKIE") {
            self.marketwatch.cookie = v;
        }
        if let Some(v) = get("MARKETWATCH_BASE_URL") {
            self.marketwatch.base_url = v;
        }
        if let Some(ttl) = get("CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.cache.ttl_secs = ttl;
        }
        if let Some(days) = get("QUOTE_DATE_OFFSET_DAYS").and_then(|v| v.parse().ok()) {
            self.cache.quote_date_offset_days = days;
        }
        if let Some(v) = get("DATABASE_URL") {
            self.database.url = v;
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
