//! 股票数据聚合服务
//!
//! 合并 Polygon 行情、公司信息与 MarketWatch 页面数据，
//! 结果在内存中缓存 5 分钟，并提供购买记录写入接口

mod cache;      // 过期缓存
mod config;     // 配置加载
mod error;      // 数据源错误类型
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 数据源与聚合逻辑

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer, middleware::Logger};
use anyhow::Context;
use env_logger::Env;

use crate::cache::ExpiringCache;
use crate::config::AppConfig;
use crate::services::aggregator::StockAggregator;
use crate::services::marketwatch::MarketWatchClient;
use crate::services::polygon::PolygonClient;
use crate::services::purchase::{MemoryPurchaseStore, PgPurchaseStore, PurchaseStore};

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 初始化日志系统，默认日志级别为 info
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::load();

    // 缺少 POLYGON_API_KEY 时直接退出
    let polygon = PolygonClient::new(&config.polygon).context("初始化 Polygon 客户端失败")?;
    let marketwatch =
        MarketWatchClient::new(&config.marketwatch).context("初始化 MarketWatch 客户端失败")?;

    let cache = Arc::new(ExpiringCache::new(Duration::from_secs(config.cache.ttl_secs)));
    let aggregator = web::Data::new(
        StockAggregator::new(Arc::new(polygon), Arc::new(marketwatch), cache)
            .with_quote_date_offset(config.cache.quote_date_offset_days),
    );

    let store: Arc<dyn PurchaseStore> = if config.database.url.is_empty() {
        log::warn!("未设置 DATABASE_URL，购买记录仅保存在内存中");
        Arc::new(MemoryPurchaseStore::new())
    } else {
        Arc::new(PgPurchaseStore::connect(&config.database.url).await?)
    };
    let store = web::Data::from(store);

    let bind_addr = config.bind_addr();
    log::info!(
        "启动股票数据服务 {}（缓存 {} 秒）",
        bind_addr,
        aggregator.cache().ttl().as_secs()
    );

    let app_aggregator = aggregator.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(app_aggregator.clone())
            .app_data(store.clone())
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_addr)?.run().await?;

    aggregator.cache().clear();
    log::info!("服务已停止");
    Ok(())
}
