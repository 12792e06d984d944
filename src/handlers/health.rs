use actix_web::{web, HttpResponse, Result};
use serde::Serialize;
use crate::models::ApiResponse;
use crate::services::aggregator::StockAggregator;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    /// 缓存中的股票数（含未淘汰的过期条目）
    pub cached_symbols: usize,
}

pub async fn health_check(aggregator: web::Data<StockAggregator>) -> Result<HttpResponse> {
    let response = ApiResponse::success(HealthStatus {
        status: "healthy",
        cached_symbols: aggregator.cache().len(),
    });
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
