//! 股票接口处理器
//!
//! - GET /stock/{symbol} - 获取聚合后的股票数据（5 分钟缓存）
//! - POST /stock/{symbol} - 记录购买数量

use actix_web::{http::StatusCode, web, HttpResponse, Result};
use crate::models::{AggregatedStock, ApiResponse, NewPurchase, PurchaseRecord, PurchaseRequest};
use crate::services::aggregator::{market_today, normalize_symbol, StockAggregator};
use crate::services::purchase::PurchaseStore;

pub async fn get_stock(
    path: web::Path<String>,
    aggregator: web::Data<StockAggregator>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();
    if symbol.trim().is_empty() {
        let response = ApiResponse::<AggregatedStock>::error("股票代码不能为空".to_string());
        return Ok(HttpResponse::BadRequest().json(response));
    }

    match aggregator.get_stock(&symbol).await {
        Ok(stock) => {
            let response = ApiResponse::success(stock);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let response = ApiResponse::<AggregatedStock>::error(e.to_string());
            Ok(HttpResponse::build(status).json(response))
        }
    }
}

pub async fn add_purchase(
    path: web::Path<String>,
    body: web::Json<PurchaseRequest>,
    store: web::Data<dyn PurchaseStore>,
) -> Result<HttpResponse> {
    let symbol = normalize_symbol(&path.into_inner());
    let amount = body.amount;

    if symbol.is_empty() || !amount.is_finite() || amount <= 0.0 {
        let response = ApiResponse::<PurchaseRecord>::error("股票代码不能为空，购买数量必须大于 0".to_string());
        return Ok(HttpResponse::BadRequest().json(response));
    }

    let purchase = NewPurchase {
        company_code: symbol.clone(),
        purchased_amount: amount,
        request_data: market_today(),
    };

    match store.record(purchase).await {
        Ok(record) => {
            log::info!("已记录 {} 的购买数量 {} (ID: {})", symbol, amount, record.id);
            let message = format!("{} units of stock {} were added to your stock record", amount, symbol);
            let response = ApiResponse::with_message(record, message);
            Ok(HttpResponse::Created().json(response))
        }
        Err(e) => {
            log::error!("保存 {} 的购买记录失败: {:#}", symbol, e);
            let response = ApiResponse::<PurchaseRecord>::error(format!("Failed to add stock record: {}", e));
            Ok(HttpResponse::InternalServerError().json(response))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/stock/{symbol}")
            .route(web::get().to(get_stock))
            .route(web::post().to(add_purchase))
    );
}
