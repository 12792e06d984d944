//! 购买记录模型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 新记录的默认状态
pub const PURCHASE_STATUS_RECORDED: &str = "recorded";

/// POST /stock/{symbol} 请求体
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// 购买数量
    pub amount: f64,
}

/// 已保存的购买记录
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PurchaseRecord {
    pub id: i64,
    pub company_code: String,
    pub purchased_amount: f64,
    pub purchased_status: String,
    pub request_data: NaiveDate,
}

/// 待写入的购买记录
#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    pub company_code: String,
    pub purchased_amount: f64,
    pub request_data: NaiveDate,
}
