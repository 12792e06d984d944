//! 股票数据模型
//!
//! 定义聚合结果及其组成部分。JSON 字段名与旧版接口保持一致。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 公司名称缺失时的占位值
pub const NOT_AVAILABLE: &str = "N/A";

/// 日线 OHLC 数据，缺失的字段为 0.0
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Quote {
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub close: f64,
}

/// 公司基本信息
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompanyProfile {
    #[serde(rename = "company_name")]
    pub name: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: NOT_AVAILABLE.to_string(),
        }
    }
}

/// 区间涨跌幅（百分比）
///
/// 只有在页面中找到并成功解析的字段才有值
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct PerformanceMetrics {
    pub five_days: Option<f64>,
    pub one_month: Option<f64>,
    pub three_months: Option<f64>,
    pub year_to_date: Option<f64>,
    pub one_year: Option<f64>,
}

impl PerformanceMetrics {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 市值（绝对数值，非 "1.2B" 简写）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MarketCap {
    pub currency: String,
    pub value: f64,
}

/// 竞争对手
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Competitor {
    pub name: String,
    pub market_cap: MarketCap,
}

/// 抓取页面得到的数据
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ScrapedData {
    pub performance: PerformanceMetrics,
    /// 按页面顺序排列
    pub competitors: Vec<Competitor>,
}

impl ScrapedData {
    pub fn is_empty(&self) -> bool {
        self.performance.is_empty() && self.competitors.is_empty()
    }
}

/// 聚合后的股票数据
///
/// 每次缓存未命中时生成一次，之后不再修改
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AggregatedStock {
    /// "Success" 加上各数据源的降级说明
    pub status: String,
    #[serde(rename = "request_data")]
    pub request_date: NaiveDate,
    #[serde(rename = "company_code")]
    pub symbol_code: String,
    #[serde(flatten)]
    pub profile: CompanyProfile,
    #[serde(rename = "stock_values")]
    pub quote: Quote,
    #[serde(rename = "performance_data")]
    pub performance: PerformanceMetrics,
    pub competitors: Vec<Competitor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregated_stock_json_fields() {
        let stock = AggregatedStock {
            status: "Success".to_string(),
            request_date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            symbol_code: "AAPL".to_string(),
            profile: CompanyProfile { name: "Apple Inc.".to_string() },
            quote: Quote { open: 130.0, high: 132.0, low: 129.5, close: 131.5 },
            performance: PerformanceMetrics { five_days: Some(1.5), ..Default::default() },
            competitors: vec![Competitor {
                name: "Microsoft Corp.".to_string(),
                market_cap: MarketCap { currency: "USD".to_string(), value: 2.0e12 },
            }],
        };

        let json = serde_json::to_value(&stock).unwrap();
        assert_eq!(json["request_data"], "2024-01-09");
        assert_eq!(json["company_code"], "AAPL");
        assert_eq!(json["company_name"], "Apple Inc.");
        assert_eq!(json["stock_values"]["close"], 131.5);
        assert_eq!(json["performance_data"]["five_days"], 1.5);
        assert!(json["performance_data"]["one_year"].is_null());
        assert_eq!(json["competitors"][0]["market_cap"]["currency"], "USD");

        let back: AggregatedStock = serde_json::from_value(json).unwrap();
        assert_eq!(back, stock);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(CompanyProfile::default().name, "N/A");
        assert_eq!(Quote::default(), Quote { open: 0.0, high: 0.0, low: 0.0, close: 0.0 });
        assert!(ScrapedData::default().is_empty());
    }
}
