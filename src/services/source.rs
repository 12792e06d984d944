//! 数据源接口
//!
//! 聚合器只依赖这两个 trait，便于替换实现和在测试中计数调用

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::FetchResult;
use crate::models::{CompanyProfile, Quote, ScrapedData};

/// 行情与公司信息数据源
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// 指定日期的日线 OHLC；该日无数据时返回 `Fetched::Empty`
    async fn fetch_daily_quote(&self, symbol: &str, date: NaiveDate) -> FetchResult<Quote>;

    /// 公司信息；没有公司名称时返回 `Fetched::Empty`
    async fn fetch_company_profile(&self, symbol: &str) -> FetchResult<CompanyProfile>;
}

/// 区间表现与竞争对手数据源
#[async_trait]
pub trait ScrapeSource: Send + Sync {
    async fn fetch_performance_and_competitors(&self, symbol: &str) -> FetchResult<ScrapedData>;
}
