//! 股票数据聚合
//!
//! 查询缓存，未命中时并发请求三个子数据源，按固定顺序合并结果：
//! 1. Polygon 日线行情
//! 2. Polygon 公司信息
//! 3. MarketWatch 区间表现与竞争对手
//!
//! 子数据源无数据时使用默认值并在 status 后追加说明；
//! 任一子数据源硬失败则整个请求失败，且不写缓存。

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::America::New_York;
use futures::future::try_join3;

use crate::cache::ExpiringCache;
use crate::error::{FetchError, Fetched};
use crate::models::{AggregatedStock, CompanyProfile, Quote, ScrapedData};
use crate::services::source::{QuoteSource, ScrapeSource};

pub const STATUS_SUCCESS: &str = "Success";
pub const QUOTE_UNAVAILABLE: &str = " (Polygon daily data not available)";
pub const PROFILE_UNAVAILABLE: &str = " (Company name not found)";
pub const SCRAPE_UNAVAILABLE: &str = " (MarketWatch data not available)";

/// 默认取两天前的日线（跳过当日未收盘和结算延迟）
pub const DEFAULT_QUOTE_DATE_OFFSET_DAYS: u32 = 2;

/// 美股市场所在时区的当前日期
pub fn market_today() -> NaiveDate {
    Utc::now().with_timezone(&New_York).date_naive()
}

/// 股票代码规范化，同时作为缓存键
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

pub struct StockAggregator {
    quotes: Arc<dyn QuoteSource>,
    scraper: Arc<dyn ScrapeSource>,
    cache: Arc<ExpiringCache<AggregatedStock>>,
    quote_date_offset_days: u32,
}

impl StockAggregator {
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        scraper: Arc<dyn ScrapeSource>,
        cache: Arc<ExpiringCache<AggregatedStock>>,
    ) -> Self {
        Self {
            quotes,
            scraper,
            cache,
            quote_date_offset_days: DEFAULT_QUOTE_DATE_OFFSET_DAYS,
        }
    }

    pub fn with_quote_date_offset(mut self, days: u32) -> Self {
        self.quote_date_offset_days = days;
        self
    }

    pub fn cache(&self) -> &ExpiringCache<AggregatedStock> {
        &self.cache
    }

    /// 获取聚合后的股票数据，请求日期为美东当日
    pub async fn get_stock(&self, symbol: &str) -> Result<AggregatedStock, FetchError> {
        self.get_stock_on(symbol, market_today()).await
    }

    /// 以 `today` 作为请求日期获取聚合数据
    pub async fn get_stock_on(
        &self,
        symbol: &str,
        today: NaiveDate,
    ) -> Result<AggregatedStock, FetchError> {
        let symbol = normalize_symbol(symbol);

        if let Some(stock) = self.cache.get(&symbol) {
            log::info!("{} 命中缓存", symbol);
            return Ok(stock);
        }
        log::info!("{} 未命中缓存，请求外部数据源", symbol);

        let quote_date = today - Duration::days(i64::from(self.quote_date_offset_days));

        let (quote, profile, scraped) = try_join3(
            self.quotes.fetch_daily_quote(&symbol, quote_date),
            self.quotes.fetch_company_profile(&symbol),
            self.scraper.fetch_performance_and_competitors(&symbol),
        )
        .await
        .map_err(|e| {
            log::error!("获取 {} 数据失败: {}", symbol, e);
            e
        })?;

        let stock = compose(symbol, today, quote, profile, scraped);
        self.cache.set(stock.symbol_code.clone(), stock.clone());
        log::info!("{} 已写入缓存: {}", stock.symbol_code, stock.status);

        Ok(stock)
    }
}

/// 合并三个子结果；status 的追加顺序固定，与完成顺序无关
fn compose(
    symbol: String,
    today: NaiveDate,
    quote: Fetched<Quote>,
    profile: Fetched<CompanyProfile>,
    scraped: Fetched<ScrapedData>,
) -> AggregatedStock {
    let mut status = STATUS_SUCCESS.to_string();

    let quote = quote.into_option().unwrap_or_else(|| {
        status.push_str(QUOTE_UNAVAILABLE);
        Quote::default()
    });
    let profile = profile.into_option().unwrap_or_else(|| {
        status.push_str(PROFILE_UNAVAILABLE);
        CompanyProfile::default()
    });
    let scraped = scraped.into_option().unwrap_or_else(|| {
        status.push_str(SCRAPE_UNAVAILABLE);
        ScrapedData::default()
    });

    AggregatedStock {
        status,
        request_date: today,
        symbol_code: symbol,
        profile,
        quote,
        performance: scraped.performance,
        competitors: scraped.competitors,
    }
}
