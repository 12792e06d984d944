//! MarketWatch 数据源
//!
//! - client: 页面请求与错误转换
//! - extractor: 页面结构化解析（区间涨跌幅、竞争对手）

mod client;
pub mod extractor;

pub use client::MarketWatchClient;
