//! Polygon 行情接口
//!
//! - 日线开收盘: /v1/open-close/{symbol}/{date}
//! - 公司信息: /v3/reference/tickers/{symbol}
//!
//! 响应分三类：正常数据、该日无数据（body 中 status 为 "failed"，软失败）、
//! 以及带状态码的错误（硬失败）。

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::config::PolygonConfig;
use crate::error::{FetchError, FetchResult};
use crate::models::{CompanyProfile, Quote};
use crate::services::source::QuoteSource;

const SOURCE: &str = "Polygon.io";

/// Polygon 客户端
pub struct PolygonClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl PolygonClient {
    /// 创建客户端；未配置 API Key 视为配置错误
    pub fn new(config: &PolygonConfig) -> Result<Self> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(anyhow!("POLYGON_API_KEY 未设置"));
        }

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("无效的 Polygon 地址: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("无效的 Polygon 地址: {}", config.base_url));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// 拼接接口地址，自动附带 apiKey
    fn endpoint(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Request(format!("无法构造 {} 地址", SOURCE)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("apiKey", &self.api_key);
        Ok(url)
    }

    async fn request(&self, url: Url) -> Result<Option<Value>, FetchError> {
        // 日志中不能出现 apiKey
        let path = url.path().to_string();

        let response = self.client.get(url).send().await.map_err(|e| {
            let err = FetchError::from_transport(SOURCE, e);
            log::error!("请求 {} 失败 ({}): {}", SOURCE, path, err);
            err
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_transport(SOURCE, e))?;

        interpret_response(status, &body).map_err(|e| {
            log::warn!("{} 返回错误 ({}): {}", SOURCE, path, e);
            e
        })
    }
}

#[async_trait]
impl QuoteSource for PolygonClient {
    async fn fetch_daily_quote(&self, symbol: &str, date: NaiveDate) -> FetchResult<Quote> {
        let date = date.format("%Y-%m-%d").to_string();
        log::info!("获取 {} 在 {} 的日线数据", symbol, date);

        let url = self.endpoint(&["v1", "open-close", symbol, date.as_str()], &[("adjusted", "true")])?;
        let quote = self.request(url).await?.map(|data| parse_quote(&data));
        if quote.is_none() {
            log::warn!("Polygon 没有 {} 在 {} 的日线数据", symbol, date);
        }
        Ok(quote.into())
    }

    async fn fetch_company_profile(&self, symbol: &str) -> FetchResult<CompanyProfile> {
        log::info!("获取 {} 的公司信息", symbol);

        let url = self.endpoint(&["v3", "reference", "tickers", symbol], &[])?;
        let profile = self.request(url).await?.and_then(|data| parse_profile(&data));
        if profile.is_none() {
            log::warn!("Polygon 没有 {} 的公司名称", symbol);
        }
        Ok(profile.into())
    }
}

/// 解析响应：Ok(None) 表示该查询没有数据
pub fn interpret_response(status: u16, body: &str) -> Result<Option<Value>, FetchError> {
    let data: Value = serde_json::from_str(body).map_err(|_| FetchError::UpstreamStatus {
        status,
        message: format!("Invalid JSON response from {}.", SOURCE),
    })?;

    let body_status = data["status"].as_str().unwrap_or("");

    if status >= 400 {
        let message = data["message"]
            .as_str()
            .unwrap_or("Polygon.io API error.")
            .to_string();
        return Err(FetchError::from_status(status, message));
    }

    if body_status == "ERROR" || body_status == "NOT_FOUND" {
        let message = data["message"]
            .as_str()
            .unwrap_or("Data not found or API error.")
            .to_string();
        return Err(FetchError::NotFound(message));
    }

    if body_status == "failed" {
        return Ok(None);
    }

    Ok(Some(data))
}

/// 开高低收，缺失的字段为 0.0
pub fn parse_quote(data: &Value) -> Quote {
    Quote {
        open: data["open"].as_f64().unwrap_or(0.0),
        high: data["high"].as_f64().unwrap_or(0.0),
        low: data["low"].as_f64().unwrap_or(0.0),
        close: data["close"].as_f64().unwrap_or(0.0),
    }
}

/// 公司信息位于 results 下，名称为空视为无数据
pub fn parse_profile(data: &Value) -> Option<CompanyProfile> {
    data["results"]["name"]
        .as_str()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| CompanyProfile {
            name: name.to_string(),
        })
}
