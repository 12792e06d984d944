//! MarketWatch 页面抓取
//!
//! 数据来源: https://www.marketwatch.com/investing/stock/<symbol>
//! 站点有反爬检测，需要模拟浏览器请求头，并可附带浏览器会话 Cookie

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, REFERER};
use reqwest::Client;
use url::Url;

use super::extractor;
use crate::config::MarketWatchConfig;
use crate::error::{FetchError, FetchResult, Fetched};
use crate::models::ScrapedData;
use crate::services::source::ScrapeSource;

const SOURCE: &str = "MarketWatch";

/// 浏览器请求头（referer 和 cookie 按请求单独添加）
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7"),
    ("accept-language", "en-US,en;q=0.9"),
    ("cache-control", "max-age=0"),
    ("dnt", "1"),
    ("priority", "u=0, i"),
    ("sec-ch-ua", "\"Chromium\";v=\"137\", \"Not/A)Brand\";v=\"24\""),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "same-origin"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
    ("user-agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36"),
];

/// MarketWatch 抓取客户端
pub struct MarketWatchClient {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
}

impl MarketWatchClient {
    pub fn new(config: &MarketWatchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("无效的 MarketWatch 地址: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("无效的 MarketWatch 地址: {}", config.base_url));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in BROWSER_HEADERS {
            headers.insert(*name, HeaderValue::from_static(*value));
        }

        let cookie = config.cookie.trim();
        if cookie.is_empty() {
            log::warn!("未设置 MARKETWATCH_COOKIE，MarketWatch 抓取可能被拦截");
        } else {
            let value = HeaderValue::from_str(cookie).context("MARKETWATCH_COOKIE 含有非法字符")?;
            headers.insert(COOKIE, value);
            log::info!("MarketWatch 客户端已配置 Cookie");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            headers,
        })
    }

    /// 股票页面地址，代码转为小写
    pub fn page_url(&self, symbol: &str) -> Result<Url, FetchError> {
        let symbol = symbol.to_lowercase();
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Request(format!("无法构造 {} 地址", SOURCE)))?
            .pop_if_empty()
            .extend(["investing", "stock", symbol.as_str()]);
        Ok(url)
    }

    fn request_headers(&self, url: &Url) -> Result<HeaderMap, FetchError> {
        let mut headers = self.headers.clone();
        let referer = HeaderValue::from_str(url.as_str())
            .map_err(|e| FetchError::Request(format!("无效的 referer: {}", e)))?;
        headers.insert(REFERER, referer);
        Ok(headers)
    }
}

#[async_trait]
impl ScrapeSource for MarketWatchClient {
    async fn fetch_performance_and_competitors(&self, symbol: &str) -> FetchResult<ScrapedData> {
        let url = self.page_url(symbol)?;
        log::info!("抓取 {} 的 MarketWatch 页面: {}", symbol, url);

        let headers = self.request_headers(&url)?;
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                let err = FetchError::from_transport(SOURCE, e);
                log::error!("请求 MarketWatch 失败 ({}): {}", symbol, err);
                err
            })?;

        check_status(symbol, response.status().as_u16())?;

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_transport(SOURCE, e))?;

        interpret_page(symbol, &body)
    }
}

/// 非 2xx 状态码转换为对应错误
pub fn check_status(symbol: &str, status: u16) -> Result<(), FetchError> {
    if (200..300).contains(&status) {
        return Ok(());
    }

    let err = match status {
        401 => FetchError::Unauthorized(
            "MarketWatch scraping failed: 401 Unauthorized. Ensure a valid MARKETWATCH_COOKIE is set."
                .to_string(),
        ),
        404 => FetchError::NotFound(format!("MarketWatch page not found for {}.", symbol)),
        _ => FetchError::UpstreamStatus {
            status,
            message: format!("MarketWatch HTTP error for {}", symbol),
        },
    };
    log::error!("MarketWatch 返回 {} ({}): {}", status, symbol, err);
    Err(err)
}

/// 解析页面；两个区块都没有内容时视为无数据
pub fn interpret_page(symbol: &str, body: &str) -> FetchResult<ScrapedData> {
    let data = extractor::extract(body).map_err(|e| {
        log::error!("解析 {} 的 MarketWatch 页面失败: {}", symbol, e);
        FetchError::InternalExtraction(format!(
            "An error occurred while parsing MarketWatch data: {}",
            e
        ))
    })?;

    if data.is_empty() {
        log::warn!("MarketWatch 页面中没有 {} 的可用数据", symbol);
        return Ok(Fetched::Empty);
    }

    log::info!(
        "MarketWatch 解析完成 ({}): {} 个竞争对手",
        symbol,
        data.competitors.len()
    );
    Ok(Fetched::Value(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;

    fn client(base_url: &str, cookie: &str) -> MarketWatchClient {
        MarketWatchClient::new(&MarketWatchConfig {
            cookie: cookie.to_string(),
            base_url: base_url.to_string(),
            timeout_secs: 15,
        })
        .unwrap()
    }

    #[test]
    fn test_page_url_lowercases_symbol() {
        let c = client("https://www.marketwatch.com", "");
        assert_eq!(
            c.page_url("AAPL").unwrap().as_str(),
            "https://www.marketwatch.com/investing/stock/aapl"
        );

        let c = client("http://127.0.0.1:9000/mirror/", "");
        assert_eq!(
            c.page_url("BRK.B").unwrap().as_str(),
            "http://127.0.0.1:9000/mirror/investing/stock/brk.b"
        );
    }

    #[test]
    fn test_headers() {
        let c = client("https://www.marketwatch.com", "session=abc");
        let url = c.page_url("msft").unwrap();
        let headers = c.request_headers(&url).unwrap();
        assert_eq!(headers[COOKIE], "session=abc");
        assert_eq!(headers[REFERER], "https://www.marketwatch.com/investing/stock/msft");
        assert!(headers.contains_key("user-agent"));

        let c = client("https://www.marketwatch.com", "");
        assert!(!c.request_headers(&url).unwrap().contains_key(COOKIE));
    }

    #[test]
    fn test_invalid_config() {
        let config = MarketWatchConfig {
            cookie: "bad\ncookie".to_string(),
            ..MarketWatchConfig::default()
        };
        assert!(MarketWatchClient::new(&config).is_err());

        let config = MarketWatchConfig {
            base_url: "not a url".to_string(),
            ..MarketWatchConfig::default()
        };
        assert!(MarketWatchClient::new(&config).is_err());
    }

    #[test]
    fn test_check_status() {
        assert!(check_status("AAPL", 200).is_ok());
        assert!(matches!(check_status("AAPL", 401), Err(FetchError::Unauthorized(_))));
        assert!(matches!(check_status("AAPL", 404), Err(FetchError::NotFound(_))));
        assert!(matches!(
            check_status("AAPL", 503),
            Err(FetchError::UpstreamStatus { status: 503, .. })
        ));
    }

    #[test]
    fn test_interpret_page() {
        let html = r#"
            <header><span class="label">Competitors</span></header>
            <table><tbody>
              <tr><td class="w50">Alphabet Inc.</td><td class="w25 number">$1.5T</td></tr>
            </tbody></table>"#;
        match interpret_page("AAPL", html).unwrap() {
            Fetched::Value(data) => {
                assert_eq!(data.competitors.len(), 1);
                assert_eq!(data.competitors[0].market_cap.value, 1.5e12);
            }
            Fetched::Empty => panic!("expected data"),
        }

        assert_eq!(interpret_page("AAPL", "<html></html>").unwrap(), Fetched::Empty);
    }

    fn local_client(addr: std::net::SocketAddr, timeout_secs: u64) -> MarketWatchClient {
        MarketWatchClient::new(&MarketWatchConfig {
            cookie: String::new(),
            base_url: format!("http://{}", addr),
            timeout_secs,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let err = local_client(testing::closed_addr(), 5)
            .fetch_performance_and_competitors("AAPL")
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Unavailable(_)), "{:?}", err);
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn test_silent_upstream_is_timeout() {
        let addr = testing::silent_server().await;
        let err = local_client(addr, 1)
            .fetch_performance_and_competitors("AAPL")
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout(_)), "{:?}", err);
        assert_eq!(err.status_code(), 504);
    }

    #[tokio::test]
    async fn test_malformed_response_has_no_url() {
        let addr = testing::garbage_server().await;
        let err = local_client(addr, 5)
            .fetch_performance_and_competitors("AAPL")
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Request(_)), "{:?}", err);
        assert!(!err.to_string().contains("/investing/stock/aapl"), "{}", err);
    }
}
