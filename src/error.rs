//! 上游数据源错误类型
//!
//! 区分两类结果：
//! - 软失败（无数据）：用 [`Fetched::Empty`] 表示，由聚合器合并默认值
//! - 硬失败：用 [`FetchError`] 表示，直接返回给调用方，不缓存

use thiserror::Error;

/// 单次数据源调用的结果（无数据 / 有数据）
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// 上游明确表示没有数据
    Empty,
    /// 正常取得数据
    Value(T),
}

impl<T> Fetched<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Empty => None,
            Fetched::Value(v) => Some(v),
        }
    }
}

impl<T> From<Option<T>> for Fetched<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Fetched::Value(v),
            None => Fetched::Empty,
        }
    }
}

/// 数据源调用结果
pub type FetchResult<T> = Result<Fetched<T>, FetchError>;

/// 数据源硬失败
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// 凭证或 Cookie 无效
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 无法建立连接
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// 请求超时
    #[error("Gateway timeout: {0}")]
    Timeout(String),

    /// 上游返回了其他错误状态码，或响应无法解析
    #[error("Upstream error ({status}): {message}")]
    UpstreamStatus { status: u16, message: String },

    /// 页面内容无法解析
    #[error("Internal extraction error: {0}")]
    InternalExtraction(String),

    /// 其他传输层错误
    #[error("Request error: {0}")]
    Request(String),
}

impl FetchError {
    /// 按 HTTP 状态码构造错误：401 / 404 有专门的类型
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => FetchError::Unauthorized(message),
            404 => FetchError::NotFound(message),
            _ => FetchError::UpstreamStatus { status, message },
        }
    }

    /// 转换 reqwest 传输错误，`source` 为数据源名称
    ///
    /// 请求地址可能带有 apiKey，错误信息中一律去掉 URL
    pub fn from_transport(source: &str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            FetchError::Timeout(format!("{} request timed out", source))
        } else if err.is_connect() {
            FetchError::Unavailable(format!("Could not connect to {}", source))
        } else if let Some(status) = err.status() {
            FetchError::from_status(status.as_u16(), format!("{} HTTP error: {}", source, err))
        } else {
            FetchError::Request(format!("An error occurred with {}: {}", source, err))
        }
    }

    /// 对外暴露的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            FetchError::Unauthorized(_) => 401,
            FetchError::NotFound(_) => 404,
            FetchError::Unavailable(_) => 503,
            FetchError::Timeout(_) => 504,
            FetchError::UpstreamStatus { status, .. } if (400..600).contains(status) => *status,
            FetchError::UpstreamStatus { .. } => 502,
            FetchError::InternalExtraction(_) | FetchError::Request(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(FetchError::from_status(401, "x"), FetchError::Unauthorized(_)));
        assert!(matches!(FetchError::from_status(404, "x"), FetchError::NotFound(_)));
        assert_eq!(
            FetchError::from_status(429, "slow down"),
            FetchError::UpstreamStatus { status: 429, message: "slow down".to_string() }
        );
    }

    #[test]
    fn test_status_code() {
        assert_eq!(FetchError::Unavailable("x".into()).status_code(), 503);
        assert_eq!(FetchError::Timeout("x".into()).status_code(), 504);
        assert_eq!(FetchError::InternalExtraction("x".into()).status_code(), 500);
        assert_eq!(
            FetchError::UpstreamStatus { status: 403, message: String::new() }.status_code(),
            403
        );
        // 2xx 却无法解析的响应
        assert_eq!(
            FetchError::UpstreamStatus { status: 200, message: String::new() }.status_code(),
            502
        );
    }

    #[test]
    fn test_fetched_option() {
        assert_eq!(Fetched::from(Some(1)), Fetched::Value(1));
        assert_eq!(Fetched::<i32>::from(None), Fetched::Empty);
        assert_eq!(Fetched::Value("a").into_option(), Some("a"));
    }
}
