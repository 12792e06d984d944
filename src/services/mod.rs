//! 业务逻辑服务模块
//!
//! 封装数据获取、页面解析和聚合逻辑

pub mod aggregator;   // 多数据源聚合
pub mod marketwatch;  // MarketWatch 页面抓取与解析
pub mod polygon;      // Polygon 行情接口
pub mod purchase;     // 购买记录存储
pub mod source;       // 数据源 trait

#[cfg(test)]
pub(crate) mod testing;  // 本地 TCP 测试服务
