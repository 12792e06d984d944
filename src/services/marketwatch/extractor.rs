//! MarketWatch 页面结构化解析
//!
//! 不涉及网络，只把 HTML 文档解析为区间涨跌幅和竞争对手列表。
//! 页面上的区块按标题文字定位（标题 → 所在 header → 之后的第一个 table），
//! 不依赖区块在页面中的位置。

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::models::{Competitor, MarketCap, PerformanceMetrics, ScrapedData};

/// 区块标题
pub const PERFORMANCE_LABEL: &str = "Performance";
pub const COMPETITORS_LABEL: &str = "Competitors";

// 页面锚点，页面改版时只需修改这里
const LABEL_SELECTOR: &str = "span.label";
const ROW_SELECTOR: &str = "tr";
const CELL_SELECTOR: &str = "td";
const BODY_ROW_SELECTOR: &str = "tbody tr";
const VALUE_SELECTOR: &str = ".value";
const NAME_CELL_SELECTOR: &str = "td.w50";
const MARKET_CAP_CELL_SELECTOR: &str = "td.number";

const DEFAULT_CURRENCY: &str = "USD";


#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

/// 文档查询能力：按标题找区块、找表格行和单元格
pub struct DocumentQuery {
    document: Html,
    label: Selector,
    row: Selector,
    cell: Selector,
    body_row: Selector,
    value: Selector,
    name_cell: Selector,
    market_cap_cell: Selector,
}

impl DocumentQuery {
    pub fn parse(html: &str) -> Result<Self, ExtractionError> {
        Ok(Self {
            document: Html::parse_document(html),
            label: selector(LABEL_SELECTOR)?,
            row: selector(ROW_SELECTOR)?,
            cell: selector(CELL_SELECTOR)?,
            body_row: selector(BODY_ROW_SELECTOR)?,
            value: selector(VALUE_SELECTOR)?,
            name_cell: selector(NAME_CELL_SELECTOR)?,
            market_cap_cell: selector(MARKET_CAP_CELL_SELECTOR)?,
        })
    }

    /// 找到标题为 `label` 的区块对应的数据表
    pub fn section_table(&self, label: &str) -> Option<ElementRef<'_>> {
        self.document
            .select(&self.label)
            .filter(|span| element_text(*span) == label)
            .find_map(|span| {
                let header = span
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|el| el.value().name() == "header")?;
                header
                    .next_siblings()
                    .filter_map(ElementRef::wrap)
                    .find(|el| el.value().name() == "table")
            })
    }

    pub fn rows<'a>(&self, table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        table.select(&self.row).collect()
    }

    /// tbody 中的行，不含表头
    pub fn body_rows<'a>(&self, table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        table.select(&self.body_row).collect()
    }

    pub fn cells<'a>(&self, row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        row.select(&self.cell).collect()
    }

    /// 单元格内嵌套的数值元素文本
    pub fn value_text(&self, cell: ElementRef<'_>) -> Option<String> {
        cell.select(&self.value).next().map(element_text)
    }

    /// 竞争对手行的（名称, 市值原文），缺任一单元格返回 None
    pub fn competitor_cells(&self, row: ElementRef<'_>) -> Option<(String, String)> {
        let name = row.select(&self.name_cell).next()?;
        let market_cap = row.select(&self.market_cap_cell).next()?;
        Some((element_text(name), element_text(market_cap)))
    }
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// 元素文本，各文本片段去掉首尾空白后以空格连接
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 解析整页
pub fn extract(html: &str) -> Result<ScrapedData, ExtractionError> {
    let query = DocumentQuery::parse(html)?;
    Ok(ScrapedData {
        performance: extract_performance(&query),
        competitors: extract_competitors(&query),
    })
}

pub fn extract_performance(query: &DocumentQuery) -> PerformanceMetrics {
    let mut performance = PerformanceMetrics::default();

    let Some(table) = query.section_table(PERFORMANCE_LABEL) else {
        log::warn!("未找到 Performance 区块，跳过");
        return performance;
    };

    for row in query.rows(table) {
        let cells = query.cells(row);
        if cells.len() != 2 {
            continue;
        }

        let label = normalize_label(&element_text(cells[0]));
        let Some(value_text) = query.value_text(cells[1]) else {
            log::warn!("Performance 行 '{}' 缺少数值元素", label);
            continue;
        };

        let value = match parse_percent(&value_text) {
            Some(v) => v,
            None => {
                log::warn!("无法解析 Performance 数值 '{}'（{}）", value_text, label);
                continue;
            }
        };

        if label.contains("5_day") {
            performance.five_days = Some(value);
        } else if label.contains("1_month") {
            performance.one_month = Some(value);
        } else if label.contains("3_month") {
            performance.three_months = Some(value);
        } else if label.contains("ytd") {
            performance.year_to_date = Some(value);
        } else if label.contains("1_year") {
            performance.one_year = Some(value);
        } else {
            continue;
        }
        log::debug!("Performance: {} = {}", label, value);
    }

    performance
}

pub fn extract_competitors(query: &DocumentQuery) -> Vec<Competitor> {
    let Some(table) = query.section_table(COMPETITORS_LABEL) else {
        log::warn!("未找到 Competitors 区块，跳过");
        return Vec::new();
    };

    let mut competitors = Vec::new();
    for row in query.body_rows(table) {
        let Some((name, raw_market_cap)) = query.competitor_cells(row) else {
            log::debug!("竞争对手行缺少名称或市值单元格，跳过");
            continue;
        };

        match parse_market_cap(&raw_market_cap) {
            Some(value) => competitors.push(Competitor {
                name,
                market_cap: MarketCap {
                    currency: detect_currency(&raw_market_cap).to_string(),
                    value,
                },
            }),
            None => log::warn!("无法解析 {} 的市值 '{}'", name, raw_market_cap),
        }
    }

    competitors
}

/// 小写，空白、连字符、句点替换为下划线
pub fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' || c == '.' { '_' } else { c })
        .collect()
}

fn parse_percent(text: &str) -> Option<f64> {
    let text = text.trim();
    let text = text.strip_suffix('%').unwrap_or(text).trim();
    text.parse::<f64>().ok()
}

/// 根据货币符号判断币种，默认 USD
pub fn detect_currency(raw: &str) -> &'static str {
    if raw.contains('¥') {
        "JPY"
    } else if raw.contains('₩') {
        "KRW"
    } else if raw.contains('€') {
        "EUR"
    } else if raw.contains('£') {
        "GBP"
    } else {
        DEFAULT_CURRENCY
    }
}

/// 解析市值简写，如 "1.23B"、"45.6M"、"900"
///
/// 货币符号、千分位逗号和空白会被忽略；单位不区分大小写。
/// 无法解析时返回 None。
pub fn parse_market_cap(raw: &str) -> Option<f64> {
    let junk_re = Regex::new(r"[^\dBMKTbmkt.]").unwrap();
    let cap_re = Regex::new(r"^(\d[\d.]*)([BMKT])?").unwrap();

    let cleaned = junk_re.replace_all(raw, "").to_uppercase();
    let caps = cap_re.captures(&cleaned)?;

    let number = caps.get(1)?.as_str();
    if number.is_empty() || number == "." {
        return None;
    }
    let value = number.parse::<f64>().ok()?;

    let scale = match caps.get(2).map(|m| m.as_str()) {
        Some("K") => 1e3,
        Some("M") => 1e6,
        Some("B") => 1e9,
        Some("T") => 1e12,
        _ => 1.0,
    };
    Some(value * scale)
}
