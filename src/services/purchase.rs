//! 购买记录存储
//!
//! 只追加写入，不参与行情聚合。配置了 DATABASE_URL 时写入 PostgreSQL，
//! 否则保存在进程内存中（重启后丢失）。

use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::models::{NewPurchase, PurchaseRecord, PURCHASE_STATUS_RECORDED};

#[async_trait]
pub trait PurchaseStore: Send + Sync {
    async fn record(&self, purchase: NewPurchase) -> Result<PurchaseRecord>;
}

/// PostgreSQL 存储
pub struct PgPurchaseStore {
    pool: PgPool,
}

impl PgPurchaseStore {
    /// 连接数据库并确保表存在
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("connect to postgres failed")?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS stock_records ( \
             id BIGSERIAL PRIMARY KEY, \
             company_code VARCHAR NOT NULL, \
             purchased_amount DOUBLE PRECISION NOT NULL, \
             purchased_status VARCHAR NOT NULL DEFAULT 'recorded', \
             request_data DATE NOT NULL DEFAULT CURRENT_DATE)",
        )
        .execute(&self.pool)
        .await
        .context("create stock_records failed")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS ix_stock_records_company_code ON stock_records (company_code)",
        )
        .execute(&self.pool)
        .await
        .context("create stock_records index failed")?;

        log::info!("stock_records 表已就绪");
        Ok(())
    }
}

#[async_trait]
impl PurchaseStore for PgPurchaseStore {
    async fn record(&self, purchase: NewPurchase) -> Result<PurchaseRecord> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO stock_records (company_code, purchased_amount, purchased_status, request_data) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(&purchase.company_code)
        .bind(purchase.purchased_amount)
        .bind(PURCHASE_STATUS_RECORDED)
        .bind(purchase.request_data)
        .fetch_one(&self.pool)
        .await
        .context("insert stock_records failed")?;

        Ok(PurchaseRecord {
            id,
            company_code: purchase.company_code,
            purchased_amount: purchase.purchased_amount,
            purchased_status: PURCHASE_STATUS_RECORDED.to_string(),
            request_data: purchase.request_data,
        })
    }
}

/// 内存存储
#[derive(Default)]
pub struct MemoryPurchaseStore {
    records: Mutex<Vec<PurchaseRecord>>,
}

impl MemoryPurchaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PurchaseRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl PurchaseStore for MemoryPurchaseStore {
    async fn record(&self, purchase: NewPurchase) -> Result<PurchaseRecord> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let record = PurchaseRecord {
            id: records.len() as i64 + 1,
            company_code: purchase.company_code,
            purchased_amount: purchase.purchased_amount,
            purchased_status: PURCHASE_STATUS_RECORDED.to_string(),
            request_data: purchase.request_data,
        };
        records.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_memory_store_appends() {
        let store = MemoryPurchaseStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();

        for amount in [10.0, 2.5] {
            store
                .record(NewPurchase {
                    company_code: "AAPL".to_string(),
                    purchased_amount: amount,
                    request_data: date,
                })
                .await
                .unwrap();
        }

        let records = store.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].purchased_amount, 2.5);
        assert!(records.iter().all(|r| r.purchased_status == "recorded"));
    }
}
