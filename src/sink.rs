//! Durable storage for every qualifying opportunity.
//!
//! Schema and idempotent bootstrap are a direct port of
//! `original_source/.../storage/postgres.py` (`init_schema`/`get_conn`),
//! translated from `psycopg` to `sqlx`'s async Postgres driver — the same
//! crate the pack's `dawsh2-AlphaPulse` arbitrage bot already depends on
//! for its own opportunity ledger. A `NullSink` stands in when `PG_DSN` is
//! unset, matching the Python original's `get_conn()` yielding `None`.

use crate::types::Opportunity;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, warn};

#[async_trait]
pub trait Sink: Send + Sync {
    async fn record(&self, opportunity: &Opportunity);

    /// Record every opportunity from one scan as a single durable unit.
    /// The default fans out to [`Sink::record`] per item; `PostgresSink`
    /// overrides this to wrap the whole batch in one transaction, per the
    /// per-scan transactionality the scan loop requires (a crashed scan
    /// must not leave a partial write behind).
    async fn record_batch(&self, opportunities: &[Opportunity]) {
        for opportunity in opportunities {
            self.record(opportunity).await;
        }
    }
}

pub struct NullSink;

#[async_trait]
impl Sink for NullSink {
    async fn record(&self, opportunity: &Opportunity) {
        debug!(pair = %opportunity.pair_symbol, "PG_DSN unset, opportunity not persisted");
    }
}

pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    pub async fn connect(dsn: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new().max_connections(5).connect(dsn).await?;
        let sink = Self { pool };
        sink.init_schema().await?;
        Ok(sink)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS opportunities (
              id BIGSERIAL PRIMARY KEY,
              ts TIMESTAMPTZ DEFAULT now(),
              chain_id BIGINT,
              base_symbol TEXT,
              quote_symbol TEXT,
              size DECIMAL,
              dex_a TEXT,
              dex_b TEXT,
              gross_bps DOUBLE PRECISION,
              net_usd DOUBLE PRECISION,
              gas_usd DOUBLE PRECISION,
              details JSONB
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS opportunities_ts_idx ON opportunities (ts DESC)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn insert_query(opportunity: &Opportunity) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    let mut symbols = opportunity.pair_symbol.splitn(2, '/');
    let base_symbol = symbols.next().unwrap_or_default();
    let quote_symbol = symbols.next().unwrap_or_default();
    let size: Option<f64> = opportunity.size.parse().ok();

    sqlx::query(
        r#"
        INSERT INTO opportunities(
            chain_id, base_symbol, quote_symbol, size, dex_a, dex_b,
            gross_bps, net_usd, gas_usd, details
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(opportunity.chain_id as i64)
    .bind(base_symbol)
    .bind(quote_symbol)
    .bind(size)
    .bind(&opportunity.route.leg_a)
    .bind(&opportunity.route.leg_b)
    .bind(opportunity.gross_bps)
    .bind(opportunity.net_usd)
    .bind(opportunity.gas_usd)
    .bind(&opportunity.details)
}

#[async_trait]
impl Sink for PostgresSink {
    async fn record(&self, opportunity: &Opportunity) {
        if let Err(e) = insert_query(opportunity).execute(&self.pool).await {
            warn!(error = %e, pair = %opportunity.pair_symbol, "failed to persist opportunity");
        }
    }

    /// One transaction per scan: every qualifying opportunity from the same
    /// `scan_once` call commits together, or none do. A crash mid-scan
    /// leaves no partial row behind, matching the per-scan transactionality
    /// the supervisor loop requires.
    async fn record_batch(&self, opportunities: &[Opportunity]) {
        if opportunities.is_empty() {
            return;
        }

        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                warn!(error = %e, "failed to open sink transaction, falling back to per-row writes");
                for opportunity in opportunities {
                    self.record(opportunity).await;
                }
                return;
            }
        };

        for opportunity in opportunities {
            if let Err(e) = insert_query(opportunity).execute(&mut *tx).await {
                warn!(error = %e, pair = %opportunity.pair_symbol, "failed to persist opportunity, rolling back scan batch");
                let _ = tx.rollback().await;
                return;
            }
        }

        if let Err(e) = tx.commit().await {
            warn!(error = %e, "failed to commit scan opportunity batch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Route;

    fn sample_opportunity() -> Opportunity {
        Opportunity {
            chain_id: 8453,
            pair_symbol: "WETH/USDC".into(),
            size: "1000".into(),
            route: Route::new("Uniswap_V3", "SushiSwap"),
            gross_base: "5.0".into(),
            gross_bps: 50.0,
            net_usd: 4.5,
            gas_usd: 0.5,
            details: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn null_sink_never_panics() {
        let sink = NullSink;
        sink.record(&sample_opportunity()).await;
    }

    #[tokio::test]
    async fn default_record_batch_fans_out_to_record() {
        let sink = NullSink;
        sink.record_batch(&[sample_opportunity(), sample_opportunity()]).await;
    }

    #[tokio::test]
    async fn record_batch_on_empty_slice_is_a_no_op() {
        let sink = NullSink;
        sink.record_batch(&[]).await;
    }
}
