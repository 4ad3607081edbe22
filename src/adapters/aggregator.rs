//! Meta-aggregator quote adapter, pinned to a single source.
//!
//! Grounded in `original_source/.../ingestors/zeroex.py`'s `ZeroEx` — same
//! query parameters (`sellToken`, `buyToken`, `sellAmount`,
//! `slippagePercentage=0.001`, `skipValidation=true`, `includedSources`),
//! same response fields (`buyAmount`, `gas`, `gasPrice`, `sources`), same
//! default per-call timeout (3.5s), same optional `0x-api-key` / bearer
//! auth headers. The HTTP client is `reqwest` with `rustls-tls`, the exact
//! feature set the teacher crate already carries (there to avoid an
//! OpenSSL conflict with alloy's own transport).

use super::{none_if_unfillable, with_deadline, QuoteAdapter};
use crate::types::Quote;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const SLIPPAGE_PERCENTAGE: &str = "0.001";
const DEFAULT_GAS_UNITS: u64 = 250_000;

/// One meta-aggregator source, restricted to a single underlying venue via
/// the `includedSources` query parameter (the "source pin"). Without the
/// pin, a cross-venue route can silently collapse into a single-venue
/// quote and yield spurious profit; the engine does not cross-check the
/// aggregator's reported dominant source against the pin (see DESIGN.md).
pub struct AggregatorAdapter {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    bearer_token: Option<String>,
    source: String,
    deadline: Duration,
}

impl AggregatorAdapter {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        api_key: Option<String>,
        bearer_token: Option<String>,
        source: impl Into<String>,
        deadline: Duration,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            api_key,
            bearer_token,
            source: source.into(),
            deadline,
        }
    }

    async fn quote_inner(&self, sell: Address, buy: Address, amount_in_base: U256) -> Option<Quote> {
        let url = format!("{}/quote", self.api_base.trim_end_matches('/'));
        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("sellToken", sell.to_checksum(None)),
                ("buyToken", buy.to_checksum(None)),
                ("sellAmount", amount_in_base.to_string()),
                ("slippagePercentage", SLIPPAGE_PERCENTAGE.to_string()),
                ("skipValidation", "true".to_string()),
                ("includedSources", self.source.clone()),
            ])
            .header("Accept", "application/json");

        if let Some(key) = &self.api_key {
            request = request.header("0x-api-key", key);
        }
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(source = %self.source, error = %e, "aggregator request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(source = %self.source, status = %response.status(), "aggregator returned non-success status");
            return None;
        }

        let body: AggregatorResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                debug!(source = %self.source, error = %e, "aggregator response failed to parse");
                return None;
            }
        };

        let buy_amount: U256 = body.buy_amount.parse().unwrap_or(U256::ZERO);
        let quote = Quote {
            buy_amount,
            gas_units: body.gas.and_then(|g| g.parse().ok()).or(Some(DEFAULT_GAS_UNITS)),
            gas_price: body.gas_price.and_then(|g| g.parse().ok()),
            protocol: self.source.clone(),
            meta: Some(serde_json::json!({ "sources": body.sources })),
        };

        none_if_unfillable(quote)
    }
}

#[derive(Debug, Deserialize)]
struct AggregatorResponse {
    #[serde(rename = "buyAmount", default)]
    buy_amount: String,
    #[serde(default)]
    gas: Option<String>,
    #[serde(rename = "gasPrice", default)]
    gas_price: Option<String>,
    #[serde(default)]
    sources: Vec<serde_json::Value>,
}

#[async_trait]
impl QuoteAdapter for AggregatorAdapter {
    fn tag(&self) -> &str {
        &self.source
    }

    async fn quote(&self, sell: Address, buy: Address, amount_in_base: U256) -> Option<Quote> {
        with_deadline(self.deadline, self.quote_inner(sell, buy, amount_in_base)).await
    }
}
