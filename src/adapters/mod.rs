//! Quote adapter abstraction.
//!
//! Every adapter family — aggregator-pinned HTTP quotes, the direct
//! on-chain router, and any future addition — exposes the same single
//! capability. Modeled as one `#[async_trait]` trait with a dynamic
//! dispatch list (`Vec<Box<dyn QuoteAdapter>>`) rather than an inheritance
//! hierarchy or a tagged enum, following the `Box<dyn Collector<E>>` /
//! `Box<dyn Strategy<E, A>>` pattern the teacher crate already uses for
//! its Collector/Strategy/Executor pipeline.

pub mod aggregator;
pub mod router;

use crate::types::Quote;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;

/// Contract:
/// - returns `None` on any transport, parse, or protocol error — never
///   propagates an error to the Scanner;
/// - never blocks cooperatively past `deadline`;
/// - treats `buy_amount <= 0` as `None`;
/// - safe for concurrent invocation, no shared mutable state between calls;
/// - may populate `gas_units`/`gas_price`; their absence means "assume 0
///   gas cost" at the ProfitModel boundary.
#[async_trait]
pub trait QuoteAdapter: Send + Sync {
    /// A human-readable tag identifying this adapter as a route leg, e.g.
    /// `Uniswap_V3` for a source-pinned aggregator leg, or the direct
    /// router's own tag once the ABI variant is known.
    fn tag(&self) -> &str;

    async fn quote(&self, sell: Address, buy: Address, amount_in_base: U256) -> Option<Quote>;
}

/// Apply the per-call deadline uniformly; a timed-out future also
/// satisfies "never propagate an error, only `None`".
pub(crate) async fn with_deadline<F>(deadline: std::time::Duration, fut: F) -> Option<Quote>
where
    F: std::future::Future<Output = Option<Quote>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => None,
    }
}

/// Invariant (c): a zero `buy_amount` is never distinguished from a failed
/// leg — centralized here so every adapter enforces it the same way.
pub(crate) fn none_if_unfillable(quote: Quote) -> Option<Quote> {
    if quote.is_fillable() {
        Some(quote)
    } else {
        None
    }
}
