//! Direct on-chain router adapter, with ABI-variant auto-negotiation.
//!
//! Two `getAmountsOut` ABI shapes are supported because deployments
//! differ: a 4-field route `(from, to, stable, factory)` and a 3-field
//! route `(from, to, stable)`. Grounded directly in
//! `original_source/.../ingestors/aerodrome_router.py`'s `AerodromeRouter`
//! (`ROUTER_ABI_4`/`ROUTER_ABI_3`) and in the teacher crate's
//! `contracts.rs` convention of declaring every on-chain interface with
//! alloy's `sol!` macro and `#[sol(rpc)]`.

use super::{none_if_unfillable, with_deadline, QuoteAdapter};
use crate::types::Quote;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::sol;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

sol! {
    #[sol(rpc)]
    interface IRouterV4 {
        struct Route {
            address from;
            address to;
            bool stable;
            address factory;
        }
        function getAmountsOut(uint256 amountIn, Route[] calldata routes) external view returns (uint256[] memory amounts);
    }
}

sol! {
    #[sol(rpc)]
    interface IRouterV3 {
        struct Route {
            address from;
            address to;
            bool stable;
        }
        function getAmountsOut(uint256 amountIn, Route[] calldata routes) external view returns (uint256[] memory amounts);
    }
}

/// Negotiation order: 4-field variant before 3-field, and within each
/// variant the requested `stable` flag before its negation.
/// The first attempt that returns a non-empty `amounts` array wins; the
/// protocol tag records which combination succeeded so the Scanner and
/// ProfitModel can distinguish routes that only differ by ABI shape.
pub struct RouterAdapter<P: Provider + Clone + Send + Sync + 'static> {
    provider: P,
    router_address: Address,
    factory_address: Address,
    requested_stable: bool,
    deadline: Duration,
}

impl<P: Provider + Clone + Send + Sync + 'static> RouterAdapter<P> {
    pub fn new(provider: P, router_address: Address, factory_address: Address, requested_stable: bool, deadline: Duration) -> Self {
        Self {
            provider,
            router_address,
            factory_address,
            requested_stable,
            deadline,
        }
    }

    async fn try_variant_4f(&self, from: Address, to: Address, stable: bool, amount_in: U256) -> Option<U256> {
        let router = IRouterV4::new(self.router_address, self.provider.clone());
        let route = IRouterV4::Route {
            from,
            to,
            stable,
            factory: self.factory_address,
        };
        match router.getAmountsOut(amount_in, vec![route]).call().await {
            Ok(result) if !result.is_empty() => result.last().copied(),
            Ok(_) => None,
            Err(e) => {
                debug!(variant = "4f", stable, error = %e, "router getAmountsOut failed");
                None
            }
        }
    }

    async fn try_variant_3f(&self, from: Address, to: Address, stable: bool, amount_in: U256) -> Option<U256> {
        let router = IRouterV3::new(self.router_address, self.provider.clone());
        let route = IRouterV3::Route { from, to, stable };
        match router.getAmountsOut(amount_in, vec![route]).call().await {
            Ok(result) if !result.is_empty() => result.last().copied(),
            Ok(_) => None,
            Err(e) => {
                debug!(variant = "3f", stable, error = %e, "router getAmountsOut failed");
                None
            }
        }
    }

    async fn quote_inner(&self, sell: Address, buy: Address, amount_in_base: U256) -> Option<Quote> {
        let stable_order = [self.requested_stable, !self.requested_stable];

        for stable in stable_order {
            if let Some(buy_amount) = self.try_variant_4f(sell, buy, stable, amount_in_base).await {
                if !buy_amount.is_zero() {
                    return none_if_unfillable(Quote {
                        buy_amount,
                        gas_units: None,
                        gas_price: None,
                        protocol: format!("Router_4f_{}", if stable { "stable" } else { "volatile" }),
                        meta: None,
                    });
                }
            }
        }

        for stable in stable_order {
            if let Some(buy_amount) = self.try_variant_3f(sell, buy, stable, amount_in_base).await {
                if !buy_amount.is_zero() {
                    return none_if_unfillable(Quote {
                        buy_amount,
                        gas_units: None,
                        gas_price: None,
                        protocol: format!("Router_3f_{}", if stable { "stable" } else { "volatile" }),
                        meta: None,
                    });
                }
            }
        }

        None
    }
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> QuoteAdapter for RouterAdapter<P> {
    fn tag(&self) -> &str {
        "Router"
    }

    async fn quote(&self, sell: Address, buy: Address, amount_in_base: U256) -> Option<Quote> {
        with_deadline(self.deadline, self.quote_inner(sell, buy, amount_in_base)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_tag_encodes_variant_and_stable_flag() {
        // The scanner needs to tell apart routes that only differ by which
        // ABI variant succeeded, so the tag always carries both bits.
        let tag_4f_stable = format!("Router_4f_{}", if true { "stable" } else { "volatile" });
        assert_eq!(tag_4f_stable, "Router_4f_stable");
        let tag_3f_volatile = format!("Router_3f_{}", if false { "stable" } else { "volatile" });
        assert_eq!(tag_3f_volatile, "Router_3f_volatile");
    }
}
