//! Round-trip profit computation and publish gate.
//!
//! Grounded directly in `original_source/.../engine/arb_loop.py`'s
//! `evaluate_and_alert` and `engine/gas.py`'s wei/gwei conversions: the
//! same eight steps (sell amount, out-back, gross, gas cost, MEV haircut,
//! net USD, net ROI, gate) in the same order, carried on `U256`/signed
//! big-integer arithmetic instead of Python `Decimal` so the precision
//! guarantee in [`crate::fixed_point`] holds end to end.

use crate::fixed_point::{from_base, to_base, FixedPointError};
use crate::types::{Quote, Route};
use alloy::primitives::{I256, U256};

/// Per-engine tunables, all environment-configurable (see [`crate::config::Config`]).
#[derive(Debug, Clone, Copy)]
pub struct ProfitModelConfig {
    pub mev_buffer_bps: f64,
    pub min_profit_usd: f64,
    pub min_roi_bps: f64,
    pub eth_usd: f64,
    /// Assumed USD value of one unit of the base token. A stable-base
    /// assumption (no price oracle) — see DESIGN.md.
    pub usd_per_base: f64,
}

/// Per-leg gas fallback when an adapter does not report one, matching the
/// `qa.get("gas", 250_000)` default in the Python original.
pub const DEFAULT_GAS_UNITS_PER_LEG: u64 = 250_000;
const WEI_PER_ETH: f64 = 1e18;

/// A fully scored round trip, whether or not it clears the publish gate.
#[derive(Debug, Clone)]
pub struct ScoredRoute {
    pub route: Route,
    pub sell_amount_base: U256,
    pub out_back_base: U256,
    /// Signed: a losing round trip has a negative `gross_base`.
    pub gross_base: I256,
    pub gross_bps: f64,
    pub gas_units: u64,
    pub gas_price_wei: u128,
    pub gas_usd: f64,
    pub mev_cut_base: f64,
    pub net_usd: f64,
    pub roi_mev_bps: f64,
    pub roi_net_bps: f64,
}

impl ScoredRoute {
    /// The gate `evaluate_and_alert` applies before ever touching cooldown
    /// or alerting: `net_usd >= min_profit_usd AND roi_net_bps >= min_roi_bps`.
    pub fn qualifies(&self, cfg: &ProfitModelConfig) -> bool {
        self.net_usd >= cfg.min_profit_usd && self.roi_net_bps >= cfg.min_roi_bps
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfitModelError {
    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),
}

/// Score one candidate round trip: leg A sold `size_decimal` of `base` for
/// `quote`, leg B sold everything leg A returned back for `base`. `qa`/`qb`
/// are the two legs' quotes in that order.
pub fn score(
    route: Route,
    base_decimals: u8,
    size_decimal: &str,
    qa: &Quote,
    qb: &Quote,
    cfg: &ProfitModelConfig,
) -> Result<ScoredRoute, ProfitModelError> {
    let sell_amount_base = to_base(size_decimal, base_decimals)?;
    let out_back_base = qb.buy_amount;

    let gross_base = I256::try_from(out_back_base).unwrap_or(I256::MAX)
        - I256::try_from(sell_amount_base).unwrap_or(I256::MAX);
    let gross_base_decimal: f64 = signed_base_to_f64(gross_base, base_decimals);

    let size_units: f64 = size_decimal.parse().unwrap_or(0.0);
    let gross_bps = if size_units > 0.0 { (gross_base_decimal / size_units) * 10_000.0 } else { 0.0 };

    let gas_units = qa.gas_units.unwrap_or(DEFAULT_GAS_UNITS_PER_LEG) + qb.gas_units.unwrap_or(DEFAULT_GAS_UNITS_PER_LEG);
    let gas_price_wei = qa.gas_price.or(qb.gas_price).unwrap_or(0);
    let gas_eth = if gas_price_wei > 0 {
        (gas_units as f64) * (gas_price_wei as f64) / WEI_PER_ETH
    } else {
        0.0
    };
    let gas_usd = if cfg.eth_usd > 0.0 { gas_eth * cfg.eth_usd } else { 0.0 };

    let mev_cut_base = size_units * (cfg.mev_buffer_bps / 10_000.0);
    let net_base_mev = gross_base_decimal - mev_cut_base;
    let roi_mev_bps = if size_units > 0.0 { (net_base_mev / size_units) * 10_000.0 } else { 0.0 };

    let net_usd = (net_base_mev * cfg.usd_per_base) - gas_usd;
    let roi_net_bps = if size_units > 0.0 {
        (net_usd / (size_units * cfg.usd_per_base)) * 10_000.0
    } else {
        0.0
    };

    Ok(ScoredRoute {
        route,
        sell_amount_base,
        out_back_base,
        gross_base,
        gross_bps,
        gas_units,
        gas_price_wei,
        gas_usd,
        mev_cut_base,
        net_usd,
        roi_mev_bps,
        roi_net_bps,
    })
}

fn signed_base_to_f64(amount: I256, decimals: u8) -> f64 {
    if amount.is_negative() {
        let magnitude = amount.unsigned_abs();
        -from_base(magnitude, decimals).parse::<f64>().unwrap_or(0.0)
    } else {
        from_base(amount.into_raw(), decimals).parse::<f64>().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Route;

    fn cfg() -> ProfitModelConfig {
        ProfitModelConfig {
            mev_buffer_bps: 5.0,
            min_profit_usd: 1.0,
            min_roi_bps: 5.0,
            eth_usd: 3000.0,
            usd_per_base: 1.0,
        }
    }

    fn quote(buy_amount: u64, gas_units: Option<u64>, gas_price: Option<u128>) -> Quote {
        Quote {
            buy_amount: U256::from(buy_amount),
            gas_units,
            gas_price,
            protocol: "Uniswap_V3".into(),
            meta: None,
        }
    }

    #[test]
    fn golden_cross_venue_clears_gate() {
        // 1000 USDC in, 1005 USDC back: 5 USDC gross on a 6-decimal base,
        // gas negligible relative to size, clears both thresholds.
        let qa = quote(1_000_000_000, Some(120_000), Some(1_000_000_000));
        let qb = quote(1_005_000_000, Some(120_000), Some(1_000_000_000));
        let route = Route::new("Uniswap_V3", "SushiSwap");
        let scored = score(route, 6, "1000", &qa, &qb, &cfg()).unwrap();
        assert!(scored.net_usd > 1.0);
        assert!(scored.roi_net_bps > 5.0);
        assert!(scored.qualifies(&cfg()));
    }

    #[test]
    fn gate_miss_below_min_roi() {
        // A 0.2 USDC edge on a 1000 USDC size is 2bps gross, below the 5bps floor.
        let qa = quote(1_000_000_000, None, None);
        let qb = quote(1_000_200_000, None, None);
        let route = Route::new("Uniswap_V3", "SushiSwap");
        let scored = score(route, 6, "1000", &qa, &qb, &cfg()).unwrap();
        assert!(!scored.qualifies(&cfg()));
    }

    #[test]
    fn gas_cost_erodes_profit_below_threshold() {
        // Same nominal 5 USDC edge as the golden case, but with gas priced
        // high enough at a large ETH_USD that net profit falls under $1.
        let qa = quote(1_000_000_000, Some(250_000), Some(200_000_000_000));
        let qb = quote(1_005_000_000, Some(250_000), Some(200_000_000_000));
        let route = Route::new("Uniswap_V3", "SushiSwap");
        let expensive_gas = ProfitModelConfig { eth_usd: 6000.0, ..cfg() };
        let scored = score(route, 6, "1000", &qa, &qb, &expensive_gas).unwrap();
        assert!(scored.gas_usd > 0.0);
        assert!(!scored.qualifies(&expensive_gas));
    }

    #[test]
    fn negative_gross_never_qualifies() {
        let qa = quote(1_000_000_000, None, None);
        let qb = quote(990_000_000, None, None);
        let route = Route::new("Uniswap_V3", "SushiSwap");
        let scored = score(route, 6, "1000", &qa, &qb, &cfg()).unwrap();
        assert!(scored.gross_base.is_negative());
        assert!(!scored.qualifies(&cfg()));
    }

    #[test]
    fn missing_gas_units_fall_back_to_default_per_leg() {
        let qa = quote(1_000_000_000, None, None);
        let qb = quote(1_005_000_000, None, None);
        let route = Route::new("Uniswap_V3", "SushiSwap");
        let scored = score(route, 6, "1000", &qa, &qb, &cfg()).unwrap();
        assert_eq!(scored.gas_units, DEFAULT_GAS_UNITS_PER_LEG * 2);
    }
}
