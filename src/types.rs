//! Core data structures for the arbitrage detection engine.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A token tracked by the engine. `decimals` is bounded to `[0, 30]`
/// (enforced at config-load time, see [`crate::config`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    /// `address` is stored checksum-normalized (EIP-55) — `Address`'s
    /// `Display`/`{:#x}` formatting already does this, so normalization is
    /// free at construction; this constructor exists to make the
    /// invariant explicit at call sites.
    pub fn new(symbol: impl Into<String>, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address,
            decimals,
        }
    }

    pub fn checksum_address(&self) -> String {
        self.address.to_checksum(None)
    }
}

/// An ordered `(base, quote)` pair drawn from the configured token set.
/// Leg A sells `base` to obtain `quote`; leg B sells `quote` back to `base`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pair {
    pub base: Token,
    pub quote: Token,
}

impl Pair {
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.base.symbol, self.quote.symbol)
    }
}

/// Adapter output. A missing or zero `buy_amount` means "no liquidity /
/// error"; adapters never construct a `Quote` in that case, they return
/// `None` instead (see [`crate::adapters::QuoteAdapter`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Integer amount of the buy token, in its base units.
    pub buy_amount: alloy::primitives::U256,
    /// Estimated gas units for this leg, when the source reports one.
    pub gas_units: Option<u64>,
    /// Gas price in wei-equivalent, when the source reports one.
    pub gas_price: Option<u128>,
    /// Protocol tag, e.g. `Uniswap_V3`, `Balancer_V2`, `Aerodrome_V1_4f`.
    pub protocol: String,
    /// Opaque adapter-specific payload (raw aggregator response fragment,
    /// ABI variant used, etc.) carried through into `Opportunity::details`.
    pub meta: Option<serde_json::Value>,
}

impl Quote {
    /// True iff this quote represents executable liquidity. A `buy_amount`
    /// of zero is never distinguished from a failed leg.
    pub fn is_fillable(&self) -> bool {
        !self.buy_amount.is_zero()
    }
}

/// Ordered pair of protocol tags naming the two legs of a round trip.
/// Valid iff `leg_a != leg_b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub leg_a: String,
    pub leg_b: String,
}

impl Route {
    pub fn new(leg_a: impl Into<String>, leg_b: impl Into<String>) -> Self {
        Self {
            leg_a: leg_a.into(),
            leg_b: leg_b.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.leg_a != self.leg_b
    }

    /// Stable string form used as the cooldown/backoff map key:
    /// `pair | size | leg_a -> leg_b`.
    pub fn key(&self, pair_symbol: &str, size_decimal: &str) -> String {
        format!("{pair_symbol}|{size_decimal}|{}->{}", self.leg_a, self.leg_b)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.leg_a, self.leg_b)
    }
}

/// A published, qualifying round-trip opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub chain_id: u64,
    pub pair_symbol: String,
    /// Trade size, in base-token decimal units, as the canonical string
    /// form fed to [`crate::fixed_point::to_base`].
    pub size: String,
    pub route: Route,
    /// `out_back - sell_amount`, in base-token decimal units.
    pub gross_base: String,
    /// `gross_base / size * 10000`, decimal (not truncated integer).
    pub gross_bps: f64,
    pub net_usd: f64,
    pub gas_usd: f64,
    /// Raw quotes plus the MEV-only and net-of-gas ROI figures.
    pub details: serde_json::Value,
}
