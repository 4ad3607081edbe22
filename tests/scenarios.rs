//! End-to-end scenarios driving the full Scanner -> ProfitModel -> Cooldown
//! pipeline through its public API, using in-memory adapter doubles
//! instead of live network/on-chain calls.

use alloy::primitives::{address, Address, U256};
use async_trait::async_trait;
use dexarb_observer::adapters::QuoteAdapter;
use dexarb_observer::arbitrage::{Cooldown, FailureBackoff, ProfitModelConfig, Scanner};
use dexarb_observer::types::{Pair, Quote, Token};
use std::sync::Arc;
use std::time::Duration;

/// Prices by which side is sold: `sell_base_out` when quoted as the
/// forward leg (selling the pair's base token), `sell_quote_out` when
/// quoted as the return leg (selling the quote token back). A source
/// pinned to one underlying venue has a different price depending on
/// which side of the pair it is asked to sell — a constant-price mock
/// would make both directions of a two-source round trip look profitable
/// at once.
struct ScriptedAdapter {
    tag: String,
    base: Address,
    sell_base_out: Option<u64>,
    sell_quote_out: Option<u64>,
}

#[async_trait]
impl QuoteAdapter for ScriptedAdapter {
    fn tag(&self) -> &str {
        &self.tag
    }

    async fn quote(&self, sell: Address, _buy: Address, _amount_in_base: U256) -> Option<Quote> {
        let amount = if sell == self.base { self.sell_base_out } else { self.sell_quote_out };
        amount.map(|amount| Quote {
            buy_amount: U256::from(amount),
            gas_units: Some(150_000),
            gas_price: Some(1_000_000_000),
            protocol: self.tag.clone(),
            meta: None,
        })
    }
}

fn adapter(tag: &str, base: Address, sell_base_out: Option<u64>, sell_quote_out: Option<u64>) -> Arc<dyn QuoteAdapter> {
    Arc::new(ScriptedAdapter {
        tag: tag.to_string(),
        base,
        sell_base_out,
        sell_quote_out,
    })
}

fn default_profit_cfg() -> ProfitModelConfig {
    ProfitModelConfig {
        mev_buffer_bps: 5.0,
        min_profit_usd: 1.0,
        min_roi_bps: 5.0,
        eth_usd: 3000.0,
        usd_per_base: 1.0,
    }
}

fn weth_usdc() -> Pair {
    Pair {
        base: Token::new("USDC", address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), 6),
        quote: Token::new("WETH", address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), 18),
    }
}

#[tokio::test]
async fn golden_cross_venue_opportunity_is_found() {
    let base = weth_usdc().base.address;
    // Uniswap_V3 forward (selling USDC) is profitable; selling WETH back
    // through it is a loss. SushiSwap is the mirror image, so only
    // `Uniswap_V3 -> SushiSwap` clears the gate, not the reverse pairing.
    let leg_a = adapter("Uniswap_V3", base, Some(500_000_000_000_000), Some(990_000_000));
    let leg_b = adapter("SushiSwap", base, Some(500_000_000_000_000), Some(1_010_000_000));
    let scanner = Scanner::new(vec![leg_a, leg_b], None, default_profit_cfg());
    let cooldown = Cooldown::new(Duration::from_secs(60));
    let backoff = FailureBackoff::new(0);

    let findings = scanner.scan_once(&[weth_usdc()], &["1000".to_string()], &cooldown, &backoff, 0).await;

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].scored.route.leg_a, "Uniswap_V3");
    assert_eq!(findings[0].scored.route.leg_b, "SushiSwap");
    assert!(findings[0].scored.net_usd > 1.0);
}

#[tokio::test]
async fn gate_miss_is_not_reported() {
    // 0.1 USDC edge on a 1000 USDC trade is 1bps, under the 5bps ROI floor;
    // the reverse pairing is a clear loss either way.
    let base = weth_usdc().base.address;
    let leg_a = adapter("Uniswap_V3", base, Some(500_000_000_000_000), Some(990_000_000));
    let leg_b = adapter("SushiSwap", base, Some(500_000_000_000_000), Some(1_000_100_000));
    let scanner = Scanner::new(vec![leg_a, leg_b], None, default_profit_cfg());
    let cooldown = Cooldown::new(Duration::from_secs(60));
    let backoff = FailureBackoff::new(0);

    let findings = scanner.scan_once(&[weth_usdc()], &["1000".to_string()], &cooldown, &backoff, 0).await;

    assert!(findings.is_empty());
}

#[tokio::test]
async fn cooldown_suppresses_the_same_route_until_recorded_window_elapses() {
    let base = weth_usdc().base.address;
    let leg_a = adapter("Uniswap_V3", base, Some(500_000_000_000_000), Some(990_000_000));
    let leg_b = adapter("SushiSwap", base, Some(500_000_000_000_000), Some(1_010_000_000));
    let scanner = Scanner::new(vec![leg_a, leg_b], None, default_profit_cfg());
    let cooldown = Cooldown::new(Duration::from_secs(60));
    let backoff = FailureBackoff::new(0);

    let first = scanner.scan_once(&[weth_usdc()], &["1000".to_string()], &cooldown, &backoff, 0).await;
    assert_eq!(first.len(), 1);
    let key = first[0].scored.route.key(&first[0].pair.symbol(), &first[0].size_decimal);
    cooldown.record_publish(&key);

    let second = scanner.scan_once(&[weth_usdc()], &["1000".to_string()], &cooldown, &backoff, 1).await;
    assert!(second.is_empty(), "same route within the cooldown window must be suppressed");
}

#[tokio::test]
async fn leg_a_failure_never_invokes_leg_b() {
    let base = weth_usdc().base.address;
    // Uniswap_V3 fails in both directions, so neither the forward nor the
    // `SushiSwap -> Uniswap_V3` reverse permutation can produce a finding.
    let leg_a = adapter("Uniswap_V3", base, None, None);
    let leg_b = adapter("SushiSwap", base, Some(500_000_000_000_000), Some(1_010_000_000));
    let scanner = Scanner::new(vec![leg_a, leg_b], None, default_profit_cfg());
    let cooldown = Cooldown::new(Duration::from_secs(60));
    let backoff = FailureBackoff::new(0);

    let findings = scanner.scan_once(&[weth_usdc()], &["1000".to_string()], &cooldown, &backoff, 0).await;

    assert!(findings.is_empty());
}

#[tokio::test]
async fn repeated_adapter_failures_escalate_into_backoff() {
    let backoff = FailureBackoff::new(10);
    let key = "USDC/WETH|1000|Uniswap_V3->SushiSwap";

    backoff.record_failure(key, 0);
    assert!(backoff.is_backed_off(key, 5));
    assert!(!backoff.is_backed_off(key, 10));

    backoff.record_failure(key, 10);
    assert!(backoff.is_backed_off(key, 20));
    assert!(!backoff.is_backed_off(key, 60));
}

#[tokio::test]
async fn gas_cost_can_erode_an_otherwise_qualifying_edge() {
    let cheap_gas = default_profit_cfg();
    let expensive_gas = ProfitModelConfig { eth_usd: 20_000.0, ..cheap_gas };
    let base = weth_usdc().base.address;

    // Forward (`Uniswap_V3 -> SushiSwap`) has a 50bps edge, gas-sensitive
    // enough to be eroded by a high ETH_USD. The reverse pairing is a flat
    // loss regardless of gas, so it never qualifies in either scenario and
    // the comparison below isolates the gas effect on the forward route.
    let cheap_scanner = Scanner::new(
        vec![
            adapter("Uniswap_V3", base, Some(1_000_000_000), Some(990_000_000)),
            adapter("SushiSwap", base, Some(1_000_000_000), Some(1_005_000_000)),
        ],
        None,
        cheap_gas,
    );
    let expensive_scanner = Scanner::new(
        vec![
            adapter("Uniswap_V3", base, Some(1_000_000_000), Some(990_000_000)),
            adapter("SushiSwap", base, Some(1_000_000_000), Some(1_005_000_000)),
        ],
        None,
        expensive_gas,
    );

    let cooldown_a = Cooldown::new(Duration::from_secs(60));
    let cooldown_b = Cooldown::new(Duration::from_secs(60));
    let backoff = FailureBackoff::new(0);

    let cheap_findings = cheap_scanner.scan_once(&[weth_usdc()], &["1000".to_string()], &cooldown_a, &backoff, 0).await;
    let expensive_findings = expensive_scanner.scan_once(&[weth_usdc()], &["1000".to_string()], &cooldown_b, &backoff, 0).await;

    assert_eq!(cheap_findings.len(), 1);
    assert!(expensive_findings.is_empty(), "higher ETH_USD must be able to erode the same edge below threshold");
}
