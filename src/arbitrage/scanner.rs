//! One full scan pass: enumerate routes, quote both legs concurrently,
//! score, gate, and report.
//!
//! Route enumeration mirrors `original_source/.../engine/arb_loop.py`'s
//! `scan_once` exactly — the same three route families in the same order
//! for every `(pair, size)`:
//!   1. aggregator × aggregator, every ordered pair with `leg_a != leg_b`;
//!   2. aggregator → router;
//!   3. router → aggregator.
//! Concurrency follows the teacher crate's `paper_trading/engine.rs`
//! `Engine::run`, which fans work out across a `tokio::task::JoinSet`
//! rather than awaiting each task serially; here every candidate route in
//! a `(pair, size)` batch is quoted concurrently, and only the
//! cooldown/backoff bookkeeping and the `Sink`/`Alerter` calls are
//! serialized afterward, since `Cooldown`/`FailureBackoff` must observe a
//! consistent view across one scan.

use crate::adapters::QuoteAdapter;
use crate::arbitrage::cooldown::{Cooldown, FailureBackoff};
use crate::arbitrage::profit_model::{self, ProfitModelConfig, ScoredRoute};
use crate::types::{Opportunity, Pair, Quote, Route};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

/// One candidate leg source: either an aggregator pinned to a source, or
/// the direct router. Dispatch is by tag, not by concrete type, so the
/// three route families can be enumerated uniformly.
pub type AdapterHandle = Arc<dyn QuoteAdapter>;

/// A qualifying route plus the score that earned it, ready for
/// `Cooldown`/`Sink`/`Alerter` handling.
pub struct Finding {
    pub pair: Pair,
    pub size_decimal: String,
    pub scored: ScoredRoute,
    pub qa: Quote,
    pub qb: Quote,
}

pub struct Scanner {
    aggregators: Vec<AdapterHandle>,
    router: Option<AdapterHandle>,
    profit_model_cfg: ProfitModelConfig,
}

impl Scanner {
    pub fn new(aggregators: Vec<AdapterHandle>, router: Option<AdapterHandle>, profit_model_cfg: ProfitModelConfig) -> Self {
        Self {
            aggregators,
            router,
            profit_model_cfg,
        }
    }

    /// Leg-source pairs for the aggregator×aggregator and aggregator→router
    /// families, where every pair quotes its own leg A independently. The
    /// router→aggregator family is handled separately in `scan_once`: the
    /// router leg is quoted once per `(pair, size)` and fanned out across
    /// every aggregator leg B, rather than being re-quoted once per pair
    /// here (see `evaluate_router_leg_a_family`).
    fn candidate_routes(&self) -> Vec<(AdapterHandle, AdapterHandle)> {
        let mut out = Vec::new();

        for leg_a in &self.aggregators {
            for leg_b in &self.aggregators {
                if Arc::ptr_eq(leg_a, leg_b) || leg_a.tag() == leg_b.tag() {
                    continue;
                }
                out.push((leg_a.clone(), leg_b.clone()));
            }
        }

        if let Some(router) = &self.router {
            for leg_a in &self.aggregators {
                out.push((leg_a.clone(), router.clone()));
            }
        }

        out
    }

    /// Quote both legs of one candidate route, short-circuiting on leg A.
    /// The route key is returned alongside the outcome so the caller can
    /// drive `FailureBackoff` without recomputing it.
    async fn evaluate_route(
        pair: Pair,
        size_decimal: String,
        leg_a: AdapterHandle,
        leg_b: AdapterHandle,
        profit_model_cfg: ProfitModelConfig,
    ) -> (String, Option<Finding>) {
        let key = Route::new(leg_a.tag(), leg_b.tag()).key(&pair.symbol(), &size_decimal);

        let Ok(sell_amount_base) = crate::fixed_point::to_base(&size_decimal, pair.base.decimals) else {
            return (key, None);
        };

        let Some(qa) = leg_a.quote(pair.base.address, pair.quote.address, sell_amount_base).await else {
            return (key, None);
        };
        if !qa.is_fillable() {
            return (key, None);
        }

        let Some(qb) = leg_b.quote(pair.quote.address, pair.base.address, qa.buy_amount).await else {
            return (key, None);
        };
        if !qb.is_fillable() {
            return (key, None);
        }

        let route = Route::new(leg_a.tag(), leg_b.tag());
        if !route.is_valid() {
            return (key, None);
        }

        let Ok(scored) = profit_model::score(route, pair.base.decimals, &size_decimal, &qa, &qb, &profit_model_cfg) else {
            return (key, None);
        };

        (key, Some(Finding { pair, size_decimal, scored, qa, qb }))
    }

    /// Router→aggregator family for one `(pair, size)`: the router leg A is
    /// quoted exactly once, then its quote is reused across every supplied
    /// aggregator leg B, run concurrently. Without this, each aggregator
    /// source would force its own on-chain `getAmountsOut` call for leg A
    /// even though the router quote for a given `(pair, size)` never
    /// depends on which aggregator leg B is paired with it.
    async fn evaluate_router_leg_a_family(
        pair: Pair,
        size_decimal: String,
        router: AdapterHandle,
        leg_bs: Vec<AdapterHandle>,
        profit_model_cfg: ProfitModelConfig,
    ) -> Vec<(String, Option<Finding>)> {
        let key_for = |leg_b_tag: &str| Route::new(router.tag(), leg_b_tag).key(&pair.symbol(), &size_decimal);

        let Ok(sell_amount_base) = crate::fixed_point::to_base(&size_decimal, pair.base.decimals) else {
            return leg_bs.iter().map(|leg_b| (key_for(leg_b.tag()), None)).collect();
        };

        let qa = router
            .quote(pair.base.address, pair.quote.address, sell_amount_base)
            .await
            .filter(Quote::is_fillable);

        let mut inner = JoinSet::new();
        for leg_b in leg_bs {
            let key = key_for(leg_b.tag());
            let qa = qa.clone();
            let pair = pair.clone();
            let size_decimal = size_decimal.clone();
            let router_tag = router.tag().to_string();
            let cfg = profit_model_cfg;
            inner.spawn(async move {
                let Some(qa) = qa else {
                    return (key, None);
                };
                let Some(qb) = leg_b.quote(pair.quote.address, pair.base.address, qa.buy_amount).await else {
                    return (key, None);
                };
                if !qb.is_fillable() {
                    return (key, None);
                }
                let route = Route::new(router_tag, leg_b.tag());
                if !route.is_valid() {
                    return (key, None);
                }
                let Ok(scored) = profit_model::score(route, pair.base.decimals, &size_decimal, &qa, &qb, &cfg) else {
                    return (key, None);
                };
                (key, Some(Finding { pair, size_decimal, scored, qa, qb }))
            });
        }

        let mut out = Vec::new();
        while let Some(result) = inner.join_next().await {
            if let Ok(outcome) = result {
                out.push(outcome);
            }
        }
        out
    }

    /// Run one scan across every configured `(pair, size)`, respecting
    /// `Cooldown`/`FailureBackoff`, and return every qualifying,
    /// not-currently-suppressed finding.
    pub async fn scan_once(
        &self,
        pairs: &[Pair],
        sizes: &[String],
        cooldown: &Cooldown,
        backoff: &FailureBackoff,
        iteration: u64,
    ) -> Vec<Finding> {
        let mut join_set = JoinSet::new();

        for pair in pairs {
            for size in sizes {
                for (leg_a, leg_b) in self.candidate_routes() {
                    let route_key_prefix = Route::new(leg_a.tag(), leg_b.tag()).key(&pair.symbol(), size);
                    if backoff.is_backed_off(&route_key_prefix, iteration) {
                        continue;
                    }
                    let pair = pair.clone();
                    let size = size.clone();
                    let cfg = self.profit_model_cfg;
                    join_set.spawn(async move { vec![Self::evaluate_route(pair, size, leg_a, leg_b, cfg).await] });
                }

                if let Some(router) = &self.router {
                    let active_leg_bs: Vec<AdapterHandle> = self
                        .aggregators
                        .iter()
                        .filter(|leg_b| {
                            let key = Route::new(router.tag(), leg_b.tag()).key(&pair.symbol(), size);
                            !backoff.is_backed_off(&key, iteration)
                        })
                        .cloned()
                        .collect();

                    if !active_leg_bs.is_empty() {
                        let router = router.clone();
                        let pair = pair.clone();
                        let size = size.clone();
                        let cfg = self.profit_model_cfg;
                        join_set.spawn(async move { Self::evaluate_router_leg_a_family(pair, size, router, active_leg_bs, cfg).await });
                    }
                }
            }
        }

        let mut findings = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(outcomes) => {
                    for (key, outcome) in outcomes {
                        match outcome {
                            Some(finding) => {
                                backoff.record_success(&key);
                                if cooldown.is_suppressed(&key) {
                                    debug!(key, "suppressed by cooldown");
                                    continue;
                                }
                                if finding.scored.qualifies(&self.profit_model_cfg) {
                                    findings.push(finding);
                                }
                            }
                            None => backoff.record_failure(&key, iteration),
                        }
                    }
                }
                Err(e) => debug!(error = %e, "scan task panicked or was cancelled"),
            }
        }

        findings
    }
}

impl Finding {
    pub fn into_opportunity(self, chain_id: u64) -> Opportunity {
        let gross_base = crate::fixed_point::from_base(self.scored.gross_base.unsigned_abs(), self.pair.base.decimals);
        let gross_base = if self.scored.gross_base.is_negative() {
            format!("-{gross_base}")
        } else {
            gross_base
        };
        Opportunity {
            chain_id,
            pair_symbol: self.pair.symbol(),
            size: self.size_decimal.clone(),
            route: self.scored.route.clone(),
            gross_base,
            gross_bps: self.scored.gross_bps,
            net_usd: self.scored.net_usd,
            gas_usd: self.scored.gas_usd,
            details: serde_json::json!({
                "leg_a": self.scored.route.leg_a,
                "leg_b": self.scored.route.leg_b,
                "qa": self.qa,
                "qb": self.qb,
                "roi_mev_bps": self.scored.roi_mev_bps,
                "roi_net_bps": self.scored.roi_net_bps,
            }),
        }
    }
}
