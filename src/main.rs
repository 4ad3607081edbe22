//! Supervisor loop: load configuration once, then scan forever.
//!
//! Structure follows the Python original's `main()` in
//! `original_source/.../engine/arb_loop.py` — init, then `loop { scan_once
//! ... sleep }` with every error from one iteration logged and swallowed
//! rather than aborting the process — expressed with `clap` for argument
//! parsing and `tracing_subscriber` for structured logs, exactly as the
//! teacher crate's own `main.rs`/`config.rs` do.

use alloy::providers::ProviderBuilder;
use clap::Parser;
use dexarb_observer::adapters::aggregator::AggregatorAdapter;
use dexarb_observer::adapters::router::RouterAdapter;
use dexarb_observer::adapters::QuoteAdapter;
use dexarb_observer::alerter::{Alerter, NullAlerter, SmtpAlerter};
use dexarb_observer::arbitrage::{Cooldown, FailureBackoff, ProfitModelConfig, Scanner};
use dexarb_observer::config::Config;
use dexarb_observer::sink::{NullSink, PostgresSink, Sink};
use dexarb_observer::types::Pair;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(about = "Cross-DEX arbitrage observer")]
struct Args {
    #[arg(long, env = "TOKENS_FILE", default_value = "configs/tokens.toml")]
    tokens: String,

    #[arg(long, env = "PAIRS_FILE", default_value = "configs/pairs.toml")]
    pairs: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.tokens, &args.pairs)?;

    let provider = ProviderBuilder::new().connect_http(cfg.rpc_url.parse()?);

    let mut aggregators: Vec<Arc<dyn QuoteAdapter>> = Vec::new();
    let http_client = reqwest::Client::new();
    for source in &cfg.sources {
        aggregators.push(Arc::new(AggregatorAdapter::new(
            http_client.clone(),
            cfg.aggregator_api_base.clone(),
            cfg.aggregator_api_key.clone(),
            cfg.aggregator_bearer_token.clone(),
            source.clone(),
            cfg.adapter_deadline,
        )));
    }

    let router: Option<Arc<dyn QuoteAdapter>> = match (cfg.router_address, cfg.factory_address) {
        (Some(router_address), Some(factory_address)) => Some(Arc::new(RouterAdapter::new(
            provider.clone(),
            router_address,
            factory_address,
            true,
            cfg.adapter_deadline,
        ))),
        _ => {
            info!("ROUTER_ADDRESS/FACTORY_ADDRESS not set, direct router leg disabled");
            None
        }
    };

    let profit_model_cfg = ProfitModelConfig {
        mev_buffer_bps: cfg.mev_buffer_bps,
        min_profit_usd: cfg.min_profit_usd,
        min_roi_bps: cfg.min_roi_bps,
        eth_usd: cfg.eth_usd,
        usd_per_base: 1.0,
    };

    let scanner = Scanner::new(aggregators, router, profit_model_cfg);
    let cooldown = Cooldown::new(Duration::from_secs(cfg.alert_cooldown_s));
    let backoff = FailureBackoff::new(10);

    let sink: Arc<dyn Sink> = match &cfg.pg_dsn {
        Some(dsn) => match PostgresSink::connect(dsn).await {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                error!(error = %e, "failed to connect to PG_DSN, falling back to no-op sink");
                Arc::new(NullSink)
            }
        },
        None => Arc::new(NullSink),
    };

    let alerter: Arc<dyn Alerter> = match &cfg.smtp {
        Some(smtp) => match SmtpAlerter::new(smtp, cfg.mev_buffer_bps, cfg.eth_usd) {
            Ok(alerter) => Arc::new(alerter),
            Err(e) => {
                error!(error = %e, "failed to build SMTP transport, falling back to no-op alerter");
                Arc::new(NullAlerter)
            }
        },
        None => Arc::new(NullAlerter),
    };

    let pairs: Vec<Pair> = cfg
        .pairs
        .iter()
        .filter_map(|(base, quote)| cfg.pair(base, quote))
        .collect();

    info!(pairs = pairs.len(), sizes = cfg.sizes.len(), "starting arbitrage observer");

    let mut iteration: u64 = 0;
    loop {
        let findings = scanner.scan_once(&pairs, &cfg.sizes, &cooldown, &backoff, iteration).await;

        let mut opportunities = Vec::with_capacity(findings.len());
        for finding in findings {
            let key = finding.scored.route.key(&finding.pair.symbol(), &finding.size_decimal);
            cooldown.record_publish(&key);

            alerter
                .alert(cfg.chain_id, &finding.pair, &finding.size_decimal, &finding.scored)
                .await;

            opportunities.push(finding.into_opportunity(cfg.chain_id));
        }

        // All Sink writes from this scan commit as a single unit; a crash
        // mid-scan leaves no partial write behind.
        sink.record_batch(&opportunities).await;

        iteration = iteration.wrapping_add(1);
        tokio::time::sleep(cfg.scan_interval).await;
    }
}
