//! Human-facing alert delivery for qualifying opportunities.
//!
//! Message body and subject line are a direct port of
//! `original_source/.../engine/arb_loop.py`'s `evaluate_and_alert` format
//! string. Delivery is a direct port of
//! `original_source/.../alerts/email.py`'s `send` (same env-var surface:
//! `SMTP_HOST`/`SMTP_PORT`/`SMTP_USER`/`SMTP_PASS`/`EMAIL_FROM`/`EMAIL_TO`/
//! `SMTP_USE_TLS`), translated from `aiosmtplib` to `lettre`, the closest
//! async-capable SMTP crate in the Rust ecosystem — no example repo in the
//! pack sends email, so this dependency is new rather than inherited (see
//! DESIGN.md).

use crate::arbitrage::ScoredRoute;
use crate::config::SmtpConfig;
use crate::types::Pair;
use async_trait::async_trait;
use lettre::message::Message;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{info, warn};

#[async_trait]
pub trait Alerter: Send + Sync {
    async fn alert(&self, chain_id: u64, pair: &Pair, size_decimal: &str, scored: &ScoredRoute);
}

/// Renders the same multi-line body the Python original logs and emails.
pub fn format_alert(chain_id: u64, pair: &Pair, size_decimal: &str, mev_buffer_bps: f64, eth_usd: f64, scored: &ScoredRoute) -> (String, String) {
    let pair_symbol = pair.symbol();
    let subject = format!("ARB {pair_symbol} {size_decimal} {}->{}", scored.route.leg_a, scored.route.leg_b);
    let body = format!(
        "[ARB] {pair_symbol} size {size_decimal} on chain {chain_id}\n\
         A: {} -> buy {} | B: {} -> sell back\n\
         Gross: {:.4} {} | Gross bps: {:.1}\n\
         MEV buffer: {mev_buffer_bps} bps | ROI (MEV-only): {:.1} bps\n\
         Gas(est): ${:.2} (ETH_USD={eth_usd}) | ROI (net): {:.1} bps\n\
         Net: ${:.2}",
        scored.route.leg_a,
        pair.quote.symbol,
        scored.route.leg_b,
        base_amount_decimal(scored),
        pair.base.symbol,
        scored.gross_bps,
        scored.roi_mev_bps,
        scored.gas_usd,
        scored.roi_net_bps,
        scored.net_usd,
    );
    (subject, body)
}

fn base_amount_decimal(scored: &ScoredRoute) -> f64 {
    if scored.gross_base.is_negative() {
        -crate::fixed_point::from_base(scored.gross_base.unsigned_abs(), 0).parse::<f64>().unwrap_or(0.0)
    } else {
        crate::fixed_point::from_base(scored.gross_base.into_raw(), 0).parse::<f64>().unwrap_or(0.0)
    }
}

pub struct NullAlerter;

#[async_trait]
impl Alerter for NullAlerter {
    async fn alert(&self, _chain_id: u64, pair: &Pair, _size_decimal: &str, _scored: &ScoredRoute) {
        info!(pair = %pair.symbol(), "no alert transport configured");
    }
}

pub struct SmtpAlerter {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
    mev_buffer_bps: f64,
    eth_usd: f64,
}

impl SmtpAlerter {
    pub fn new(cfg: &SmtpConfig, mev_buffer_bps: f64, eth_usd: f64) -> Result<Self, lettre::transport::smtp::Error> {
        let mut builder = if cfg.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.host)
        };
        builder = builder.port(cfg.port);
        if let (Some(user), Some(pass)) = (&cfg.username, &cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: cfg.from.clone(),
            to: cfg.to.clone(),
            mev_buffer_bps,
            eth_usd,
        })
    }
}

#[async_trait]
impl Alerter for SmtpAlerter {
    async fn alert(&self, chain_id: u64, pair: &Pair, size_decimal: &str, scored: &ScoredRoute) {
        let (subject, body) = format_alert(chain_id, pair, size_decimal, self.mev_buffer_bps, self.eth_usd, scored);

        let message = match Message::builder()
            .from(match self.from.parse() {
                Ok(addr) => addr,
                Err(e) => {
                    warn!(error = %e, "invalid EMAIL_FROM address");
                    return;
                }
            })
            .to(match self.to.parse() {
                Ok(addr) => addr,
                Err(e) => {
                    warn!(error = %e, "invalid EMAIL_TO address");
                    return;
                }
            })
            .subject(subject)
            .body(body)
        {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "failed to build alert email");
                return;
            }
        };

        if let Err(e) = self.transport.send(message).await {
            warn!(error = %e, "failed to send alert email");
        }
    }
}
