//! Configuration schema and loader.
//!
//! The token/pair set is read once at startup from a TOML file (mirroring
//! `paper_trading/toml_config.rs`'s `TomlConfig::load` in the teacher crate
//! and the `configs/tokens.*.yml` / `configs/pairs.*.yml` split in the
//! Python original, translated to the teacher's TOML dependency rather
//! than introducing a YAML one). Thresholds and secrets are read from the
//! environment via `dotenv`, exactly as `config.rs` in the teacher crate
//! does. This module owns the schema and the minimal plumbing needed to
//! populate it, nothing more.

use crate::error::EngineError;
use alloy::primitives::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// One entry of the configured token set.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
    pub address: String,
    pub decimals: u8,
}

/// `tokens.toml`: `chain_id` plus a `symbols` map.
#[derive(Debug, Clone, Deserialize)]
pub struct TokensFile {
    pub chain_id: u64,
    pub symbols: HashMap<String, TokenEntry>,
}

/// `pairs.toml`: the cartesian inputs to the scan — pairs, sizes, sources.
#[derive(Debug, Clone, Deserialize)]
pub struct PairsFile {
    pub pairs: Vec<(String, String)>,
    pub sizes: Vec<String>,
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
}

fn default_sources() -> Vec<String> {
    vec!["Uniswap_V3".into(), "Balancer_V2".into(), "SushiSwap".into()]
}

/// Fully resolved engine configuration: the merged token/pair set plus all
/// environment-driven thresholds.
#[derive(Debug, Clone)]
pub struct Config {
    pub chain_id: u64,
    pub tokens: HashMap<String, crate::types::Token>,
    pub pairs: Vec<(String, String)>,
    pub sizes: Vec<String>,
    pub sources: Vec<String>,

    pub mev_buffer_bps: f64,
    pub min_profit_usd: f64,
    pub min_roi_bps: f64,
    pub eth_usd: f64,
    pub alert_cooldown_s: u64,

    pub rpc_url: String,
    pub aggregator_api_base: String,
    pub aggregator_api_key: Option<String>,
    pub router_address: Option<Address>,
    pub factory_address: Option<Address>,
    pub aggregator_bearer_token: Option<String>,

    pub adapter_deadline: Duration,
    pub scan_interval: Duration,

    pub pg_dsn: Option<String>,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub to: String,
    pub use_tls: bool,
}

impl Config {
    /// Load the token/pair TOML files plus environment thresholds. `.env`
    /// is loaded first (teacher's `dotenv::dotenv().ok()` convention) so
    /// both shell-exported and `.env`-file variables are visible.
    pub fn load(tokens_path: impl AsRef<Path>, pairs_path: impl AsRef<Path>) -> Result<Self, EngineError> {
        dotenv::dotenv().ok();

        let tokens_path = tokens_path.as_ref();
        let tokens_raw = std::fs::read_to_string(tokens_path).map_err(|source| EngineError::ConfigFileRead {
            path: tokens_path.display().to_string(),
            source,
        })?;
        let tokens_file: TokensFile = toml::from_str(&tokens_raw).map_err(|source| EngineError::ConfigFileParse {
            path: tokens_path.display().to_string(),
            source,
        })?;

        let pairs_path = pairs_path.as_ref();
        let pairs_raw = std::fs::read_to_string(pairs_path).map_err(|source| EngineError::ConfigFileRead {
            path: pairs_path.display().to_string(),
            source,
        })?;
        let pairs_file: PairsFile = toml::from_str(&pairs_raw).map_err(|source| EngineError::ConfigFileParse {
            path: pairs_path.display().to_string(),
            source,
        })?;

        let mut tokens = HashMap::new();
        for (symbol, entry) in tokens_file.symbols {
            if entry.decimals as u32 > crate::fixed_point::MAX_DECIMALS {
                return Err(EngineError::InvalidConfig {
                    field: format!("symbols.{symbol}.decimals"),
                    reason: format!("{} exceeds maximum {}", entry.decimals, crate::fixed_point::MAX_DECIMALS),
                });
            }
            let address = Address::from_str(&entry.address).map_err(|e| EngineError::InvalidAddress {
                symbol: symbol.clone(),
                reason: e.to_string(),
            })?;
            tokens.insert(symbol.clone(), crate::types::Token::new(symbol, address, entry.decimals));
        }

        for (base, quote) in &pairs_file.pairs {
            for sym in [base, quote] {
                if !tokens.contains_key(sym) {
                    return Err(EngineError::InvalidConfig {
                        field: "pairs".into(),
                        reason: format!("pair references unknown token symbol {sym}"),
                    });
                }
            }
        }

        let env_f64 = |key: &str, default: f64| -> f64 {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        };
        let env_u64 = |key: &str, default: u64| -> u64 {
            std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        };
        let env_str = |key: &str| -> Option<String> { std::env::var(key).ok() };

        let rpc_url = env_str("RPC_URL").ok_or_else(|| EngineError::MissingEnv("RPC_URL".into()))?;

        let router_address = env_str("ROUTER_ADDRESS")
            .map(|s| Address::from_str(&s))
            .transpose()
            .map_err(|e| EngineError::InvalidConfig {
                field: "ROUTER_ADDRESS".into(),
                reason: e.to_string(),
            })?;
        let factory_address = env_str("FACTORY_ADDRESS")
            .map(|s| Address::from_str(&s))
            .transpose()
            .map_err(|e| EngineError::InvalidConfig {
                field: "FACTORY_ADDRESS".into(),
                reason: e.to_string(),
            })?;

        let smtp = match (env_str("SMTP_HOST"), env_str("EMAIL_FROM"), env_str("EMAIL_TO")) {
            (Some(host), Some(from), Some(to)) => Some(SmtpConfig {
                host,
                port: env_u64("SMTP_PORT", 587) as u16,
                username: env_str("SMTP_USER"),
                password: env_str("SMTP_PASS"),
                from,
                to,
                use_tls: env_str("SMTP_USE_TLS").map(|v| v == "true").unwrap_or(true),
            }),
            _ => None,
        };

        Ok(Self {
            chain_id: tokens_file.chain_id,
            tokens,
            pairs: pairs_file.pairs,
            sizes: pairs_file.sizes,
            sources: pairs_file.sources,

            mev_buffer_bps: env_f64("MEV_BUFFER_BPS", 5.0),
            min_profit_usd: env_f64("MIN_PROFIT_USD", 1.0),
            min_roi_bps: env_f64("MIN_ROI_BPS", 5.0),
            eth_usd: env_f64("ETH_USD", 0.0),
            alert_cooldown_s: env_u64("ALERT_COOLDOWN_S", 60),

            rpc_url,
            aggregator_api_base: env_str("AGGREGATOR_API_BASE")
                .unwrap_or_else(|| "https://base.api.0x.org/swap/v1".to_string()),
            aggregator_api_key: env_str("AGGREGATOR_API_KEY"),
            router_address,
            factory_address,
            aggregator_bearer_token: env_str("AGGREGATOR_BEARER_TOKEN"),

            adapter_deadline: Duration::from_millis(env_u64("ADAPTER_DEADLINE_MS", 3_500)),
            scan_interval: Duration::from_millis(env_u64("SCAN_INTERVAL_MS", 1_000)),

            pg_dsn: env_str("PG_DSN"),
            smtp,
        })
    }

    pub fn pair(&self, base_symbol: &str, quote_symbol: &str) -> Option<crate::types::Pair> {
        Some(crate::types::Pair {
            base: self.tokens.get(base_symbol)?.clone(),
            quote: self.tokens.get(quote_symbol)?.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> tempfile_path::TempPath {
        tempfile_path::TempPath::new(contents)
    }

    /// Minimal stand-in for a temp-file helper so this module has no extra
    /// dev-dependency beyond what the teacher already declares.
    mod tempfile_path {
        use std::fs::File;
        use std::io::Write;
        use std::path::{Path, PathBuf};

        pub struct TempPath(PathBuf);

        impl TempPath {
            pub fn new(contents: &str) -> Self {
                let path = std::env::temp_dir().join(format!(
                    "dexarb-observer-test-{}-{}.toml",
                    std::process::id(),
                    contents.len()
                ));
                let mut f = File::create(&path).unwrap();
                f.write_all(contents.as_bytes()).unwrap();
                Self(path)
            }
        }

        impl AsRef<Path> for TempPath {
            fn as_ref(&self) -> &Path {
                &self.0
            }
        }

        impl Drop for TempPath {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
    }

    #[test]
    fn load_valid_config() {
        std::env::set_var("RPC_URL", "https://rpc.example/");
        std::env::remove_var("MIN_PROFIT_USD");

        let tokens = write_temp(
            r#"
chain_id = 8453
[symbols.USDC]
address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
decimals = 6
[symbols.WETH]
address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
decimals = 18
"#,
        );
        let pairs = write_temp(
            r#"
pairs = [["USDC", "WETH"]]
sizes = ["1000"]
sources = ["Uniswap_V3", "SushiSwap"]
"#,
        );

        let cfg = Config::load(&tokens, &pairs).unwrap();
        assert_eq!(cfg.chain_id, 8453);
        assert_eq!(cfg.min_profit_usd, 1.0);
        assert!(cfg.pair("USDC", "WETH").is_some());
    }

    #[test]
    fn rejects_pair_referencing_unknown_token() {
        std::env::set_var("RPC_URL", "https://rpc.example/");
        let tokens = write_temp(
            r#"
chain_id = 8453
[symbols.USDC]
address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
decimals = 6
"#,
        );
        let pairs = write_temp(
            r#"
pairs = [["USDC", "NOPE"]]
sizes = ["1000"]
"#,
        );
        let err = Config::load(&tokens, &pairs).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { .. }));
    }
}
