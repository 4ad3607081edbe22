//! Cross-DEX arbitrage observer: scans configured token pairs across a
//! meta-aggregator (pinned per source) and a direct on-chain router,
//! scores every round trip, and reports the ones that clear the
//! configured profit and ROI thresholds.

pub mod adapters;
pub mod alerter;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod fixed_point;
pub mod sink;
pub mod types;
