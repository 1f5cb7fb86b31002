//! Application configuration.
//!
//! Every section has serde defaults so a partial TOML file (or none at all)
//! yields a runnable practice-mode configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::odds::ExchangeId;
use crate::selection::DEFAULT_LADDER_DEPTH;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tick loop settings.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Betfair commission and stake floor.
    #[serde(default = "ExchangeSettings::betfair")]
    pub betfair: ExchangeSettings,
    /// Betdaq commission and stake floor.
    #[serde(default = "ExchangeSettings::betdaq")]
    pub betdaq: ExchangeSettings,
    /// Price ladder and refresh settings.
    #[serde(default)]
    pub pricing: PricingSettings,
    /// Market-making strategy settings.
    #[serde(default)]
    pub maker: MakerSettings,
    /// Risk limits applied before order submission.
    #[serde(default)]
    pub risk: RiskSettings,
    /// Persistence settings.
    #[serde(default)]
    pub store: StoreSettings,
    /// Matched markets to trade, one strategy each.
    #[serde(default)]
    pub markets: Vec<MarketEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            betfair: ExchangeSettings::betfair(),
            betdaq: ExchangeSettings::betdaq(),
            pricing: PricingSettings::default(),
            maker: MakerSettings::default(),
            risk: RiskSettings::default(),
            store: StoreSettings::default(),
            markets: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Per-exchange settings lookup.
    #[must_use]
    pub fn exchange(&self, exchange: ExchangeId) -> &ExchangeSettings {
        match exchange {
            ExchangeId::Betfair => &self.betfair,
            ExchangeId::Betdaq => &self.betdaq,
        }
    }
}

/// Tick loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Seconds between ticks.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// When true, order placement is logged but never executed and the order
    /// store receives no writes from order execution.
    #[serde(default = "default_true")]
    pub practice_mode: bool,
    /// Stop after this many ticks (None = run until interrupted).
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            practice_mode: true,
            max_ticks: None,
        }
    }
}

/// Commission and stake floor for one exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSettings {
    /// Commission rate charged on net winnings, as a fraction.
    pub commission: Decimal,
    /// Minimum stake the exchange accepts.
    pub min_stake: Decimal,
    /// Whether to log in at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ExchangeSettings {
    /// Betfair defaults: 5% commission, 2.00 minimum stake.
    #[must_use]
    pub fn betfair() -> Self {
        Self {
            commission: dec!(0.05),
            min_stake: dec!(2.0),
            enabled: true,
        }
    }

    /// Betdaq defaults: 5% commission, 0.50 minimum stake.
    #[must_use]
    pub fn betdaq() -> Self {
        Self {
            commission: dec!(0.05),
            min_stake: dec!(0.5),
            enabled: true,
        }
    }
}

/// Price ladder and refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Number of levels kept per ladder side.
    #[serde(default = "default_ladder_depth")]
    pub ladder_depth: usize,
    /// Default ticks between price refreshes for new strategies.
    #[serde(default = "default_refresh_ticks")]
    pub refresh_ticks: u64,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            ladder_depth: DEFAULT_LADDER_DEPTH,
            refresh_ticks: default_refresh_ticks(),
        }
    }
}

/// Market-making strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerSettings {
    /// Stake quoted on the back side of each pair.
    #[serde(default = "default_base_stake")]
    pub base_stake: Decimal,
    /// Minimum spread (in odds) between our two quotes.
    #[serde(default = "default_epsilon")]
    pub epsilon: Decimal,
    /// Ticks-to-live below which the strategy closes out.
    #[serde(default = "default_close_out_ticks")]
    pub close_out_ticks: u64,
}

impl Default for MakerSettings {
    fn default() -> Self {
        Self {
            base_stake: default_base_stake(),
            epsilon: default_epsilon(),
            close_out_ticks: default_close_out_ticks(),
        }
    }
}

/// Risk limits applied before order submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSettings {
    /// Lay orders quoted above this price are discarded.
    #[serde(default = "default_max_lay_odds")]
    pub max_lay_odds: Decimal,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            max_lay_odds: default_max_lay_odds(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite database path. None selects the in-memory store.
    #[serde(default)]
    pub sqlite_path: Option<String>,
}

/// Which strategy to run on a matched market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Cross-exchange arbitrage over the matched pair.
    #[default]
    Cross,
    /// Market making on the Betfair leg only.
    Maker,
    /// Independent market making on both legs.
    DualMaker,
}

/// A market known to represent the same event on both exchanges, plus the
/// strategy to run on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEntry {
    /// Display name of the outcome.
    pub name: String,
    /// Betfair market id.
    pub betfair_market_id: String,
    /// Betfair selection id.
    pub betfair_selection_id: u64,
    /// Betdaq market id.
    pub betdaq_market_id: String,
    /// Betdaq selection id.
    pub betdaq_selection_id: u64,
    /// Strategy to run.
    #[serde(default)]
    pub strategy: StrategyKind,
}

fn default_tick_secs() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

fn default_ladder_depth() -> usize {
    DEFAULT_LADDER_DEPTH
}

fn default_refresh_ticks() -> u64 {
    1
}

fn default_base_stake() -> Decimal {
    dec!(2.0)
}

fn default_epsilon() -> Decimal {
    dec!(0.1)
}

fn default_close_out_ticks() -> u64 {
    10
}

fn default_max_lay_odds() -> Decimal {
    dec!(20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_practice_mode() {
        let config = AppConfig::default();
        assert!(config.engine.practice_mode);
        assert_eq!(config.engine.tick_secs, 2);
    }

    #[test]
    fn test_exchange_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.betfair.min_stake, dec!(2.0));
        assert_eq!(config.betdaq.min_stake, dec!(0.5));
        assert_eq!(config.exchange(ExchangeId::Betfair).commission, dec!(0.05));
    }

    #[test]
    fn test_risk_defaults() {
        assert_eq!(AppConfig::default().risk.max_lay_odds, dec!(20.0));
    }
}
