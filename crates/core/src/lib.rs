//! Core domain model for the betarb exchange bot.
//!
//! Defines the odds tick-ladder model, immutable selection snapshots, the
//! order lifecycle, the collaborator traits implemented by exchange clients
//! and stores, and the application configuration.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod links;
pub mod odds;
pub mod order;
pub mod selection;
pub mod traits;

pub use config::{
    AppConfig, EngineSettings, ExchangeSettings, MakerSettings, MarketEntry, PricingSettings,
    RiskSettings, StoreSettings, StrategyKind,
};
pub use config_loader::ConfigLoader;
pub use error::{ExchangeError, Result};
pub use links::{MarketLink, SelectionLink};
pub use odds::{
    next_tick_down, next_tick_up, tick_increment, ExchangeId, BACK_ABSENT, LAY_ABSENT, MAX_ODDS,
};
pub use order::{round_stake, Order, OrderReport, OrderStatus, Side};
pub use selection::{PriceLevel, PriceMap, Selection, SelectionKey, DEFAULT_LADDER_DEPTH};
pub use traits::{ChangedOrders, ExchangeClient, PriceFetch, Store};
