//! Strategy state machines for the betarb exchange bot.
//!
//! Three strategies share one interface: cross-exchange arbitrage over a
//! matched selection pair, single-exchange market making, and a dual
//! market-making composite running one maker per exchange. The
//! [`group::StrategyGroup`] aggregates all active strategies and handles the
//! per-tick fan-out of prices and order state.

pub mod cross;
pub mod dual;
pub mod group;
pub mod maker;
pub mod pending;
pub mod state;
pub mod traits;

pub use cross::{check_opportunity, size_stakes, CrossConfig, CrossStrategy, ExchangeParams};
pub use dual::DualMakerStrategy;
pub use group::StrategyGroup;
pub use maker::{neutral_lay_stake, MakerConfig, MakerStrategy};
pub use pending::PendingOrders;
pub use state::StrategyState;
pub use traits::Strategy;
