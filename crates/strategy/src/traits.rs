//! The strategy interface the engine drives.

use std::collections::HashMap;

use uuid::Uuid;

use betarb_core::{ExchangeId, Order, PriceMap};

use crate::pending::PendingOrders;
use crate::state::StrategyState;

/// A tick-driven trading strategy.
///
/// The engine feeds a strategy in a fixed per-tick order: fresh order state
/// first (`update_orders`, every tick), then fresh prices (`update_prices`,
/// only on ticks matching `refresh_ticks`) — which is the only place state
/// transitions and order construction happen. Strategies are handed valid,
/// already-reconciled data; exchange failures never reach them.
pub trait Strategy: Send {
    /// Display name for logging.
    fn name(&self) -> &str;

    /// Current state-machine state.
    fn state(&self) -> StrategyState;

    /// Ticks between required price refreshes.
    fn refresh_ticks(&self) -> u64;

    /// Markets whose prices this strategy needs, per exchange.
    fn market_ids(&self) -> Vec<(ExchangeId, String)>;

    /// Whether this strategy received prices this tick.
    fn was_updated(&self) -> bool;

    /// Marks whether this strategy is due a price update this tick.
    fn set_updated(&mut self, updated: bool);

    /// Writes the externally-managed lifetime countdown. Default no-op for
    /// strategies without close-out behavior.
    fn set_ticks_to_live(&mut self, _ticks: u64) {}

    /// Pushes reconciled order state into the strategy, keyed by the orders'
    /// client ids.
    fn update_orders(&mut self, orders: &HashMap<Uuid, Order>);

    /// Pushes fresh price snapshots into the strategy, triggering state
    /// machine evaluation. Clears and repopulates the pending order sets.
    fn update_prices(&mut self, prices: &PriceMap);

    /// The orders this strategy wants executed this tick.
    fn pending_orders(&self) -> PendingOrders;

    /// Returns true once the strategy has closed out and can be removed.
    fn is_finished(&self) -> bool {
        self.state() == StrategyState::Finished
    }
}
