//! The strategy group: every active strategy, with per-tick fan-out.

use std::collections::{HashMap, HashSet};

use tracing::info;
use uuid::Uuid;

use betarb_core::{ExchangeId, Order, PriceMap};

use crate::pending::PendingOrders;
use crate::traits::Strategy;

/// An unordered collection of active strategies.
///
/// Fan-out queries for prices, market ids, and pending orders are filtered by
/// the per-tick `updated` flag; order-state fan-out reaches every strategy on
/// every tick.
#[derive(Default)]
pub struct StrategyGroup {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a strategy.
    pub fn add(&mut self, strategy: Box<dyn Strategy>) {
        info!(strategy = strategy.name(), "Adding strategy");
        self.strategies.push(strategy);
    }

    /// Number of active strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns true when no strategies are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Iterates the strategies.
    pub fn iter(&self) -> impl Iterator<Item = &Box<dyn Strategy>> {
        self.strategies.iter()
    }

    /// Iterates the strategies mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Strategy>> {
        self.strategies.iter_mut()
    }

    /// Marks each strategy's `updated` flag for this tick from its refresh
    /// cadence.
    pub fn mark_updated(&mut self, tick: u64) {
        for strategy in &mut self.strategies {
            let cadence = strategy.refresh_ticks().max(1);
            strategy.set_updated(tick % cadence == 0);
        }
    }

    /// Deduplicated market ids needed on `exchange` by strategies due an
    /// update this tick.
    #[must_use]
    pub fn market_ids(&self, exchange: ExchangeId) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for strategy in self.strategies.iter().filter(|s| s.was_updated()) {
            for (ex, market_id) in strategy.market_ids() {
                if ex == exchange && seen.insert(market_id.clone()) {
                    ids.push(market_id);
                }
            }
        }
        ids
    }

    /// Pushes reconciled order state into every strategy.
    pub fn update_orders(&mut self, orders: &HashMap<Uuid, Order>) {
        if orders.is_empty() {
            return;
        }
        for strategy in &mut self.strategies {
            strategy.update_orders(orders);
        }
    }

    /// Pushes fresh prices into the strategies due an update this tick,
    /// triggering their state machines.
    pub fn update_prices_if_due(&mut self, prices: &PriceMap) {
        for strategy in self.strategies.iter_mut().filter(|s| s.was_updated()) {
            strategy.update_prices(prices);
        }
    }

    /// Pending orders for `exchange` from strategies updated this tick.
    #[must_use]
    pub fn pending_orders(&self, exchange: ExchangeId) -> PendingOrders {
        let mut pending = PendingOrders::default();
        for strategy in self.strategies.iter().filter(|s| s.was_updated()) {
            pending.merge(strategy.pending_orders().for_exchange(exchange));
        }
        pending
    }

    /// Removes every strategy that references one of `market_ids` on
    /// `exchange` — used when a fetch reports those markets as gone.
    pub fn remove_markets(&mut self, exchange: ExchangeId, market_ids: &[String]) {
        if market_ids.is_empty() {
            return;
        }
        self.strategies.retain(|strategy| {
            let dead = strategy
                .market_ids()
                .iter()
                .any(|(ex, id)| *ex == exchange && market_ids.contains(id));
            if dead {
                info!(
                    strategy = strategy.name(),
                    exchange = %exchange,
                    "Removing strategy: market no longer available"
                );
            }
            !dead
        });
    }

    /// Removes strategies that have closed out.
    pub fn remove_finished(&mut self) {
        self.strategies.retain(|strategy| {
            if strategy.is_finished() {
                info!(strategy = strategy.name(), "Removing finished strategy");
                false
            } else {
                true
            }
        });
    }
}
