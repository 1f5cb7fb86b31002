//! Dual-exchange market making: one maker per exchange behind a single
//! strategy interface.
//!
//! Pure composition — market ids, pending orders, and update fan-out are
//! unions over the two inner makers. No cross-exchange decisioning.

use std::collections::HashMap;

use uuid::Uuid;

use betarb_core::{ExchangeId, Order, PriceMap};

use crate::maker::MakerStrategy;
use crate::pending::PendingOrders;
use crate::state::StrategyState;
use crate::traits::Strategy;

/// Two independent single-exchange market makers run as one strategy.
pub struct DualMakerStrategy {
    name: String,
    betfair: MakerStrategy,
    betdaq: MakerStrategy,
    updated: bool,
}

impl DualMakerStrategy {
    /// Wraps a maker per exchange.
    #[must_use]
    pub fn new(name: impl Into<String>, betfair: MakerStrategy, betdaq: MakerStrategy) -> Self {
        Self {
            name: name.into(),
            betfair,
            betdaq,
            updated: false,
        }
    }

    /// The inner maker for one exchange.
    #[must_use]
    pub fn leg(&self, exchange: ExchangeId) -> &MakerStrategy {
        match exchange {
            ExchangeId::Betfair => &self.betfair,
            ExchangeId::Betdaq => &self.betdaq,
        }
    }
}

impl Strategy for DualMakerStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> StrategyState {
        // Finished only once both legs are done; otherwise report the leg
        // that is still working.
        match (self.betfair.state(), self.betdaq.state()) {
            (StrategyState::Finished, other) => other,
            (other, _) => other,
        }
    }

    fn refresh_ticks(&self) -> u64 {
        self.betfair.refresh_ticks().min(self.betdaq.refresh_ticks())
    }

    fn market_ids(&self) -> Vec<(ExchangeId, String)> {
        let mut ids = self.betfair.market_ids();
        ids.extend(self.betdaq.market_ids());
        ids
    }

    fn was_updated(&self) -> bool {
        self.updated
    }

    fn set_updated(&mut self, updated: bool) {
        self.updated = updated;
        self.betfair.set_updated(updated);
        self.betdaq.set_updated(updated);
    }

    fn set_ticks_to_live(&mut self, ticks: u64) {
        self.betfair.set_ticks_to_live(ticks);
        self.betdaq.set_ticks_to_live(ticks);
    }

    fn update_orders(&mut self, orders: &HashMap<Uuid, Order>) {
        self.betfair.update_orders(orders);
        self.betdaq.update_orders(orders);
    }

    fn update_prices(&mut self, prices: &PriceMap) {
        self.betfair.update_prices(prices);
        self.betdaq.update_prices(prices);
    }

    fn pending_orders(&self) -> PendingOrders {
        let mut pending = self.betfair.pending_orders();
        pending.merge(self.betdaq.pending_orders());
        pending
    }

    fn is_finished(&self) -> bool {
        self.betfair.is_finished() && self.betdaq.is_finished()
    }
}
