//! Pending order sets produced by strategy evaluation.

use betarb_core::{ExchangeId, Order};

/// Orders a strategy wants executed this tick, split by operation.
///
/// Cleared at the start of every price update and repopulated only by that
/// update's state transitions, which is what makes submission at-most-once
/// per detected opportunity.
#[derive(Debug, Clone, Default)]
pub struct PendingOrders {
    /// New orders to place.
    pub place: Vec<Order>,
    /// Resting orders to cancel.
    pub cancel: Vec<Order>,
    /// Resting orders to reprice.
    pub update: Vec<Order>,
}

impl PendingOrders {
    /// Empties all three sets.
    pub fn clear(&mut self) {
        self.place.clear();
        self.cancel.clear();
        self.update.clear();
    }

    /// Returns true when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.place.is_empty() && self.cancel.is_empty() && self.update.is_empty()
    }

    /// Total queued operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.place.len() + self.cancel.len() + self.update.len()
    }

    /// Appends every set from `other`.
    pub fn merge(&mut self, other: PendingOrders) {
        self.place.extend(other.place);
        self.cancel.extend(other.cancel);
        self.update.extend(other.update);
    }

    /// The subset targeting one exchange.
    #[must_use]
    pub fn for_exchange(&self, exchange: ExchangeId) -> PendingOrders {
        let filter = |orders: &[Order]| {
            orders
                .iter()
                .filter(|o| o.exchange == exchange)
                .cloned()
                .collect()
        };
        PendingOrders {
            place: filter(&self.place),
            cancel: filter(&self.cancel),
            update: filter(&self.update),
        }
    }
}
