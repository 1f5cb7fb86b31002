//! In-memory store over locked maps.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use uuid::Uuid;

use betarb_core::{
    ExchangeId, MarketLink, Order, Selection, SelectionKey, SelectionLink, Store,
};

#[derive(Default)]
struct Inner {
    selections: HashMap<SelectionKey, Selection>,
    orders: HashMap<(ExchangeId, Uuid), Order>,
    market_links: HashMap<(String, String), MarketLink>,
    selection_links: HashMap<(String, u64, String, u64), SelectionLink>,
    balances: HashMap<ExchangeId, Decimal>,
}

/// A store backed by process memory. State dies with the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders held, for assertions in tests.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.inner.read().orders.len()
    }

    /// Number of selection snapshots held.
    #[must_use]
    pub fn selection_count(&self) -> usize {
        self.inner.read().selections.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_selection(&self, selection: &Selection) -> anyhow::Result<()> {
        self.inner
            .write()
            .selections
            .insert(selection.key(), selection.clone());
        Ok(())
    }

    async fn selection(&self, key: &SelectionKey) -> anyhow::Result<Option<Selection>> {
        Ok(self.inner.read().selections.get(key).cloned())
    }

    async fn upsert_order(&self, order: &Order) -> anyhow::Result<()> {
        self.inner
            .write()
            .orders
            .insert((order.exchange, order.id), order.clone());
        Ok(())
    }

    async fn order(&self, exchange: ExchangeId, id: Uuid) -> anyhow::Result<Option<Order>> {
        Ok(self.inner.read().orders.get(&(exchange, id)).cloned())
    }

    async fn unmatched_orders(&self, exchange: ExchangeId) -> anyhow::Result<Vec<Order>> {
        Ok(self
            .inner
            .read()
            .orders
            .values()
            .filter(|o| o.exchange == exchange && o.is_unmatched())
            .cloned()
            .collect())
    }

    async fn upsert_market_link(&self, link: &MarketLink) -> anyhow::Result<()> {
        self.inner.write().market_links.insert(
            (link.betfair_market_id.clone(), link.betdaq_market_id.clone()),
            link.clone(),
        );
        Ok(())
    }

    async fn upsert_selection_link(&self, link: &SelectionLink) -> anyhow::Result<()> {
        self.inner.write().selection_links.insert(
            (
                link.betfair_market_id.clone(),
                link.betfair_selection_id,
                link.betdaq_market_id.clone(),
                link.betdaq_selection_id,
            ),
            link.clone(),
        );
        Ok(())
    }

    async fn upsert_balance(&self, exchange: ExchangeId, balance: Decimal) -> anyhow::Result<()> {
        self.inner.write().balances.insert(exchange, balance);
        Ok(())
    }

    async fn balance(&self, exchange: ExchangeId) -> anyhow::Result<Option<Decimal>> {
        Ok(self.inner.read().balances.get(&exchange).copied())
    }
}
