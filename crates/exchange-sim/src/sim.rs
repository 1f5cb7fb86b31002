//! The simulated exchange.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;
use uuid::Uuid;

use betarb_core::{
    ChangedOrders, ExchangeClient, ExchangeError, ExchangeId, Order, OrderReport, PriceFetch,
    Result, Selection,
};

/// Per-operation call counters, for asserting on API usage in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `fetch_prices` calls.
    pub fetch_prices: usize,
    /// `place_orders` calls.
    pub place_orders: usize,
    /// `cancel_orders` calls.
    pub cancel_orders: usize,
    /// `update_orders` calls.
    pub update_orders: usize,
    /// `order_status` calls.
    pub order_status: usize,
    /// `changed_orders` calls.
    pub changed_orders: usize,
}

impl CallCounts {
    /// Total calls that would mutate exchange state.
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.place_orders + self.cancel_orders + self.update_orders
    }
}

struct SimOrder {
    order: Order,
    exchange_ref: String,
    changed_seq: i64,
}

#[derive(Default)]
struct Inner {
    selections: HashMap<String, Vec<Selection>>,
    errored_markets: HashSet<String>,
    orders: HashMap<Uuid, SimOrder>,
    sequence: i64,
    next_ref: u64,
    fail_next: bool,
    bootstrap_drained: bool,
    funds: Decimal,
    calls: CallCounts,
}

/// A scriptable in-memory exchange.
pub struct SimExchange {
    exchange: ExchangeId,
    inner: Mutex<Inner>,
}

impl SimExchange {
    /// Creates a simulated exchange for `exchange`, with a default balance.
    #[must_use]
    pub fn new(exchange: ExchangeId) -> Self {
        Self {
            exchange,
            inner: Mutex::new(Inner {
                funds: dec!(1000),
                ..Inner::default()
            }),
        }
    }

    /// Betdaq surfaces references only through `changed_orders`.
    fn defers_references(&self) -> bool {
        self.exchange == ExchangeId::Betdaq
    }

    /// Scripts the current snapshot for a selection.
    pub fn set_selection(&self, selection: Selection) {
        let mut inner = self.inner.lock();
        let market = inner
            .selections
            .entry(selection.market_id.clone())
            .or_default();
        market.retain(|s| s.selection_id != selection.selection_id);
        market.push(selection);
    }

    /// Marks a market as gone: future fetches report it in the errored set.
    pub fn set_market_errored(&self, market_id: impl Into<String>) {
        let market_id = market_id.into();
        let mut inner = self.inner.lock();
        inner.selections.remove(&market_id);
        inner.errored_markets.insert(market_id);
    }

    /// Makes the next client call fail at the transport layer.
    pub fn fail_next_call(&self) {
        self.inner.lock().fail_next = true;
    }

    /// Fully matches a resting order.
    pub fn force_match(&self, id: Uuid) {
        let mut inner = self.inner.lock();
        inner.sequence += 1;
        let seq = inner.sequence;
        if let Some(sim) = inner.orders.get_mut(&id) {
            sim.order.matched_stake = sim.order.stake;
            sim.order.unmatched_stake = Decimal::ZERO;
            sim.order.status = betarb_core::OrderStatus::Matched;
            sim.changed_seq = seq;
        }
    }

    /// Voids an order: it disappears from all future reports, the way Betdaq
    /// drops cancelled orders from its changed-orders feed.
    pub fn void_order(&self, id: Uuid) {
        self.inner.lock().orders.remove(&id);
    }

    /// The exchange's view of one order.
    #[must_use]
    pub fn order(&self, id: Uuid) -> Option<Order> {
        self.inner.lock().orders.get(&id).map(|sim| sim.order.clone())
    }

    /// Number of orders the exchange is tracking.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.inner.lock().orders.len()
    }

    /// API call counters so far.
    #[must_use]
    pub fn call_counts(&self) -> CallCounts {
        self.inner.lock().calls
    }

    fn check_fault(inner: &mut Inner) -> Result<()> {
        if inner.fail_next {
            inner.fail_next = false;
            return Err(ExchangeError::network("simulated outage"));
        }
        Ok(())
    }

    fn next_reference(&self, inner: &mut Inner) -> String {
        inner.next_ref += 1;
        let prefix = match self.exchange {
            ExchangeId::Betfair => "BF",
            ExchangeId::Betdaq => "DQ",
        };
        format!("{}-{}", prefix, inner.next_ref)
    }
}

#[async_trait]
impl ExchangeClient for SimExchange {
    fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    async fn fetch_prices(&self, market_ids: &[String]) -> Result<PriceFetch> {
        let mut inner = self.inner.lock();
        inner.calls.fetch_prices += 1;
        Self::check_fault(&mut inner)?;

        let mut fetch = PriceFetch::empty();
        for market_id in market_ids {
            if inner.errored_markets.contains(market_id) {
                fetch.errored_markets.push(market_id.clone());
            } else if let Some(selections) = inner.selections.get(market_id) {
                fetch.selections.extend(selections.iter().cloned());
            }
        }
        Ok(fetch)
    }

    async fn place_orders(&self, intents: Vec<Order>) -> Result<HashMap<Uuid, Order>> {
        let mut inner = self.inner.lock();
        inner.calls.place_orders += 1;
        Self::check_fault(&mut inner)?;

        let mut result = HashMap::new();
        for intent in intents {
            intent
                .validate()
                .map_err(|e| ExchangeError::rejected("INVALID_ORDER", e.to_string()))?;
            let reference = self.next_reference(&mut inner);
            inner.sequence += 1;
            let seq = inner.sequence;

            let mut tracked = intent.clone();
            tracked.mark_placed(Some(reference.clone()));

            let mut returned = tracked.clone();
            if self.defers_references() {
                returned.exchange_ref = None;
            }
            debug!(
                exchange = %self.exchange,
                order_id = %tracked.id,
                reference = %reference,
                "Simulated placement"
            );
            inner.orders.insert(
                tracked.id,
                SimOrder {
                    order: tracked,
                    exchange_ref: reference,
                    changed_seq: seq,
                },
            );
            result.insert(returned.id, returned);
        }
        Ok(result)
    }

    async fn cancel_orders(&self, orders: Vec<Order>) -> Result<HashMap<Uuid, Order>> {
        let mut inner = self.inner.lock();
        inner.calls.cancel_orders += 1;
        Self::check_fault(&mut inner)?;

        let mut result = HashMap::new();
        for order in orders {
            inner.sequence += 1;
            let seq = inner.sequence;
            if let Some(sim) = inner.orders.get_mut(&order.id) {
                sim.order.mark_cancelled();
                sim.changed_seq = seq;
                result.insert(order.id, sim.order.clone());
            }
        }
        Ok(result)
    }

    async fn update_orders(&self, orders: Vec<Order>) -> Result<HashMap<Uuid, Order>> {
        let mut inner = self.inner.lock();
        inner.calls.update_orders += 1;
        Self::check_fault(&mut inner)?;

        let mut result = HashMap::new();
        for order in orders {
            inner.sequence += 1;
            let seq = inner.sequence;
            if let Some(sim) = inner.orders.get_mut(&order.id) {
                if sim.order.is_unmatched() {
                    sim.order.price = order.price;
                    sim.order.stake = order.stake;
                    sim.changed_seq = seq;
                }
                result.insert(order.id, sim.order.clone());
            }
        }
        Ok(result)
    }

    async fn order_status(&self, refs: Vec<String>) -> Result<HashMap<String, OrderReport>> {
        let mut inner = self.inner.lock();
        inner.calls.order_status += 1;
        Self::check_fault(&mut inner)?;

        let mut result = HashMap::new();
        for reference in refs {
            if let Some(sim) = inner.orders.values().find(|s| s.exchange_ref == reference) {
                result.insert(
                    reference.clone(),
                    OrderReport::for_order(&sim.order, reference.clone()),
                );
            }
        }
        Ok(result)
    }

    async fn changed_orders(&self, sequence: i64) -> Result<ChangedOrders> {
        let mut inner = self.inner.lock();
        inner.calls.changed_orders += 1;
        Self::check_fault(&mut inner)?;

        let reports = inner
            .orders
            .values()
            .filter(|sim| sim.changed_seq > sequence)
            .map(|sim| OrderReport::for_order(&sim.order, sim.exchange_ref.clone()))
            .collect();
        Ok(ChangedOrders {
            reports,
            sequence: inner.sequence,
        })
    }

    async fn bootstrap_orders(&self) -> Result<ChangedOrders> {
        let mut inner = self.inner.lock();
        Self::check_fault(&mut inner)?;

        if inner.bootstrap_drained {
            return Ok(ChangedOrders {
                reports: Vec::new(),
                sequence: inner.sequence,
            });
        }
        inner.bootstrap_drained = true;
        let reports = inner
            .orders
            .values()
            .map(|sim| OrderReport::for_order(&sim.order, sim.exchange_ref.clone()))
            .collect();
        Ok(ChangedOrders {
            reports,
            sequence: inner.sequence,
        })
    }

    async fn account_funds(&self) -> Result<Decimal> {
        let mut inner = self.inner.lock();
        Self::check_fault(&mut inner)?;
        Ok(inner.funds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use betarb_core::{OrderStatus, PriceLevel, Side, DEFAULT_LADDER_DEPTH};

    fn selection(market_id: &str) -> Selection {
        Selection::new(
            ExchangeId::Betfair,
            market_id,
            1,
            "Home Win",
            vec![PriceLevel::new(dec!(5.0), dec!(10))],
            vec![PriceLevel::new(dec!(5.2), dec!(10))],
            DEFAULT_LADDER_DEPTH,
        )
    }

    fn intent(exchange: ExchangeId) -> Order {
        Order::new(exchange, "m1", 1, Side::Back, dec!(5.0), dec!(2.0))
    }

    #[tokio::test]
    async fn test_fetch_prices_splits_errored_markets() {
        let sim = SimExchange::new(ExchangeId::Betfair);
        sim.set_selection(selection("m1"));
        sim.set_market_errored("m2");

        let fetch = sim
            .fetch_prices(&["m1".to_string(), "m2".to_string(), "m3".to_string()])
            .await
            .unwrap();
        assert_eq!(fetch.selections.len(), 1);
        assert_eq!(fetch.errored_markets, vec!["m2".to_string()]);
    }

    #[tokio::test]
    async fn test_betfair_placement_returns_reference() {
        let sim = SimExchange::new(ExchangeId::Betfair);
        let order = intent(ExchangeId::Betfair);
        let id = order.id;

        let result = sim.place_orders(vec![order]).await.unwrap();
        let placed = &result[&id];
        assert_eq!(placed.status, OrderStatus::Unmatched);
        assert!(placed.exchange_ref.is_some());
    }

    #[tokio::test]
    async fn test_betdaq_placement_defers_reference() {
        let sim = SimExchange::new(ExchangeId::Betdaq);
        let order = intent(ExchangeId::Betdaq);
        let id = order.id;

        let result = sim.place_orders(vec![order]).await.unwrap();
        let placed = &result[&id];
        assert_eq!(placed.status, OrderStatus::Unmatched);
        assert!(placed.exchange_ref.is_none());

        // The reference appears in the changed-orders feed.
        let changed = sim.changed_orders(0).await.unwrap();
        assert_eq!(changed.reports.len(), 1);
        assert!(changed.reports[0].exchange_ref.starts_with("DQ-"));
    }

    #[tokio::test]
    async fn test_changed_orders_sequence_window() {
        let sim = SimExchange::new(ExchangeId::Betdaq);
        let order = intent(ExchangeId::Betdaq);
        let id = order.id;
        sim.place_orders(vec![order]).await.unwrap();

        let first = sim.changed_orders(0).await.unwrap();
        assert_eq!(first.reports.len(), 1);

        // Nothing changed since the returned cursor.
        let second = sim.changed_orders(first.sequence).await.unwrap();
        assert!(second.reports.is_empty());

        sim.force_match(id);
        let third = sim.changed_orders(first.sequence).await.unwrap();
        assert_eq!(third.reports.len(), 1);
        assert_eq!(third.reports[0].status, OrderStatus::Matched);
    }

    #[tokio::test]
    async fn test_bootstrap_drains_once() {
        let sim = SimExchange::new(ExchangeId::Betdaq);
        sim.place_orders(vec![intent(ExchangeId::Betdaq)]).await.unwrap();

        let first = sim.bootstrap_orders().await.unwrap();
        assert_eq!(first.reports.len(), 1);
        let second = sim.bootstrap_orders().await.unwrap();
        assert!(second.reports.is_empty());
    }

    #[tokio::test]
    async fn test_fault_injection_fails_once() {
        let sim = SimExchange::new(ExchangeId::Betfair);
        sim.fail_next_call();
        let err = sim.fetch_prices(&["m1".to_string()]).await.unwrap_err();
        assert!(err.is_transient());
        assert!(sim.fetch_prices(&["m1".to_string()]).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_intent_rejected_as_business_error() {
        let sim = SimExchange::new(ExchangeId::Betfair);
        let mut order = intent(ExchangeId::Betfair);
        order.stake = Decimal::ZERO;
        let err = sim.place_orders(vec![order]).await.unwrap_err();
        assert!(err.is_business());
    }

    #[tokio::test]
    async fn test_cancel_only_affects_unmatched() {
        let sim = SimExchange::new(ExchangeId::Betfair);
        let order = intent(ExchangeId::Betfair);
        let id = order.id;
        sim.place_orders(vec![order.clone()]).await.unwrap();
        sim.force_match(id);

        let result = sim.cancel_orders(vec![order]).await.unwrap();
        assert_eq!(result[&id].status, OrderStatus::Matched);
    }
}
