//! Collaborator traits the engine consumes.
//!
//! The real SOAP/JSON API clients and the persistence layer sit behind these
//! traits; everything above them (managers, strategies, the tick loop) is
//! exercised identically whether the implementation is a live client, the
//! in-process simulator, or a store backed by memory or SQLite.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::links::{MarketLink, SelectionLink};
use crate::odds::ExchangeId;
use crate::order::{Order, OrderReport};
use crate::selection::{Selection, SelectionKey};

/// Result of one price refresh against one exchange.
#[derive(Debug, Clone, Default)]
pub struct PriceFetch {
    /// Fresh selection snapshots, one per (market, selection).
    pub selections: Vec<Selection>,
    /// Markets the exchange reported as gone (finished, voided, unknown).
    /// Distinct from a transport failure, which yields an error instead.
    pub errored_markets: Vec<String>,
}

impl PriceFetch {
    /// A fetch that returned nothing — the degraded result used when the
    /// exchange call failed at the network layer.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A page of exchange-reported order changes plus the new sync cursor.
#[derive(Debug, Clone, Default)]
pub struct ChangedOrders {
    /// Changed orders since the requested sequence number.
    pub reports: Vec<OrderReport>,
    /// Cursor to pass to the next call.
    pub sequence: i64,
}

/// One exchange's API surface, with throttling handled inside the client.
///
/// `place_orders`, `cancel_orders` and `update_orders` key their results by
/// the client-generated order id, so callers can merge them without knowing
/// whether the exchange assigns references synchronously (Betfair) or only
/// through a later [`ExchangeClient::changed_orders`] poll (Betdaq).
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Which exchange this client talks to.
    fn exchange(&self) -> ExchangeId;

    /// Establishes a session. Default no-op for clients without login.
    async fn login(&self) -> Result<()> {
        Ok(())
    }

    /// Fetches fresh price ladders for the given markets.
    async fn fetch_prices(&self, market_ids: &[String]) -> Result<PriceFetch>;

    /// Submits new orders. Returned orders carry status `Unmatched` and, on
    /// exchanges with synchronous confirmation, the exchange reference.
    async fn place_orders(&self, intents: Vec<Order>) -> Result<HashMap<Uuid, Order>>;

    /// Cancels the unmatched portion of the given orders.
    async fn cancel_orders(&self, orders: Vec<Order>) -> Result<HashMap<Uuid, Order>>;

    /// Reprices the given resting orders.
    async fn update_orders(&self, orders: Vec<Order>) -> Result<HashMap<Uuid, Order>>;

    /// Point-in-time status for orders identified by exchange reference.
    async fn order_status(&self, refs: Vec<String>) -> Result<HashMap<String, OrderReport>>;

    /// Orders changed since `sequence`. Only non-terminal orders are
    /// guaranteed to appear; absence of a tracked unmatched order implies it
    /// was cancelled or voided.
    async fn changed_orders(&self, sequence: i64) -> Result<ChangedOrders>;

    /// Drains outstanding orders at startup. Called repeatedly until it
    /// returns an empty page; the final sequence number becomes the baseline
    /// cursor for [`ExchangeClient::changed_orders`].
    async fn bootstrap_orders(&self) -> Result<ChangedOrders>;

    /// Available account funds.
    async fn account_funds(&self) -> Result<Decimal>;
}

/// The persistence collaborator. All writes are idempotent upserts.
#[async_trait]
pub trait Store: Send + Sync {
    /// Upserts the latest snapshot for a selection.
    async fn upsert_selection(&self, selection: &Selection) -> anyhow::Result<()>;

    /// Reads the latest snapshot for a selection.
    async fn selection(&self, key: &SelectionKey) -> anyhow::Result<Option<Selection>>;

    /// Upserts an order by (exchange, client id).
    async fn upsert_order(&self, order: &Order) -> anyhow::Result<()>;

    /// Reads one order.
    async fn order(&self, exchange: ExchangeId, id: Uuid) -> anyhow::Result<Option<Order>>;

    /// All orders currently unmatched on one exchange.
    async fn unmatched_orders(&self, exchange: ExchangeId) -> anyhow::Result<Vec<Order>>;

    /// Upserts a cross-exchange market identity mapping.
    async fn upsert_market_link(&self, link: &MarketLink) -> anyhow::Result<()>;

    /// Upserts a cross-exchange selection identity mapping.
    async fn upsert_selection_link(&self, link: &SelectionLink) -> anyhow::Result<()>;

    /// Upserts the last-known account balance for an exchange.
    async fn upsert_balance(&self, exchange: ExchangeId, balance: Decimal) -> anyhow::Result<()>;

    /// Reads the last-known balance for an exchange.
    async fn balance(&self, exchange: ExchangeId) -> anyhow::Result<Option<Decimal>>;
}
