//! The order manager: status reconciliation and order execution.
//!
//! Reconciliation is asymmetric because the two exchanges confirm orders
//! differently:
//!
//! - **Betfair** returns an order reference synchronously at placement, and a
//!   status poll by reference simply overwrites the tracked order (subject to
//!   status monotonicity).
//! - **Betdaq** returns nothing usable at placement. Orders are picked up
//!   from the changed-orders feed, matched to tracked orders by reference
//!   when one is held, or correlated by (selection id, side) for orders
//!   still awaiting their reference. A tracked unmatched order *absent* from
//!   a successful changed-orders page is inferred cancelled/voided — the
//!   vendor-documented reading of the feed, not a reported status.
//!
//! The Betdaq sync cursor lives on this manager and is threaded through every
//! call. Practice mode suppresses exchange mutations and order-store writes
//! while leaving detection, logging, and pending-order computation intact.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use betarb_core::{AppConfig, ExchangeClient, ExchangeError, ExchangeId, Order, Store};
use betarb_strategy::{PendingOrders, StrategyGroup};

/// Tick-driven order state reconciler and executor.
pub struct OrderManager {
    betfair: Arc<dyn ExchangeClient>,
    betdaq: Arc<dyn ExchangeClient>,
    store: Arc<dyn Store>,
    practice_mode: bool,
    betfair_enabled: bool,
    betdaq_sequence: i64,
}

impl OrderManager {
    /// Creates an order manager over the two exchange clients and the store.
    #[must_use]
    pub fn new(
        betfair: Arc<dyn ExchangeClient>,
        betdaq: Arc<dyn ExchangeClient>,
        store: Arc<dyn Store>,
        config: &AppConfig,
    ) -> Self {
        Self {
            betfair,
            betdaq,
            store,
            practice_mode: config.engine.practice_mode,
            betfair_enabled: config.betfair.enabled,
            betdaq_sequence: 0,
        }
    }

    /// The current Betdaq sync cursor.
    #[must_use]
    pub fn betdaq_sequence(&self) -> i64 {
        self.betdaq_sequence
    }

    /// Startup: drain Betdaq's outstanding orders until an empty page
    /// establishes the baseline sequence number, then log in to Betfair if
    /// configured, and record account balances.
    pub async fn bootstrap(&mut self) -> anyhow::Result<()> {
        loop {
            let page = self.betdaq.bootstrap_orders().await?;
            self.betdaq_sequence = page.sequence;
            if page.reports.is_empty() {
                break;
            }
            info!(
                count = page.reports.len(),
                sequence = page.sequence,
                "Recovered outstanding Betdaq orders"
            );
            for report in &page.reports {
                let mut order = Order::new(
                    ExchangeId::Betdaq,
                    report.market_id.clone(),
                    report.selection_id,
                    report.side,
                    report.price,
                    report.stake,
                );
                order.mark_placed(Some(report.exchange_ref.clone()));
                order.apply_report(report);
                self.store.upsert_order(&order).await?;
            }
        }

        if self.betfair_enabled {
            self.betfair.login().await?;
        }

        for client in [&self.betfair, &self.betdaq] {
            match client.account_funds().await {
                Ok(funds) => {
                    info!(exchange = %client.exchange(), %funds, "Account balance");
                    if let Err(error) = self.store.upsert_balance(client.exchange(), funds).await {
                        warn!(exchange = %client.exchange(), %error, "Failed to persist balance");
                    }
                }
                Err(error) => {
                    warn!(exchange = %client.exchange(), %error, "Could not read account balance");
                }
            }
        }
        Ok(())
    }

    /// Per tick: refresh the status of every tracked unmatched order and
    /// return the reconciled orders keyed by client id, for strategy fan-out.
    ///
    /// No-op in practice mode or with no active strategies. An exchange is
    /// only called when it has at least one unmatched order.
    pub async fn update_order_information(
        &mut self,
        active_strategies: usize,
    ) -> HashMap<Uuid, Order> {
        if self.practice_mode || active_strategies == 0 {
            return HashMap::new();
        }

        let betfair_unmatched = self.unmatched(ExchangeId::Betfair).await;
        let betdaq_unmatched = self.unmatched(ExchangeId::Betdaq).await;

        let betfair_call = async {
            let refs: Vec<String> = betfair_unmatched
                .iter()
                .filter_map(|o| o.exchange_ref.clone())
                .collect();
            if refs.is_empty() {
                return None;
            }
            match self.betfair.order_status(refs).await {
                Ok(reports) => Some(reports),
                Err(error) => {
                    warn!(exchange = %ExchangeId::Betfair, %error, "Order status poll failed");
                    None
                }
            }
        };
        let sequence = self.betdaq_sequence;
        let betdaq_call = async {
            if betdaq_unmatched.is_empty() {
                return None;
            }
            match self.betdaq.changed_orders(sequence).await {
                Ok(changed) => Some(changed),
                Err(error) => {
                    warn!(exchange = %ExchangeId::Betdaq, %error, "Changed-orders poll failed");
                    None
                }
            }
        };
        let (betfair_reports, betdaq_changed) = tokio::join!(betfair_call, betdaq_call);

        let mut refreshed = HashMap::new();

        if let Some(reports) = betfair_reports {
            for mut order in betfair_unmatched {
                let Some(reference) = order.exchange_ref.clone() else {
                    continue;
                };
                if let Some(report) = reports.get(&reference) {
                    order.apply_report(report);
                    self.persist(&order).await;
                    refreshed.insert(order.id, order);
                }
            }
        }

        if let Some(changed) = betdaq_changed {
            self.betdaq_sequence = changed.sequence;
            let mut reports = changed.reports;
            for mut order in betdaq_unmatched {
                // Match by held reference first, then correlate a
                // reference-less order by (selection, side).
                let position = match &order.exchange_ref {
                    Some(reference) => reports.iter().position(|r| &r.exchange_ref == reference),
                    None => reports
                        .iter()
                        .position(|r| r.selection_id == order.selection_id && r.side == order.side),
                };
                match position {
                    Some(index) => {
                        let report = reports.swap_remove(index);
                        order.apply_report(&report);
                    }
                    None => {
                        // Absent from a successful page: cancelled or voided.
                        info!(
                            order_id = %order.id,
                            selection_id = order.selection_id,
                            "Unmatched Betdaq order absent from changed-orders page, marking cancelled"
                        );
                        order.mark_cancelled();
                    }
                }
                self.persist(&order).await;
                refreshed.insert(order.id, order);
            }
            for leftover in &reports {
                debug!(
                    reference = %leftover.exchange_ref,
                    selection_id = leftover.selection_id,
                    "Ignoring changed-orders report with no tracked counterpart"
                );
            }
        }

        refreshed
    }

    /// Per tick: collect pending cancel/update/place sets from strategies
    /// updated this tick and execute them, concurrently per exchange.
    pub async fn make_orders(&mut self, group: &StrategyGroup) {
        let betfair_pending = group.pending_orders(ExchangeId::Betfair);
        let betdaq_pending = group.pending_orders(ExchangeId::Betdaq);
        if betfair_pending.is_empty() && betdaq_pending.is_empty() {
            return;
        }

        if self.practice_mode {
            for (exchange, pending) in [
                (ExchangeId::Betfair, &betfair_pending),
                (ExchangeId::Betdaq, &betdaq_pending),
            ] {
                if pending.is_empty() {
                    continue;
                }
                info!(
                    exchange = %exchange,
                    place = pending.place.len(),
                    cancel = pending.cancel.len(),
                    update = pending.update.len(),
                    "Practice mode: suppressing order execution"
                );
                for order in &pending.place {
                    info!(
                        exchange = %exchange,
                        market_id = %order.market_id,
                        selection_id = order.selection_id,
                        side = %order.side,
                        price = %order.price,
                        stake = %order.stake,
                        "Practice mode: would place"
                    );
                }
            }
            return;
        }

        let (betfair_results, betdaq_results) = tokio::join!(
            Self::execute(&self.betfair, betfair_pending),
            Self::execute(&self.betdaq, betdaq_pending),
        );
        for order in betfair_results.into_iter().chain(betdaq_results) {
            self.persist(&order).await;
        }
    }

    // Runs one exchange's cancel/update/place sets concurrently. Placement on
    // Betfair is submitted per market, as that API requires.
    async fn execute(client: &Arc<dyn ExchangeClient>, pending: PendingOrders) -> Vec<Order> {
        if pending.is_empty() {
            return Vec::new();
        }
        let PendingOrders {
            place,
            cancel,
            update,
        } = pending;
        let exchange = client.exchange();

        let cancels = async {
            if cancel.is_empty() {
                return HashMap::new();
            }
            match client.cancel_orders(cancel.clone()).await {
                Ok(result) => result,
                Err(error) => {
                    log_execution_error(exchange, "cancel", &error, &cancel);
                    HashMap::new()
                }
            }
        };

        let updates = async {
            if update.is_empty() {
                return HashMap::new();
            }
            match client.update_orders(update.clone()).await {
                Ok(result) => result,
                Err(error) => {
                    log_execution_error(exchange, "update", &error, &update);
                    HashMap::new()
                }
            }
        };

        let places = async {
            let mut valid = Vec::new();
            for order in place {
                match order.validate() {
                    Ok(()) => valid.push(order),
                    Err(error) => {
                        error!(
                            exchange = %exchange,
                            order_id = %order.id,
                            %error,
                            "Dropping invalid order intent"
                        );
                    }
                }
            }
            if valid.is_empty() {
                return HashMap::new();
            }
            if exchange == ExchangeId::Betfair {
                // One placement call per distinct market id.
                let mut by_market: HashMap<String, Vec<Order>> = HashMap::new();
                for order in valid {
                    by_market.entry(order.market_id.clone()).or_default().push(order);
                }
                let calls = by_market.into_values().map(|orders| {
                    let client = Arc::clone(client);
                    async move {
                        match client.place_orders(orders.clone()).await {
                            Ok(result) => result,
                            Err(error) => {
                                log_execution_error(client.exchange(), "place", &error, &orders);
                                HashMap::new()
                            }
                        }
                    }
                });
                let mut merged = HashMap::new();
                for result in join_all(calls).await {
                    merged.extend(result);
                }
                merged
            } else {
                match client.place_orders(valid.clone()).await {
                    Ok(result) => result,
                    Err(error) => {
                        log_execution_error(exchange, "place", &error, &valid);
                        HashMap::new()
                    }
                }
            }
        };

        let (cancelled, updated, placed) = tokio::join!(cancels, updates, places);
        cancelled
            .into_values()
            .chain(updated.into_values())
            .chain(placed.into_values())
            .collect()
    }

    async fn unmatched(&self, exchange: ExchangeId) -> Vec<Order> {
        match self.store.unmatched_orders(exchange).await {
            Ok(orders) => orders,
            Err(error) => {
                warn!(exchange = %exchange, %error, "Failed to read unmatched orders");
                Vec::new()
            }
        }
    }

    async fn persist(&self, order: &Order) {
        if let Err(error) = self.store.upsert_order(order).await {
            warn!(order_id = %order.id, %error, "Failed to persist order");
        }
    }
}

// Business rejections carry the offending intents for operator review;
// transport failures just degrade for the tick.
fn log_execution_error(
    exchange: ExchangeId,
    operation: &str,
    error: &ExchangeError,
    orders: &[Order],
) {
    if error.is_business() {
        let intents: Vec<String> = orders
            .iter()
            .map(|o| {
                format!(
                    "{} {}@{} x{} on {}",
                    o.side, o.selection_id, o.price, o.stake, o.market_id
                )
            })
            .collect();
        error!(
            exchange = %exchange,
            operation,
            %error,
            ?intents,
            "Exchange rejected order operation"
        );
    } else {
        warn!(
            exchange = %exchange,
            operation,
            %error,
            "Order operation failed; degraded to empty result for this tick"
        );
    }
}
