//! Single-exchange market-making strategy.
//!
//! Quotes both sides of one selection whenever it can improve the best back
//! *and* the best lay at the same time: the back order goes on one tick under
//! the resting lay, the lay order one tick over the resting back, and the
//! spread between the two quotes is the edge. The lay stake is sized so the
//! position is odds-neutral if both quotes fill.
//!
//! The strategy does not choose its own cadence or lifetime: an automation
//! writes `ticks_to_live` between updates, and once it drops below the
//! close-out threshold the strategy flattens — repricing the unmatched side
//! one tick into the book when the other side already filled, or cancelling
//! both quotes when neither did — and enters `Finished`.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use betarb_core::{
    next_tick_down, next_tick_up, round_stake, AppConfig, ExchangeId, Order, OrderStatus,
    PriceMap, Selection, Side, BACK_ABSENT, LAY_ABSENT,
};

use crate::pending::PendingOrders;
use crate::state::StrategyState;
use crate::traits::Strategy;

/// Configuration for [`MakerStrategy`].
#[derive(Debug, Clone)]
pub struct MakerConfig {
    /// Stake quoted on the back side.
    pub base_stake: Decimal,
    /// Minimum spread (in odds) between the two quotes.
    pub epsilon: Decimal,
    /// Ticks-to-live below which the strategy closes out.
    pub close_out_ticks: u64,
    /// Ticks between price refreshes.
    pub refresh_ticks: u64,
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

impl MakerConfig {
    /// Builds strategy parameters from the application configuration.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_stake: config.maker.base_stake,
            epsilon: config.maker.epsilon,
            close_out_ticks: config.maker.close_out_ticks,
            refresh_ticks: config.pricing.refresh_ticks,
        }
    }
}

/// Odds-neutral lay stake for a (back, lay) quote pair.
#[must_use]
pub fn neutral_lay_stake(back_stake: Decimal, back_price: Decimal, lay_price: Decimal) -> Decimal {
    round_stake(back_stake * (Decimal::ONE + back_price) / (Decimal::ONE + lay_price))
}

/// Market-making state machine over one selection.
pub struct MakerStrategy {
    name: String,
    config: MakerConfig,
    selection: Selection,
    state: StrategyState,
    updated: bool,
    ticks_to_live: u64,
    back_order: Option<Order>,
    lay_order: Option<Order>,
    pending: PendingOrders,
}

impl MakerStrategy {
    /// Creates a market maker over one selection. The snapshot may be empty
    /// until the first price refresh.
    #[must_use]
    pub fn new(name: impl Into<String>, selection: Selection, config: MakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            selection,
            state: StrategyState::NoOpp,
            updated: false,
            ticks_to_live: u64::MAX,
            back_order: None,
            lay_order: None,
            pending: PendingOrders::default(),
        }
    }

    /// The current back quote, if any.
    #[must_use]
    pub fn back_order(&self) -> Option<&Order> {
        self.back_order.as_ref()
    }

    /// The current lay quote, if any.
    #[must_use]
    pub fn lay_order(&self) -> Option<&Order> {
        self.lay_order.as_ref()
    }

    /// Current lifetime countdown, as last written by the automation.
    #[must_use]
    pub fn ticks_to_live(&self) -> u64 {
        self.ticks_to_live
    }

    fn evaluate(&mut self) {
        if self.ticks_to_live < self.config.close_out_ticks
            && self.state != StrategyState::Finished
        {
            self.close_out();
            return;
        }

        match self.state {
            StrategyState::NoOpp => self.seek(),
            StrategyState::Opp => {
                if placed(&self.back_order) || placed(&self.lay_order) {
                    self.state = StrategyState::BothPlaced;
                    self.check_matches();
                } else {
                    self.seek();
                }
            }
            StrategyState::BothPlaced => self.check_matches(),
            StrategyState::BackMatched => {
                if matched(&self.lay_order) {
                    self.enter_both_matched();
                }
            }
            StrategyState::LayMatched => {
                if matched(&self.back_order) {
                    self.enter_both_matched();
                }
            }
            // Unreachable: entering BothMatched reverts to NoOpp immediately.
            StrategyState::BothMatched => self.reset(),
            StrategyState::Finished => {}
            // Cross-exchange-only states.
            StrategyState::InstantOpp | StrategyState::LayPlaced => self.reset(),
        }
    }

    fn seek(&mut self) {
        let sel = &self.selection;
        let back_quote = sel.make_best_lay();
        let lay_quote = sel.make_best_back();
        if back_quote == LAY_ABSENT || lay_quote == BACK_ABSENT {
            return;
        }
        // Both quotes must improve the book and still leave a spread.
        if back_quote <= lay_quote + self.config.epsilon {
            return;
        }

        let back_stake = round_stake(self.config.base_stake);
        let lay_stake = neutral_lay_stake(back_stake, back_quote, lay_quote);

        let back = Order::new(
            sel.exchange,
            sel.market_id.clone(),
            sel.selection_id,
            Side::Back,
            back_quote,
            back_stake,
        )
        .with_selection_meta(sel.reset_count, sel.withdrawal_sequence);
        let lay = Order::new(
            sel.exchange,
            sel.market_id.clone(),
            sel.selection_id,
            Side::Lay,
            lay_quote,
            lay_stake,
        )
        .with_selection_meta(sel.reset_count, sel.withdrawal_sequence);

        info!(
            strategy = %self.name,
            exchange = %sel.exchange,
            back_price = %back_quote,
            back_stake = %back_stake,
            lay_price = %lay_quote,
            lay_stake = %lay_stake,
            "Quoting both sides"
        );

        self.pending.place.push(back.clone());
        self.pending.place.push(lay.clone());
        self.back_order = Some(back);
        self.lay_order = Some(lay);
        self.state = StrategyState::Opp;
    }

    fn check_matches(&mut self) {
        match (matched(&self.back_order), matched(&self.lay_order)) {
            (true, true) => self.enter_both_matched(),
            (true, false) => self.state = StrategyState::BackMatched,
            (false, true) => self.state = StrategyState::LayMatched,
            (false, false) => {
                if cancelled(&self.back_order) && cancelled(&self.lay_order) {
                    self.reset();
                }
            }
        }
    }

    // Entering BothMatched immediately reverts to NoOpp so the next update
    // can re-detect.
    fn enter_both_matched(&mut self) {
        info!(strategy = %self.name, "Both quotes matched");
        self.reset();
    }

    fn reset(&mut self) {
        self.back_order = None;
        self.lay_order = None;
        self.state = StrategyState::NoOpp;
    }

    fn close_out(&mut self) {
        let back_matched = matched(&self.back_order);
        let lay_matched = matched(&self.lay_order);
        match (back_matched, lay_matched) {
            (true, false) => self.force_fill(Side::Lay),
            (false, true) => self.force_fill(Side::Back),
            (false, false) => {
                // Nothing filled: withdraw any quote that actually reached
                // the exchange.
                for slot in [&self.back_order, &self.lay_order] {
                    if let Some(order) = slot {
                        if order.is_unmatched() && order.exchange_ref.is_some() {
                            self.pending.cancel.push(order.clone());
                        }
                    }
                }
                if !self.pending.cancel.is_empty() {
                    info!(
                        strategy = %self.name,
                        cancels = self.pending.cancel.len(),
                        "Closing out: cancelling unmatched quotes"
                    );
                }
            }
            (true, true) => {}
        }
        self.state = StrategyState::Finished;
    }

    // Reprices the unmatched side one tick into the book to chase a fill,
    // preserving its stake.
    fn force_fill(&mut self, unmatched_side: Side) {
        let exchange = self.selection.exchange;
        let slot = match unmatched_side {
            Side::Back => &mut self.back_order,
            Side::Lay => &mut self.lay_order,
        };
        let Some(order) = slot else {
            return;
        };
        if !order.is_unmatched() || order.exchange_ref.is_none() {
            return;
        }
        let worse = match unmatched_side {
            Side::Back => next_tick_down(exchange, order.price),
            Side::Lay => next_tick_up(exchange, order.price),
        };
        debug!(
            strategy = %self.name,
            side = %unmatched_side,
            from = %order.price,
            to = %worse,
            "Closing out: repricing unmatched side one tick worse"
        );
        order.price = worse;
        self.pending.update.push(order.clone());
    }
}

impl Strategy for MakerStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> StrategyState {
        self.state
    }

    fn refresh_ticks(&self) -> u64 {
        self.config.refresh_ticks
    }

    fn market_ids(&self) -> Vec<(ExchangeId, String)> {
        vec![(self.selection.exchange, self.selection.market_id.clone())]
    }

    fn was_updated(&self) -> bool {
        self.updated
    }

    fn set_updated(&mut self, updated: bool) {
        self.updated = updated;
    }

    fn set_ticks_to_live(&mut self, ticks: u64) {
        self.ticks_to_live = ticks;
    }

    fn update_orders(&mut self, orders: &HashMap<Uuid, Order>) {
        for slot in [&mut self.back_order, &mut self.lay_order] {
            if let Some(current) = slot {
                if let Some(fresh) = orders.get(&current.id) {
                    *current = fresh.clone();
                }
            }
        }
    }

    fn update_prices(&mut self, prices: &PriceMap) {
        self.pending.clear();
        let Some(fresh) = prices.get(&self.selection.key()) else {
            debug!(strategy = %self.name, "Skipping update: price data missing");
            return;
        };
        self.selection = fresh.clone();
        self.evaluate();
    }

    fn pending_orders(&self) -> PendingOrders {
        self.pending.clone()
    }
}

fn placed(order: &Option<Order>) -> bool {
    order
        .as_ref()
        .is_some_and(|o| o.status != OrderStatus::NotPlaced)
}

fn matched(order: &Option<Order>) -> bool {
    order
        .as_ref()
        .is_some_and(|o| o.status == OrderStatus::Matched)
}

fn cancelled(order: &Option<Order>) -> bool {
    order
        .as_ref()
        .is_some_and(|o| o.status == OrderStatus::Cancelled)
}
