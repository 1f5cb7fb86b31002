//! Cross-exchange arbitrage strategy.
//!
//! Works a pair of selections known to represent the same outcome on both
//! exchanges. When the backable price on one exchange exceeds the layable
//! price on the other by more than the two commissions, laying cheap on one
//! side and backing high on the other locks in a profit whichever way the
//! event settles:
//!
//! ```text
//! Betdaq:  back available @ 6.0
//! Betfair: lay  available @ 5.0
//!
//! 6.0 > 5.0 / ((1 - 0.05)(1 - 0.05)) = 5.54  ->  opportunity
//! ```
//!
//! Two variants are detected, in this order:
//! - *instant*: both prices are resting on the books, so both orders are
//!   queued for simultaneous placement;
//! - *improvable*: the lay is quoted one tick above the current best back
//!   (leading that book), and the back order is only queued once the lay is
//!   reported matched.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info};
use uuid::Uuid;

use betarb_core::{
    round_stake, AppConfig, ExchangeId, Order, OrderStatus, PriceMap, Selection, Side, LAY_ABSENT,
};

use crate::pending::PendingOrders;
use crate::state::StrategyState;
use crate::traits::Strategy;

// =============================================================================
// Configuration
// =============================================================================

/// Commission and stake floor for one exchange.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeParams {
    /// Commission rate on net winnings, as a fraction.
    pub commission: Decimal,
    /// Minimum stake the exchange accepts.
    pub min_stake: Decimal,
}

/// Configuration for [`CrossStrategy`].
#[derive(Debug, Clone)]
pub struct CrossConfig {
    /// Betfair commission and stake floor.
    pub betfair: ExchangeParams,
    /// Betdaq commission and stake floor.
    pub betdaq: ExchangeParams,
    /// Lay orders above this price are discarded rather than submitted.
    pub max_lay_odds: Decimal,
    /// Ticks between price refreshes.
    pub refresh_ticks: u64,
}

impl Default for CrossConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

impl CrossConfig {
    /// Builds strategy parameters from the application configuration.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            betfair: ExchangeParams {
                commission: config.betfair.commission,
                min_stake: config.betfair.min_stake,
            },
            betdaq: ExchangeParams {
                commission: config.betdaq.commission,
                min_stake: config.betdaq.min_stake,
            },
            max_lay_odds: config.risk.max_lay_odds,
            refresh_ticks: config.pricing.refresh_ticks,
        }
    }

    /// Per-exchange parameter lookup.
    #[must_use]
    pub fn params(&self, exchange: ExchangeId) -> &ExchangeParams {
        match exchange {
            ExchangeId::Betfair => &self.betfair,
            ExchangeId::Betdaq => &self.betdaq,
        }
    }
}

// =============================================================================
// Profitability
// =============================================================================

/// True iff backing at `back_price` against a lay at `lay_price` is
/// profitable after both exchanges' commissions.
#[must_use]
pub fn check_opportunity(
    back_price: Decimal,
    lay_price: Decimal,
    back_commission: Decimal,
    lay_commission: Decimal,
) -> bool {
    if lay_price <= Decimal::ZERO {
        return false;
    }
    let threshold =
        lay_price / ((Decimal::ONE - back_commission) * (Decimal::ONE - lay_commission));
    back_price > threshold
}

/// Sizes the (back, lay) stake pair so both exchange floors are met and the
/// position is commission-adjusted neutral. Both stakes round to 2 dp.
#[must_use]
pub fn size_stakes(
    back: &ExchangeParams,
    lay: &ExchangeParams,
    back_price: Decimal,
    lay_price: Decimal,
) -> (Decimal, Decimal) {
    let ratio = back_price / lay_price * (Decimal::ONE - back.commission);
    // Round the floor-derived stake up, so the lay side cannot dip under its
    // own floor after multiplication.
    let floor_backing =
        (lay.min_stake / ratio).round_dp_with_strategy(2, RoundingStrategy::AwayFromZero);
    let back_stake = back.min_stake.max(floor_backing);
    let lay_stake = round_stake(back_stake * ratio);
    (back_stake, lay_stake)
}

// =============================================================================
// Cross-Exchange Strategy
// =============================================================================

/// Arbitrage state machine over one matched selection pair.
pub struct CrossStrategy {
    name: String,
    config: CrossConfig,
    sel_a: Selection,
    sel_b: Selection,
    state: StrategyState,
    updated: bool,
    lay_order: Option<Order>,
    back_order: Option<Order>,
    pending: PendingOrders,
}

impl CrossStrategy {
    /// Creates a strategy over a matched pair of selections, one per
    /// exchange. The snapshots may be empty until the first price refresh.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        sel_a: Selection,
        sel_b: Selection,
        config: CrossConfig,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            sel_a,
            sel_b,
            state: StrategyState::NoOpp,
            updated: false,
            lay_order: None,
            back_order: None,
            pending: PendingOrders::default(),
        }
    }

    /// The order currently laying the outcome, if any.
    #[must_use]
    pub fn lay_order(&self) -> Option<&Order> {
        self.lay_order.as_ref()
    }

    /// The order currently backing the outcome, if any.
    #[must_use]
    pub fn back_order(&self) -> Option<&Order> {
        self.back_order.as_ref()
    }

    fn evaluate(&mut self) {
        match self.state {
            StrategyState::NoOpp => self.seek(),
            StrategyState::InstantOpp => {
                if placed(&self.lay_order) || placed(&self.back_order) {
                    self.state = StrategyState::BothPlaced;
                    self.check_matches();
                } else {
                    // Nothing reached an exchange (dry run or failed
                    // placement): re-evaluate from scratch.
                    self.seek();
                }
            }
            StrategyState::Opp => {
                if placed(&self.lay_order) {
                    self.state = StrategyState::LayPlaced;
                } else {
                    self.seek();
                }
            }
            StrategyState::LayPlaced => {
                if cancelled(&self.lay_order) {
                    self.reset();
                } else if matched(&self.lay_order) {
                    // Exit action: the covering back goes on only once the
                    // lay is filled.
                    if let Some(back) = self.back_order.clone() {
                        info!(
                            strategy = %self.name,
                            exchange = %back.exchange,
                            price = %back.price,
                            stake = %back.stake,
                            "Lay matched, queueing covering back order"
                        );
                        self.pending.place.push(back);
                    }
                    self.state = StrategyState::LayMatched;
                }
            }
            StrategyState::BothPlaced => self.check_matches(),
            StrategyState::LayMatched => {
                if matched(&self.back_order) {
                    self.enter_both_matched();
                }
            }
            StrategyState::BackMatched => {
                if matched(&self.lay_order) {
                    self.enter_both_matched();
                }
            }
            StrategyState::BothMatched => {
                self.reset();
                self.seek();
            }
            StrategyState::Finished => {}
        }
    }

    fn check_matches(&mut self) {
        match (matched(&self.lay_order), matched(&self.back_order)) {
            (true, true) => self.enter_both_matched(),
            (true, false) => self.state = StrategyState::LayMatched,
            (false, true) => self.state = StrategyState::BackMatched,
            (false, false) => {
                if cancelled(&self.lay_order) && cancelled(&self.back_order) {
                    self.reset();
                }
            }
        }
    }

    fn enter_both_matched(&mut self) {
        info!(strategy = %self.name, "Both legs matched");
        self.state = StrategyState::BothMatched;
    }

    fn reset(&mut self) {
        self.lay_order = None;
        self.back_order = None;
        self.state = StrategyState::NoOpp;
    }

    fn seek(&mut self) {
        let a = self.sel_a.clone();
        let b = self.sel_b.clone();
        // Instant opportunities take priority over improvable ones.
        for instant in [true, false] {
            for (lay_sel, back_sel) in [(&a, &b), (&b, &a)] {
                if self.try_pair(lay_sel, back_sel, instant) {
                    return;
                }
            }
        }
    }

    // Returns true when seeking should stop: an opportunity was queued, or
    // one was found but discarded by the risk filter.
    fn try_pair(&mut self, lay_sel: &Selection, back_sel: &Selection, instant: bool) -> bool {
        let lay_price = if instant {
            lay_sel.best_lay()
        } else {
            lay_sel.make_best_back()
        };
        let back_price = back_sel.best_back();
        let lay_params = *self.config.params(lay_sel.exchange);
        let back_params = *self.config.params(back_sel.exchange);

        if !check_opportunity(
            back_price,
            lay_price,
            back_params.commission,
            lay_params.commission,
        ) {
            return false;
        }

        if lay_price >= LAY_ABSENT || lay_price > self.config.max_lay_odds {
            debug!(
                strategy = %self.name,
                lay_price = %lay_price,
                ceiling = %self.config.max_lay_odds,
                "Discarding opportunity: lay price above risk ceiling"
            );
            self.pending.clear();
            return true;
        }

        let (back_stake, lay_stake) =
            size_stakes(&back_params, &lay_params, back_price, lay_price);

        let lay = Order::new(
            lay_sel.exchange,
            lay_sel.market_id.clone(),
            lay_sel.selection_id,
            Side::Lay,
            lay_price,
            lay_stake,
        )
        .with_selection_meta(lay_sel.reset_count, lay_sel.withdrawal_sequence);
        let back = Order::new(
            back_sel.exchange,
            back_sel.market_id.clone(),
            back_sel.selection_id,
            Side::Back,
            back_price,
            back_stake,
        )
        .with_selection_meta(back_sel.reset_count, back_sel.withdrawal_sequence);

        info!(
            strategy = %self.name,
            instant,
            lay_exchange = %lay_sel.exchange,
            lay_price = %lay_price,
            lay_stake = %lay_stake,
            back_exchange = %back_sel.exchange,
            back_price = %back_price,
            back_stake = %back_stake,
            "Arbitrage opportunity detected"
        );

        if instant {
            self.pending.place.push(lay.clone());
            self.pending.place.push(back.clone());
            self.state = StrategyState::InstantOpp;
        } else {
            self.pending.place.push(lay.clone());
            self.state = StrategyState::Opp;
        }
        self.lay_order = Some(lay);
        self.back_order = Some(back);
        true
    }
}

impl Strategy for CrossStrategy {
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
        vec![
            (self.sel_a.exchange, self.sel_a.market_id.clone()),
            (self.sel_b.exchange, self.sel_b.market_id.clone()),
        ]
    }

    fn was_updated(&self) -> bool {
        self.updated
    }

    fn set_updated(&mut self, updated: bool) {
        self.updated = updated;
    }

    fn update_orders(&mut self, orders: &HashMap<Uuid, Order>) {
        for slot in [&mut self.lay_order, &mut self.back_order] {
            if let Some(current) = slot {
                if let Some(fresh) = orders.get(&current.id) {
                    *current = fresh.clone();
                }
            }
        }
    }

    fn update_prices(&mut self, prices: &PriceMap) {
        self.pending.clear();
        let (Some(a), Some(b)) = (prices.get(&self.sel_a.key()), prices.get(&self.sel_b.key()))
        else {
            debug!(strategy = %self.name, "Skipping update: price data missing for a leg");
            return;
        };
        self.sel_a = a.clone();
        self.sel_b = b.clone();
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

#[cfg(test)]
mod tests {
    use super::*;
    use betarb_core::{PriceLevel, DEFAULT_LADDER_DEPTH};
    use rust_decimal_macros::dec;

    fn selection(
        exchange: ExchangeId,
        market_id: &str,
        back: Option<Decimal>,
        lay: Option<Decimal>,
    ) -> Selection {
        Selection::new(
            exchange,
            market_id,
            7,
            "Home Win",
            back.map(|p| PriceLevel::new(p, dec!(100))).into_iter().collect(),
            lay.map(|p| PriceLevel::new(p, dec!(100))).into_iter().collect(),
            DEFAULT_LADDER_DEPTH,
        )
    }

    fn price_map(selections: &[&Selection]) -> PriceMap {
        selections.iter().map(|s| (s.key(), (*s).clone())).collect()
    }

    fn strategy(sel_a: Selection, sel_b: Selection) -> CrossStrategy {
        CrossStrategy::new("cross:Home Win", sel_a, sel_b, CrossConfig::default())
    }

    // ==================== Profitability Tests ====================

    #[test]
    fn test_check_opportunity_documented_scenario() {
        // back 6.0 vs lay 5.0 at 5% commission each: 5.0 / 0.9025 = 5.54.
        assert!(check_opportunity(dec!(6.0), dec!(5.0), dec!(0.05), dec!(0.05)));
        assert!(!check_opportunity(dec!(5.5), dec!(5.0), dec!(0.05), dec!(0.05)));
    }

    #[test]
    fn test_check_opportunity_matches_inequality_across_sweep() {
        let prices = [
            dec!(1.2),
            dec!(2.0),
            dec!(3.4),
            dec!(5.0),
            dec!(6.0),
            dec!(10.0),
            dec!(21.0),
            dec!(100.0),
        ];
        let commissions = [dec!(0), dec!(0.02), dec!(0.05), dec!(0.1), dec!(0.2)];
        for back in prices {
            for lay in prices {
                for c1 in commissions {
                    for c2 in commissions {
                        let expected =
                            back > lay / ((Decimal::ONE - c1) * (Decimal::ONE - c2));
                        assert_eq!(
                            check_opportunity(back, lay, c1, c2),
                            expected,
                            "back={back} lay={lay} c1={c1} c2={c2}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_sentinel_lay_never_profitable() {
        assert!(!check_opportunity(dec!(999), LAY_ABSENT, dec!(0), dec!(0)));
    }

    // ==================== Stake Sizing Tests ====================

    #[test]
    fn test_stakes_meet_both_floors_and_round_to_2dp() {
        let config = CrossConfig::default();
        // Back on Betdaq (floor 0.50), lay on Betfair (floor 2.00).
        let (back_stake, lay_stake) = size_stakes(
            &config.betdaq,
            &config.betfair,
            dec!(6.0),
            dec!(5.0),
        );
        assert_eq!(back_stake, dec!(1.76));
        assert_eq!(lay_stake, dec!(2.01));
        assert!(back_stake >= config.betdaq.min_stake);
        assert!(lay_stake >= config.betfair.min_stake);
        assert_eq!(back_stake, round_stake(back_stake));
        assert_eq!(lay_stake, round_stake(lay_stake));
    }

    #[test]
    fn test_stakes_use_own_floor_when_larger() {
        let config = CrossConfig::default();
        // Back on Betfair (floor 2.00), lay on Betdaq (floor 0.50): the
        // back's own floor dominates.
        let (back_stake, lay_stake) = size_stakes(
            &config.betfair,
            &config.betdaq,
            dec!(6.0),
            dec!(5.0),
        );
        assert_eq!(back_stake, dec!(2.0));
        assert_eq!(lay_stake, round_stake(dec!(2.0) * dec!(1.14)));
        assert!(lay_stake >= config.betdaq.min_stake);
    }

    // ==================== Detection Tests ====================

    #[test]
    fn test_instant_opportunity_queues_both_orders() {
        let bf = selection(ExchangeId::Betfair, "1.234", Some(dec!(4.9)), Some(dec!(5.0)));
        let dq = selection(ExchangeId::Betdaq, "9001", Some(dec!(6.0)), None);
        let mut strat = strategy(bf.clone(), dq.clone());

        strat.update_prices(&price_map(&[&bf, &dq]));

        assert_eq!(strat.state(), StrategyState::InstantOpp);
        let pending = strat.pending_orders();
        assert_eq!(pending.place.len(), 2);
        let lay = pending.place.iter().find(|o| o.side == Side::Lay).unwrap();
        let back = pending.place.iter().find(|o| o.side == Side::Back).unwrap();
        assert_eq!(lay.exchange, ExchangeId::Betfair);
        assert_eq!(lay.price, dec!(5.0));
        assert_eq!(back.exchange, ExchangeId::Betdaq);
        assert_eq!(back.price, dec!(6.0));
    }

    #[test]
    fn test_improvable_opportunity_queues_lay_only() {
        // No resting lay on Betfair, but quoting one tick above its best
        // back (5.0 -> 5.1) is still profitable against the Betdaq 6.0 back.
        let bf = selection(ExchangeId::Betfair, "1.234", Some(dec!(5.0)), None);
        let dq = selection(ExchangeId::Betdaq, "9001", Some(dec!(6.0)), None);
        let mut strat = strategy(bf.clone(), dq.clone());

        strat.update_prices(&price_map(&[&bf, &dq]));

        assert_eq!(strat.state(), StrategyState::Opp);
        let pending = strat.pending_orders();
        assert_eq!(pending.place.len(), 1);
        assert_eq!(pending.place[0].side, Side::Lay);
        assert_eq!(pending.place[0].price, dec!(5.1));
        // The covering back is held, not queued.
        assert!(strat.back_order().is_some());
    }

    #[test]
    fn test_no_opportunity_without_edge() {
        let bf = selection(ExchangeId::Betfair, "1.234", Some(dec!(5.0)), Some(dec!(5.1)));
        let dq = selection(ExchangeId::Betdaq, "9001", Some(dec!(5.2)), Some(dec!(5.4)));
        let mut strat = strategy(bf.clone(), dq.clone());

        strat.update_prices(&price_map(&[&bf, &dq]));

        assert_eq!(strat.state(), StrategyState::NoOpp);
        assert!(strat.pending_orders().is_empty());
    }

    #[test]
    fn test_risk_ceiling_discards_whole_set() {
        // Laying at 21.0 would be profitable against a 25.0 back, but sits
        // above the 20.0 ceiling.
        let bf = selection(ExchangeId::Betfair, "1.234", Some(dec!(20)), Some(dec!(21.0)));
        let dq = selection(ExchangeId::Betdaq, "9001", Some(dec!(25.0)), None);
        let mut strat = strategy(bf.clone(), dq.clone());

        strat.update_prices(&price_map(&[&bf, &dq]));

        assert_eq!(strat.state(), StrategyState::NoOpp);
        assert!(strat.pending_orders().is_empty());
    }

    #[test]
    fn test_missing_leg_skips_update_entirely() {
        let bf = selection(ExchangeId::Betfair, "1.234", Some(dec!(4.9)), Some(dec!(5.0)));
        let dq = selection(ExchangeId::Betdaq, "9001", Some(dec!(6.0)), None);
        let mut strat = strategy(bf.clone(), dq.clone());

        // Only one leg present in the refresh.
        strat.update_prices(&price_map(&[&bf]));

        assert_eq!(strat.state(), StrategyState::NoOpp);
        assert!(strat.pending_orders().is_empty());
    }

    #[test]
    fn test_repeated_update_does_not_double_pending() {
        let bf = selection(ExchangeId::Betfair, "1.234", Some(dec!(4.9)), Some(dec!(5.0)));
        let dq = selection(ExchangeId::Betdaq, "9001", Some(dec!(6.0)), None);
        let mut strat = strategy(bf.clone(), dq.clone());
        let prices = price_map(&[&bf, &dq]);

        strat.update_prices(&prices);
        assert_eq!(strat.pending_orders().place.len(), 2);
        strat.update_prices(&prices);
        assert_eq!(strat.pending_orders().place.len(), 2);
    }

    // ==================== Lifecycle Tests ====================

    fn report_status(order: &Order, reference: &str, status: OrderStatus) -> Order {
        let mut fresh = order.clone();
        fresh.mark_placed(Some(reference.to_string()));
        if status == OrderStatus::Matched {
            fresh.matched_stake = fresh.stake;
            fresh.unmatched_stake = Decimal::ZERO;
            fresh.status = OrderStatus::Matched;
        }
        fresh
    }

    #[test]
    fn test_instant_flow_to_both_matched_and_reset() {
        let bf = selection(ExchangeId::Betfair, "1.234", Some(dec!(4.9)), Some(dec!(5.0)));
        let dq = selection(ExchangeId::Betdaq, "9001", Some(dec!(6.0)), None);
        let mut strat = strategy(bf.clone(), dq.clone());
        let prices = price_map(&[&bf, &dq]);

        strat.update_prices(&prices);
        let lay = strat.lay_order().unwrap().clone();
        let back = strat.back_order().unwrap().clone();

        // Both legs confirmed unmatched.
        let mut reports = HashMap::new();
        reports.insert(lay.id, report_status(&lay, "BF-1", OrderStatus::Unmatched));
        reports.insert(back.id, report_status(&back, "DQ-1", OrderStatus::Unmatched));
        strat.update_orders(&reports);
        strat.update_prices(&prices);
        assert_eq!(strat.state(), StrategyState::BothPlaced);

        // Back leg fills first.
        reports.insert(back.id, report_status(&back, "DQ-1", OrderStatus::Matched));
        strat.update_orders(&reports);
        strat.update_prices(&prices);
        assert_eq!(strat.state(), StrategyState::BackMatched);

        // Lay leg fills.
        reports.insert(lay.id, report_status(&lay, "BF-1", OrderStatus::Matched));
        strat.update_orders(&reports);
        strat.update_prices(&prices);
        assert_eq!(strat.state(), StrategyState::BothMatched);

        // Next evaluation resets and re-detects against the same book.
        strat.update_orders(&HashMap::new());
        strat.update_prices(&prices);
        assert_eq!(strat.state(), StrategyState::InstantOpp);
        assert_eq!(strat.pending_orders().place.len(), 2);
    }

    #[test]
    fn test_improvable_flow_places_back_after_lay_match() {
        let bf = selection(ExchangeId::Betfair, "1.234", Some(dec!(5.0)), None);
        let dq = selection(ExchangeId::Betdaq, "9001", Some(dec!(6.0)), None);
        let mut strat = strategy(bf.clone(), dq.clone());
        let prices = price_map(&[&bf, &dq]);

        strat.update_prices(&prices);
        assert_eq!(strat.state(), StrategyState::Opp);
        let lay = strat.lay_order().unwrap().clone();

        let mut reports = HashMap::new();
        reports.insert(lay.id, report_status(&lay, "BF-1", OrderStatus::Unmatched));
        strat.update_orders(&reports);
        strat.update_prices(&prices);
        assert_eq!(strat.state(), StrategyState::LayPlaced);
        assert!(strat.pending_orders().is_empty());

        reports.insert(lay.id, report_status(&lay, "BF-1", OrderStatus::Matched));
        strat.update_orders(&reports);
        strat.update_prices(&prices);
        assert_eq!(strat.state(), StrategyState::LayMatched);
        let pending = strat.pending_orders();
        assert_eq!(pending.place.len(), 1);
        assert_eq!(pending.place[0].side, Side::Back);
        assert_eq!(pending.place[0].exchange, ExchangeId::Betdaq);
        assert_eq!(pending.place[0].price, dec!(6.0));
    }

    #[test]
    fn test_cancelled_lay_resets_to_no_opp() {
        let bf = selection(ExchangeId::Betfair, "1.234", Some(dec!(5.0)), None);
        let dq = selection(ExchangeId::Betdaq, "9001", Some(dec!(6.0)), None);
        let mut strat = strategy(bf.clone(), dq.clone());
        let prices = price_map(&[&bf, &dq]);

        strat.update_prices(&prices);
        let lay = strat.lay_order().unwrap().clone();

        let mut reports = HashMap::new();
        reports.insert(lay.id, report_status(&lay, "BF-1", OrderStatus::Unmatched));
        strat.update_orders(&reports);
        strat.update_prices(&prices);
        assert_eq!(strat.state(), StrategyState::LayPlaced);

        let mut voided = report_status(&lay, "BF-1", OrderStatus::Unmatched);
        voided.mark_cancelled();
        reports.insert(lay.id, voided);
        strat.update_orders(&reports);

        // Quiet book so the reset is observable.
        let quiet_bf = selection(ExchangeId::Betfair, "1.234", None, None);
        let quiet_dq = selection(ExchangeId::Betdaq, "9001", None, None);
        strat.update_prices(&price_map(&[&quiet_bf, &quiet_dq]));
        assert_eq!(strat.state(), StrategyState::NoOpp);
    }
}
