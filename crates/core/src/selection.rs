//! Immutable per-tick odds snapshots for one tradable outcome.
//!
//! A [`Selection`] is rebuilt from scratch on every price refresh and never
//! mutated in place; a strategy swaps its snapshot wholesale when fresh prices
//! arrive. Ladders are padded to a fixed depth so "no price offered" is an
//! explicit empty level rather than a shorter list, and the best-price
//! accessors collapse emptiness to the odds-range sentinels.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::odds::{next_tick_down, next_tick_up, ExchangeId, BACK_ABSENT, LAY_ABSENT};

/// Key identifying one selection on one exchange.
pub type SelectionKey = (ExchangeId, String, u64);

/// Snapshot map produced by a price refresh, keyed by [`SelectionKey`].
pub type PriceMap = HashMap<SelectionKey, Selection>;

/// Default ladder depth when the configuration does not override it.
pub const DEFAULT_LADDER_DEPTH: usize = 5;

/// One price level on a ladder: odds and the unmatched stake available there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Decimal odds.
    pub price: Decimal,
    /// Unmatched stake available at these odds.
    pub stake: Decimal,
}

impl PriceLevel {
    /// Creates a price level.
    #[must_use]
    pub fn new(price: Decimal, stake: Decimal) -> Self {
        Self { price, stake }
    }
}

/// One tradable outcome on one exchange at one market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    /// Exchange this snapshot was taken from.
    pub exchange: ExchangeId,
    /// Market identifier on that exchange.
    pub market_id: String,
    /// Selection identifier on that exchange.
    pub selection_id: u64,
    /// Display name.
    pub name: String,
    // Ladders are best-to-worst and always padded to the configured depth.
    back: Vec<Option<PriceLevel>>,
    lay: Vec<Option<PriceLevel>>,
    /// Price of the most recent matched bet, if the exchange reported one.
    pub last_matched_price: Option<Decimal>,
    /// Amount of the most recent matched bet.
    pub last_matched_amount: Option<Decimal>,
    /// Selection reset count, required by Betdaq order placement.
    pub reset_count: u32,
    /// Withdrawal sequence number, required by Betfair order placement.
    pub withdrawal_sequence: u32,
}

impl Selection {
    /// Creates a snapshot, padding (or truncating) both ladders to `depth`.
    #[must_use]
    pub fn new(
        exchange: ExchangeId,
        market_id: impl Into<String>,
        selection_id: u64,
        name: impl Into<String>,
        back: Vec<PriceLevel>,
        lay: Vec<PriceLevel>,
        depth: usize,
    ) -> Self {
        Self {
            exchange,
            market_id: market_id.into(),
            selection_id,
            name: name.into(),
            back: pad(back, depth),
            lay: pad(lay, depth),
            last_matched_price: None,
            last_matched_amount: None,
            reset_count: 0,
            withdrawal_sequence: 0,
        }
    }

    /// Creates a snapshot with empty ladders (a selection known by identity
    /// only, before the first price refresh).
    #[must_use]
    pub fn empty(
        exchange: ExchangeId,
        market_id: impl Into<String>,
        selection_id: u64,
        name: impl Into<String>,
        depth: usize,
    ) -> Self {
        Self::new(exchange, market_id, selection_id, name, Vec::new(), Vec::new(), depth)
    }

    /// Attaches the last-matched price/amount pair.
    #[must_use]
    pub fn with_last_matched(mut self, price: Decimal, amount: Decimal) -> Self {
        self.last_matched_price = Some(price);
        self.last_matched_amount = Some(amount);
        self
    }

    /// Attaches the exchange bookkeeping fields needed to place orders.
    #[must_use]
    pub fn with_order_meta(mut self, reset_count: u32, withdrawal_sequence: u32) -> Self {
        self.reset_count = reset_count;
        self.withdrawal_sequence = withdrawal_sequence;
        self
    }

    /// Map key for this selection.
    #[must_use]
    pub fn key(&self) -> SelectionKey {
        (self.exchange, self.market_id.clone(), self.selection_id)
    }

    /// Back ladder, best-to-worst, padded to the configured depth.
    #[must_use]
    pub fn back_levels(&self) -> &[Option<PriceLevel>] {
        &self.back
    }

    /// Lay ladder, best-to-worst, padded to the configured depth.
    #[must_use]
    pub fn lay_levels(&self) -> &[Option<PriceLevel>] {
        &self.lay
    }

    /// Best available back price, or [`BACK_ABSENT`] if no back is offered.
    #[must_use]
    pub fn best_back(&self) -> Decimal {
        self.back
            .first()
            .and_then(|level| level.map(|l| l.price))
            .unwrap_or(BACK_ABSENT)
    }

    /// Best available lay price, or [`LAY_ABSENT`] if no lay is offered.
    #[must_use]
    pub fn best_lay(&self) -> Decimal {
        self.lay
            .first()
            .and_then(|level| level.map(|l| l.price))
            .unwrap_or(LAY_ABSENT)
    }

    /// Price a new lay order must quote to become the best back offer:
    /// one tick above the current best back. Returns the sentinel unchanged
    /// when there is no back market to improve on.
    #[must_use]
    pub fn make_best_back(&self) -> Decimal {
        let best = self.best_back();
        if best == BACK_ABSENT {
            return BACK_ABSENT;
        }
        next_tick_up(self.exchange, best)
    }

    /// Price a new back order must quote to become the best lay offer:
    /// one tick below the current best lay. Sentinel-preserving.
    #[must_use]
    pub fn make_best_lay(&self) -> Decimal {
        let best = self.best_lay();
        if best == LAY_ABSENT {
            return LAY_ABSENT;
        }
        next_tick_down(self.exchange, best)
    }
}

fn pad(mut levels: Vec<PriceLevel>, depth: usize) -> Vec<Option<PriceLevel>> {
    levels.truncate(depth);
    let mut out: Vec<Option<PriceLevel>> = levels.into_iter().map(Some).collect();
    out.resize(depth, None);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(back: Vec<PriceLevel>, lay: Vec<PriceLevel>) -> Selection {
        Selection::new(
            ExchangeId::Betfair,
            "1.234",
            42,
            "Home Win",
            back,
            lay,
            DEFAULT_LADDER_DEPTH,
        )
    }

    // ==================== Ladder Shape Tests ====================

    #[test]
    fn test_ladders_padded_to_depth() {
        let sel = snapshot(vec![PriceLevel::new(dec!(5.0), dec!(10))], Vec::new());
        assert_eq!(sel.back_levels().len(), DEFAULT_LADDER_DEPTH);
        assert_eq!(sel.lay_levels().len(), DEFAULT_LADDER_DEPTH);
        assert!(sel.back_levels()[0].is_some());
        assert!(sel.back_levels()[1].is_none());
    }

    #[test]
    fn test_ladders_truncated_to_depth() {
        let levels: Vec<PriceLevel> = (0..8)
            .map(|i| PriceLevel::new(dec!(5.0) - Decimal::from(i) / dec!(10), dec!(10)))
            .collect();
        let sel = snapshot(levels, Vec::new());
        assert_eq!(sel.back_levels().len(), DEFAULT_LADDER_DEPTH);
    }

    // ==================== Best Price Tests ====================

    #[test]
    fn test_single_back_level_all_lay_empty() {
        let sel = snapshot(vec![PriceLevel::new(dec!(5.0), dec!(10))], Vec::new());
        assert_eq!(sel.best_back(), dec!(5.0));
        assert_eq!(sel.best_lay(), LAY_ABSENT);
    }

    #[test]
    fn test_best_prices_from_full_ladders() {
        let sel = snapshot(
            vec![
                PriceLevel::new(dec!(5.0), dec!(10)),
                PriceLevel::new(dec!(4.9), dec!(25)),
            ],
            vec![
                PriceLevel::new(dec!(5.1), dec!(12)),
                PriceLevel::new(dec!(5.2), dec!(40)),
            ],
        );
        assert_eq!(sel.best_back(), dec!(5.0));
        assert_eq!(sel.best_lay(), dec!(5.1));
    }

    #[test]
    fn test_sentinels_stay_inside_legal_range() {
        let sel = snapshot(Vec::new(), Vec::new());
        assert!(sel.best_back() >= BACK_ABSENT);
        assert!(sel.best_lay() <= LAY_ABSENT);
    }

    // ==================== Improvement Price Tests ====================

    #[test]
    fn test_make_best_back_steps_above_best_back() {
        let sel = snapshot(
            vec![PriceLevel::new(dec!(5.0), dec!(10))],
            vec![PriceLevel::new(dec!(5.3), dec!(10))],
        );
        assert_eq!(sel.make_best_back(), dec!(5.1));
    }

    #[test]
    fn test_make_best_lay_steps_below_best_lay() {
        let sel = snapshot(
            vec![PriceLevel::new(dec!(5.0), dec!(10))],
            vec![PriceLevel::new(dec!(5.3), dec!(10))],
        );
        assert_eq!(sel.make_best_lay(), dec!(5.2));
    }

    #[test]
    fn test_make_best_preserves_sentinels() {
        let sel = snapshot(Vec::new(), Vec::new());
        assert_eq!(sel.make_best_back(), BACK_ABSENT);
        assert_eq!(sel.make_best_lay(), LAY_ABSENT);
    }

    #[test]
    fn test_betdaq_make_best_lay_on_band_boundary() {
        let sel = Selection::new(
            ExchangeId::Betdaq,
            "9001",
            7,
            "Away Win",
            Vec::new(),
            vec![PriceLevel::new(dec!(21.0), dec!(50))],
            DEFAULT_LADDER_DEPTH,
        );
        assert_eq!(sel.make_best_lay(), dec!(20.5));
    }

    // ==================== Metadata Tests ====================

    #[test]
    fn test_builder_metadata() {
        let sel = snapshot(Vec::new(), Vec::new())
            .with_last_matched(dec!(4.8), dec!(120))
            .with_order_meta(2, 7);
        assert_eq!(sel.last_matched_price, Some(dec!(4.8)));
        assert_eq!(sel.last_matched_amount, Some(dec!(120)));
        assert_eq!(sel.reset_count, 2);
        assert_eq!(sel.withdrawal_sequence, 7);
    }

    #[test]
    fn test_key_identity() {
        let sel = snapshot(Vec::new(), Vec::new());
        assert_eq!(sel.key(), (ExchangeId::Betfair, "1.234".to_string(), 42));
    }

    #[test]
    fn test_serde_round_trip() {
        let sel = snapshot(
            vec![PriceLevel::new(dec!(5.0), dec!(10))],
            vec![PriceLevel::new(dec!(5.1), dec!(12))],
        );
        let json = serde_json::to_string(&sel).unwrap();
        let back: Selection = serde_json::from_str(&json).unwrap();
        assert_eq!(back.best_back(), dec!(5.0));
        assert_eq!(back.best_lay(), dec!(5.1));
    }
}
