//! Automations: per-tick bookkeeping pushed into strategies from outside.
//!
//! Strategies deliberately know nothing about wall-clock time or event
//! schedules. An automation runs at the top of every tick with mutable access
//! to the group and writes whatever external state the strategies consume —
//! in particular the ticks-to-live countdown that drives market-maker
//! close-out.

use std::collections::HashMap;

use tracing::debug;

use betarb_core::ExchangeId;
use betarb_strategy::{Strategy, StrategyGroup};

/// A per-tick hook over the strategy group.
pub trait Automation: Send {
    /// Display name for logging.
    fn name(&self) -> &str;

    /// Runs at the top of each tick, before order and price refresh.
    fn update(&mut self, tick: u64, group: &mut StrategyGroup);
}

/// Writes ticks-to-live into strategies from a per-market expiry schedule.
///
/// A strategy spanning several markets gets the smallest remaining lifetime
/// among them.
#[derive(Default)]
pub struct CountdownAutomation {
    expiries: HashMap<(ExchangeId, String), u64>,
}

impl CountdownAutomation {
    /// Creates an automation with no scheduled expiries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a market to expire at `expiry_tick`.
    pub fn set_expiry(&mut self, exchange: ExchangeId, market_id: impl Into<String>, expiry_tick: u64) {
        self.expiries.insert((exchange, market_id.into()), expiry_tick);
    }
}

impl Automation for CountdownAutomation {
    fn name(&self) -> &str {
        "countdown"
    }

    fn update(&mut self, tick: u64, group: &mut StrategyGroup) {
        for strategy in group.iter_mut() {
            let remaining = strategy
                .market_ids()
                .into_iter()
                .filter_map(|(exchange, market_id)| {
                    self.expiries
                        .get(&(exchange, market_id))
                        .map(|expiry| expiry.saturating_sub(tick))
                })
                .min();
            if let Some(ticks_to_live) = remaining {
                debug!(
                    strategy = strategy.name(),
                    tick, ticks_to_live, "Writing lifetime countdown"
                );
                strategy.set_ticks_to_live(ticks_to_live);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use betarb_core::{Selection, DEFAULT_LADDER_DEPTH};
    use betarb_strategy::{MakerConfig, MakerStrategy};

    fn maker(market_id: &str) -> MakerStrategy {
        MakerStrategy::new(
            format!("maker:{market_id}"),
            Selection::empty(ExchangeId::Betfair, market_id, 1, "Home Win", DEFAULT_LADDER_DEPTH),
            MakerConfig::default(),
        )
    }

    #[test]
    fn test_countdown_writes_remaining_ticks() {
        let strat = maker("m1");
        let mut group = StrategyGroup::new();
        group.add(Box::new(strat));

        let mut automation = CountdownAutomation::new();
        automation.set_expiry(ExchangeId::Betfair, "m1", 100);

        automation.update(40, &mut group);
        // Countdown is observable through close-out behavior; here we just
        // check the automation runs without touching unrelated strategies.
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_expired_market_drives_close_out() {
        use betarb_core::{PriceLevel, PriceMap};
        use rust_decimal_macros::dec;

        let sel = Selection::new(
            ExchangeId::Betfair,
            "m1",
            1,
            "Home Win",
            vec![PriceLevel::new(dec!(5.0), dec!(100))],
            vec![PriceLevel::new(dec!(6.0), dec!(100))],
            DEFAULT_LADDER_DEPTH,
        );
        let strat = MakerStrategy::new("maker:m1", sel.clone(), MakerConfig::default());
        let mut group = StrategyGroup::new();
        group.add(Box::new(strat));

        let mut automation = CountdownAutomation::new();
        automation.set_expiry(ExchangeId::Betfair, "m1", 50);

        // Tick 49: one tick left, below the close-out threshold.
        automation.update(49, &mut group);
        let mut prices = PriceMap::new();
        prices.insert(sel.key(), sel);
        group.mark_updated(49);
        group.update_prices_if_due(&prices);

        group.remove_finished();
        assert!(group.is_empty());
    }
}
