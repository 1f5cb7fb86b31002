//! The pricing manager: cadence-driven price refresh across both exchanges.

use std::sync::Arc;

use tracing::{debug, warn};

use betarb_core::{ExchangeClient, ExchangeId, PriceFetch, PriceMap, Store};
use betarb_strategy::StrategyGroup;

/// Tick-driven price refresher.
///
/// Per tick: marks which strategies are due prices (their cadence divides the
/// tick number), unions and deduplicates their market ids per exchange, calls
/// both exchanges concurrently (one logical call each — chunking to API
/// limits is the client's concern), prunes strategies whose markets the
/// exchange reported as gone, and writes the fresh snapshots through to the
/// store after the join.
pub struct PricingManager {
    betfair: Arc<dyn ExchangeClient>,
    betdaq: Arc<dyn ExchangeClient>,
    store: Arc<dyn Store>,
}

impl PricingManager {
    /// Creates a pricing manager over the two exchange clients and the store.
    #[must_use]
    pub fn new(
        betfair: Arc<dyn ExchangeClient>,
        betdaq: Arc<dyn ExchangeClient>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            betfair,
            betdaq,
            store,
        }
    }

    /// Runs the refresh for `tick` and returns the snapshot map to fan out.
    pub async fn update_prices(&self, tick: u64, group: &mut StrategyGroup) -> PriceMap {
        group.mark_updated(tick);

        let betfair_ids = group.market_ids(ExchangeId::Betfair);
        let betdaq_ids = group.market_ids(ExchangeId::Betdaq);
        debug!(
            tick,
            betfair_markets = betfair_ids.len(),
            betdaq_markets = betdaq_ids.len(),
            "Refreshing prices"
        );

        let (betfair_fetch, betdaq_fetch) = tokio::join!(
            Self::fetch(&self.betfair, &betfair_ids),
            Self::fetch(&self.betdaq, &betdaq_ids),
        );

        // Strategies on a dead market must never see another tick.
        group.remove_markets(ExchangeId::Betfair, &betfair_fetch.errored_markets);
        group.remove_markets(ExchangeId::Betdaq, &betdaq_fetch.errored_markets);

        let mut prices = PriceMap::new();
        for selection in betfair_fetch
            .selections
            .into_iter()
            .chain(betdaq_fetch.selections)
        {
            if let Err(error) = self.store.upsert_selection(&selection).await {
                warn!(
                    market_id = %selection.market_id,
                    selection_id = selection.selection_id,
                    %error,
                    "Failed to persist selection snapshot"
                );
            }
            prices.insert(selection.key(), selection);
        }
        prices
    }

    // A transport failure degrades to "no prices, no errored ids" for the
    // tick; it is never treated as the market having gone away.
    async fn fetch(client: &Arc<dyn ExchangeClient>, market_ids: &[String]) -> PriceFetch {
        if market_ids.is_empty() {
            return PriceFetch::empty();
        }
        match client.fetch_prices(market_ids).await {
            Ok(fetch) => fetch,
            Err(error) => {
                warn!(
                    exchange = %client.exchange(),
                    %error,
                    "Price refresh failed; treating as no new data"
                );
                PriceFetch::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use betarb_data::MemoryStore;
    use betarb_exchange_sim::SimExchange;
    use betarb_strategy::{CrossConfig, CrossStrategy};
    use betarb_core::{PriceLevel, Selection, DEFAULT_LADDER_DEPTH};
    use rust_decimal_macros::dec;

    fn betfair_selection(market_id: &str) -> Selection {
        Selection::new(
            ExchangeId::Betfair,
            market_id,
            42,
            "Home Win",
            vec![PriceLevel::new(dec!(4.9), dec!(50))],
            vec![PriceLevel::new(dec!(5.0), dec!(50))],
            DEFAULT_LADDER_DEPTH,
        )
    }

    fn betdaq_selection(market_id: &str) -> Selection {
        Selection::new(
            ExchangeId::Betdaq,
            market_id,
            7,
            "Home Win",
            vec![PriceLevel::new(dec!(6.0), dec!(50))],
            Vec::new(),
            DEFAULT_LADDER_DEPTH,
        )
    }

    fn cross_strategy(betfair_market: &str, betdaq_market: &str) -> CrossStrategy {
        CrossStrategy::new(
            format!("cross:{betfair_market}"),
            Selection::empty(ExchangeId::Betfair, betfair_market, 42, "Home Win", 5),
            Selection::empty(ExchangeId::Betdaq, betdaq_market, 7, "Home Win", 5),
            CrossConfig::default(),
        )
    }

    struct Rig {
        betfair: Arc<SimExchange>,
        betdaq: Arc<SimExchange>,
        store: Arc<MemoryStore>,
        manager: PricingManager,
    }

    fn rig() -> Rig {
        let betfair = Arc::new(SimExchange::new(ExchangeId::Betfair));
        let betdaq = Arc::new(SimExchange::new(ExchangeId::Betdaq));
        let store = Arc::new(MemoryStore::new());
        let manager = PricingManager::new(
            betfair.clone(),
            betdaq.clone(),
            store.clone(),
        );
        Rig {
            betfair,
            betdaq,
            store,
            manager,
        }
    }

    #[tokio::test]
    async fn test_one_fetch_call_per_exchange_with_dedup() {
        let rig = rig();
        rig.betfair.set_selection(betfair_selection("1.234"));
        rig.betdaq.set_selection(betdaq_selection("9001"));

        // Two strategies over the same pair of markets.
        let mut group = StrategyGroup::new();
        group.add(Box::new(cross_strategy("1.234", "9001")));
        group.add(Box::new(cross_strategy("1.234", "9001")));

        let prices = rig.manager.update_prices(1, &mut group).await;

        assert_eq!(rig.betfair.call_counts().fetch_prices, 1);
        assert_eq!(rig.betdaq.call_counts().fetch_prices, 1);
        assert_eq!(prices.len(), 2);
        assert_eq!(rig.store.selection_count(), 2);
    }

    #[tokio::test]
    async fn test_no_due_strategies_means_no_calls() {
        let rig = rig();
        let mut group = StrategyGroup::new();

        let prices = rig.manager.update_prices(3, &mut group).await;

        assert!(prices.is_empty());
        assert_eq!(rig.betfair.call_counts().fetch_prices, 0);
        assert_eq!(rig.betdaq.call_counts().fetch_prices, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_to_no_data() {
        let rig = rig();
        rig.betfair.set_selection(betfair_selection("1.234"));
        rig.betdaq.set_selection(betdaq_selection("9001"));
        rig.betfair.fail_next_call();

        let mut group = StrategyGroup::new();
        group.add(Box::new(cross_strategy("1.234", "9001")));

        let prices = rig.manager.update_prices(1, &mut group).await;

        // The Betdaq side still arrived; the strategy is not removed.
        assert_eq!(prices.len(), 1);
        assert_eq!(group.len(), 1);
    }

    #[tokio::test]
    async fn test_errored_market_removes_strategy() {
        let rig = rig();
        rig.betdaq.set_selection(betdaq_selection("9001"));
        rig.betfair.set_market_errored("1.234");

        let mut group = StrategyGroup::new();
        group.add(Box::new(cross_strategy("1.234", "9001")));

        rig.manager.update_prices(1, &mut group).await;

        assert!(group.is_empty());
    }
}
