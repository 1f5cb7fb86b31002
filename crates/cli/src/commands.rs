//! Command handlers for the betarb CLI.

use std::sync::Arc;

use anyhow::Result;
use rust_decimal_macros::dec;
use tracing::info;

use betarb_core::{
    AppConfig, ConfigLoader, ExchangeId, MarketEntry, MarketLink, PriceLevel, Selection,
    SelectionLink, Store, StrategyKind,
};
use betarb_data::{MemoryStore, SqliteStore};
use betarb_engine::{Engine, OrderManager, PricingManager};
use betarb_exchange_sim::SimExchange;
use betarb_strategy::{
    CrossConfig, CrossStrategy, DualMakerStrategy, MakerConfig, MakerStrategy, Strategy,
};

/// `betarb run`: wire the engine to the simulated venues and tick.
pub async fn run(config_path: &str, ticks: Option<u64>, demo: bool) -> Result<()> {
    let mut config = ConfigLoader::load_from(config_path)?;
    if let Some(ticks) = ticks {
        config.engine.max_ticks = Some(ticks);
    }
    if demo && config.markets.is_empty() {
        config.markets.push(demo_market());
    }
    if !config.engine.practice_mode {
        info!("Order execution enabled; the bundled venues are in-process simulators");
    }

    let store: Arc<dyn Store> = match &config.store.sqlite_path {
        Some(path) => Arc::new(SqliteStore::connect(path).await?),
        None => Arc::new(MemoryStore::new()),
    };

    let betfair = Arc::new(SimExchange::new(ExchangeId::Betfair));
    let betdaq = Arc::new(SimExchange::new(ExchangeId::Betdaq));
    if demo {
        seed_demo_books(&betfair, &betdaq, &config);
    }

    let pricing = PricingManager::new(betfair.clone(), betdaq.clone(), store.clone());
    let orders = OrderManager::new(betfair, betdaq, store.clone(), &config);
    let mut engine = Engine::new(config.engine.clone(), pricing, orders);

    for entry in &config.markets {
        persist_links(store.as_ref(), entry).await?;
        engine.add_strategy(build_strategy(entry, &config));
    }
    info!(
        markets = config.markets.len(),
        practice_mode = config.engine.practice_mode,
        "Configured strategies"
    );

    engine.run().await
}

/// `betarb check-config`: load and print the resolved configuration.
pub fn check_config(config_path: &str) -> Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    println!("{config:#?}");
    Ok(())
}

fn build_strategy(entry: &MarketEntry, config: &AppConfig) -> Box<dyn Strategy> {
    let depth = config.pricing.ladder_depth;
    let betfair_sel = Selection::empty(
        ExchangeId::Betfair,
        entry.betfair_market_id.clone(),
        entry.betfair_selection_id,
        entry.name.clone(),
        depth,
    );
    let betdaq_sel = Selection::empty(
        ExchangeId::Betdaq,
        entry.betdaq_market_id.clone(),
        entry.betdaq_selection_id,
        entry.name.clone(),
        depth,
    );
    match entry.strategy {
        StrategyKind::Cross => Box::new(CrossStrategy::new(
            format!("cross:{}", entry.name),
            betfair_sel,
            betdaq_sel,
            CrossConfig::from_app_config(config),
        )),
        StrategyKind::Maker => Box::new(MakerStrategy::new(
            format!("maker:{}", entry.name),
            betfair_sel,
            MakerConfig::from_app_config(config),
        )),
        StrategyKind::DualMaker => Box::new(DualMakerStrategy::new(
            format!("dual:{}", entry.name),
            MakerStrategy::new(
                format!("dual:{}:betfair", entry.name),
                betfair_sel,
                MakerConfig::from_app_config(config),
            ),
            MakerStrategy::new(
                format!("dual:{}:betdaq", entry.name),
                betdaq_sel,
                MakerConfig::from_app_config(config),
            ),
        )),
    }
}

async fn persist_links(store: &dyn Store, entry: &MarketEntry) -> Result<()> {
    store
        .upsert_market_link(&MarketLink {
            betfair_market_id: entry.betfair_market_id.clone(),
            betdaq_market_id: entry.betdaq_market_id.clone(),
            name: entry.name.clone(),
        })
        .await?;
    store
        .upsert_selection_link(&SelectionLink {
            betfair_market_id: entry.betfair_market_id.clone(),
            betfair_selection_id: entry.betfair_selection_id,
            betdaq_market_id: entry.betdaq_market_id.clone(),
            betdaq_selection_id: entry.betdaq_selection_id,
            name: entry.name.clone(),
        })
        .await?;
    Ok(())
}

fn demo_market() -> MarketEntry {
    MarketEntry {
        name: "Demo Match Odds".to_string(),
        betfair_market_id: "1.234".to_string(),
        betfair_selection_id: 42,
        betdaq_market_id: "9001".to_string(),
        betdaq_selection_id: 7,
        strategy: StrategyKind::Cross,
    }
}

// A book with a visible cross-exchange edge: lay 5.0 on Betfair against a
// 6.0 back on Betdaq.
fn seed_demo_books(betfair: &SimExchange, betdaq: &SimExchange, config: &AppConfig) {
    let depth = config.pricing.ladder_depth;
    for entry in &config.markets {
        betfair.set_selection(Selection::new(
            ExchangeId::Betfair,
            entry.betfair_market_id.clone(),
            entry.betfair_selection_id,
            entry.name.clone(),
            vec![PriceLevel::new(dec!(4.9), dec!(50))],
            vec![PriceLevel::new(dec!(5.0), dec!(50))],
            depth,
        ));
        betdaq.set_selection(Selection::new(
            ExchangeId::Betdaq,
            entry.betdaq_market_id.clone(),
            entry.betdaq_selection_id,
            entry.name.clone(),
            vec![PriceLevel::new(dec!(6.0), dec!(50))],
            Vec::new(),
            depth,
        ));
    }
}
