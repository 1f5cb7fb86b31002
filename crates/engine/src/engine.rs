//! The tick loop.
//!
//! One discrete tick runs the phases in a fixed order, each a synchronous
//! barrier (no exchange call spans a tick):
//!
//! 1. automations (lifetime countdowns, strategy retirement)
//! 2. order-status refresh, pushed into every strategy
//! 3. price refresh for strategies whose cadence is due
//! 4. price fan-out, which triggers state machines and order construction
//! 5. order execution for everything the strategies queued
//!
//! So strategies always decide on fresh order state and fresh prices, and
//! orders constructed this tick are executed before the next tick begins.

use std::time::Duration;

use tracing::{debug, info};

use betarb_core::EngineSettings;
use betarb_strategy::{Strategy, StrategyGroup};

use crate::automation::Automation;
use crate::orders::OrderManager;
use crate::pricing::PricingManager;

/// The top-level scheduler.
pub struct Engine {
    settings: EngineSettings,
    pricing: PricingManager,
    orders: OrderManager,
    group: StrategyGroup,
    automations: Vec<Box<dyn Automation>>,
    tick: u64,
}

impl Engine {
    /// Creates an engine with an empty strategy group.
    #[must_use]
    pub fn new(settings: EngineSettings, pricing: PricingManager, orders: OrderManager) -> Self {
        Self {
            settings,
            pricing,
            orders,
            group: StrategyGroup::new(),
            automations: Vec::new(),
            tick: 0,
        }
    }

    /// Adds a strategy to the group.
    pub fn add_strategy(&mut self, strategy: Box<dyn Strategy>) {
        self.group.add(strategy);
    }

    /// Adds an automation, run at the top of every tick.
    pub fn add_automation(&mut self, automation: Box<dyn Automation>) {
        self.automations.push(automation);
    }

    /// The strategy group.
    #[must_use]
    pub fn group(&self) -> &StrategyGroup {
        &self.group
    }

    /// Ticks completed so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The order manager.
    #[must_use]
    pub fn order_manager(&self) -> &OrderManager {
        &self.orders
    }

    /// One-time startup work: Betdaq bootstrap drain, Betfair login, balance
    /// snapshot.
    pub async fn bootstrap(&mut self) -> anyhow::Result<()> {
        self.orders.bootstrap().await
    }

    /// Runs exactly one tick.
    pub async fn step(&mut self) {
        self.tick += 1;
        let tick = self.tick;
        debug!(tick, strategies = self.group.len(), "Tick start");

        for automation in &mut self.automations {
            automation.update(tick, &mut self.group);
        }
        self.group.remove_finished();

        let refreshed = self.orders.update_order_information(self.group.len()).await;
        self.group.update_orders(&refreshed);

        let prices = self.pricing.update_prices(tick, &mut self.group).await;
        self.group.update_prices_if_due(&prices);

        self.orders.make_orders(&self.group).await;
    }

    /// Runs the tick loop until interrupted or the configured tick limit is
    /// reached.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.bootstrap().await?;
        info!(
            tick_secs = self.settings.tick_secs,
            practice_mode = self.settings.practice_mode,
            "Engine starting"
        );

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.settings.tick_secs.max(1)));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.step().await;
                    if let Some(max_ticks) = self.settings.max_ticks {
                        if self.tick >= max_ticks {
                            info!(ticks = self.tick, "Tick limit reached, stopping");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupt received, stopping");
                    break;
                }
            }
        }
        Ok(())
    }
}
