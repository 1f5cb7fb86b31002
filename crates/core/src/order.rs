//! The order model: bet intents, tracked orders, and exchange reports.
//!
//! Orders are created by strategies as intents (`NotPlaced`, no exchange
//! reference) and carry a client-generated uuid from construction; every local
//! map — store, manager, strategy — is keyed by that uuid, so bookkeeping
//! never depends on when an exchange gets around to assigning its own
//! reference. Exchange-reported state arrives as an [`OrderReport`] and is
//! reconciled field-by-field onto the tracked order, never adopted wholesale.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ExchangeError;
use crate::odds::{ExchangeId, MAX_ODDS};

/// Rounds a stake to the two decimal places both exchanges accept.
#[must_use]
pub fn round_stake(stake: Decimal) -> Decimal {
    stake.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Side and Status
// =============================================================================

/// Side of a bet. The wire encoding on both exchanges is back=1, lay=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bet for the outcome.
    Back,
    /// Bet against the outcome.
    Lay,
}

impl Side {
    /// Wire encoding used by both exchange APIs.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Back => 1,
            Self::Lay => 2,
        }
    }

    /// Returns the opposite side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Back => Self::Lay,
            Self::Lay => Self::Back,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Back => write!(f, "back"),
            Self::Lay => write!(f, "lay"),
        }
    }
}

/// Lifecycle status of an order. Transitions are monotonic:
/// `NotPlaced → Unmatched → {Matched, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Intent constructed by a strategy, not yet submitted.
    NotPlaced,
    /// Resting on the exchange, not (fully) matched.
    Unmatched,
    /// Fully matched.
    Matched,
    /// Cancelled or voided.
    Cancelled,
}

impl OrderStatus {
    /// Returns true if no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Matched | Self::Cancelled)
    }

    /// Whether moving to `next` respects the monotonic lifecycle.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        match self {
            Self::NotPlaced => true,
            Self::Unmatched => next.is_terminal(),
            Self::Matched | Self::Cancelled => false,
        }
    }

    /// Returns the display string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotPlaced => "not_placed",
            Self::Unmatched => "unmatched",
            Self::Matched => "matched",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A bet instance, from intent through settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Client-generated correlation id, assigned at construction.
    pub id: Uuid,
    /// Exchange this order targets.
    pub exchange: ExchangeId,
    /// Market identifier on that exchange.
    pub market_id: String,
    /// Selection identifier on that exchange.
    pub selection_id: u64,
    /// Back or lay.
    pub side: Side,
    /// Decimal odds.
    pub price: Decimal,
    /// Requested stake.
    pub stake: Decimal,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Reference assigned by the exchange; `None` until confirmed, immutable
    /// once set.
    pub exchange_ref: Option<String>,
    /// Stake matched so far.
    pub matched_stake: Decimal,
    /// Stake still resting unmatched.
    pub unmatched_stake: Decimal,
    /// When the order was submitted to the exchange.
    pub placed_at: Option<DateTime<Utc>>,
    /// Selection reset count at placement (Betdaq).
    pub reset_count: u32,
    /// Withdrawal sequence number at placement (Betfair).
    pub withdrawal_sequence: u32,
    /// Whether the exchange should cancel the unmatched part when the market
    /// turns in-running.
    pub cancel_on_in_running: bool,
}

impl Order {
    /// Creates a new order intent with a fresh client id.
    #[must_use]
    pub fn new(
        exchange: ExchangeId,
        market_id: impl Into<String>,
        selection_id: u64,
        side: Side,
        price: Decimal,
        stake: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            exchange,
            market_id: market_id.into(),
            selection_id,
            side,
            price,
            stake,
            status: OrderStatus::NotPlaced,
            exchange_ref: None,
            matched_stake: Decimal::ZERO,
            unmatched_stake: stake,
            placed_at: None,
            reset_count: 0,
            withdrawal_sequence: 0,
            cancel_on_in_running: true,
        }
    }

    /// Attaches the selection bookkeeping fields an exchange needs to accept
    /// the order.
    #[must_use]
    pub fn with_selection_meta(mut self, reset_count: u32, withdrawal_sequence: u32) -> Self {
        self.reset_count = reset_count;
        self.withdrawal_sequence = withdrawal_sequence;
        self
    }

    /// Checks the submission invariants: positive stake, price in the legal
    /// odds range for the exchange.
    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.stake <= Decimal::ZERO {
            return Err(ExchangeError::invalid_order(format!(
                "stake must be positive, got {}",
                self.stake
            )));
        }
        if self.price < self.exchange.min_odds() || self.price > MAX_ODDS {
            return Err(ExchangeError::invalid_order(format!(
                "price {} outside [{}, {}] on {}",
                self.price,
                self.exchange.min_odds(),
                MAX_ODDS,
                self.exchange
            )));
        }
        Ok(())
    }

    /// Returns true while the order is resting on an exchange.
    #[must_use]
    pub fn is_unmatched(&self) -> bool {
        self.status == OrderStatus::Unmatched
    }

    /// Marks the order as submitted, recording the reference when the
    /// exchange returned one synchronously.
    pub fn mark_placed(&mut self, exchange_ref: Option<String>) {
        if self.status.can_transition_to(OrderStatus::Unmatched) {
            self.status = OrderStatus::Unmatched;
        }
        if self.exchange_ref.is_none() {
            self.exchange_ref = exchange_ref;
        }
        self.placed_at = Some(Utc::now());
    }

    /// Marks the order cancelled, unless it already reached a terminal state.
    pub fn mark_cancelled(&mut self) {
        if self.status.can_transition_to(OrderStatus::Cancelled) {
            self.status = OrderStatus::Cancelled;
            self.unmatched_stake = Decimal::ZERO;
        }
    }

    /// Reconciles exchange-reported state onto this order.
    ///
    /// Adopts the reference if none is held yet, refreshes matched/unmatched
    /// stakes, and applies the reported status only when the monotonic
    /// lifecycle allows it — a stale report can never resurrect a matched or
    /// cancelled order.
    pub fn apply_report(&mut self, report: &OrderReport) {
        if self.exchange_ref.is_none() {
            self.exchange_ref = Some(report.exchange_ref.clone());
        }
        self.matched_stake = report.matched_stake;
        self.unmatched_stake = report.unmatched_stake;
        if self.status.can_transition_to(report.status) {
            self.status = report.status;
        } else {
            debug!(
                order_id = %self.id,
                current = %self.status,
                reported = %report.status,
                "Ignoring non-monotonic status report"
            );
        }
    }
}

// =============================================================================
// Order Report
// =============================================================================

/// Order state as reported by an exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReport {
    /// Exchange that produced the report.
    pub exchange: ExchangeId,
    /// The exchange's own order reference.
    pub exchange_ref: String,
    /// Market the order sits on.
    pub market_id: String,
    /// Selection the order sits on.
    pub selection_id: u64,
    /// Back or lay.
    pub side: Side,
    /// Current price of the order.
    pub price: Decimal,
    /// Requested stake.
    pub stake: Decimal,
    /// Stake matched so far.
    pub matched_stake: Decimal,
    /// Stake still resting.
    pub unmatched_stake: Decimal,
    /// Reported status.
    pub status: OrderStatus,
}

impl OrderReport {
    /// Builds the report an exchange would produce for `order` in its current
    /// state. Requires the order to hold a reference.
    #[must_use]
    pub fn for_order(order: &Order, exchange_ref: impl Into<String>) -> Self {
        Self {
            exchange: order.exchange,
            exchange_ref: exchange_ref.into(),
            market_id: order.market_id.clone(),
            selection_id: order.selection_id,
            side: order.side,
            price: order.price,
            stake: order.stake,
            matched_stake: order.matched_stake,
            unmatched_stake: order.unmatched_stake,
            status: order.status,
        }
    }
}
