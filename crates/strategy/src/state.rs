//! The per-strategy state machine vocabulary.

use serde::{Deserialize, Serialize};

/// States a strategy moves through while working one opportunity.
///
/// Cross-exchange path:
/// `NoOpp → {InstantOpp | Opp} → {BothPlaced | LayPlaced} → {BackMatched |
/// LayMatched} → BothMatched → NoOpp`.
///
/// Market-making path:
/// `NoOpp → Opp → BothPlaced → {BackMatched | LayMatched} → BothMatched →
/// NoOpp`, with `Finished` reachable from any open-order state at close-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyState {
    /// No opportunity detected.
    NoOpp,
    /// Improvable opportunity detected; lay order queued.
    Opp,
    /// Instantly-matchable opportunity detected; both orders queued.
    InstantOpp,
    /// The lay order is resting on the exchange.
    LayPlaced,
    /// Both orders are resting on their exchanges.
    BothPlaced,
    /// The back order has matched; waiting on the lay.
    BackMatched,
    /// The lay order has matched; waiting on the back.
    LayMatched,
    /// Both orders matched.
    BothMatched,
    /// The strategy has closed out and takes no further part in ticks.
    Finished,
}

impl StrategyState {
    /// Returns true while the strategy has orders resting on an exchange.
    #[must_use]
    pub fn has_open_orders(self) -> bool {
        matches!(
            self,
            Self::LayPlaced | Self::BothPlaced | Self::BackMatched | Self::LayMatched
        )
    }

    /// Returns the display string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoOpp => "no_opp",
            Self::Opp => "opp",
            Self::InstantOpp => "instant_opp",
            Self::LayPlaced => "lay_placed",
            Self::BothPlaced => "both_placed",
            Self::BackMatched => "back_matched",
            Self::LayMatched => "lay_matched",
            Self::BothMatched => "both_matched",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for StrategyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_order_states() {
        assert!(StrategyState::BothPlaced.has_open_orders());
        assert!(StrategyState::LayMatched.has_open_orders());
        assert!(!StrategyState::NoOpp.has_open_orders());
        assert!(!StrategyState::BothMatched.has_open_orders());
        assert!(!StrategyState::Finished.has_open_orders());
    }

    #[test]
    fn test_display() {
        assert_eq!(StrategyState::LayPlaced.to_string(), "lay_placed");
    }
}
