//! Identity mappings between the two exchanges' market and selection ids.
//!
//! The fuzzy name-matching that produces these links lives outside this
//! system; the links themselves are persisted so a restart does not re-run it.

use serde::{Deserialize, Serialize};

/// A market known to represent the same event on both exchanges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketLink {
    /// Betfair market id.
    pub betfair_market_id: String,
    /// Betdaq market id.
    pub betdaq_market_id: String,
    /// Display name of the event.
    pub name: String,
}

/// A selection known to represent the same outcome on both exchanges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionLink {
    /// Betfair market id.
    pub betfair_market_id: String,
    /// Betfair selection id.
    pub betfair_selection_id: u64,
    /// Betdaq market id.
    pub betdaq_market_id: String,
    /// Betdaq selection id.
    pub betdaq_selection_id: u64,
    /// Display name of the outcome.
    pub name: String,
}
