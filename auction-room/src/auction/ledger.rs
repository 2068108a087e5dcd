// Bid ledger for the player currently on the block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Crores;

/// An accepted bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: u64,
    pub player_id: u32,
    pub team_name: String,
    pub amount: Crores,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LedgerEntry {
    bid: Bid,
    withdrawn: bool,
}

/// Append-only log of bids for the current player.
///
/// Undo withdraws the newest active entry instead of deleting it, so the
/// history stays intact until the ledger is cleared for the next player.
/// Bid ids keep increasing across players.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BidLedger {
    entries: Vec<LedgerEntry>,
    next_id: u64,
}

impl BidLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bid and return a copy of it.
    pub fn record(&mut self, player_id: u32, team_name: &str, amount: Crores) -> Bid {
        self.next_id += 1;
        let bid = Bid {
            id: self.next_id,
            player_id,
            team_name: team_name.to_string(),
            amount,
            timestamp: Utc::now(),
        };
        self.entries.push(LedgerEntry {
            bid: bid.clone(),
            withdrawn: false,
        });
        bid
    }

    /// Withdraw the most recent active bid.
    pub fn withdraw_latest(&mut self) -> Option<Bid> {
        let entry = self.entries.iter_mut().rev().find(|e| !e.withdrawn)?;
        entry.withdrawn = true;
        Some(entry.bid.clone())
    }

    pub fn latest(&self) -> Option<&Bid> {
        self.active().next()
    }

    /// Active bids, most recent first.
    pub fn active(&self) -> impl Iterator<Item = &Bid> {
        self.entries
            .iter()
            .rev()
            .filter(|e| !e.withdrawn)
            .map(|e| &e.bid)
    }

    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.withdrawn).count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Whether any active bid already quotes `amount`.
    pub fn contains_amount(&self, amount: Crores) -> bool {
        self.active().any(|b| b.amount == amount)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
