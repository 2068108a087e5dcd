// Committed mutations handed to the persistence collaborator.

use serde::{Deserialize, Serialize};

use super::money::Crores;

/// One committed change to the auction. The engine queues these in an
/// outbox; the room drains them after each successful call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuctionEvent {
    BidPlaced {
        bid_id: u64,
        player_id: u32,
        team: String,
        amount: Crores,
    },
    BidUndone {
        bid_id: u64,
        player_id: u32,
        team: String,
        amount: Crores,
    },
    PlayerSold {
        player_id: u32,
        team: String,
        amount: Crores,
        via_rtm: bool,
    },
    PlayerUnsold {
        player_id: u32,
    },
    PlayerRetained {
        player_id: u32,
        team: String,
        amount: Crores,
    },
    SaleReverted {
        player_id: u32,
        team: String,
        amount: Crores,
    },
    PlayerBroughtBack {
        player_id: u32,
    },
    BudgetChanged {
        team: String,
        budget: Crores,
    },
    RetentionPhaseStarted,
    RetentionPhaseCompleted,
    AuctionReset,
}

impl AuctionEvent {
    /// Short label stored next to the JSON payload.
    pub fn kind(&self) -> &'static str {
        match self {
            AuctionEvent::BidPlaced { .. } => "bid_placed",
            AuctionEvent::BidUndone { .. } => "bid_undone",
            AuctionEvent::PlayerSold { .. } => "player_sold",
            AuctionEvent::PlayerUnsold { .. } => "player_unsold",
            AuctionEvent::PlayerRetained { .. } => "player_retained",
            AuctionEvent::SaleReverted { .. } => "sale_reverted",
            AuctionEvent::PlayerBroughtBack { .. } => "player_brought_back",
            AuctionEvent::BudgetChanged { .. } => "budget_changed",
            AuctionEvent::RetentionPhaseStarted => "retention_phase_started",
            AuctionEvent::RetentionPhaseCompleted => "retention_phase_completed",
            AuctionEvent::AuctionReset => "auction_reset",
        }
    }
}
