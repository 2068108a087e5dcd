// Read-only views broadcast to connected clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ledger::Bid;
use super::pending::PendingAction;
use super::player::Player;
use super::retention::{RetentionPhase, RetentionStatus};
use super::rtm::RtmNegotiation;
use super::rules::AuctionRules;
use super::team::Team;
use super::timer::TimerPhase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub timer: u32,
    pub timer_limit: u32,
    pub is_running: bool,
    pub is_paused: bool,
    pub phase: TimerPhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionSnapshot {
    pub phase: RetentionPhase,
    pub statuses: BTreeMap<String, RetentionStatus>,
}

/// Everything a client needs to render the room.
///
/// `sequence` increases by one per committed mutation; clients drop any
/// snapshot older than the last one they applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    pub sequence: u64,
    pub is_auction_active: bool,
    pub current_player: Option<Player>,
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    /// Active bids on the current player, most recent first.
    pub bids: Vec<Bid>,
    pub timer: TimerSnapshot,
    pub rtm: Option<RtmNegotiation>,
    pub retention: RetentionSnapshot,
    pub pending_actions: Vec<PendingAction>,
    pub rules: AuctionRules,
}
