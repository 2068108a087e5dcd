// Named rejection reasons returned by every mutating engine call.

use thiserror::Error;

use super::money::Crores;

/// Why an engine operation was declined. A rejected call never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    // --- lookups ---
    #[error("unknown team: {team}")]
    UnknownTeam { team: String },

    #[error("unknown player: {player}")]
    UnknownPlayer { player: String },

    #[error("no player is currently up for auction")]
    NoCurrentPlayer,

    #[error("player {player} is not available")]
    PlayerNotAvailable { player: String },

    #[error("player {player} is not unsold")]
    PlayerNotUnsold { player: String },

    // --- pricing ---
    #[error("amount must be positive, got {amount}")]
    InvalidAmount { amount: Crores },

    #[error("opening bid {amount} is below the base price {base_price}")]
    BelowBasePrice { amount: Crores, base_price: Crores },

    #[error("bid {amount} is below the minimum of {minimum}")]
    BelowMinimumIncrement { amount: Crores, minimum: Crores },

    #[error("a bid of {amount} has already been placed for this player")]
    DuplicateBidAmount { amount: Crores },

    // --- team limits ---
    #[error("{team} cannot afford {required} (remaining {remaining})")]
    InsufficientBudget {
        team: String,
        required: Crores,
        remaining: Crores,
    },

    #[error("{team} already has the maximum of {limit} players")]
    SquadFull { team: String, limit: usize },

    #[error("{team} already has the maximum of {limit} overseas players")]
    OverseasQuotaFull { team: String, limit: usize },

    #[error("{team} has used all {limit} retentions")]
    RetentionCapReached { team: String, limit: u32 },

    // --- right to match ---
    #[error("the current player has no bidder")]
    NoBidder,

    #[error("{team} has no right-to-match cards left")]
    RtmUnavailable { team: String },

    #[error("{team} already holds the highest bid")]
    RtmOnOwnBid { team: String },

    #[error("matched amount {matched} does not equal the current bid {current_bid}")]
    RtmAmountMismatch { matched: Crores, current_bid: Crores },

    #[error("a right-to-match negotiation is already in progress")]
    RtmInProgress,

    #[error("no right-to-match negotiation is in progress")]
    NoRtmInProgress,

    #[error("the original bidder has already responded")]
    HikeNotExpected,

    #[error("hike {amount} must exceed the matched amount {matched}")]
    HikeTooLow { amount: Crores, matched: Crores },

    // --- timer / misc ---
    #[error("timer limit must be at least one second")]
    InvalidTimerLimit,

    #[error("no pending action with id {id}")]
    UnknownAction { id: u64 },

    #[error("no sale to undo")]
    NothingToUndo,
}

impl AuctionError {
    /// Stable machine-readable code sent to clients alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::UnknownTeam { .. } => "UNKNOWN_TEAM",
            AuctionError::UnknownPlayer { .. } => "UNKNOWN_PLAYER",
            AuctionError::NoCurrentPlayer => "NO_CURRENT_PLAYER",
            AuctionError::PlayerNotAvailable { .. } => "PLAYER_NOT_AVAILABLE",
            AuctionError::PlayerNotUnsold { .. } => "PLAYER_NOT_UNSOLD",
            AuctionError::InvalidAmount { .. } => "INVALID_AMOUNT",
            AuctionError::BelowBasePrice { .. } => "BELOW_BASE_PRICE",
            AuctionError::BelowMinimumIncrement { .. } => "BELOW_MINIMUM_INCREMENT",
            AuctionError::DuplicateBidAmount { .. } => "DUPLICATE_BID_AMOUNT",
            AuctionError::InsufficientBudget { .. } => "INSUFFICIENT_BUDGET",
            AuctionError::SquadFull { .. } => "SQUAD_FULL",
            AuctionError::OverseasQuotaFull { .. } => "OVERSEAS_QUOTA_FULL",
            AuctionError::RetentionCapReached { .. } => "RETENTION_CAP_REACHED",
            AuctionError::NoBidder => "NO_BIDDER",
            AuctionError::RtmUnavailable { .. } => "RTM_UNAVAILABLE",
            AuctionError::RtmOnOwnBid { .. } => "RTM_ON_OWN_BID",
            AuctionError::RtmAmountMismatch { .. } => "RTM_AMOUNT_MISMATCH",
            AuctionError::RtmInProgress => "RTM_IN_PROGRESS",
            AuctionError::NoRtmInProgress => "NO_RTM_IN_PROGRESS",
            AuctionError::HikeNotExpected => "HIKE_NOT_EXPECTED",
            AuctionError::HikeTooLow { .. } => "HIKE_TOO_LOW",
            AuctionError::InvalidTimerLimit => "INVALID_TIMER_LIMIT",
            AuctionError::UnknownAction { .. } => "UNKNOWN_ACTION",
            AuctionError::NothingToUndo => "NOTHING_TO_UNDO",
        }
    }
}
