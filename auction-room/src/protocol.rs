// WebSocket wire format: client actions in, snapshots and replies out.

use serde::{Deserialize, Serialize};

use crate::auction::{AuctionError, AuctionSnapshot, Crores, PendingKind};

/// One engine entry point. Tagged by `"action"`; tags and fields are
/// snake_case like the rest of the wire format. Money fields are plain
/// numbers in crores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    PlaceBid {
        team: String,
        amount: Crores,
    },
    UndoLastBid,
    InitiateRtm {
        team: String,
        matched_amount: Crores,
    },
    HikePrice {
        amount: Crores,
    },
    FinalizeRtm {
        accept: bool,
    },
    CancelRtm,
    SellPlayer {
        team: String,
        amount: Crores,
    },
    SellPlayerWithRtm {
        team: String,
        amount: Crores,
    },
    RetainPlayer {
        team: String,
        player: String,
        amount: Crores,
    },
    ConfirmTeamRetentions {
        team: String,
    },
    MarkUnsold,
    BringBackUnsoldPlayer {
        player_id: u32,
    },
    NextPlayer,
    StartAuction,
    PauseAuction,
    ResetAuction,
    StartRetentionPhase,
    CompleteRetentionPhase,
    UpdateTeamLimits {
        max_retentions: u32,
        max_rtm: u32,
    },
    StartTimer,
    PauseTimer,
    ResumeTimer,
    ResetTimer,
    SetTimerLimit {
        seconds: u32,
    },
    Propose {
        player: String,
        #[serde(default)]
        team: String,
        #[serde(default)]
        amount: Crores,
        kind: PendingKind,
    },
    Approve {
        id: u64,
    },
    Reject {
        id: u64,
    },
    UndoLastSale,
}

/// Incoming message: an action plus an optional id echoed in the reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(default)]
    pub request_id: Option<u64>,
    #[serde(flatten)]
    pub action: Action,
}

/// Outgoing message, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Full room state after a committed mutation.
    Snapshot(Box<AuctionSnapshot>),
    Ack {
        request_id: Option<u64>,
    },
    Rejected {
        request_id: Option<u64>,
        code: String,
        reason: String,
    },
}

/// Code used when a message cannot be parsed at all.
pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";

impl ServerMessage {
    pub fn rejected(request_id: Option<u64>, err: &AuctionError) -> Self {
        ServerMessage::Rejected {
            request_id,
            code: err.code().to_string(),
            reason: err.to_string(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            request_id: None,
            code: INVALID_MESSAGE.to_string(),
            reason: reason.into(),
        }
    }
}
