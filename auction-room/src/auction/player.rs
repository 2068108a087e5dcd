// Player registry entries and their auction status.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::money::Crores;

/// Playing role. Cosmetic for the engine; carried through to snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Batter,
    Bowler,
    AllRounder,
    WicketKeeper,
}

impl Role {
    /// Parse a role string.
    ///
    /// Accepts the usual abbreviations: "BAT", "BOWL", "AR"/"ALL-ROUNDER",
    /// "WK"/"KEEPER".
    pub fn from_str_role(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BAT" | "BATTER" | "BATSMAN" => Some(Role::Batter),
            "BOWL" | "BOWLER" => Some(Role::Bowler),
            "AR" | "ALL-ROUNDER" | "ALLROUNDER" | "ALL ROUNDER" => Some(Role::AllRounder),
            "WK" | "KEEPER" | "WICKET-KEEPER" | "WICKETKEEPER" => Some(Role::WicketKeeper),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Role::Batter => "BAT",
            Role::Bowler => "BOWL",
            Role::AllRounder => "AR",
            Role::WicketKeeper => "WK",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Where a player stands in the current auction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Available,
    Sold,
    Unsold,
    Retained,
}

/// A player in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub role: Role,
    pub country: String,
    pub base_price: Crores,
    /// Highest accepted bid, or the base price while nobody has bid.
    pub current_bid: Crores,
    /// Team name holding `current_bid`, if any.
    pub current_bidder: Option<String>,
    pub status: PlayerStatus,
    /// Auction set label (e.g. "Marquee"). Display only.
    #[serde(default)]
    pub set_name: String,
    /// Ordering key for the auction queue; ties keep registry order.
    #[serde(default)]
    pub set_order: u32,
    /// Team the player was retained by or bought back through RTM.
    #[serde(default)]
    pub previous_team: Option<String>,
    #[serde(default)]
    pub sold_price: Option<Crores>,
    #[serde(default)]
    pub retained_amount: Option<Crores>,
}

impl Player {
    pub fn new(
        id: u32,
        name: &str,
        role: Role,
        country: &str,
        base_price: Crores,
        set_name: &str,
        set_order: u32,
    ) -> Self {
        Player {
            id,
            name: name.to_string(),
            role,
            country: country.to_string(),
            base_price,
            current_bid: base_price,
            current_bidder: None,
            status: PlayerStatus::Available,
            set_name: set_name.to_string(),
            set_order,
            previous_team: None,
            sold_price: None,
            retained_amount: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == PlayerStatus::Available
    }

    /// Put the player back on the block at their base price. `previous_team`
    /// is kept because it records where the player came from.
    pub fn reset_to_base(&mut self) {
        self.status = PlayerStatus::Available;
        self.current_bid = self.base_price;
        self.current_bidder = None;
        self.sold_price = None;
        self.retained_amount = None;
    }
}
