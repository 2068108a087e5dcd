// Auction-wide limits shared by every team.

use serde::{Deserialize, Serialize};

use super::money::Crores;

/// Limits and timings the engine enforces. Built from `config/auction.toml`
/// by the service layer; tests usually start from `AuctionRules::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionRules {
    /// Starting budget of every team.
    pub purse: Crores,
    pub max_squad: usize,
    pub max_overseas: usize,
    /// Players from any other country count against `max_overseas`.
    pub domestic_country: String,
    pub min_increment: Crores,
    /// Full countdown applied on the first bid for a player.
    pub timer_limit: u32,
    /// Ceiling the countdown is reset to on every later bid.
    pub bid_reset_secs: u32,
    pub max_retentions: u32,
    pub max_rtm: u32,
}

impl Default for AuctionRules {
    fn default() -> Self {
        AuctionRules {
            purse: Crores::from_hundredths(12_000),
            max_squad: 25,
            max_overseas: 8,
            domestic_country: "India".to_string(),
            min_increment: Crores::from_hundredths(25),
            timer_limit: 30,
            bid_reset_secs: 10,
            max_retentions: 6,
            max_rtm: 6,
        }
    }
}

impl AuctionRules {
    pub fn is_domestic(&self, country: &str) -> bool {
        country.trim().eq_ignore_ascii_case(&self.domestic_country)
    }

    /// RTM cards a team gets after using `retentions_used` retentions.
    pub fn rtm_allowance(&self, retentions_used: u32) -> u32 {
        self.max_retentions
            .saturating_sub(retentions_used)
            .min(self.max_rtm)
    }

    /// Countdown value after a bid: the full limit for the opening bid,
    /// otherwise `min(bid_reset_secs, timer_limit)`.
    pub fn countdown_after_bid(&self, opening_bid: bool) -> u32 {
        if opening_bid {
            self.timer_limit
        } else {
            self.bid_reset_secs.min(self.timer_limit)
        }
    }
}
