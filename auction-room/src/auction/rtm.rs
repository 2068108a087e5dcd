// Right-to-match negotiation.
//
// A team holding an RTM card may match the leading bid on the current
// player. The original bidder then gets one chance to hike; the RTM team
// either accepts the hike or passes, and the player goes to whichever side
// ends up paying.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::engine::AuctionEngine;
use super::error::AuctionError;
use super::money::Crores;
use super::team::Acquisition;

/// An open RTM negotiation on the current player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtmNegotiation {
    pub rtm_team: String,
    pub matched_amount: Crores,
    pub original_bidder: String,
    /// True until the original bidder makes their hike.
    pub waiting_for_hike: bool,
    pub hike_amount: Option<Crores>,
}

/// Who takes the player when a negotiation is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtmWinner {
    RtmTeam,
    OriginalBidder,
}

impl RtmNegotiation {
    /// Outcome of a finalize decision.
    ///
    /// Without a hike the RTM team takes the player at the matched amount.
    /// After a hike, accepting gives the RTM team the player at the hike and
    /// passing gives it to the original bidder at the same price.
    pub fn resolve(&self, accept: bool) -> (RtmWinner, Crores) {
        match self.hike_amount {
            None => (RtmWinner::RtmTeam, self.matched_amount),
            Some(hike) if accept => (RtmWinner::RtmTeam, hike),
            Some(hike) => (RtmWinner::OriginalBidder, hike),
        }
    }
}

impl AuctionEngine {
    /// Open a negotiation: `rtm_team` matches the current bid and the
    /// countdown is paused.
    pub fn initiate_rtm(&mut self, rtm_team: &str, matched_amount: Crores) -> Result<(), AuctionError> {
        if self.rtm.is_some() {
            return Err(AuctionError::RtmInProgress);
        }
        let idx = self.current_available_index()?;
        let player = &self.players[idx];
        let original_bidder = player.current_bidder.clone().ok_or(AuctionError::NoBidder)?;

        let team = &self.teams[self.team_index(rtm_team)?];
        if team.name == original_bidder {
            return Err(AuctionError::RtmOnOwnBid {
                team: team.name.clone(),
            });
        }
        if matched_amount != player.current_bid {
            return Err(AuctionError::RtmAmountMismatch {
                matched: matched_amount,
                current_bid: player.current_bid,
            });
        }
        if team.rtm_available == 0 {
            return Err(AuctionError::RtmUnavailable {
                team: team.name.clone(),
            });
        }

        info!(
            "{} matched {} on {} (bid by {})",
            team.name, matched_amount, player.name, original_bidder
        );
        self.rtm = Some(RtmNegotiation {
            rtm_team: team.name.clone(),
            matched_amount,
            original_bidder,
            waiting_for_hike: true,
            hike_amount: None,
        });
        self.timer.pause();
        Ok(())
    }

    /// The original bidder raises above the matched amount.
    pub fn hike_price(&mut self, new_amount: Crores) -> Result<(), AuctionError> {
        let negotiation = self.rtm.as_mut().ok_or(AuctionError::NoRtmInProgress)?;
        if !negotiation.waiting_for_hike {
            return Err(AuctionError::HikeNotExpected);
        }
        if new_amount <= negotiation.matched_amount {
            return Err(AuctionError::HikeTooLow {
                amount: new_amount,
                matched: negotiation.matched_amount,
            });
        }
        negotiation.hike_amount = Some(new_amount);
        negotiation.waiting_for_hike = false;
        info!("{} hiked to {}", negotiation.original_bidder, new_amount);
        Ok(())
    }

    /// Close the negotiation and sell the player. A sale that fails
    /// validation leaves the negotiation open.
    pub fn finalize_rtm(&mut self, accept: bool) -> Result<(), AuctionError> {
        let negotiation = self.rtm.clone().ok_or(AuctionError::NoRtmInProgress)?;
        let idx = self.current_available_index()?;

        let (winner, price) = negotiation.resolve(accept);
        let (team_name, acquisition) = match winner {
            RtmWinner::RtmTeam => (&negotiation.rtm_team, Acquisition::RightToMatch),
            RtmWinner::OriginalBidder => (&negotiation.original_bidder, Acquisition::Bought),
        };
        let team_idx = self.team_index(team_name)?;
        self.complete_sale(idx, team_idx, price, acquisition)
    }

    /// Abandon the negotiation. The countdown resumes where it stopped.
    pub fn cancel_rtm(&mut self) -> Result<(), AuctionError> {
        let negotiation = self.rtm.take().ok_or(AuctionError::NoRtmInProgress)?;
        info!("RTM by {} cancelled", negotiation.rtm_team);
        self.timer.resume();
        Ok(())
    }
}
