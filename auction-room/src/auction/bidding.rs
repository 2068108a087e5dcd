// Bid validation and recording for the player on the block.

use tracing::{debug, info};

use super::engine::AuctionEngine;
use super::error::AuctionError;
use super::event::AuctionEvent;
use super::money::Crores;

impl AuctionEngine {
    /// Record a bid by `team_name` on the current player.
    ///
    /// The opening bid must reach the base price; later bids must beat the
    /// current bid by at least the minimum increment. No two active bids
    /// share an amount. The team must be able to afford the player and have
    /// room in its squad.
    ///
    /// An accepted bid restarts the countdown: the full limit for the
    /// opening bid, the shorter reset window afterwards.
    pub fn place_bid(&mut self, team_name: &str, amount: Crores) -> Result<(), AuctionError> {
        let player_idx = self.current_available_index()?;
        if self.rtm.is_some() {
            return Err(AuctionError::RtmInProgress);
        }
        if !amount.is_positive() {
            return Err(AuctionError::InvalidAmount { amount });
        }
        let team_idx = self.team_index(team_name)?;

        let player = &self.players[player_idx];
        let opening = player.current_bidder.is_none();
        if opening {
            if amount < player.base_price {
                return Err(AuctionError::BelowBasePrice {
                    amount,
                    base_price: player.base_price,
                });
            }
        } else {
            let minimum = player.current_bid + self.rules.min_increment;
            if amount < minimum {
                return Err(AuctionError::BelowMinimumIncrement { amount, minimum });
            }
        }
        if self.ledger.contains_amount(amount) {
            return Err(AuctionError::DuplicateBidAmount { amount });
        }

        let team = &self.teams[team_idx];
        team.check_can_acquire(player, amount, &self.rules)?;
        let team_name = team.name.clone();
        let player_id = player.id;

        let bid = self.ledger.record(player_id, &team_name, amount);
        let player = &mut self.players[player_idx];
        player.current_bid = amount;
        player.current_bidder = Some(team_name.clone());
        self.timer
            .restart_at(self.rules.countdown_after_bid(opening));

        info!("{} bid {} on {}", team_name, amount, player.name);
        self.emit(AuctionEvent::BidPlaced {
            bid_id: bid.id,
            player_id,
            team: team_name,
            amount,
        });
        Ok(())
    }

    /// Withdraw the most recent bid and restore the one before it. With no
    /// bids to undo this is a no-op.
    pub fn undo_last_bid(&mut self) -> Result<(), AuctionError> {
        let Some(player_idx) = self.current else {
            return Ok(());
        };
        if self.ledger.is_empty() {
            return Ok(());
        }
        if self.rtm.is_some() {
            return Err(AuctionError::RtmInProgress);
        }
        let Some(bid) = self.ledger.withdraw_latest() else {
            return Ok(());
        };

        let player = &mut self.players[player_idx];
        match self.ledger.latest() {
            Some(previous) => {
                player.current_bid = previous.amount;
                player.current_bidder = Some(previous.team_name.clone());
            }
            None => {
                player.current_bid = player.base_price;
                player.current_bidder = None;
            }
        }
        debug!(
            "Undid {} by {}, now {} ({:?})",
            bid.amount, bid.team_name, player.current_bid, player.current_bidder
        );

        self.emit(AuctionEvent::BidUndone {
            bid_id: bid.id,
            player_id: bid.player_id,
            team: bid.team_name,
            amount: bid.amount,
        });
        Ok(())
    }
}
