// Team ledger: budget, roster and RTM/retention counters.

use serde::{Deserialize, Serialize};

use super::error::AuctionError;
use super::money::Crores;
use super::player::Player;
use super::rules::AuctionRules;

/// How a rostered player was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acquisition {
    Bought,
    RightToMatch,
    Retained,
}

/// A player owned by a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosteredPlayer {
    pub player_id: u32,
    pub name: String,
    pub country: String,
    pub price: Crores,
    pub acquisition: Acquisition,
}

/// The state of a single team during the auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// Budget restored on a full reset or a new retention phase.
    pub starting_budget: Crores,
    /// Remaining budget. Never negative.
    pub budget: Crores,
    /// Owned players in acquisition order.
    pub roster: Vec<RosteredPlayer>,
    pub rtm_available: u32,
    pub retentions_used: u32,
}

impl Team {
    pub fn new(id: &str, name: &str, starting_budget: Crores, rtm_available: u32) -> Self {
        Team {
            id: id.to_string(),
            name: name.to_string(),
            starting_budget,
            budget: starting_budget,
            roster: Vec::new(),
            rtm_available,
            retentions_used: 0,
        }
    }

    /// Total spent on the current roster.
    pub fn spent(&self) -> Crores {
        self.roster.iter().map(|p| p.price).sum()
    }

    pub fn overseas_count(&self, rules: &AuctionRules) -> usize {
        self.roster
            .iter()
            .filter(|p| !rules.is_domestic(&p.country))
            .count()
    }

    pub fn has_player(&self, player_id: u32) -> bool {
        self.roster.iter().any(|p| p.player_id == player_id)
    }

    /// Whether this team may add `player` at `amount` without breaking the
    /// budget, squad-size or overseas limits.
    pub fn check_can_acquire(
        &self,
        player: &Player,
        amount: Crores,
        rules: &AuctionRules,
    ) -> Result<(), AuctionError> {
        if self.budget < amount {
            return Err(AuctionError::InsufficientBudget {
                team: self.name.clone(),
                required: amount,
                remaining: self.budget,
            });
        }
        if self.roster.len() >= rules.max_squad {
            return Err(AuctionError::SquadFull {
                team: self.name.clone(),
                limit: rules.max_squad,
            });
        }
        if !rules.is_domestic(&player.country) && self.overseas_count(rules) >= rules.max_overseas {
            return Err(AuctionError::OverseasQuotaFull {
                team: self.name.clone(),
                limit: rules.max_overseas,
            });
        }
        Ok(())
    }

    /// Deduct `amount` and append the player. Callers run
    /// `check_can_acquire` first.
    pub fn acquire(&mut self, player: &Player, amount: Crores, acquisition: Acquisition) {
        self.budget -= amount;
        self.roster.push(RosteredPlayer {
            player_id: player.id,
            name: player.name.clone(),
            country: player.country.clone(),
            price: amount,
            acquisition,
        });
    }

    /// Remove a player and refund what was paid for them.
    pub fn release(&mut self, player_id: u32) -> Option<RosteredPlayer> {
        let idx = self.roster.iter().position(|p| p.player_id == player_id)?;
        let released = self.roster.remove(idx);
        self.budget += released.price;
        Some(released)
    }

    /// Back to the starting budget with an empty roster and no retentions.
    pub fn reset(&mut self, rtm_available: u32) {
        self.budget = self.starting_budget;
        self.roster.clear();
        self.retentions_used = 0;
        self.rtm_available = rtm_available;
    }
}
