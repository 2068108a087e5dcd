// Pre-auction retention phase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::engine::AuctionEngine;
use super::error::AuctionError;
use super::event::AuctionEvent;
use super::money::Crores;
use super::player::PlayerStatus;
use super::team::Acquisition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPhase {
    #[default]
    Inactive,
    Active,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionStatus {
    Pending,
    Confirmed,
}

/// Phase flag plus each team's confirmation, keyed by team name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionCoordinator {
    pub phase: RetentionPhase,
    pub statuses: BTreeMap<String, RetentionStatus>,
}

impl RetentionCoordinator {
    pub fn all_confirmed(&self) -> bool {
        !self.statuses.is_empty()
            && self
                .statuses
                .values()
                .all(|s| *s == RetentionStatus::Confirmed)
    }
}

impl AuctionEngine {
    /// Open the retention window: retained players go back to the pool and
    /// every team starts over with its full purse and an empty roster.
    pub fn start_retention_phase(&mut self) -> Result<(), AuctionError> {
        for player in &mut self.players {
            if player.status == PlayerStatus::Retained {
                player.reset_to_base();
            }
        }

        let rtm = self.rules.rtm_allowance(0);
        for team in &mut self.teams {
            team.reset(rtm);
        }
        self.sales.clear();

        self.retention.phase = RetentionPhase::Active;
        self.retention.statuses = self
            .teams
            .iter()
            .map(|t| (t.name.clone(), RetentionStatus::Pending))
            .collect();

        info!("Retention phase started for {} teams", self.teams.len());
        self.emit(AuctionEvent::RetentionPhaseStarted);
        for idx in 0..self.teams.len() {
            self.emit_budget(idx);
        }
        Ok(())
    }

    /// Retain `player_name` for `team_name` at `amount`, bypassing bidding.
    pub fn retain_player(&mut self, team_name: &str, player_name: &str, amount: Crores) -> Result<(), AuctionError> {
        if !amount.is_positive() {
            return Err(AuctionError::InvalidAmount { amount });
        }
        let team_idx = self.team_index(team_name)?;
        let player_idx = self.player_index_by_name(player_name)?;

        let player = &self.players[player_idx];
        if !player.is_available() {
            return Err(AuctionError::PlayerNotAvailable {
                player: player.name.clone(),
            });
        }
        let team = &self.teams[team_idx];
        team.check_can_acquire(player, amount, &self.rules)?;
        let team_name = team.name.clone();

        let player = &mut self.players[player_idx];
        player.status = PlayerStatus::Retained;
        player.retained_amount = Some(amount);
        player.sold_price = Some(amount);
        player.current_bidder = None;
        player.previous_team = Some(team_name.clone());
        let player_id = player.id;

        let team = &mut self.teams[team_idx];
        team.acquire(&self.players[player_idx], amount, Acquisition::Retained);
        team.retentions_used += 1;

        info!(
            "{} retained {} for {}",
            team_name, self.players[player_idx].name, amount
        );
        self.emit(AuctionEvent::PlayerRetained {
            player_id,
            team: team_name,
            amount,
        });
        self.emit_budget(team_idx);

        if self.current == Some(player_idx) {
            let next = self.next_available_after(Some(player_idx));
            self.select_player(next);
        }
        Ok(())
    }

    /// Mark a team's retentions as final.
    pub fn confirm_team_retentions(&mut self, team_name: &str) -> Result<(), AuctionError> {
        let name = self.teams[self.team_index(team_name)?].name.clone();
        info!("{} confirmed retentions", name);
        self.retention
            .statuses
            .insert(name, RetentionStatus::Confirmed);
        Ok(())
    }

    /// Close the retention window, hand out RTM cards and put the first
    /// available player on the block.
    pub fn complete_retention_phase(&mut self) -> Result<(), AuctionError> {
        for team in &mut self.teams {
            team.rtm_available = self.rules.rtm_allowance(team.retentions_used);
        }
        self.retention.phase = RetentionPhase::Complete;

        let first = self.next_available_after(None);
        self.select_player(first);

        info!("Retention phase complete");
        self.emit(AuctionEvent::RetentionPhaseCompleted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::test_support::{cr, engine, started_engine};

    #[test]
    fn start_resets_teams_and_retained_players() {
        let mut e = engine();
        let name = e.players()[1].name.clone();
        e.retain_player("Alpha", &name, cr(18.0)).unwrap();

        e.start_retention_phase().unwrap();

        assert_eq!(e.retention().phase, RetentionPhase::Active);
        assert!(e
            .retention()
            .statuses
            .values()
            .all(|s| *s == RetentionStatus::Pending));
        let team = e.team("Alpha").unwrap();
        assert_eq!(team.budget, team.starting_budget);
        assert_eq!(team.retentions_used, 0);
        assert!(team.roster.is_empty());
        let player = e.player_named(&name).unwrap();
        assert_eq!(player.status, PlayerStatus::Available);
        assert!(player.retained_amount.is_none());
    }

    #[test]
    fn retain_deducts_budget_and_marks_player() {
        let mut e = engine();
        e.start_retention_phase().unwrap();
        let name = e.players()[2].name.clone();
        e.retain_player("Bravo", &name, cr(14.0)).unwrap();

        let team = e.team("Bravo").unwrap();
        assert_eq!(team.budget, team.starting_budget - cr(14.0));
        assert_eq!(team.retentions_used, 1);
        assert_eq!(team.roster[0].acquisition, Acquisition::Retained);

        let player = e.player_named(&name).unwrap();
        assert_eq!(player.status, PlayerStatus::Retained);
        assert_eq!(player.retained_amount, Some(cr(14.0)));
        assert_eq!(player.previous_team.as_deref(), Some("Bravo"));
    }

    #[test]
    fn retain_rejects_unavailable_and_unaffordable() {
        let mut e = engine();
        let name = e.players()[0].name.clone();
        assert!(matches!(
            e.retain_player("Alpha", &name, cr(500.0)).unwrap_err(),
            AuctionError::InsufficientBudget { .. }
        ));
        e.retain_player("Alpha", &name, cr(10.0)).unwrap();
        assert!(matches!(
            e.retain_player("Bravo", &name, cr(10.0)).unwrap_err(),
            AuctionError::PlayerNotAvailable { .. }
        ));
        assert!(matches!(
            e.retain_player("Bravo", "Nobody", cr(10.0)).unwrap_err(),
            AuctionError::UnknownPlayer { .. }
        ));
    }

    #[test]
    fn confirm_marks_only_that_team() {
        let mut e = engine();
        e.start_retention_phase().unwrap();
        e.confirm_team_retentions("Alpha").unwrap();
        assert_eq!(
            e.retention().statuses.get("Alpha"),
            Some(&RetentionStatus::Confirmed)
        );
        assert_eq!(
            e.retention().statuses.get("Bravo"),
            Some(&RetentionStatus::Pending)
        );
        assert!(!e.retention().all_confirmed());
        assert!(matches!(
            e.confirm_team_retentions("Nobody").unwrap_err(),
            AuctionError::UnknownTeam { .. }
        ));
    }

    #[test]
    fn complete_sets_rtm_from_retentions_used() {
        let mut e = engine();
        e.update_team_limits(4, 3).unwrap();
        e.start_retention_phase().unwrap();
        let names: Vec<String> = e.players()[..3].iter().map(|p| p.name.clone()).collect();
        for name in &names {
            e.retain_player("Alpha", name, cr(5.0)).unwrap();
        }

        e.complete_retention_phase().unwrap();

        // Alpha: min(3, 4 - 3) = 1. Others: min(3, 4) = 3.
        assert_eq!(e.team("Alpha").unwrap().rtm_available, 1);
        assert_eq!(e.team("Bravo").unwrap().rtm_available, 3);
        assert_eq!(e.retention().phase, RetentionPhase::Complete);

        let current = e.current_player().unwrap();
        assert!(current.is_available());
        assert!(!names.contains(&current.name));
    }

    #[test]
    fn retaining_the_current_player_moves_on() {
        let mut e = started_engine();
        let current = e.current_player().unwrap().name.clone();
        e.retain_player("Charlie", &current, cr(3.0)).unwrap();
        assert_ne!(e.current_player().unwrap().name, current);
    }
}
