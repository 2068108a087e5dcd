// Auction coordinator: current-player advancement, sales and lifecycle.
//
// `AuctionEngine` is the only mutation surface for players, teams, the bid
// ledger and the timer. Bidding, RTM, retention and the pending queue add
// their operations in sibling modules through further `impl AuctionEngine`
// blocks.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::AuctionError;
use super::event::AuctionEvent;
use super::ledger::BidLedger;
use super::money::Crores;
use super::pending::PendingQueue;
use super::player::{Player, PlayerStatus};
use super::retention::RetentionCoordinator;
use super::rtm::RtmNegotiation;
use super::rules::AuctionRules;
use super::snapshot::{AuctionSnapshot, RetentionSnapshot, TimerSnapshot};
use super::team::{Acquisition, Team};
use super::timer::{TickOutcome, TimerController};

/// A completed sale, kept so the most recent one can be reverted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub player_id: u32,
    pub team_name: String,
    pub amount: Crores,
    pub acquisition: Acquisition,
    /// `previous_team` before the sale overwrote it.
    pub previous_team_before: Option<String>,
}

/// The complete state of one auction room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionEngine {
    pub(super) rules: AuctionRules,
    /// Registry in auction order.
    pub(super) players: Vec<Player>,
    /// Registry as seeded, restored by `reset_auction`.
    pub(super) seed_players: Vec<Player>,
    pub(super) teams: Vec<Team>,
    /// Index into `players` of the player on the block.
    pub(super) current: Option<usize>,
    pub(super) ledger: BidLedger,
    pub(super) timer: TimerController,
    pub(super) rtm: Option<RtmNegotiation>,
    pub(super) retention: RetentionCoordinator,
    pub(super) pending: PendingQueue,
    pub(super) sales: Vec<SaleRecord>,
    pub(super) is_auction_active: bool,
    #[serde(skip)]
    pub(super) outbox: Vec<AuctionEvent>,
}

impl AuctionEngine {
    /// Create an engine for the given teams and players.
    ///
    /// # Arguments
    /// - `rules`: limits and timings
    /// - `teams`: (team_id, team_name) pairs, kept in the given order
    /// - `players`: the registry; ordered by `set_order`, ties keep input order
    pub fn new(rules: AuctionRules, teams: Vec<(String, String)>, mut players: Vec<Player>) -> Self {
        players.sort_by_key(|p| p.set_order);
        for player in &mut players {
            player.reset_to_base();
        }

        let rtm = rules.rtm_allowance(0);
        let teams = teams
            .into_iter()
            .map(|(id, name)| Team::new(&id, &name, rules.purse, rtm))
            .collect();

        AuctionEngine {
            timer: TimerController::new(rules.timer_limit),
            rules,
            seed_players: players.clone(),
            players,
            teams,
            current: None,
            ledger: BidLedger::new(),
            rtm: None,
            retention: RetentionCoordinator::default(),
            pending: PendingQueue::default(),
            sales: Vec::new(),
            is_auction_active: false,
            outbox: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn rules(&self) -> &AuctionRules {
        &self.rules
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current.map(|idx| &self.players[idx])
    }

    pub fn player(&self, player_id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_named(&self, name: &str) -> Option<&Player> {
        self.player_index_by_name(name).ok().map(|idx| &self.players[idx])
    }

    /// Look up a team by display name (exact match first, then
    /// case-insensitive).
    pub fn team(&self, name: &str) -> Option<&Team> {
        self.team_index(name).ok().map(|idx| &self.teams[idx])
    }

    pub fn ledger(&self) -> &BidLedger {
        &self.ledger
    }

    pub fn timer(&self) -> &TimerController {
        &self.timer
    }

    pub fn rtm(&self) -> Option<&RtmNegotiation> {
        self.rtm.as_ref()
    }

    pub fn retention(&self) -> &RetentionCoordinator {
        &self.retention
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    pub fn sales(&self) -> &[SaleRecord] {
        &self.sales
    }

    pub fn is_auction_active(&self) -> bool {
        self.is_auction_active
    }

    /// Drain the events committed since the last call.
    pub fn take_events(&mut self) -> Vec<AuctionEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Full state for the broadcaster. `sequence` is filled in by the room.
    pub fn snapshot(&self) -> AuctionSnapshot {
        AuctionSnapshot {
            sequence: 0,
            is_auction_active: self.is_auction_active,
            current_player: self.current_player().cloned(),
            players: self.players.clone(),
            teams: self.teams.clone(),
            bids: self.ledger.active().cloned().collect(),
            timer: TimerSnapshot {
                timer: self.timer.timer,
                timer_limit: self.timer.timer_limit,
                is_running: self.timer.is_running,
                is_paused: self.timer.is_paused,
                phase: self.timer.phase(),
            },
            rtm: self.rtm.clone(),
            retention: RetentionSnapshot {
                phase: self.retention.phase,
                statuses: self.retention.statuses.clone(),
            },
            pending_actions: self.pending.iter().cloned().collect(),
            rules: self.rules.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Lookups shared by the sibling modules
    // ------------------------------------------------------------------

    pub(super) fn team_index(&self, name: &str) -> Result<usize, AuctionError> {
        self.teams
            .iter()
            .position(|t| t.name == name)
            .or_else(|| self.teams.iter().position(|t| t.name.eq_ignore_ascii_case(name)))
            .ok_or_else(|| AuctionError::UnknownTeam {
                team: name.to_string(),
            })
    }

    pub(super) fn player_index(&self, player_id: u32) -> Result<usize, AuctionError> {
        self.players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| AuctionError::UnknownPlayer {
                player: player_id.to_string(),
            })
    }

    pub(super) fn player_index_by_name(&self, name: &str) -> Result<usize, AuctionError> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .or_else(|| self.players.iter().position(|p| p.name.eq_ignore_ascii_case(name)))
            .ok_or_else(|| AuctionError::UnknownPlayer {
                player: name.to_string(),
            })
    }

    /// The current player, which must still be available.
    pub(super) fn current_available_index(&self) -> Result<usize, AuctionError> {
        let idx = self.current.ok_or(AuctionError::NoCurrentPlayer)?;
        let player = &self.players[idx];
        if !player.is_available() {
            return Err(AuctionError::PlayerNotAvailable {
                player: player.name.clone(),
            });
        }
        Ok(idx)
    }

    pub(super) fn emit(&mut self, event: AuctionEvent) {
        self.outbox.push(event);
    }

    pub(super) fn emit_budget(&mut self, team_idx: usize) {
        let team = &self.teams[team_idx];
        let event = AuctionEvent::BudgetChanged {
            team: team.name.clone(),
            budget: team.budget,
        };
        self.emit(event);
    }

    // ------------------------------------------------------------------
    // Queue advancement
    // ------------------------------------------------------------------

    /// First available player after `from` in auction order, wrapping
    /// around; `from` itself is considered last.
    pub(super) fn next_available_after(&self, from: Option<usize>) -> Option<usize> {
        let n = self.players.len();
        let start = from.map(|idx| idx + 1).unwrap_or(0);
        (0..n)
            .map(|k| (start + k) % n)
            .find(|&idx| self.players[idx].is_available())
    }

    /// Put `idx` on the block (or halt on `None`). Clears the ledger, drops
    /// any open negotiation and resets the timer.
    pub(super) fn select_player(&mut self, idx: Option<usize>) {
        if let Some(prev) = self.current {
            let player = &mut self.players[prev];
            if player.is_available() {
                player.current_bid = player.base_price;
                player.current_bidder = None;
            }
        }

        self.current = idx;
        self.ledger.clear();
        self.rtm = None;
        self.timer.reset();

        match idx {
            Some(i) => info!(
                "Now on the block: {} (base {})",
                self.players[i].name, self.players[i].base_price
            ),
            None => info!("No available players remain, auction halted"),
        }
    }

    /// Move on from player `idx` if it is the one on the block.
    fn advance_if_current(&mut self, idx: usize) {
        if self.current == Some(idx) {
            let next = self.next_available_after(Some(idx));
            self.select_player(next);
        }
    }

    /// Advance to the next available player in auction order, wrapping to
    /// the start. With no available players the auction halts.
    pub fn next_player(&mut self) -> Result<(), AuctionError> {
        let next = self.next_available_after(self.current);
        self.select_player(next);
        Ok(())
    }

    /// Jump straight to an unsold player, ahead of the normal queue.
    pub fn bring_back_unsold_player(&mut self, player_id: u32) -> Result<(), AuctionError> {
        let idx = self.player_index(player_id)?;
        let player = &self.players[idx];
        if !matches!(player.status, PlayerStatus::Unsold | PlayerStatus::Available) {
            return Err(AuctionError::PlayerNotUnsold {
                player: player.name.clone(),
            });
        }

        self.players[idx].reset_to_base();
        self.select_player(Some(idx));
        info!("Brought back {}", self.players[idx].name);
        self.emit(AuctionEvent::PlayerBroughtBack { player_id });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sales
    // ------------------------------------------------------------------

    /// Sell player `player_idx` to team `team_idx`.
    ///
    /// Validates amount, availability, RTM cards and squad limits, then
    /// records the sale. If the player was on the block the auction moves on.
    pub(super) fn complete_sale(
        &mut self,
        player_idx: usize,
        team_idx: usize,
        amount: Crores,
        acquisition: Acquisition,
    ) -> Result<(), AuctionError> {
        if !amount.is_positive() {
            return Err(AuctionError::InvalidAmount { amount });
        }
        let player = &self.players[player_idx];
        if !player.is_available() {
            return Err(AuctionError::PlayerNotAvailable {
                player: player.name.clone(),
            });
        }
        let team = &self.teams[team_idx];
        if acquisition == Acquisition::RightToMatch && team.rtm_available == 0 {
            return Err(AuctionError::RtmUnavailable {
                team: team.name.clone(),
            });
        }
        team.check_can_acquire(player, amount, &self.rules)?;

        let team_name = team.name.clone();
        let via_rtm = acquisition == Acquisition::RightToMatch;

        let player = &mut self.players[player_idx];
        let previous_team_before = player.previous_team.clone();
        player.status = PlayerStatus::Sold;
        player.sold_price = Some(amount);
        player.current_bid = amount;
        player.current_bidder = Some(team_name.clone());
        if via_rtm {
            player.previous_team = Some(team_name.clone());
        }
        let player_id = player.id;

        let team = &mut self.teams[team_idx];
        if via_rtm {
            team.rtm_available -= 1;
        }
        team.acquire(&self.players[player_idx], amount, acquisition);

        info!(
            "Sold {} to {} for {}{}",
            self.players[player_idx].name,
            team_name,
            amount,
            if via_rtm { " (RTM)" } else { "" }
        );

        self.sales.push(SaleRecord {
            player_id,
            team_name: team_name.clone(),
            amount,
            acquisition,
            previous_team_before,
        });
        self.emit(AuctionEvent::PlayerSold {
            player_id,
            team: team_name,
            amount,
            via_rtm,
        });
        self.emit_budget(team_idx);

        self.advance_if_current(player_idx);
        Ok(())
    }

    /// Mark player `player_idx` unsold and move on if it was on the block.
    pub(super) fn complete_unsold(&mut self, player_idx: usize) -> Result<(), AuctionError> {
        let player = &mut self.players[player_idx];
        if !player.is_available() {
            return Err(AuctionError::PlayerNotAvailable {
                player: player.name.clone(),
            });
        }
        player.status = PlayerStatus::Unsold;
        player.current_bid = player.base_price;
        player.current_bidder = None;
        let player_id = player.id;
        info!("{} went unsold", player.name);

        self.emit(AuctionEvent::PlayerUnsold { player_id });
        self.advance_if_current(player_idx);
        Ok(())
    }

    /// Manually sell the current player.
    pub fn sell_player(&mut self, team_name: &str, amount: Crores) -> Result<(), AuctionError> {
        let idx = self.current_available_index()?;
        let team_idx = self.team_index(team_name)?;
        self.complete_sale(idx, team_idx, amount, Acquisition::Bought)
    }

    /// Manually sell the current player to a team using one of its RTM cards.
    pub fn sell_player_with_rtm(&mut self, team_name: &str, amount: Crores) -> Result<(), AuctionError> {
        let idx = self.current_available_index()?;
        let team_idx = self.team_index(team_name)?;
        self.complete_sale(idx, team_idx, amount, Acquisition::RightToMatch)
    }

    pub fn mark_unsold(&mut self) -> Result<(), AuctionError> {
        let idx = self.current_available_index()?;
        self.complete_unsold(idx)
    }

    /// Revert the most recent sale: refund the team, give back an RTM card
    /// if one was used and put the player back on the block.
    pub fn undo_last_sale(&mut self) -> Result<(), AuctionError> {
        let record = self.sales.last().cloned().ok_or(AuctionError::NothingToUndo)?;
        let player_idx = self.player_index(record.player_id)?;
        let team_idx = self.team_index(&record.team_name)?;

        self.sales.pop();
        let team = &mut self.teams[team_idx];
        if team.release(record.player_id).is_none() {
            warn!(
                "Sale of player {} was not on {}'s roster, nothing refunded",
                record.player_id, record.team_name
            );
        }
        if record.acquisition == Acquisition::RightToMatch {
            team.rtm_available += 1;
        }

        let player = &mut self.players[player_idx];
        player.reset_to_base();
        player.previous_team = record.previous_team_before.clone();
        info!(
            "Reverted sale of {} to {} for {}",
            player.name, record.team_name, record.amount
        );

        self.emit(AuctionEvent::SaleReverted {
            player_id: record.player_id,
            team: record.team_name.clone(),
            amount: record.amount,
        });
        self.emit_budget(team_idx);
        self.select_player(Some(player_idx));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open the auction. Without a valid player on the block the first
    /// available one is selected; the timer stays stopped until a bid.
    pub fn start_auction(&mut self) -> Result<(), AuctionError> {
        self.is_auction_active = true;
        let has_current = self
            .current
            .is_some_and(|idx| self.players[idx].is_available());
        if has_current {
            if self.rtm.is_none() {
                self.timer.resume();
            }
        } else {
            let first = self.next_available_after(None);
            self.select_player(first);
        }
        info!("Auction opened");
        Ok(())
    }

    /// Close the auction and freeze the countdown.
    pub fn pause_auction(&mut self) -> Result<(), AuctionError> {
        self.is_auction_active = false;
        self.timer.pause();
        info!("Auction paused");
        Ok(())
    }

    /// Full hard reset: seeded players, fresh budgets, empty rosters and no
    /// negotiation, queue or phase state.
    pub fn reset_auction(&mut self) -> Result<(), AuctionError> {
        let rtm = self.rules.rtm_allowance(0);
        self.players = self.seed_players.clone();
        for team in &mut self.teams {
            team.reset(rtm);
        }
        self.current = None;
        self.ledger.clear();
        self.timer.reset();
        self.rtm = None;
        self.retention = RetentionCoordinator::default();
        self.pending.clear();
        self.sales.clear();
        self.is_auction_active = false;
        info!("Auction reset");
        self.emit(AuctionEvent::AuctionReset);
        for idx in 0..self.teams.len() {
            self.emit_budget(idx);
        }
        Ok(())
    }

    /// Store new retention/RTM caps. Teams holding more RTM cards than the
    /// new cap are clamped to it.
    pub fn update_team_limits(&mut self, max_retentions: u32, max_rtm: u32) -> Result<(), AuctionError> {
        self.rules.max_retentions = max_retentions;
        self.rules.max_rtm = max_rtm;
        for team in &mut self.teams {
            team.rtm_available = team.rtm_available.min(max_rtm);
        }
        info!(
            "Team limits updated: max_retentions={}, max_rtm={}",
            max_retentions, max_rtm
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Timer
    // ------------------------------------------------------------------

    pub fn start_timer(&mut self) -> Result<(), AuctionError> {
        self.current_available_index()?;
        self.timer.start();
        Ok(())
    }

    pub fn pause_timer(&mut self) -> Result<(), AuctionError> {
        self.timer.pause();
        Ok(())
    }

    pub fn resume_timer(&mut self) -> Result<(), AuctionError> {
        self.timer.resume();
        Ok(())
    }

    pub fn reset_timer(&mut self) -> Result<(), AuctionError> {
        self.timer.reset();
        Ok(())
    }

    pub fn set_timer_limit(&mut self, seconds: u32) -> Result<(), AuctionError> {
        if seconds == 0 {
            return Err(AuctionError::InvalidTimerLimit);
        }
        self.rules.timer_limit = seconds;
        self.timer.set_limit(seconds);
        Ok(())
    }

    /// One scheduler tick. On expiry the current player is sold to the
    /// highest bidder, or marked unsold, and the auction moves on.
    pub fn on_timer_tick(&mut self) -> TickOutcome {
        let outcome = self.timer.tick();
        if outcome == TickOutcome::Expired {
            self.resolve_expiry();
        }
        outcome
    }

    fn resolve_expiry(&mut self) {
        let Some(idx) = self.current else {
            return;
        };
        if !self.players[idx].is_available() {
            self.advance_if_current(idx);
            return;
        }

        let player = &self.players[idx];
        let sale = player
            .current_bidder
            .clone()
            .map(|bidder| (bidder, player.current_bid));

        if let Some((bidder, amount)) = sale {
            let result = self
                .team_index(&bidder)
                .and_then(|team_idx| self.complete_sale(idx, team_idx, amount, Acquisition::Bought));
            match result {
                Ok(()) => return,
                Err(e) => warn!(
                    "Timer expired but sale to {} failed ({}), marking unsold",
                    bidder, e
                ),
            }
        }
        if let Err(e) = self.complete_unsold(idx) {
            warn!("Could not mark player unsold on expiry: {}", e);
        }
    }

    /// Called after restoring from a saved snapshot: a countdown that was
    /// running when the process stopped is left paused for an admin to
    /// resume.
    pub fn suspend_after_restore(&mut self) {
        if self.timer.is_running {
            self.timer.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::test_support::{cr, engine, started_engine};
    use crate::auction::timer::TimerPhase;

    #[test]
    fn new_engine_orders_players_by_set() {
        let e = engine();
        let orders: Vec<u32> = e.players().iter().map(|p| p.set_order).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);
        assert!(e.current_player().is_none());
        assert!(!e.is_auction_active());
    }

    #[test]
    fn start_auction_selects_first_available_and_keeps_timer_stopped() {
        let mut e = engine();
        e.start_auction().unwrap();
        assert!(e.is_auction_active());
        assert_eq!(e.current_player().unwrap().id, e.players()[0].id);
        assert_eq!(e.timer().phase(), TimerPhase::WaitingForBid);
        assert_eq!(e.timer().timer, e.rules().timer_limit);
    }

    #[test]
    fn next_player_wraps_and_skips_unavailable() {
        let mut e = started_engine();
        let ids: Vec<u32> = e.players().iter().map(|p| p.id).collect();

        e.mark_unsold().unwrap();
        assert_eq!(e.current_player().unwrap().id, ids[1]);

        let last = ids.len() - 1;
        for _ in 1..last {
            e.next_player().unwrap();
        }
        assert_eq!(e.current_player().unwrap().id, ids[last]);

        // Wraps past the unsold first player.
        e.next_player().unwrap();
        assert_eq!(e.current_player().unwrap().id, ids[1]);
    }

    #[test]
    fn next_player_resets_abandoned_bids() {
        let mut e = started_engine();
        let first = e.current_player().unwrap().id;
        e.place_bid("Alpha", cr(2.0)).unwrap();
        e.next_player().unwrap();

        let abandoned = e.player(first).unwrap();
        assert_eq!(abandoned.current_bid, abandoned.base_price);
        assert!(abandoned.current_bidder.is_none());
        assert!(e.ledger().is_empty());
        assert_eq!(e.timer().phase(), TimerPhase::WaitingForBid);
    }

    #[test]
    fn exhaustion_halts_with_no_current_player() {
        let mut e = started_engine();
        for _ in 0..e.players().len() {
            e.mark_unsold().unwrap();
        }
        assert!(e.current_player().is_none());
        assert_eq!(e.mark_unsold().unwrap_err(), AuctionError::NoCurrentPlayer);
        e.next_player().unwrap();
        assert!(e.current_player().is_none());
    }

    #[test]
    fn sale_deducts_budget_and_advances() {
        let mut e = started_engine();
        let first = e.current_player().unwrap().id;
        let before = e.team("Alpha").unwrap().budget;

        e.sell_player("Alpha", cr(4.5)).unwrap();

        let team = e.team("Alpha").unwrap();
        assert_eq!(team.budget, before - cr(4.5));
        assert_eq!(team.roster.len(), 1);
        let sold = e.player(first).unwrap();
        assert_eq!(sold.status, PlayerStatus::Sold);
        assert_eq!(sold.sold_price, Some(cr(4.5)));
        assert_ne!(e.current_player().unwrap().id, first);
    }

    #[test]
    fn sale_over_budget_is_rejected_without_changes() {
        let mut e = started_engine();
        let first = e.current_player().unwrap().id;
        let err = e.sell_player("Alpha", cr(500.0)).unwrap_err();
        assert!(matches!(err, AuctionError::InsufficientBudget { .. }));
        assert_eq!(e.current_player().unwrap().id, first);
        assert!(e.team("Alpha").unwrap().roster.is_empty());
        assert!(e.take_events().is_empty());
    }

    #[test]
    fn unknown_team_is_named_in_error() {
        let mut e = started_engine();
        assert_eq!(
            e.sell_player("Nobody", cr(2.0)).unwrap_err(),
            AuctionError::UnknownTeam {
                team: "Nobody".into()
            }
        );
    }

    #[test]
    fn team_lookup_falls_back_to_case_insensitive() {
        let mut e = started_engine();
        e.sell_player("alpha", cr(2.0)).unwrap();
        assert_eq!(e.team("Alpha").unwrap().roster.len(), 1);
    }

    #[test]
    fn sell_with_rtm_uses_a_card_and_records_provenance() {
        let mut e = started_engine();
        let first = e.current_player().unwrap().id;
        let cards = e.team("Bravo").unwrap().rtm_available;

        e.sell_player_with_rtm("Bravo", cr(3.0)).unwrap();

        assert_eq!(e.team("Bravo").unwrap().rtm_available, cards - 1);
        assert_eq!(e.player(first).unwrap().previous_team.as_deref(), Some("Bravo"));
    }

    #[test]
    fn bring_back_unsold_jumps_the_queue() {
        let mut e = started_engine();
        let first = e.current_player().unwrap().id;
        e.mark_unsold().unwrap();
        e.next_player().unwrap();
        e.place_bid("Alpha", cr(2.0)).unwrap();

        e.bring_back_unsold_player(first).unwrap();

        let current = e.current_player().unwrap();
        assert_eq!(current.id, first);
        assert_eq!(current.status, PlayerStatus::Available);
        assert_eq!(current.current_bid, current.base_price);
        assert!(current.current_bidder.is_none());
        assert!(e.ledger().is_empty());
        assert_eq!(e.timer().phase(), TimerPhase::WaitingForBid);
    }

    #[test]
    fn bring_back_rejects_sold_player() {
        let mut e = started_engine();
        let first = e.current_player().unwrap().id;
        e.sell_player("Alpha", cr(2.0)).unwrap();
        assert!(matches!(
            e.bring_back_unsold_player(first).unwrap_err(),
            AuctionError::PlayerNotUnsold { .. }
        ));
        assert!(matches!(
            e.bring_back_unsold_player(9999).unwrap_err(),
            AuctionError::UnknownPlayer { .. }
        ));
    }

    #[test]
    fn undo_last_sale_refunds_and_restores() {
        let mut e = started_engine();
        let first = e.current_player().unwrap().id;
        let budget = e.team("Bravo").unwrap().budget;
        let cards = e.team("Bravo").unwrap().rtm_available;

        e.sell_player_with_rtm("Bravo", cr(6.0)).unwrap();
        e.undo_last_sale().unwrap();

        let team = e.team("Bravo").unwrap();
        assert_eq!(team.budget, budget);
        assert_eq!(team.rtm_available, cards);
        assert!(team.roster.is_empty());
        let player = e.player(first).unwrap();
        assert_eq!(player.status, PlayerStatus::Available);
        assert!(player.previous_team.is_none());
        assert_eq!(e.current_player().unwrap().id, first);
        assert_eq!(e.undo_last_sale().unwrap_err(), AuctionError::NothingToUndo);
    }

    #[test]
    fn pause_auction_freezes_timer() {
        let mut e = started_engine();
        e.place_bid("Alpha", cr(2.0)).unwrap();
        e.pause_auction().unwrap();
        assert_eq!(e.on_timer_tick(), TickOutcome::Idle);
        assert_eq!(e.timer().timer, e.rules().timer_limit);

        e.start_auction().unwrap();
        assert_eq!(
            e.on_timer_tick(),
            TickOutcome::Counting {
                remaining: e.rules().timer_limit - 1
            }
        );
    }

    #[test]
    fn reset_auction_restores_everything() {
        let mut e = started_engine();
        e.sell_player("Alpha", cr(5.0)).unwrap();
        e.mark_unsold().unwrap();
        e.take_events();
        e.reset_auction().unwrap();

        let events = e.take_events();
        assert_eq!(events[0], AuctionEvent::AuctionReset);
        assert!(events.contains(&AuctionEvent::BudgetChanged {
            team: "Alpha".into(),
            budget: cr(120.0),
        }));
        let budget_events = events
            .iter()
            .filter(|ev| matches!(ev, AuctionEvent::BudgetChanged { .. }))
            .count();
        assert_eq!(budget_events, e.teams().len());

        assert!(e.current_player().is_none());
        assert!(!e.is_auction_active());
        assert!(e.players().iter().all(|p| p.is_available()));
        let team = e.team("Alpha").unwrap();
        assert_eq!(team.budget, team.starting_budget);
        assert!(team.roster.is_empty());
        assert!(e.sales().is_empty());
    }

    #[test]
    fn update_team_limits_clamps_rtm_cards() {
        let mut e = engine();
        e.update_team_limits(4, 1).unwrap();
        assert_eq!(e.rules().max_retentions, 4);
        assert!(e.teams().iter().all(|t| t.rtm_available == 1));
    }

    #[test]
    fn timer_expiry_with_bidder_sells() {
        let mut e = started_engine();
        let first = e.current_player().unwrap().id;
        e.place_bid("Alpha", cr(2.0)).unwrap();
        e.place_bid("Bravo", cr(2.5)).unwrap();

        let mut outcome = TickOutcome::Idle;
        for _ in 0..e.rules().bid_reset_secs {
            outcome = e.on_timer_tick();
        }
        assert_eq!(outcome, TickOutcome::Expired);

        let sold = e.player(first).unwrap();
        assert_eq!(sold.status, PlayerStatus::Sold);
        assert_eq!(sold.current_bidder.as_deref(), Some("Bravo"));
        assert_eq!(sold.sold_price, Some(cr(2.5)));
        assert_ne!(e.current_player().unwrap().id, first);
        assert!(e.ledger().is_empty());
        assert_eq!(e.timer().phase(), TimerPhase::WaitingForBid);
        assert_eq!(e.timer().timer, e.rules().timer_limit);
    }

    #[test]
    fn timer_expiry_without_bidder_marks_unsold() {
        let mut e = started_engine();
        let first = e.current_player().unwrap().id;
        e.start_timer().unwrap();
        for _ in 0..e.rules().timer_limit {
            e.on_timer_tick();
        }
        assert_eq!(e.player(first).unwrap().status, PlayerStatus::Unsold);
        assert_ne!(e.current_player().unwrap().id, first);
        assert!(e.ledger().is_empty());
        assert_eq!(e.timer().phase(), TimerPhase::WaitingForBid);
    }

    #[test]
    fn set_timer_limit_rejects_zero() {
        let mut e = engine();
        assert_eq!(e.set_timer_limit(0).unwrap_err(), AuctionError::InvalidTimerLimit);
        e.set_timer_limit(45).unwrap();
        assert_eq!(e.timer().timer_limit, 45);
        assert_eq!(e.rules().timer_limit, 45);
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut e = started_engine();
        e.place_bid("Alpha", cr(2.0)).unwrap();
        e.place_bid("Bravo", cr(2.25)).unwrap();
        let snap = e.snapshot();
        assert_eq!(snap.bids.len(), 2);
        assert_eq!(snap.bids[0].team_name, "Bravo");
        assert_eq!(snap.current_player.unwrap().current_bid, cr(2.25));
        assert_eq!(snap.teams.len(), e.teams().len());
        assert_eq!(snap.timer.phase, TimerPhase::Running);
    }

    #[test]
    fn events_are_drained_once() {
        let mut e = started_engine();
        e.sell_player("Alpha", cr(2.0)).unwrap();
        let events = e.take_events();
        assert!(matches!(events[0], AuctionEvent::PlayerSold { .. }));
        assert!(matches!(events[1], AuctionEvent::BudgetChanged { .. }));
        assert!(e.take_events().is_empty());
    }

    #[test]
    fn suspend_after_restore_pauses_running_timer() {
        let mut e = started_engine();
        e.place_bid("Alpha", cr(2.0)).unwrap();
        let json = serde_json::to_string(&e).unwrap();
        let mut restored: AuctionEngine = serde_json::from_str(&json).unwrap();
        restored.suspend_after_restore();
        assert_eq!(restored.timer().phase(), TimerPhase::Paused);
        assert_eq!(restored.current_player().unwrap().current_bidder.as_deref(), Some("Alpha"));
        assert_eq!(restored.ledger().active_count(), 1);
    }
}
