// Proposed actions awaiting admin approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::engine::AuctionEngine;
use super::error::AuctionError;
use super::money::Crores;
use super::team::Acquisition;

/// What a pending action will do once approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingKind {
    Sold,
    Retain,
    Unsold,
    Rtm {
        original_bidder: String,
        hiked_amount: Option<Crores>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: u64,
    pub player_name: String,
    /// Empty for `Unsold`.
    pub team_name: String,
    pub amount: Crores,
    pub timestamp: DateTime<Utc>,
    pub kind: PendingKind,
}

/// FIFO of proposals. Nothing here touches auction state until approval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingQueue {
    actions: Vec<PendingAction>,
    next_id: u64,
}

impl PendingQueue {
    pub fn push(&mut self, player_name: &str, team_name: &str, amount: Crores, kind: PendingKind) -> u64 {
        self.next_id += 1;
        self.actions.push(PendingAction {
            id: self.next_id,
            player_name: player_name.to_string(),
            team_name: team_name.to_string(),
            amount,
            timestamp: Utc::now(),
            kind,
        });
        self.next_id
    }

    /// Remove and return the action with `id`.
    pub fn take(&mut self, id: u64) -> Option<PendingAction> {
        let idx = self.actions.iter().position(|a| a.id == id)?;
        Some(self.actions.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingAction> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

impl AuctionEngine {
    /// Queue an action for approval and return its id. Only the names are
    /// checked here; the full preconditions run on approval.
    pub fn propose(
        &mut self,
        player_name: &str,
        team_name: &str,
        amount: Crores,
        kind: PendingKind,
    ) -> Result<u64, AuctionError> {
        let player = self.players[self.player_index_by_name(player_name)?].name.clone();
        let team = match kind {
            PendingKind::Unsold => String::new(),
            _ => {
                if !amount.is_positive() {
                    return Err(AuctionError::InvalidAmount { amount });
                }
                self.teams[self.team_index(team_name)?].name.clone()
            }
        };
        if let PendingKind::Rtm { original_bidder, .. } = &kind {
            self.team_index(original_bidder)?;
        }

        let id = self.pending.push(&player, &team, amount, kind);
        info!("Proposed action {} for {}", id, player);
        Ok(id)
    }

    /// Execute a pending action. The action leaves the queue whether or not
    /// it succeeds, so approving the same id twice fails the second time.
    pub fn approve(&mut self, id: u64) -> Result<(), AuctionError> {
        let action = self
            .pending
            .take(id)
            .ok_or(AuctionError::UnknownAction { id })?;
        info!("Approving action {} ({:?}) for {}", id, action.kind, action.player_name);

        let player_idx = self.player_index_by_name(&action.player_name)?;
        match action.kind {
            PendingKind::Unsold => self.complete_unsold(player_idx),
            PendingKind::Sold => {
                let team_idx = self.team_index(&action.team_name)?;
                self.complete_sale(player_idx, team_idx, action.amount, Acquisition::Bought)
            }
            PendingKind::Rtm { .. } => {
                let team_idx = self.team_index(&action.team_name)?;
                self.complete_sale(player_idx, team_idx, action.amount, Acquisition::RightToMatch)
            }
            PendingKind::Retain => {
                let team = &self.teams[self.team_index(&action.team_name)?];
                if team.retentions_used >= self.rules.max_retentions {
                    return Err(AuctionError::RetentionCapReached {
                        team: team.name.clone(),
                        limit: self.rules.max_retentions,
                    });
                }
                self.retain_player(&action.team_name, &action.player_name, action.amount)
            }
        }
    }

    /// Drop a pending action without executing it.
    pub fn reject(&mut self, id: u64) -> Result<(), AuctionError> {
        self.pending
            .take(id)
            .ok_or(AuctionError::UnknownAction { id })?;
        info!("Rejected action {}", id);
        Ok(())
    }
}
