// Room actor: owns the engine, serializes every mutation and the countdown
// tick, persists committed events and broadcasts snapshots.

use std::time::Duration;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::auction::timer::TickOutcome;
use crate::auction::{AuctionEngine, AuctionError, AuctionSnapshot};
use crate::db::Database;
use crate::protocol::{Action, ServerMessage};

/// Scheduler period for the countdown.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Key under which the engine is saved for crash recovery.
const ENGINE_STATE_KEY: &str = "engine";

/// Key under which the last broadcast sequence number is saved.
const SEQUENCE_STATE_KEY: &str = "sequence";

// ---------------------------------------------------------------------------
// Commands and handle
// ---------------------------------------------------------------------------

pub enum RoomCommand {
    Apply {
        action: Action,
        reply: oneshot::Sender<Result<(), AuctionError>>,
    },
    Snapshot {
        reply: oneshot::Sender<AuctionSnapshot>,
    },
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] AuctionError),
    #[error("auction room has shut down")]
    Closed,
}

/// Cloneable sender side of the room actor.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn new(tx: mpsc::Sender<RoomCommand>) -> Self {
        Self { tx }
    }

    /// Apply one action and wait for the engine's verdict.
    pub async fn submit(&self, action: Action) -> Result<(), SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RoomCommand::Apply { action, reply })
            .await
            .map_err(|_| SubmitError::Closed)?;
        rx.await.map_err(|_| SubmitError::Closed)??;
        Ok(())
    }

    /// Current state without a mutation (used for newly connected clients).
    pub async fn snapshot(&self) -> Result<AuctionSnapshot, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RoomCommand::Snapshot { reply })
            .await
            .map_err(|_| SubmitError::Closed)?;
        rx.await.map_err(|_| SubmitError::Closed)
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(RoomCommand::Shutdown).await;
    }
}

// ---------------------------------------------------------------------------
// Room state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub engine: AuctionEngine,
    pub db: Database,
    pub room_id: String,
    /// Sequence number of the last broadcast snapshot.
    pub sequence: u64,
    pub snapshot_tx: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(
        engine: AuctionEngine,
        db: Database,
        room_id: String,
        snapshot_tx: broadcast::Sender<ServerMessage>,
    ) -> Self {
        Self {
            engine,
            db,
            room_id,
            sequence: 0,
            snapshot_tx,
        }
    }

    /// Apply an action. On success the change is persisted and broadcast;
    /// a rejection leaves everything untouched.
    pub fn apply(&mut self, action: Action) -> Result<(), AuctionError> {
        debug!("Applying {:?}", action);
        match apply_action(&mut self.engine, action) {
            Ok(()) => {
                self.commit();
                Ok(())
            }
            Err(e) => {
                info!("Rejected action: {}", e);
                Err(e)
            }
        }
    }

    /// One scheduler tick. Countdown changes are broadcast; an expiry is
    /// committed like any other mutation.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.engine.on_timer_tick();
        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Counting { .. } => self.publish(),
            TickOutcome::Expired => {
                info!("Countdown expired");
                self.commit();
            }
        }
        outcome
    }

    pub fn snapshot(&self) -> AuctionSnapshot {
        let mut snapshot = self.engine.snapshot();
        snapshot.sequence = self.sequence;
        snapshot
    }

    /// Persist queued events and the engine, then broadcast.
    fn commit(&mut self) {
        for event in self.engine.take_events() {
            match self.db.record_event(&self.room_id, &event) {
                Ok(id) => debug!("Recorded event {} ({})", id, event.kind()),
                Err(e) => warn!("Failed to persist {} event: {}", event.kind(), e),
            }
        }
        if let Err(e) = self.save_engine() {
            warn!("Failed to save engine state: {}", e);
        }
        self.publish();
    }

    fn save_engine(&self) -> anyhow::Result<()> {
        let value =
            serde_json::to_value(&self.engine).context("failed to serialize engine state")?;
        self.db.save_state(ENGINE_STATE_KEY, &value)
    }

    fn publish(&mut self) {
        self.sequence += 1;
        // Countdown ticks bump the sequence without a commit.
        if let Err(e) = self
            .db
            .save_state(SEQUENCE_STATE_KEY, &serde_json::Value::from(self.sequence))
        {
            warn!("Failed to save snapshot sequence: {}", e);
        }
        let snapshot = self.snapshot();
        // No subscribers is fine: nobody is connected yet.
        let _ = self
            .snapshot_tx
            .send(ServerMessage::Snapshot(Box::new(snapshot)));
    }
}

/// Dispatch one wire action to the engine.
pub fn apply_action(engine: &mut AuctionEngine, action: Action) -> Result<(), AuctionError> {
    match action {
        Action::PlaceBid { team, amount } => engine.place_bid(&team, amount),
        Action::UndoLastBid => engine.undo_last_bid(),
        Action::InitiateRtm {
            team,
            matched_amount,
        } => engine.initiate_rtm(&team, matched_amount),
        Action::HikePrice { amount } => engine.hike_price(amount),
        Action::FinalizeRtm { accept } => engine.finalize_rtm(accept),
        Action::CancelRtm => engine.cancel_rtm(),
        Action::SellPlayer { team, amount } => engine.sell_player(&team, amount),
        Action::SellPlayerWithRtm { team, amount } => engine.sell_player_with_rtm(&team, amount),
        Action::RetainPlayer {
            team,
            player,
            amount,
        } => engine.retain_player(&team, &player, amount),
        Action::ConfirmTeamRetentions { team } => engine.confirm_team_retentions(&team),
        Action::MarkUnsold => engine.mark_unsold(),
        Action::BringBackUnsoldPlayer { player_id } => engine.bring_back_unsold_player(player_id),
        Action::NextPlayer => engine.next_player(),
        Action::StartAuction => engine.start_auction(),
        Action::PauseAuction => engine.pause_auction(),
        Action::ResetAuction => engine.reset_auction(),
        Action::StartRetentionPhase => engine.start_retention_phase(),
        Action::CompleteRetentionPhase => engine.complete_retention_phase(),
        Action::UpdateTeamLimits {
            max_retentions,
            max_rtm,
        } => engine.update_team_limits(max_retentions, max_rtm),
        Action::StartTimer => engine.start_timer(),
        Action::PauseTimer => engine.pause_timer(),
        Action::ResumeTimer => engine.resume_timer(),
        Action::ResetTimer => engine.reset_timer(),
        Action::SetTimerLimit { seconds } => engine.set_timer_limit(seconds),
        Action::Propose {
            player,
            team,
            amount,
            kind,
        } => engine.propose(&player, &team, amount, kind).map(|_| ()),
        Action::Approve { id } => engine.approve(id),
        Action::Reject { id } => engine.reject(id),
        Action::UndoLastSale => engine.undo_last_sale(),
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the room actor until shutdown or until every handle is dropped.
///
/// The command arm is polled before the tick arm, so a bid that arrives in
/// the same instant as an expiry tick is applied first.
pub async fn run(mut cmd_rx: mpsc::Receiver<RoomCommand>, mut state: AppState) -> anyhow::Result<()> {
    info!("Auction room {} started", state.room_id);

    let mut tick_interval = tokio::time::interval(TICK_INTERVAL);
    // The first tick completes immediately; consume it so the countdown
    // starts one full second later.
    tick_interval.tick().await;

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(RoomCommand::Apply { action, reply }) => {
                        let result = state.apply(action);
                        let _ = reply.send(result);
                    }
                    Some(RoomCommand::Snapshot { reply }) => {
                        let _ = reply.send(state.snapshot());
                    }
                    Some(RoomCommand::Shutdown) => {
                        info!("Shutdown requested");
                        break;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            _ = tick_interval.tick() => {
                state.tick();
            }
        }
    }

    info!("Auction room {} exiting", state.room_id);
    Ok(())
}

/// Restore the engine saved by the last committed mutation.
///
/// Returns `false` when nothing was saved. A countdown that was running is
/// restored paused.
pub fn recover_from_db(state: &mut AppState) -> anyhow::Result<bool> {
    let Some(value) = state.db.load_state(ENGINE_STATE_KEY)? else {
        info!("No saved auction for room {}, starting fresh", state.room_id);
        return Ok(false);
    };

    let mut engine: AuctionEngine =
        serde_json::from_value(value).context("failed to deserialize saved engine state")?;
    engine.suspend_after_restore();
    state.engine = engine;
    state.sequence = state
        .db
        .load_state(SEQUENCE_STATE_KEY)?
        .and_then(|v| v.as_u64())
        .unwrap_or(0);

    let sold = state
        .engine
        .players()
        .iter()
        .filter(|p| !p.is_available())
        .count();
    let logged = state.db.event_count(&state.room_id)?;
    info!(
        "Crash recovery: restored room {} ({} of {} players resolved, {} events logged)",
        state.room_id,
        sold,
        state.engine.players().len(),
        logged
    );
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
